use crate::error::{Result, SlurmError};

/// Characters a shell would treat specially
const SHELL_METACHARACTERS: &[char] = &[
    ';', '&', '|', '`', '$', '<', '>', '(', ')', '{', '}', '\\', '"', '\'', '*', '?', '!', '#', '~',
];

/// Ordered pass-through options for sbatch and srun
///
/// A flag without a value renders as a bare flag (`--exclusive`), a flag with a value renders as
/// two tokens (`--partition debug`). Flags are used verbatim, include the dashes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    options: Vec<(String, Option<String>)>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        SubmitOptions::default()
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.options.push((flag.into(), None));
        self
    }

    pub fn arg(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((flag.into(), Some(value.into())));
        self
    }

    pub fn push(&mut self, flag: impl Into<String>, value: Option<String>) {
        self.options.push((flag.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Reject empty flags, embedded whitespace and shell metacharacters
    pub fn validate(&self) -> Result<()> {
        for (flag, value) in &self.options {
            check_token(flag)?;
            if flag.starts_with('=') {
                return Err(invalid(flag, "flag starts with '='"));
            }
            if let Some(value) = value {
                check_token(value)?;
            }
        }
        Ok(())
    }

    /// Validated options as discrete argument tokens
    pub fn to_args(&self) -> Result<Vec<String>> {
        self.validate()?;
        let mut args = Vec::with_capacity(self.options.len() * 2);
        for (flag, value) in &self.options {
            args.push(flag.clone());
            if let Some(value) = value {
                args.push(value.clone());
            }
        }
        Ok(args)
    }

    /// Space-joined form, for log lines
    pub fn render(&self) -> String {
        self.options
            .iter()
            .map(|(flag, value)| match value {
                Some(value) => format!("{flag} {value}"),
                None => flag.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for SubmitOptions {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        SubmitOptions { options: iter.into_iter().map(|(flag, value)| (flag.into(), value)).collect() }
    }
}

fn check_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(invalid(token, "empty"));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(invalid(token, "contains whitespace"));
    }
    if let Some(c) = token.chars().find(|c| SHELL_METACHARACTERS.contains(c) || c.is_control()) {
        return Err(invalid(token, &format!("contains {c:?}")));
    }
    Ok(())
}

fn invalid(token: &str, reason: &str) -> SlurmError {
    SlurmError::InvalidOption { token: token.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keeps_order() {
        let options = SubmitOptions::new()
            .arg("--partition", "debug")
            .flag("--exclusive")
            .arg("--time", "01:00:00");
        assert_eq!(options.render(), "--partition debug --exclusive --time 01:00:00");
        assert_eq!(
            options.to_args().unwrap(),
            vec!["--partition", "debug", "--exclusive", "--time", "01:00:00"]
        );
    }

    #[test]
    fn test_empty() {
        let options = SubmitOptions::new();
        assert!(options.is_empty());
        assert_eq!(options.render(), "");
        assert!(options.to_args().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_whitespace() {
        let err = SubmitOptions::new().arg("--job-name", "two words").to_args().unwrap_err();
        assert!(matches!(err, SlurmError::InvalidOption { ref token, .. } if token == "two words"));
    }

    #[test]
    fn test_rejects_metacharacters() {
        for bad in ["a;b", "$(id)", "`id`", "x|y", "a&&b", "out>file"] {
            assert!(SubmitOptions::new().arg("--comment", bad).validate().is_err(), "{bad}");
        }
        assert!(SubmitOptions::new().flag("--exclusive;reboot").validate().is_err());
    }

    #[test]
    fn test_rejects_empty_tokens() {
        assert!(SubmitOptions::new().flag("").validate().is_err());
        assert!(SubmitOptions::new().arg("--mem", "").validate().is_err());
    }

    #[test]
    fn test_allows_common_slurm_values() {
        let options = SubmitOptions::new()
            .arg("--mem", "4G")
            .arg("--gres", "gpu:a100:2")
            .arg("--output", "/scratch/logs/%j.out")
            .arg("--constraint", "intel,avx2")
            .flag("--mail-type=END");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_iter() {
        let options: SubmitOptions = vec![("--nodes", Some("2".to_string())), ("--exclusive", None)]
            .into_iter()
            .collect();
        assert_eq!(options.render(), "--nodes 2 --exclusive");
    }
}
