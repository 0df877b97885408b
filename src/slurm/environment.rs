use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Result, SlurmError};

/// Find `program` the way a shell would
///
/// A program containing a path separator is checked as is, anything else is looked up in each
/// directory of `search_path`.
pub fn find_program(program: &str, search_path: Option<OsString>) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }
    let search_path = search_path?;
    env::split_paths(&search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

/// Fail with [`SlurmError::EnvironmentUnavailable`] unless `program` is on PATH
pub fn require_program(program: &str) -> Result<PathBuf> {
    let search_path = env::var_os("PATH");
    match find_program(program, search_path.clone()) {
        Some(path) => {
            info!("Found {} at {}", program, path.display());
            Ok(path)
        }
        None => Err(SlurmError::EnvironmentUnavailable {
            program: program.to_string(),
            search_path: search_path.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default(),
        }),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[cfg(unix)]
    fn touch(dir: &Path, name: &str, mode: u32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_finds_executable_on_search_path() {
        let empty = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        let sinfo = touch(bin.path(), "sinfo", 0o755);

        let search_path = env::join_paths([empty.path(), bin.path()]).unwrap();
        assert_eq!(find_program("sinfo", Some(search_path)), Some(sinfo));
    }

    #[cfg(unix)]
    #[test]
    fn test_ignores_non_executable() {
        let bin = tempfile::tempdir().unwrap();
        touch(bin.path(), "sinfo", 0o644);
        let search_path = env::join_paths([bin.path()]).unwrap();
        assert_eq!(find_program("sinfo", Some(search_path)), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_program() {
        let bin = tempfile::tempdir().unwrap();
        let sinfo = touch(bin.path(), "sinfo", 0o755);
        let program = sinfo.to_str().unwrap();
        assert_eq!(find_program(program, None), Some(sinfo.clone()));
    }

    #[test]
    fn test_missing_program() {
        let err = require_program("definitely-not-sinfo-9a8b7c").unwrap_err();
        assert!(matches!(err, SlurmError::EnvironmentUnavailable { ref program, .. } if program == "definitely-not-sinfo-9a8b7c"));
    }
}
