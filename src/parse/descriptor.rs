use std::collections::HashMap;

use log::debug;
use serde::Serialize;

/// Fields reported for a single job or node
///
/// Keys are whatever the control plane printed, nothing is predeclared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Descriptor {
    fields: HashMap<String, String>,
}

pub type JobRecord = Descriptor;
pub type NodeRecord = Descriptor;

impl Descriptor {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn job_state(&self) -> Option<&str> {
        self.get("JobState")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields sorted by key
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut fields: Vec<(&str, &str)> = self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        fields.sort_unstable();
        fields
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.fields
    }
}

/// Parse descriptor text into a [`Descriptor`]
///
/// Tokens are split at their first `=`, so values may contain further `=` signs. Tokens without
/// a key are skipped and later duplicates overwrite earlier ones.
pub fn parse_descriptor(text: &str) -> Descriptor {
    let mut fields = HashMap::new();
    for token in text.lines().flat_map(str::split_whitespace) {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                fields.insert(key.to_string(), value.to_string());
            }
            _ => debug!("Skipping descriptor token without a key: {token:?}"),
        }
    }
    Descriptor { fields }
}
