use std::io;
use std::time::Duration;

use thiserror::Error;

/// Every way a call against the control plane can fail
///
/// Variants carry the raw text that caused them where there is any, so callers never have to
/// guess what the control plane actually said.
#[derive(Error, Debug)]
pub enum SlurmError {
    #[error("Unable to find {program} on the search path, is slurm installed on this system?")]
    EnvironmentUnavailable { program: String, search_path: String },

    #[error("{program} still reports a transient failure after {attempts} attempts: {detail}")]
    TransientInfrastructure { program: String, attempts: u32, detail: String },

    #[error("Job not found: {id}: {detail}")]
    JobNotFound { id: String, detail: String },

    #[error("Node not found: {id}: {detail}")]
    NodeNotFound { id: String, detail: String },

    #[error("Submission failed: {detail}")]
    Submission { detail: String },

    #[error("Malformed output ({reason}): {raw:?}")]
    MalformedOutput { reason: String, raw: String },

    #[error("{program} did not finish within {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("Can't run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid submission option {token:?}: {reason}")]
    InvalidOption { token: String, reason: String },
}

impl SlurmError {
    pub(crate) fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        SlurmError::MalformedOutput { reason: reason.into(), raw: raw.into() }
    }
}

pub type Result<T> = std::result::Result<T, SlurmError>;
