use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, SlurmError};

/// In-band failure token in submission output
pub const ERROR_TOKEN: &str = "error";

/// Identifier the control plane assigned to a submitted job
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Returned when the submission output reported an error but stderr stayed empty
    pub const SENTINEL: JobId = JobId(0);

    pub fn is_sentinel(&self) -> bool {
        *self == JobId::SENTINEL
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(JobId)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

/// True if any whitespace-delimited token is exactly [`ERROR_TOKEN`]
pub fn reports_error(output: &str) -> bool {
    output.split_whitespace().any(|token| token == ERROR_TOKEN)
}

/// Pull the job id out of `sbatch` output such as `Submitted batch job 42`
///
/// An `error` token anywhere yields [`JobId::SENTINEL`]. Otherwise the last token must be the
/// id; anything else is malformed output.
pub fn parse_job_id(output: &str) -> Result<JobId> {
    if reports_error(output) {
        return Ok(JobId::SENTINEL);
    }
    let last = output
        .split_whitespace()
        .last()
        .ok_or_else(|| SlurmError::malformed("submission output is empty", output))?;
    last.parse()
        .map_err(|err| SlurmError::malformed(format!("trailing token {last:?} is not a job id: {err}"), output))
}
