use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::exec::retry::RetryPolicy;

/// Names (or paths) of the control plane binaries
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Programs {
    pub batch: String,
    pub interactive: String,
    pub control: String,
    pub queue: String,
    pub cancel: String,
    /// Looked up on PATH to decide whether slurm is installed at all
    pub probe: String,
}

impl Default for Programs {
    fn default() -> Self {
        Programs {
            batch: "sbatch".to_string(),
            interactive: "srun".to_string(),
            control: "scontrol".to_string(),
            queue: "squeue".to_string(),
            cancel: "scancel".to_string(),
            probe: "sinfo".to_string(),
        }
    }
}

/// Client configuration, every field is optional in the JSON form
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub programs: Programs,
    pub retry: RetryPolicy,
    /// Kill control plane processes that run longer than this
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config> {
        info!("Reading configuration from {}", path.display());
        let json = fs::read_to_string(path).with_context(|| format!("Can't read config at {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&json).with_context(|| format!("Invalid config in {}", path.display()))?;
        config.validate().with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.retry.validate()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
