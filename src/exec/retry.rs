use std::thread;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlurmError};
use crate::exec::command::{CommandRunner, ExecutionResult, Invocation};

/// stderr signature of a slurmctld connectivity blip
pub const TRANSPORT_NOT_CONNECTED: &str = "Transport endpoint is not connected";

/// Blocks the calling thread between attempts
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

/// Retry an invocation while its stderr carries a transient marker
///
/// Attempt `n` that fails transiently is followed by a sleep of `n * backoff_unit`, so the
/// backoff grows linearly with no jitter. Anything else the control plane says is returned to
/// the caller untouched on the first attempt.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit_ms: u64,
    pub marker: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 10,
            backoff_unit_ms: 1000,
            marker: TRANSPORT_NOT_CONNECTED.to_string(),
        }
    }
}

impl RetryPolicy {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    /// Sleep that follows the `attempt`th transient failure (1-based), saturating
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit().checked_mul(attempt).unwrap_or(Duration::MAX)
    }

    /// Reject policies that would retry everything or never run at all
    pub fn validate(&self) -> Result<()> {
        if self.marker.trim().is_empty() {
            return Err(SlurmError::InvalidConfig { reason: "retry marker is empty".to_string() });
        }
        if self.max_attempts == 0 {
            return Err(SlurmError::InvalidConfig { reason: "retry max_attempts is 0".to_string() });
        }
        Ok(())
    }

    /// An empty marker never matches, it would otherwise match every result
    pub fn is_transient(&self, result: &ExecutionResult) -> bool {
        !self.marker.is_empty() && result.stderr_contains(&self.marker)
    }

    pub fn run<R, S>(&self, runner: &R, sleeper: &S, invocation: &Invocation) -> Result<ExecutionResult>
    where
        R: CommandRunner + ?Sized,
        S: Sleeper + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let result = runner.run(invocation)?;
            if !self.is_transient(&result) {
                return Ok(result);
            }

            attempt += 1;
            if attempt >= self.max_attempts {
                warn!("{} still disconnected after {attempt} attempts, giving up", invocation.program);
                return Err(SlurmError::TransientInfrastructure {
                    program: invocation.program.clone(),
                    attempts: attempt,
                    detail: result.stderr.trim().to_string(),
                });
            }

            let pause = self.backoff(attempt);
            warn!("{} reported {:?}, retrying in {:?} (attempt {attempt})", invocation.program, self.marker, pause);
            sleeper.sleep(pause);
        }
    }
}
