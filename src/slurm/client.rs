use std::fmt::Display;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::config::{Config, Programs};
use crate::error::{Result, SlurmError};
use crate::exec::command::{CommandRunner, ExecutionResult, Invocation, ProcessRunner};
use crate::exec::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::parse::descriptor::{parse_descriptor, JobRecord, NodeRecord};
use crate::parse::queue::{parse_queue, QueueEntry};
use crate::parse::submission::{parse_job_id, reports_error, JobId};
use crate::slurm::environment::require_program;
use crate::slurm::options::SubmitOptions;

/// scontrol's answer for an unknown job id (it says the same for some node queries)
pub const INVALID_JOB_ID: &str = "Invalid job id specified";
/// scontrol's answer for an unknown node name
pub const INVALID_NODE_NAME: &str = "Invalid node name specified";

const CANCELLED: &str = "CANCELLED";

/// Result of a blocking srun call
///
/// `output` is the job's stdout on success. On failure it is stderr, or stdout when stderr was
/// empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractiveOutcome {
    pub succeeded: bool,
    pub output: String,
}

/// Client for the slurm command line tools
///
/// Every call is one blocking round trip, the client itself keeps no state between calls.
/// Status queries (describe, queue, cancel) are retried while the controller reports a
/// transient disconnect; submissions are never retried.
pub struct Slurm<R = ProcessRunner, S = ThreadSleeper> {
    programs: Programs,
    retry: RetryPolicy,
    runner: R,
    sleeper: S,
}

impl Slurm {
    /// Check that slurm is installed and build a client that spawns real processes
    pub fn new(config: Config) -> Result<Slurm> {
        config.validate()?;
        require_program(&config.programs.probe)?;
        let runner = ProcessRunner::new().with_timeout(config.timeout());
        Ok(Slurm::with_runner(config, runner, ThreadSleeper))
    }
}

impl<R: CommandRunner, S: Sleeper> Slurm<R, S> {
    /// Build a client on top of any runner, without probing the environment
    pub fn with_runner(config: Config, runner: R, sleeper: S) -> Self {
        Slurm { programs: config.programs, retry: config.retry, runner, sleeper }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Submit a batch script and return its job id
    ///
    /// Any stderr output fails the submission. An `error` token in stdout without stderr is
    /// reported as [`JobId::SENTINEL`] instead.
    pub fn submit_batch(&self, script: &Path, options: &SubmitOptions) -> Result<JobId> {
        let invocation = Invocation::new(&self.programs.batch)
            .args(options.to_args()?)
            .arg(script.to_string_lossy());
        info!("Submitting {} with options [{}]", script.display(), options.render());

        let result = self.runner.run(&invocation)?;
        if result.has_stderr() {
            warn!("{} wrote to stderr, submission failed", self.programs.batch);
            return Err(SlurmError::Submission { detail: result.stderr.trim().to_string() });
        }

        let job_id = parse_job_id(&result.stdout)?;
        if job_id.is_sentinel() {
            warn!("Submission output reports an error: {}", result.stdout.trim());
        } else {
            info!("Submitted job {job_id}");
        }
        Ok(job_id)
    }

    /// Run a command through srun and wait for it to finish
    ///
    /// `command` is the program and its arguments as separate tokens, e.g. `["hostname", "-s"]`.
    pub fn submit_interactive<C: AsRef<str>>(
        &self,
        command: &[C],
        options: &SubmitOptions,
    ) -> Result<InteractiveOutcome> {
        if command.is_empty() {
            return Err(SlurmError::InvalidOption { token: String::new(), reason: "empty command".to_string() });
        }
        let command: Vec<&str> = command.iter().map(AsRef::as_ref).collect();
        let invocation = Invocation::new(&self.programs.interactive)
            .args(options.to_args()?)
            .args(command.iter().copied());
        info!("Running {command:?} interactively with options [{}]", options.render());

        let ExecutionResult { stdout, stderr, .. } = self.runner.run(&invocation)?;
        if reports_error(&stdout) {
            warn!("Interactive job reported an error");
            let output = if stderr.trim().is_empty() { stdout } else { stderr };
            return Ok(InteractiveOutcome { succeeded: false, output });
        }
        Ok(InteractiveOutcome { succeeded: true, output: stdout })
    }

    pub fn describe_job(&self, job_id: impl Display) -> Result<JobRecord> {
        let id = job_id.to_string();
        let result = self.control(&["show", "job", &id])?;
        if result.stderr_contains(INVALID_JOB_ID) {
            return Err(SlurmError::JobNotFound { id, detail: result.stderr.trim().to_string() });
        }
        Ok(parse_descriptor(&result.stdout))
    }

    pub fn describe_node(&self, node_id: impl Display) -> Result<NodeRecord> {
        let id = node_id.to_string();
        let result = self.control(&["show", "node", &id])?;
        if result.stderr_contains(INVALID_JOB_ID) || result.stderr_contains(INVALID_NODE_NAME) {
            return Err(SlurmError::NodeNotFound { id, detail: result.stderr.trim().to_string() });
        }
        Ok(parse_descriptor(&result.stdout))
    }

    pub fn list_queue(&self) -> Result<Vec<QueueEntry>> {
        let invocation = Invocation::new(&self.programs.queue);
        let result = self.retry.run(&self.runner, &self.sleeper, &invocation)?;
        let entries = parse_queue(&result.stdout)?;
        info!("{} jobs in the queue", entries.len());
        Ok(entries)
    }

    /// Cancel a job, then ask the controller whether it really is cancelled
    ///
    /// scancel returns before the job state changes, so its own exit status is not trusted.
    pub fn cancel_job(&self, job_id: impl Display) -> Result<bool> {
        let id = job_id.to_string();
        let invocation = Invocation::new(&self.programs.cancel).arg(&id);
        info!("Cancelling job {id}");
        self.retry.run(&self.runner, &self.sleeper, &invocation)?;

        let job = self.describe_job(&id)?;
        let state = job
            .job_state()
            .ok_or_else(|| SlurmError::malformed(format!("job {id} has no JobState field"), format!("{job:?}")))?;
        info!("Job {id} is {state} after cancel");
        Ok(state == CANCELLED)
    }

    fn control(&self, args: &[&str]) -> Result<ExecutionResult> {
        let invocation = Invocation::new(&self.programs.control).args(args.iter().copied());
        self.retry.run(&self.runner, &self.sleeper, &invocation)
    }
}
