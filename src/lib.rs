//! A client for the slurm workload manager that drives its command line tools
//!
//! Commands are spawned without a shell, status queries ride out transient controller
//! disconnects, and the text the tools print is parsed into plain records.

pub mod config;
pub mod error;
/// Spawn control plane processes and retry transient failures
pub mod exec;
/// Parsers for scontrol, squeue and sbatch output
pub mod parse;
/// Submit, describe, list and cancel jobs
pub mod slurm;

pub use config::{Config, Programs};
pub use error::{Result, SlurmError};
pub use exec::command::{CommandRunner, ExecutionResult, Invocation, ProcessRunner};
pub use exec::retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use parse::descriptor::{Descriptor, JobRecord, NodeRecord};
pub use parse::queue::QueueEntry;
pub use parse::submission::JobId;
pub use slurm::client::{InteractiveOutcome, Slurm};
pub use slurm::options::SubmitOptions;
