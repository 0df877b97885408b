//! Submit, inspect, list and cancel slurm jobs

/// Probe the search path for control plane binaries
pub mod environment;

/// Ordered flag/value pairs passed through to sbatch and srun
pub mod options;

/// The job control facade
pub mod client;
