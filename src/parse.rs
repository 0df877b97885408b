//! Turn control plane text into structured records
//!
//! Each parser is a pure function of the captured output; none of them touch processes.

/// `key=value` descriptors printed by `scontrol show job|node`
pub mod descriptor;
/// Column listings printed by `squeue`
pub mod queue;
/// Job ids in `sbatch` output
pub mod submission;
