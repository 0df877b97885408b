//! Run control plane binaries and ride out transient failures

/// Spawn external programs without a shell and capture their output
pub mod command;

/// Bounded retries keyed on the transient disconnect signature
pub mod retry;
