use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use slurmctl::{Descriptor, QueueEntry};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub fn json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One `key=value` line per field, sorted by key
pub fn descriptor(record: &Descriptor) -> String {
    record
        .sorted()
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Aligned table in squeue's own column order
pub fn queue(entries: &[QueueEntry]) -> String {
    let header = ["JOBID", "PARTITION", "NAME", "USER", "ST", "TIME", "NODES", "NODELIST(REASON)"];
    let rows: Vec<[&str; 8]> = entries
        .iter()
        .map(|e| {
            [
                e.job_id.as_str(),
                e.partition.as_str(),
                e.name.as_str(),
                e.user.as_str(),
                e.state.as_str(),
                e.time.as_str(),
                e.nodes.as_str(),
                e.nodelist_reason.as_str(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    std::iter::once(header)
        .chain(rows)
        .map(|row| {
            row.iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
