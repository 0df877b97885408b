use serde::Serialize;

use crate::error::{Result, SlurmError};

/// Number of columns in the default `squeue` layout
pub const QUEUE_COLUMNS: usize = 8;

/// One row of `squeue` output
///
/// Fields are taken by position, not by header text. The job id stays a string because array
/// jobs are listed as `1234_[1-10]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    #[serde(rename = "JOBID")]
    pub job_id: String,
    #[serde(rename = "PARTITION")]
    pub partition: String,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "USER")]
    pub user: String,
    #[serde(rename = "ST")]
    pub state: String,
    #[serde(rename = "TIME")]
    pub time: String,
    #[serde(rename = "NODES")]
    pub nodes: String,
    #[serde(rename = "NODELIST(REASON)")]
    pub nodelist_reason: String,
}

/// Parse a queue listing, skipping its header line
///
/// Rows end at the first blank line. A reason containing spaces spills into extra tokens, those
/// are folded back into the last column.
pub fn parse_queue(text: &str) -> Result<Vec<QueueEntry>> {
    text.lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Result<QueueEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < QUEUE_COLUMNS {
        return Err(SlurmError::malformed(
            format!("queue row has {} fields, expected {QUEUE_COLUMNS}", fields.len()),
            line,
        ));
    }

    let (columns, reason) = fields.split_at(QUEUE_COLUMNS - 1);
    Ok(QueueEntry {
        job_id: columns[0].to_string(),
        partition: columns[1].to_string(),
        name: columns[2].to_string(),
        user: columns[3].to_string(),
        state: columns[4].to_string(),
        time: columns[5].to_string(),
        nodes: columns[6].to_string(),
        nodelist_reason: reason.join(" "),
    })
}
