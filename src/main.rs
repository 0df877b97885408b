use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use slurmctl::{Config, Slurm, SubmitOptions};

use crate::format::OutputFormat;

/// Output rendering for the command line
mod format;

#[derive(Parser, Debug)]
#[command(name = "slurmctl")]
#[command(author = "slurmctl developers")]
#[command(version = "0.1.0")]
#[command(about = "Submit, inspect and cancel slurm jobs")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "SLURMCTL_CONFIG")]
    config: Option<PathBuf>,
    /// Kill control plane commands that run longer than this many seconds
    #[arg(long, env = "SLURMCTL_TIMEOUT")]
    timeout: Option<u64>,
    /// Give up on transient controller disconnects after this many attempts
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a batch script with sbatch
    Batch {
        script: PathBuf,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Run a command with srun and wait for it
    Run {
        #[command(flatten)]
        options: OptionArgs,
        /// Program and arguments, after any -o options
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Show a job
    Job { id: String },
    /// Show a node
    Node { id: String },
    /// List the queue
    Queue,
    /// Cancel a job and check that it is cancelled
    Cancel { id: String },
}

#[derive(Args, Debug)]
struct OptionArgs {
    /// Pass-through option, FLAG or FLAG=VALUE (e.g. -o --partition=debug -o --exclusive)
    #[arg(short = 'o', long = "option", allow_hyphen_values = true)]
    options: Vec<String>,
}

impl OptionArgs {
    fn submit_options(&self) -> SubmitOptions {
        self.options
            .iter()
            .map(|option| match option.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (option.clone(), None),
            })
            .collect()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let config = load_config(&args)?;
    let slurm = Slurm::new(config).context("Can't set up the slurm client")?;
    let format = args.format;

    let output = match args.command {
        Command::Batch { script, options } => {
            let job_id = slurm.submit_batch(&script, &options.submit_options())?;
            if job_id.is_sentinel() {
                bail!("sbatch reported an error for {}", script.display());
            }
            match format {
                OutputFormat::Json => format::json(&job_id)?,
                OutputFormat::Text => job_id.to_string(),
            }
        }
        Command::Run { command, options } => {
            let outcome = slurm.submit_interactive(&command, &options.submit_options())?;
            if format == OutputFormat::Json {
                format::json(&outcome)?
            } else if outcome.succeeded {
                outcome.output
            } else {
                bail!("srun reported an error: {}", outcome.output.trim());
            }
        }
        Command::Job { id } => {
            let job = slurm.describe_job(&id)?;
            match format {
                OutputFormat::Json => format::json(&job)?,
                OutputFormat::Text => format::descriptor(&job),
            }
        }
        Command::Node { id } => {
            let node = slurm.describe_node(&id)?;
            match format {
                OutputFormat::Json => format::json(&node)?,
                OutputFormat::Text => format::descriptor(&node),
            }
        }
        Command::Queue => {
            let entries = slurm.list_queue()?;
            match format {
                OutputFormat::Json => format::json(&entries)?,
                OutputFormat::Text => format::queue(&entries),
            }
        }
        Command::Cancel { id } => {
            let cancelled = slurm.cancel_job(&id)?;
            if !cancelled && format == OutputFormat::Text {
                bail!("Job {id} is not cancelled");
            }
            match format {
                OutputFormat::Json => format::json(&cancelled)?,
                OutputFormat::Text => format!("Job {id} cancelled"),
            }
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}

/// Defaults, then the config file, then command line flags
fn load_config(args: &Cli) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    info!("Using {config:?}");
    Ok(config)
}
