use std::fmt;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::error::{Result, SlurmError};

/// A program and its arguments
///
/// Arguments stay discrete tokens all the way to the OS, they are never joined into a command
/// line that a shell could reinterpret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg:?}")?;
        }
        Ok(())
    }
}

/// Captured output of a finished process
///
/// `status` is `None` if the process was killed by a signal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<i32>,
}

impl ExecutionResult {
    pub fn stderr_contains(&self, needle: &str) -> bool {
        self.stderr.contains(needle)
    }

    /// True when stderr holds anything other than whitespace
    pub fn has_stderr(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}

/// Something that can execute an [`Invocation`]
///
/// A non-empty stderr is not a failure at this level, callers decide what it means.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExecutionResult>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ExecutionResult> {
        (**self).run(invocation)
    }
}

/// Runs invocations as child processes of this one
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner { timeout: None }
    }

    /// Kill the child and fail with [`SlurmError::Timeout`] if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn timed_out(&self, invocation: &Invocation, after: Duration) -> SlurmError {
        SlurmError::Timeout { program: invocation.program.clone(), after }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExecutionResult> {
        let spawn_error = |source| SlurmError::Spawn { program: invocation.program.clone(), source };

        info!("Running {invocation}");
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // drain both pipes while waiting, a chatty child would otherwise block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = self.timeout.map(|limit| (limit, Instant::now() + limit));
        let status = match deadline {
            Some((limit, _)) => match child.wait_timeout(limit) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    warn!("{} exceeded {:?}, killing it", invocation.program, limit);
                    kill(&mut child);
                    return Err(self.timed_out(invocation, limit));
                }
                Err(err) => {
                    kill(&mut child);
                    return Err(spawn_error(err));
                }
            },
            None => child.wait().map_err(spawn_error)?,
        };

        // a background grandchild can hold the pipes open long after the child exits
        let deadline = deadline.map(|(_, at)| at);
        let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline)) else {
            warn!("{} exited but its output is still held open, giving up", invocation.program);
            return Err(self.timed_out(invocation, self.timeout.unwrap_or_default()));
        };

        let result = ExecutionResult { stdout, stderr, status: status.code() };
        debug!(
            "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
            invocation.program,
            result.status,
            result.stdout.len(),
            result.stderr.len()
        );
        Ok(result)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(err) = pipe.read_to_end(&mut buf) {
                warn!("Can't read child output: {err}");
            }
            // the receiver is gone if the caller already gave up
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Output of one pipe, or `None` if it was still open at `deadline`
fn collect(reader: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Option<String> {
    let bytes = match (reader, deadline) {
        (None, _) => Vec::new(),
        (Some(rx), None) => rx.recv().unwrap_or_default(),
        (Some(rx), Some(deadline)) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(bytes) => bytes,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Vec::new(),
        },
    };
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn kill(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!("Can't kill child process: {err}");
    }
    // reap, the exit status of a killed child is meaningless
    let _ = child.wait();
}
