// File: snapraid-runner/src/process.rs
//
// Subprocess execution with streamed output and cancellation
//
use crate::cancellation::Cancellation;
use crate::constants::shutdown;
use crate::errors::CommandError;
use futures::future::BoxFuture;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command as AsyncCommand};
use tokio::sync::Notify;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Output of a command that exited successfully
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Trait abstracting how external commands are executed.
///
/// Production code uses [`ProcessRunner`]; tests provide scripted
/// implementations that never spawn processes.
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `args`. Passing `None` for `cancel` makes the call
    /// ignore cancellation entirely.
    fn run<'a>(
        &'a self,
        command: &'a str,
        args: &'a [String],
        cancel: Option<&'a Cancellation>,
    ) -> BoxFuture<'a, Result<CommandOutput, CommandError>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        command: &str,
        args: &[String],
        cancel: Option<&Cancellation>,
    ) -> Result<CommandOutput, CommandError> {
        let context = log_context(command, args);

        if let Some(reason) = cancel.and_then(|c| c.reason()) {
            warn!(
                context = %context,
                "Not starting process, cancellation already requested: {}", reason
            );
            return Err(CommandError::Aborted {
                command: context,
                reason,
                code: None,
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        debug!(context = %context, "Executing: {} {}", command, args.join(" "));

        let mut child = AsyncCommand::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(context = %context, "Error while running process: {}", e);
                CommandError::Launch {
                    command: context.clone(),
                    reason: e.to_string(),
                }
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let exited = Notify::new();

        let wait = async {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = wait_for_cancel(cancel) => terminate(&mut child, &context).await,
            };
            exited.notify_one();
            status
        };

        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();
        let output = async {
            let drains = async {
                tokio::join!(
                    drain(stdout, &context, Stream::Stdout, &mut stdout_buf),
                    drain(stderr, &context, Stream::Stderr, &mut stderr_buf),
                )
            };
            tokio::pin!(drains);

            tokio::select! {
                _ = &mut drains => return,
                _ = exited.notified() => {}
            }

            // Background children may keep the pipes open after a cancelled run
            if cancel.is_some_and(|c| c.is_cancelled()) {
                if timeout(shutdown::DRAIN_GRACE, &mut drains).await.is_err() {
                    warn!(context = %context, "Output still open after exit, stopped reading");
                }
            } else {
                drains.await;
            }
        };

        let (status, ()) = tokio::join!(wait, output);

        let status: ExitStatus = status.map_err(|e| {
            error!(context = %context, "Error while waiting for process: {}", e);
            CommandError::Launch {
                command: context.clone(),
                reason: e.to_string(),
            }
        })?;

        debug!(context = %context, "Process exited with {:?}", status.code());
        classify_exit(context, status.code(), stdout_buf, stderr_buf, cancel)
    }
}

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        args: &'a [String],
        cancel: Option<&'a Cancellation>,
    ) -> BoxFuture<'a, Result<CommandOutput, CommandError>> {
        Box::pin(self.execute(command, args, cancel))
    }
}

/// Decide the result of a finished process. Cancellation takes precedence
/// over the exit code, even a successful one.
pub fn classify_exit(
    command: String,
    code: Option<i32>,
    stdout: String,
    stderr: String,
    cancel: Option<&Cancellation>,
) -> Result<CommandOutput, CommandError> {
    if let Some(reason) = cancel.and_then(|c| c.reason()) {
        return Err(CommandError::Aborted {
            command,
            reason,
            code,
            stdout,
            stderr,
        });
    }

    match code {
        Some(0) => Ok(CommandOutput {
            code,
            stdout,
            stderr,
        }),
        _ => Err(CommandError::Failed {
            command,
            code,
            stdout,
            stderr,
        }),
    }
}

/// Logging context for a command, e.g. `snapraid-sync`
pub fn log_context(command: &str, args: &[String]) -> String {
    match args.first() {
        Some(first) => format!("{}-{}", command, first),
        None => command.to_string(),
    }
}

async fn wait_for_cancel(cancel: Option<&Cancellation>) {
    match cancel {
        Some(cancel) => cancel.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Ask the process to stop with SIGTERM so it can save its state, and
/// only kill it once the grace period runs out.
async fn terminate(child: &mut Child, context: &str) -> std::io::Result<ExitStatus> {
    if let Some(pid) = child.id() {
        warn!(context = %context, "Cancellation requested, sending SIGTERM to process {}", pid);
        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => match timeout(shutdown::TERMINATE_GRACE, child.wait()).await {
                Ok(status) => return status,
                Err(_) => warn!(
                    context = %context,
                    "Process did not exit within {}s of SIGTERM, killing",
                    shutdown::TERMINATE_GRACE.as_secs()
                ),
            },
            Err(e) => warn!(context = %context, "Failed to send SIGTERM: {}", e),
        }
    }

    if let Err(e) = child.start_kill() {
        warn!(context = %context, "Failed to kill process: {}", e);
    }
    child.wait().await
}

/// Read `stream` line by line into `collected`. Lines already read are kept
/// if the future is dropped part way.
async fn drain<R>(stream: Option<R>, context: &str, kind: Stream, collected: &mut String)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = String::from_utf8_lossy(&buf);
                let line = chunk.trim_end();
                if !line.is_empty() {
                    match kind {
                        Stream::Stdout => info!(context = %context, "{}", line),
                        Stream::Stderr => error!(context = %context, "{}", line),
                    }
                }
                collected.push_str(&chunk);
            }
            Err(e) => {
                warn!(context = %context, "Stopped reading process output: {}", e);
                break;
            }
        }
    }
}
