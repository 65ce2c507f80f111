//! Scripted command runner
//!
//! Records every invocation and answers from a script instead of spawning
//! processes. Exit classification goes through the real `classify_exit`, so
//! cancellation behaves exactly as it does with `ProcessRunner`.

use futures::future::BoxFuture;
use snapraid_runner::process::{classify_exit, log_context};
use snapraid_runner::{Cancellation, CommandError, CommandOutput, CommandRunner};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
    /// Whether the caller handed the cancellation token to the runner
    pub cancellable: bool,
}

impl Invocation {
    /// `args` joined with spaces, e.g. `stop radarr` or `scrub -p 5`
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

#[derive(Clone)]
struct ScriptedFailure {
    code: i32,
    stderr: String,
}

struct CancelTrigger {
    after_calls: usize,
    cancellation: Cancellation,
    reason: String,
}

#[derive(Default)]
pub struct FakeCommandRunner {
    calls: Mutex<Vec<Invocation>>,
    failures: Mutex<HashMap<String, ScriptedFailure>>,
    trigger: Mutex<Option<CancelTrigger>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make invocations whose joined args equal `line` exit with `code`
    pub fn fail_on(self, line: &str, code: i32, stderr: &str) -> Self {
        self.failures.lock().unwrap().insert(
            line.to_string(),
            ScriptedFailure {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Trigger `cancellation` right after the `n`-th invocation completes
    pub fn cancel_after(self, n: usize, cancellation: &Cancellation, reason: &str) -> Self {
        *self.trigger.lock().unwrap() = Some(CancelTrigger {
            after_calls: n,
            cancellation: cancellation.clone(),
            reason: reason.to_string(),
        });
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations whose first argument is `verb` (`stop`, `start`, `sync`, ...)
    pub fn calls_for(&self, verb: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.args.first().map(String::as_str) == Some(verb))
            .collect()
    }

    fn respond(
        &self,
        command: &str,
        args: &[String],
        cancel: Option<&Cancellation>,
    ) -> Result<CommandOutput, CommandError> {
        let context = log_context(command, args);

        if let Some(reason) = cancel.and_then(|c| c.reason()) {
            return Err(CommandError::Aborted {
                command: context,
                reason,
                code: None,
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Invocation {
                command: command.to_string(),
                args: args.to_vec(),
                cancellable: cancel.is_some(),
            });
            calls.len()
        };

        if let Some(trigger) = self.trigger.lock().unwrap().as_ref() {
            if trigger.after_calls == call_number {
                trigger.cancellation.cancel(trigger.reason.clone());
            }
        }

        let line = args.join(" ");
        let stdout = format!("{} output\n", line);
        match self.failures.lock().unwrap().get(&line).cloned() {
            Some(failure) => {
                classify_exit(context, Some(failure.code), stdout, failure.stderr, cancel)
            }
            None => classify_exit(context, Some(0), stdout, String::new(), cancel),
        }
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        args: &'a [String],
        cancel: Option<&'a Cancellation>,
    ) -> BoxFuture<'a, Result<CommandOutput, CommandError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.respond(command, args, cancel)
        })
    }
}
