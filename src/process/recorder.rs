//! Recording runner for unit tests.

use super::{CommandRunner, ExitOutcome, Invocation};
use crate::error::{ProcessError, Result};
use std::sync::Mutex;

type Effect = Box<dyn Fn(&Invocation) + Send + Sync>;

/// Records every invocation instead of running it.
///
/// Behaviour is keyed on substrings of [`Invocation::display`]: the first
/// matching rule decides the exit code, captured stdout, or side effect.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    failures: Vec<(String, i32)>,
    timeouts: Vec<String>,
    outputs: Vec<(String, String)>,
    effects: Vec<(String, Effect)>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` when the command line contains `needle`
    pub(crate) fn fail_when(mut self, needle: &str, code: i32) -> Self {
        self.failures.push((needle.to_string(), code));
        self
    }

    /// Report a timeout from `run` when the command line contains `needle`
    pub(crate) fn time_out_when(mut self, needle: &str) -> Self {
        self.timeouts.push(needle.to_string());
        self
    }

    /// Return `stdout` from `capture` when the command line contains `needle`
    pub(crate) fn output_for(mut self, needle: &str, stdout: &str) -> Self {
        self.outputs.push((needle.to_string(), stdout.to_string()));
        self
    }

    /// Run `effect` when the command line contains `needle`
    pub(crate) fn effect_for<F>(mut self, needle: &str, effect: F) -> Self
    where
        F: Fn(&Invocation) + Send + Sync + 'static,
    {
        self.effects.push((needle.to_string(), Box::new(effect)));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::display).collect()
    }

    /// First recorded invocation whose command line contains `needle`
    pub(crate) fn find(&self, needle: &str) -> Option<Invocation> {
        self.calls()
            .into_iter()
            .find(|inv| inv.display().contains(needle))
    }

    fn record(&self, invocation: &Invocation) -> ExitOutcome {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }
        let line = invocation.display();
        for (needle, effect) in &self.effects {
            if line.contains(needle.as_str()) {
                effect(invocation);
            }
        }
        let code = self
            .failures
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        ExitOutcome { code: Some(code) }
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ExitOutcome> {
        let outcome = self.record(invocation);
        let line = invocation.display();
        if self.timeouts.iter().any(|needle| line.contains(needle.as_str())) {
            return Err(ProcessError::TimedOut {
                command: line,
                seconds: invocation.timeout.map(|t| t.as_secs()).unwrap_or(0),
            }
            .into());
        }
        Ok(outcome)
    }

    fn run_blocking(&self, invocation: &Invocation) -> bool {
        self.record(invocation).success()
    }

    async fn capture(&self, invocation: &Invocation) -> Result<String> {
        let outcome = self.record(invocation);
        if !outcome.success() {
            return Err(ProcessError::Failed {
                command: invocation.display(),
                code: outcome.code,
            }
            .into());
        }
        let line = invocation.display();
        Ok(self
            .outputs
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default())
    }
}
