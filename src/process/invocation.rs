use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// One external command, fully described up front.
///
/// `env` holds only the variables this step adds on top of the ambient
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name or path
    pub program: String,
    /// Arguments, not including the program
    pub args: Vec<String>,
    /// Injected environment variables
    pub env: BTreeMap<String, String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Attach the terminal (stdin inherited) instead of streaming output
    pub interactive: bool,
    /// Discard stdout and stderr
    pub quiet: bool,
    /// Kill the process if it runs longer than this
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Start describing a command
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            interactive: false,
            quiet: false,
            timeout: None,
        }
    }

    /// Build an invocation from an argv-style list; `None` when empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Inject an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Attach the terminal
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Discard output
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Bound the run time
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Command line for messages. Injected variable values are never shown.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.join(" ")
    }
}

/// How a finished process exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_hides_env_values() {
        let inv = Invocation::new("docker")
            .args(["run", "-e", "CONNECT_API_KEY"])
            .env("CONNECT_API_KEY", "secret");
        assert_eq!(inv.display(), "docker run -e CONNECT_API_KEY");
        assert!(!inv.display().contains("secret"));
    }

    #[test]
    fn test_from_argv() {
        let argv = vec!["make".to_string(), "-C".to_string(), "mock_connect".to_string()];
        let inv = Invocation::from_argv(&argv).unwrap();
        assert_eq!(inv.program, "make");
        assert_eq!(inv.args, vec!["-C", "mock_connect"]);
        assert!(Invocation::from_argv(&[]).is_none());
    }
}
