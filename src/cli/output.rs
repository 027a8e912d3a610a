//! Colored terminal output for orchestration steps
//!
//! Progress and status lines go to stdout, errors to stderr. Quiet mode
//! silences everything except errors.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Marker printed before a line and the colors used to print it
struct Style {
    marker: &'static str,
    marker_color: Color,
    text_color: Option<Color>,
    bold: bool,
}

const SUCCESS: Style = Style {
    marker: "✓",
    marker_color: Color::Green,
    text_color: None,
    bold: true,
};

const WARN: Style = Style {
    marker: "⚠",
    marker_color: Color::Yellow,
    text_color: Some(Color::Yellow),
    bold: true,
};

const ERROR: Style = Style {
    marker: "✗",
    marker_color: Color::Red,
    text_color: Some(Color::Red),
    bold: true,
};

const VERBOSE: Style = Style {
    marker: "→",
    marker_color: Color::Blue,
    text_color: Some(Color::White),
    bold: false,
};

const PROGRESS: Style = Style {
    marker: "⋯",
    marker_color: Color::Magenta,
    text_color: None,
    bold: false,
};

/// Output manager for consistent colored terminal output
#[derive(Debug, Clone)]
pub struct OutputManager {
    choice: ColorChoice,
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            choice: ColorChoice::Auto,
            verbose,
            quiet,
        }
    }

    fn styled(&self, writer: &BufferWriter, style: &Style, message: &str) -> std::io::Result<()> {
        let mut buffer = writer.buffer();
        buffer.set_color(
            ColorSpec::new()
                .set_fg(Some(style.marker_color))
                .set_bold(style.bold),
        )?;
        write!(&mut buffer, "{}", style.marker)?;
        buffer.reset()?;
        if let Some(color) = style.text_color {
            buffer.set_color(ColorSpec::new().set_fg(Some(color)))?;
        }
        writeln!(&mut buffer, " {}", message)?;
        buffer.reset()?;
        writer.print(&buffer)
    }

    fn stdout_line(&self, style: &Style, message: &str) {
        if self.quiet {
            return;
        }
        // Terminal write failures are not actionable
        let _ = self.styled(&BufferWriter::stdout(self.choice), style, message);
    }

    fn plain(&self, text: &str, blank_first: bool, header: bool) -> std::io::Result<()> {
        let writer = BufferWriter::stdout(self.choice);
        let mut buffer = writer.buffer();
        if blank_first {
            writeln!(&mut buffer)?;
        }
        if header {
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        }
        writeln!(&mut buffer, "{}", text)?;
        buffer.reset()?;
        writer.print(&buffer)
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.stdout_line(&SUCCESS, message)
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        self.stdout_line(&WARN, message)
    }

    /// Print a progress message
    pub fn progress(&self, message: &str) {
        self.stdout_line(&PROGRESS, message)
    }

    /// Print a verbose message (only in verbose mode)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            self.stdout_line(&VERBOSE, message);
        }
    }

    /// Print an error message to stderr, even in quiet mode
    pub fn error(&self, message: &str) {
        if self
            .styled(&BufferWriter::stderr(self.choice), &ERROR, message)
            .is_err()
        {
            eprintln!("✗ {}", message);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if !self.quiet {
            let _ = self.plain(&format!("═══ {} ═══", title), true, true);
        }
    }

    /// Print indented text (child process output, sub-items)
    pub fn indent(&self, message: &str) {
        self.println(&format!("    {}", message));
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) {
        if !self.quiet {
            let _ = self.plain(message, false, false);
        }
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
