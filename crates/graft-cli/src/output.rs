//! Output management and formatting.

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::GlobalArgs;
use crate::config::AppConfig;

/// Manages CLI output based on flags and configuration.
pub struct OutputManager {
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        Self {
            quiet: args.quiet,
            no_color: args.no_color || config.output.no_color,
            term: Term::stdout(),
        }
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.marked("\u{2713}", msg, |s| s.green().bold().to_string(), |s| s.green().to_string())
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.marked("\u{26a0}", msg, |s| s.yellow().bold().to_string(), |s| s.yellow().to_string())
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.marked("\u{2139}", msg, |s| s.blue().bold().to_string(), |s| s.blue().to_string())
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Dimmed secondary text, e.g. a file status.
    pub fn dim(&self, text: &str) -> String {
        if self.no_color {
            text.to_owned()
        } else {
            text.dimmed().to_string()
        }
    }

    /// Pretty JSON on stdout. Written even in quiet mode so pipes keep
    /// working.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    /// Spinner on stderr; hidden when quiet or not on a terminal.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.quiet || !io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_owned());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    // ---- Internal Helpers ----

    fn marked(
        &self,
        mark: &str,
        msg: &str,
        mark_style: impl Fn(&str) -> String,
        msg_style: impl Fn(&str) -> String,
    ) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("{mark} {msg}")
        } else {
            format!("{} {}", mark_style(mark), msg_style(msg))
        };
        self.term.write_line(&line)
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_manager(quiet: bool, no_color: bool) -> OutputManager {
        let args = GlobalArgs {
            quiet,
            no_color,
            ..GlobalArgs::default()
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, true);
        assert!(out.print("hello").is_ok());
        assert!(out.is_quiet());
    }

    #[test]
    fn config_can_disable_color() {
        let mut config = AppConfig::default();
        config.output.no_color = true;
        let out = OutputManager::new(&GlobalArgs::default(), &config);
        assert_eq!(out.dim("created"), "created");
    }

    #[test]
    fn spinner_is_hidden_in_quiet_mode() {
        let out = make_manager(true, true);
        assert!(out.spinner("working").is_hidden());
    }
}
