//! Output helpers for consistent CLI output.
//!
//! Two layers live here:
//! - plain ANSI wrappers ([`term_bold`], [`term_green`], [`term_red`]) that
//!   return decorated strings
//! - [`Output`], the status-line printer used by the orchestrator
//!
//! # Example
//!
//! ```rust,ignore
//! use tmplpkg::output::Output;
//!
//! Output::announce("Updating source repositories", true);
//! Output::warning("GOV.UK Elements overwrites 2 asset(s)");
//! Output::list_item("images/favicon.ico");
//! ```

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Bold version of `message`.
pub fn term_bold(message: &str) -> String {
    message.bold().to_string()
}

/// Green version of `message`.
pub fn term_green(message: &str) -> String {
    message.green().to_string()
}

/// Red version of `message`.
pub fn term_red(message: &str) -> String {
    message.red().to_string()
}

/// Whether stdout is attached to a terminal.
pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Standard output helper for consistent CLI formatting.
pub struct Output;

impl Output {
    /// Print a step announcement, bold when `bold` is set and stdout is a tty.
    pub fn announce(msg: impl AsRef<str>, bold: bool) {
        if bold && stdout_is_terminal() {
            println!("{}", term_bold(msg.as_ref()));
        } else {
            println!("{}", msg.as_ref());
        }
    }

    /// Print a success message with a green checkmark.
    ///
    /// Example: `✓ Done`
    pub fn success(msg: impl AsRef<str>) {
        println!("{} {}", term_green("✓"), msg.as_ref());
    }

    /// Print an error message with a red X to stderr.
    ///
    /// Example: `✗ sass is not on the path`
    pub fn error(msg: impl AsRef<str>) {
        eprintln!("{} {}", term_red("✗"), term_red(msg.as_ref()));
    }

    /// Print a bold warning line.
    pub fn warning(msg: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow(), msg.as_ref().bold());
    }

    /// Print an info/status message with a cyan arrow.
    pub fn info(msg: impl AsRef<str>) {
        println!("{} {}", "→".cyan(), msg.as_ref().dimmed());
    }

    /// Print an item in a list (indented).
    ///
    /// Example: `  stylesheets/govuk-template.css`
    pub fn list_item(msg: impl AsRef<str>) {
        println!("  {}", msg.as_ref());
    }

    /// Print the running command (for transparency).
    ///
    /// Example: `Running: bundle exec rake build:django`
    pub fn running(cmd: impl AsRef<str>) {
        println!("{} {}", "Running:".dimmed(), cmd.as_ref().dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_wrappers_use_ansi_codes() {
        assert!(term_bold("Done").starts_with("\x1b[1mDone\x1b["));
        assert!(term_green("ok").starts_with("\x1b[32mok\x1b["));
        assert!(term_red("no").starts_with("\x1b[31mno\x1b["));
    }

    #[test]
    fn test_output_methods_dont_panic() {
        Output::announce("test", true);
        Output::announce("test", false);
        Output::success("test");
        Output::error("test");
        Output::warning("test");
        Output::info("test");
        Output::list_item("test");
        Output::running("test");
    }
}
