//! Error types for tmplpkg.

use thiserror::Error;

/// Failures the builder reports to the user.
///
/// Everything here is fatal: `main` prints the message and exits non-zero.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{name} is not on the path")]
    ToolMissing { name: String },

    #[error("{name} on the path must be at least version {minimum} (found {found})")]
    ToolTooOld {
        name: String,
        minimum: String,
        found: String,
    },

    #[error("{0}")]
    ArtifactNotFound(String),

    #[error("Command `{command}` failed with exit status {status}")]
    CommandFailed { command: String, status: String },

    #[error("Run the build command first before trying to publish")]
    NotBuilt,

    #[error("Unknown command '{name}'. Available: {}", available.join(", "))]
    UnknownCommand {
        name: String,
        available: Vec<String>,
    },

    #[error("Command '{0}' is registered more than once")]
    DuplicateCommand(String),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: String, message: String },
}
