//! CLI-level errors (wrap script and config errors)

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::SettingsError;
use crate::script::ScriptError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the appropriate exit code for this error.
    ///
    /// Tree failures exit with their error bits, everything else with a
    /// sysexits code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Settings(_) => crate::exitcode::CONFIG,
            CliError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                crate::exitcode::NOINPUT
            }
            CliError::Io { .. } => crate::exitcode::IOERR,
            CliError::Script(e) => match e {
                ScriptError::Tree { source, .. } => crate::exitcode::tree_failure(*source),
                ScriptError::Output(_) => crate::exitcode::IOERR,
                ScriptError::Parse { .. }
                | ScriptError::UnknownPath { .. }
                | ScriptError::SizeMismatch { .. } => crate::exitcode::DATAERR,
            },
        }
    }
}
