//! Error types for the robclass CLI

use robclass::error::{ErrorKind, RobError};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Input file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Output directory path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Failure inside the experiment pipeline
    #[error(transparent)]
    Robclass(#[from] RobError),
}

impl CliError {
    /// Get exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Numeric exit code: 2 configuration, 3 alignment, 4 data sufficiency,
    /// 5 I/O, 6 bad arguments.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Self::FileNotFound(_) | Self::NotADirectory(_) => 6,
            Self::Robclass(e) => match e.kind() {
                ErrorKind::Configuration => 2,
                ErrorKind::Alignment => 3,
                ErrorKind::DataSufficiency => 4,
                ErrorKind::Io => 5,
            },
        }
    }
}
