//! Error types for program loading and saving.

use thiserror::Error;

/// Errors raised while reading or writing instruction programs.
#[derive(Error, Debug)]
pub enum ProgramError {
    /// I/O failure while reading or writing a program file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for program operations.
pub type ProgramResult<T> = Result<T, ProgramError>;
