//! Error handling for arcweld
//!
//! Provides the error types shared by all layers:
//! - G-Code errors (parsing/validation of a single line)
//! - Welder errors (fatal conditions of a welding run)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors related to G-Code parsing of a single source line.
/// These are recoverable: the welder logs them and keeps streaming.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Invalid G-Code syntax
    #[error("Invalid syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// The line number where the syntax error occurred.
        line_number: u32,
        /// The reason for the syntax error.
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' at line {line_number}: {reason}")]
    InvalidParameter {
        /// The line number where the invalid parameter was found.
        line_number: u32,
        /// The parameter letter.
        param: char,
        /// The reason the parameter is invalid.
        reason: String,
    },

    /// Missing required parameter
    #[error("Missing value for parameter '{param}' at line {line_number}")]
    MissingParameter {
        /// The line number where the parameter was missing.
        line_number: u32,
        /// The letter whose value is missing.
        param: char,
    },
}

impl GcodeError {
    /// Line number the error refers to
    pub fn line_number(&self) -> u32 {
        match self {
            Self::InvalidSyntax { line_number, .. }
            | Self::InvalidParameter { line_number, .. }
            | Self::MissingParameter { line_number, .. } => *line_number,
        }
    }
}

/// Welder error type
///
/// Represents conditions that abort or interrupt a welding run.
#[derive(Error, Debug)]
pub enum WelderError {
    /// The source file could not be opened or read
    #[error("Unable to read source file {path}: {reason}")]
    SourceUnreadable {
        /// The source path.
        path: String,
        /// The underlying reason.
        reason: String,
    },

    /// The target file could not be created or written
    #[error("Unable to write target file {path}: {reason}")]
    TargetUnwritable {
        /// The target path.
        path: String,
        /// The underlying reason.
        reason: String,
    },

    /// Invalid welding settings
    #[error("Invalid setting '{name}': {reason}")]
    InvalidSetting {
        /// The setting name.
        name: String,
        /// The reason the value was rejected.
        reason: String,
    },

    /// The progress observer requested cancellation
    #[error("Processing cancelled by request")]
    Cancelled,
}

impl WelderError {
    /// Check if this error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WelderError::Cancelled)
    }
}

/// Main error type for arcweld
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Welder error
    #[error(transparent)]
    Welder(#[from] WelderError),
}

impl Error {
    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
