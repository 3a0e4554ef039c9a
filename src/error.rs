//! Exit codes for the dupescan binary.

use crate::duplicates::FinderError;

/// Exit codes for the dupescan application.
///
/// - 0: Success (completed normally, with or without duplicates)
/// - 1: General error (bad root or unexpected failure)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success: Scan completed. Skipped files do not change this.
    Success = 0,
    /// General error: An unrecoverable error occurred.
    GeneralError = 1,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}
