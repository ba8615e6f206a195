//! Exit code logic for the s3-ssec-get process.
//!
//! Single responsibility: map each error kind and the final run report to
//! one process exit code. `main` is the only caller that acts on it.

use std::process::ExitCode;

use crate::transfer::RunReport;

/// Process outcome with a distinct exit code per error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Every listed object was transferred (or nothing was listed).
    Success,
    /// Missing positional argument or invalid flag.
    Usage,
    /// SDK configuration or credentials could not be loaded.
    Config,
    /// The prefix listing failed.
    Listing,
    /// The SSE-C key argument could not be decoded.
    KeyMaterial,
    /// A transfer failed under fail-fast, or every attempted transfer failed.
    TransferFailure,
    /// Some transfers failed while others completed under continue-past-failure.
    Partial,
}

impl ProcessExit {
    /// Returns the numeric exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Usage => 1,
            Self::Config => 2,
            Self::Listing => 3,
            Self::KeyMaterial => 4,
            Self::TransferFailure => 5,
            Self::Partial => 6,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Determines the process exit outcome from a finished run.
#[must_use]
pub fn determine_exit_outcome(report: &RunReport) -> ProcessExit {
    if report.failed.is_empty() {
        ProcessExit::Success
    } else if report.aborted || report.completed.is_empty() {
        ProcessExit::TransferFailure
    } else {
        ProcessExit::Partial
    }
}
