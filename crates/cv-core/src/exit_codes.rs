//! Exit codes for the cv-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-2: Validation outcomes (the command ran; the input may still be bad)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use cv_common::Error;

/// Exit codes for cv-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Validation Outcomes (0-2)
    // ========================================================================
    /// Everything checked out
    Clean = 0,

    /// At least one row failed validation
    RowsInvalid = 1,

    /// The config document is incomplete or malformed
    ConfigInvalid = 2,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments or unusable input
    ArgsError = 10,

    /// File could not be read or written
    IoError = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Validation outcomes (codes 0-2) are not errors of the tool itself.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// User/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::RowsInvalid => "ERR_ROWS_INVALID",
            ExitCode::ConfigInvalid => "ERR_CONFIG_INVALID",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::IoError => "ERR_IO",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::ConfigIncomplete { .. } => ExitCode::ConfigInvalid,
            Error::ConfigNotFound | Error::InvalidRow { .. } => ExitCode::ArgsError,
            Error::Io(_) => ExitCode::IoError,
            // Raised only on caller bugs or output serialization
            Error::UnknownColumn { .. } | Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::RowsInvalid.as_i32(), 1);
        assert_eq!(ExitCode::ConfigInvalid.as_i32(), 2);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::IoError.as_i32(), 12);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
    }

    #[test]
    fn test_ranges() {
        assert!(ExitCode::RowsInvalid.is_operational());
        assert!(!ExitCode::RowsInvalid.is_success());
        assert!(ExitCode::IoError.is_user_error());
        assert!(ExitCode::InternalError.is_internal_error());
        assert!(!ExitCode::ConfigInvalid.is_user_error());
    }

    #[test]
    fn test_from_error() {
        let incomplete = Error::ConfigIncomplete {
            missing: vec!["version".into()],
        };
        assert_eq!(ExitCode::from(&incomplete), ExitCode::ConfigInvalid);
        assert_eq!(ExitCode::from(&Error::ConfigNotFound), ExitCode::ArgsError);

        let io = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::RowsInvalid.to_string(), "ERR_ROWS_INVALID (1)");
    }
}
