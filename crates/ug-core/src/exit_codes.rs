//! Exit codes for the `ug` CLI.
//!
//! Exit code ranges:
//! - 0-1: Outcomes (1 means "verification did not match", not a failure)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

/// Exit codes for `ug` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded.
    Ok = 0,

    /// `verify`: the secret does not match the hash.
    Mismatch = 1,

    /// Invalid arguments or input.
    ArgsError = 10,

    /// Configuration could not be loaded or is invalid.
    ConfigError = 11,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error on stdin/stdout.
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Outcome rather than error (codes 0-9).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::Mismatch => "MISMATCH",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
