use core::fmt;
use serde::Serialize;

/// Coarse classification shared by every engine error.
///
/// `IllegalAction` is a recoverable rejection of caller input, `InvalidArgument`
/// a malformed request, and `InvariantViolation` a corrupted engine state that
/// callers should surface loudly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidArgument,
    IllegalAction,
    InvariantViolation,
}

impl ErrorKind {
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, ErrorKind::InvariantViolation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::IllegalAction => "illegal action",
            ErrorKind::InvariantViolation => "invariant violation",
        };
        f.write_str(label)
    }
}
