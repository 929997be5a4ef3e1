//! Reply error codes.

use std::fmt;

/// The `error_code` field of a reply packet.
///
/// Zero means success.  Known codes have a symbolic name; unknown codes are
/// kept as-is so a newer VM never breaks decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    pub const NONE: ErrorCode = ErrorCode(0);
    pub const INVALID_THREAD: ErrorCode = ErrorCode(10);
    pub const INVALID_THREAD_GROUP: ErrorCode = ErrorCode(11);
    pub const THREAD_NOT_SUSPENDED: ErrorCode = ErrorCode(13);
    pub const INVALID_OBJECT: ErrorCode = ErrorCode(20);
    pub const INVALID_CLASS: ErrorCode = ErrorCode(21);
    pub const NOT_IMPLEMENTED: ErrorCode = ErrorCode(99);
    pub const NULL_POINTER: ErrorCode = ErrorCode(100);
    pub const ILLEGAL_ARGUMENT: ErrorCode = ErrorCode(103);
    pub const VM_DEAD: ErrorCode = ErrorCode(112);
    pub const INTERNAL: ErrorCode = ErrorCode(113);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Symbolic name of the code, if it is one the protocol defines.
    pub fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "NONE",
            10 => "INVALID_THREAD",
            11 => "INVALID_THREAD_GROUP",
            12 => "INVALID_PRIORITY",
            13 => "THREAD_NOT_SUSPENDED",
            14 => "THREAD_SUSPENDED",
            15 => "THREAD_NOT_ALIVE",
            20 => "INVALID_OBJECT",
            21 => "INVALID_CLASS",
            22 => "CLASS_NOT_PREPARED",
            23 => "INVALID_METHODID",
            24 => "INVALID_LOCATION",
            25 => "INVALID_FIELDID",
            30 => "INVALID_FRAMEID",
            31 => "NO_MORE_FRAMES",
            32 => "OPAQUE_FRAME",
            33 => "NOT_CURRENT_FRAME",
            34 => "TYPE_MISMATCH",
            35 => "INVALID_SLOT",
            40 => "DUPLICATE",
            41 => "NOT_FOUND",
            50 => "INVALID_MONITOR",
            51 => "NOT_MONITOR_OWNER",
            52 => "INTERRUPT",
            60 => "INVALID_CLASS_FORMAT",
            61 => "CIRCULAR_CLASS_DEFINITION",
            62 => "FAILS_VERIFICATION",
            63 => "ADD_METHOD_NOT_IMPLEMENTED",
            64 => "SCHEMA_CHANGE_NOT_IMPLEMENTED",
            65 => "INVALID_TYPESTATE",
            66 => "HIERARCHY_CHANGE_NOT_IMPLEMENTED",
            67 => "DELETE_METHOD_NOT_IMPLEMENTED",
            68 => "UNSUPPORTED_VERSION",
            69 => "NAMES_DONT_MATCH",
            70 => "CLASS_MODIFIERS_CHANGE_NOT_IMPLEMENTED",
            71 => "METHOD_MODIFIERS_CHANGE_NOT_IMPLEMENTED",
            99 => "NOT_IMPLEMENTED",
            100 => "NULL_POINTER",
            101 => "ABSENT_INFORMATION",
            102 => "INVALID_EVENT_TYPE",
            103 => "ILLEGAL_ARGUMENT",
            110 => "OUT_OF_MEMORY",
            111 => "ACCESS_DENIED",
            112 => "VM_DEAD",
            113 => "INTERNAL",
            115 => "UNATTACHED_THREAD",
            500 => "INVALID_TAG",
            502 => "ALREADY_INVOKING",
            503 => "INVALID_INDEX",
            504 => "INVALID_LENGTH",
            506 => "INVALID_STRING",
            507 => "INVALID_CLASS_LOADER",
            508 => "INVALID_ARRAY",
            509 => "TRANSPORT_LOAD",
            510 => "TRANSPORT_INIT",
            511 => "NATIVE_METHOD",
            512 => "INVALID_COUNT",
            _ => return None,
        })
    }
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "unknown error ({})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_has_name() {
        assert_eq!(ErrorCode(112).name(), Some("VM_DEAD"));
        assert_eq!(ErrorCode::INVALID_THREAD.to_string(), "INVALID_THREAD (10)");
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let code = ErrorCode::from(9999);
        assert_eq!(code.name(), None);
        assert_eq!(code.to_string(), "unknown error (9999)");
        assert!(!code.is_success());
    }

    #[test]
    fn test_zero_is_success() {
        assert!(ErrorCode::NONE.is_success());
    }
}
