//! Shared error type across uidfw crates.

use thiserror::Error;

/// Stable error codes reported to callers across the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Chain identifier outside the recognized set.
    InvalidChain,
    /// Rule value outside {DEFAULT, ALLOW, DENY}.
    InvalidRule,
    /// Negative UID.
    InvalidUid,
    /// Malformed configuration or request shape.
    BadRequest,
    /// Unsupported config schema version.
    UnsupportedVersion,
    /// Internal failure.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidChain => "INVALID_CHAIN",
            ErrorCode::InvalidRule => "INVALID_RULE",
            ErrorCode::InvalidUid => "INVALID_UID",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FirewallError>;

/// Unified error type used by core and engine.
///
/// Caller-input variants carry the rejected raw value. None of them are
/// fatal: a rejected call leaves the policy store untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FirewallError {
    #[error("invalid firewall chain: {0}")]
    InvalidChain(i32),
    #[error("invalid firewall rule: {0}")]
    InvalidRule(i32),
    #[error("invalid uid: {0}")]
    InvalidUid(i64),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(u32),
    #[error("internal: {0}")]
    Internal(String),
}

impl FirewallError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            FirewallError::InvalidChain(_) => ErrorCode::InvalidChain,
            FirewallError::InvalidRule(_) => ErrorCode::InvalidRule,
            FirewallError::InvalidUid(_) => ErrorCode::InvalidUid,
            FirewallError::BadRequest(_) => ErrorCode::BadRequest,
            FirewallError::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            FirewallError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// True for errors caused by the caller's arguments.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            FirewallError::InvalidChain(_)
                | FirewallError::InvalidRule(_)
                | FirewallError::InvalidUid(_)
                | FirewallError::BadRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(FirewallError::InvalidChain(9).code().as_str(), "INVALID_CHAIN");
        assert_eq!(FirewallError::InvalidRule(99).code().as_str(), "INVALID_RULE");
        assert_eq!(FirewallError::InvalidUid(-1).code().as_str(), "INVALID_UID");
        assert_eq!(FirewallError::UnsupportedVersion(2).code().as_str(), "UNSUPPORTED_VERSION");
    }

    #[test]
    fn display_includes_rejected_value() {
        assert_eq!(FirewallError::InvalidRule(99).to_string(), "invalid firewall rule: 99");
        assert_eq!(FirewallError::InvalidUid(-1).to_string(), "invalid uid: -1");
    }

    #[test]
    fn internal_is_not_caller_input() {
        assert!(!FirewallError::Internal("poisoned".into()).is_invalid_input());
        assert!(FirewallError::InvalidChain(0).is_invalid_input());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FirewallError>();
    }
}
