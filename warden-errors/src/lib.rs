//! Error taxonomy for the access-control core (kinds, not type names — §7).
//!
//! Every fallible core operation returns `Result<_, AccessError>`. The hot path
//! (`ResolveAccess`) never propagates an `AccessError` to its caller: any error is
//! logged and collapsed to a `Deny` decision (see `warden-acl`/`warden`). The admin
//! API surfaces the kind as-is so the external HTTP layer can pick a status code.

use std::fmt;

use thiserror::Error;

/// The error taxonomy of §7. Distinguishes *why* an operation failed so callers can
/// decide whether to retry, report to the user, or escalate.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Malformed identifiers, lengths, enum values. Reported, not retried.
    InputValidation,
    /// Duplicate unique key on create.
    Conflict,
    /// Referenced principal/resource missing.
    NotFound,
    /// Attempted child type not allowed, unknown permission for service-type.
    PolicyViolation,
    /// Database unavailable or deadlock. Retried at most once with backoff by the
    /// facade; otherwise surfaced as `Internal`.
    TransientStore,
    /// Invariant breach. Logged with context; deny on the hot path, 500 on admin path.
    Internal,
}

impl ErrorKind {
    /// The admin-API exit code for this kind (§6). `TransientStore` that reaches
    /// this far means the one retry already failed, so it reports the same way as
    /// `Internal`.
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::InputValidation => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::PolicyViolation => 403,
            ErrorKind::TransientStore => 500,
            ErrorKind::Internal => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InputValidation => "input_validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PolicyViolation => "policy_violation",
            ErrorKind::TransientStore => "transient_store",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A core-level error: a [`ErrorKind`] plus a human-readable message and optional
/// source error.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AccessError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl AccessError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(kind: ErrorKind, message: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn input_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputValidation, message)
    }

    pub fn policy_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PolicyViolation, message)
    }

    pub fn transient_store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransientStore, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// Build an [`AccessError`] of the given kind. Mirrors the reference workspace's
/// `http_err!` macro in `proxmox-http-error`.
#[macro_export]
macro_rules! access_err {
    ($kind:ident, $($fmt:tt)+) => {
        $crate::AccessError::new($crate::ErrorKind::$kind, format!($($fmt)+))
    };
}

/// Return early with an [`AccessError`] of the given kind. Mirrors `http_bail!`.
#[macro_export]
macro_rules! access_bail {
    ($kind:ident, $($fmt:tt)+) => {
        return Err($crate::access_err!($kind, $($fmt)+))
    };
}

pub type Result<T> = std::result::Result<T, AccessError>;
