// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types shared by every layer of the runtime.
//!
//! Conversion and dispatch failures are data: they travel inside a failed
//! [`Future`](crate::future::Future) or come back from a fallible call.
//! An [`Error`] always carries an [`ErrorKind`] plus a human-readable message,
//! and both survive a trip across the call boundary (see [`ErrorKind::code`]).

use std::fmt;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // ========================================================================
    // Type Errors
    // ========================================================================
    /// No conversion path between two types.
    TypeMismatch,
    /// Signature text is malformed.
    InvalidSignature,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// Unknown method id or name.
    MethodNotFound,
    /// Unknown signal id or name.
    SignalNotFound,
    /// Unknown property id or name.
    PropertyNotFound,
    /// Call made with the wrong number of arguments.
    ArgumentCountMismatch,
    /// Native code under a callable raised something untyped (panic).
    UnknownException,

    // ========================================================================
    // Async Result Errors
    // ========================================================================
    /// Promise already reached a terminal state.
    AlreadyCompleted,
    /// Cancel requested on a future without a cancel handler.
    NotCancelable,
    /// Observed a canceled future.
    Canceled,
    /// Bounded wait elapsed before completion.
    Timeout,
    /// Every promise handle was dropped while the future was running.
    BrokenPromise,
    /// Future added to a barrier after its future was requested.
    BarrierClosed,

    // ========================================================================
    // Wire Errors
    // ========================================================================
    /// Malformed wire bytes.
    DeserializationFailure,
    /// Value cannot be written to the wire.
    SerializationFailure,
    /// Message channel failure.
    Transport,
}

impl ErrorKind {
    /// Stable wire code for this kind.
    pub fn code(self) -> u8 {
        match self {
            Self::TypeMismatch => 1,
            Self::InvalidSignature => 2,
            Self::MethodNotFound => 3,
            Self::SignalNotFound => 4,
            Self::PropertyNotFound => 5,
            Self::ArgumentCountMismatch => 6,
            Self::UnknownException => 7,
            Self::AlreadyCompleted => 8,
            Self::NotCancelable => 9,
            Self::Canceled => 10,
            Self::Timeout => 11,
            Self::BrokenPromise => 12,
            Self::BarrierClosed => 13,
            Self::DeserializationFailure => 14,
            Self::SerializationFailure => 15,
            Self::Transport => 16,
        }
    }

    /// Kind for a wire code; unknown codes map to `UnknownException`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::TypeMismatch,
            2 => Self::InvalidSignature,
            3 => Self::MethodNotFound,
            4 => Self::SignalNotFound,
            5 => Self::PropertyNotFound,
            6 => Self::ArgumentCountMismatch,
            8 => Self::AlreadyCompleted,
            9 => Self::NotCancelable,
            10 => Self::Canceled,
            11 => Self::Timeout,
            12 => Self::BrokenPromise,
            13 => Self::BarrierClosed,
            14 => Self::DeserializationFailure,
            15 => Self::SerializationFailure,
            16 => Self::Transport,
            _ => Self::UnknownException,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::TypeMismatch => "type mismatch",
            Self::InvalidSignature => "invalid signature",
            Self::MethodNotFound => "method not found",
            Self::SignalNotFound => "signal not found",
            Self::PropertyNotFound => "property not found",
            Self::ArgumentCountMismatch => "argument count mismatch",
            Self::UnknownException => "unknown exception",
            Self::AlreadyCompleted => "promise already completed",
            Self::NotCancelable => "future is not cancelable",
            Self::Canceled => "future canceled",
            Self::Timeout => "timed out",
            Self::BrokenPromise => "broken promise",
            Self::BarrierClosed => "barrier closed",
            Self::DeserializationFailure => "deserialization failure",
            Self::SerializationFailure => "serialization failure",
            Self::Transport => "transport error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Runtime error: a kind plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message)
    }

    pub fn method_not_found(method_id: u32) -> Self {
        Self::new(
            ErrorKind::MethodNotFound,
            format!("Can't find methodID: {}", method_id),
        )
    }

    pub fn signal_not_found(signal_id: u32) -> Self {
        Self::new(
            ErrorKind::SignalNotFound,
            format!("Can't find signalID: {}", signal_id),
        )
    }

    pub fn property_not_found(property_id: u32) -> Self {
        Self::new(
            ErrorKind::PropertyNotFound,
            format!("Can't find propertyID: {}", property_id),
        )
    }

    pub fn argument_count(expected: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::ArgumentCountMismatch,
            format!("expected {} arguments, got {}", expected, got),
        )
    }

    pub fn deserialization(offset: usize, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::DeserializationFailure,
            format!("at offset {}: {}", offset, reason),
        )
    }

    pub fn canceled() -> Self {
        Self::new(ErrorKind::Canceled, "future canceled")
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "future did not complete in time")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes_round_trip() {
        let kinds = [
            ErrorKind::TypeMismatch,
            ErrorKind::InvalidSignature,
            ErrorKind::MethodNotFound,
            ErrorKind::SignalNotFound,
            ErrorKind::PropertyNotFound,
            ErrorKind::ArgumentCountMismatch,
            ErrorKind::UnknownException,
            ErrorKind::AlreadyCompleted,
            ErrorKind::NotCancelable,
            ErrorKind::Canceled,
            ErrorKind::Timeout,
            ErrorKind::BrokenPromise,
            ErrorKind::BarrierClosed,
            ErrorKind::DeserializationFailure,
            ErrorKind::SerializationFailure,
            ErrorKind::Transport,
        ];
        for kind in kinds {
            assert_eq!(ErrorKind::from_code(kind.code()), kind);
        }
        assert_eq!(ErrorKind::from_code(200), ErrorKind::UnknownException);
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = Error::method_not_found(42);
        assert_eq!(err.kind(), ErrorKind::MethodNotFound);
        assert_eq!(err.to_string(), "method not found: Can't find methodID: 42");

        let bare: Error = ErrorKind::Canceled.into();
        assert_eq!(bare.to_string(), "future canceled");
    }
}
