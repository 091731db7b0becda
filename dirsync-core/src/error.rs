//! Error taxonomy for the reconciliation engine.
//!
//! Two layers:
//! - [`DirectoryError`]: what a [`crate::client::DirectoryClient`] reports.
//!   Carries a structured [`ErrorKind`] so the engine never inspects message
//!   text.
//! - [`ReconcileError`]: what engine operations surface to the caller. The
//!   two idempotence signals (`NotFound` on drift reads, `NoModifications` on
//!   mutations) are absorbed into [`crate::outcome::Outcome`] and never show
//!   up here.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote code for "object does not exist".
pub const NOT_FOUND_CODE: u32 = 4001;
/// Remote code for "an object with that name already exists".
pub const DUPLICATE_ENTRY_CODE: u32 = 4002;
/// Remote code for "no modifications to be performed" (`EmptyModlist`).
pub const EMPTY_MODLIST_CODE: u32 = 4202;

/// Message fragments recognised when a remote failure arrives without a code.
const NOT_FOUND_MARKERS: &[&str] = &["NotFound", "not found"];
const NO_MODIFICATION_MARKERS: &[&str] = &[
    "EmptyModlist",
    "no modifications to be performed",
    "already a member",
    "not a member",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The addressed object (or its parent) does not exist.
    NotFound,
    /// The request was valid but nothing had to change.
    NoModifications,
    /// Any other rejection: validation, authorization, duplicates, transport.
    Rejected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::NoModifications => "EmptyModlist",
            Self::Rejected => "Rejected",
        }
    }

    /// Classify a remote failure.
    ///
    /// The structured code always wins. When the remote layer could not supply
    /// one, `message_fallback` allows the legacy substring match on the
    /// human-readable message; with the fallback off, uncoded failures are
    /// plain rejections.
    pub fn classify(code: Option<u32>, message: &str, message_fallback: bool) -> Self {
        match code {
            Some(NOT_FOUND_CODE) => return Self::NotFound,
            Some(EMPTY_MODLIST_CODE) => return Self::NoModifications,
            Some(_) => return Self::Rejected,
            None => {}
        }

        if !message_fallback {
            return Self::Rejected;
        }
        if NOT_FOUND_MARKERS.iter().any(|m| message.contains(m)) {
            Self::NotFound
        } else if NO_MODIFICATION_MARKERS.iter().any(|m| message.contains(m)) {
            Self::NoModifications
        } else {
            Self::Rejected
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by the directory service, message kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}{}: {message}", code_suffix(.code))]
pub struct DirectoryError {
    pub kind: ErrorKind,
    pub code: Option<u32>,
    pub message: String,
}

fn code_suffix(code: &Option<u32>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

impl DirectoryError {
    pub fn new(kind: ErrorKind, code: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Build from a raw remote failure, classifying it via [`ErrorKind::classify`].
    pub fn from_remote(code: Option<u32>, message: impl Into<String>, message_fallback: bool) -> Self {
        let message = message.into();
        let kind = ErrorKind::classify(code, &message, message_fallback);
        Self {
            kind,
            code,
            message,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, Some(NOT_FOUND_CODE), message)
    }

    pub fn no_modifications(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoModifications, Some(EMPTY_MODLIST_CODE), message)
    }

    pub fn rejected(code: Option<u32>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rejected, code, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_no_modifications(&self) -> bool {
        self.kind == ErrorKind::NoModifications
    }
}

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// A composite key could not be decoded. Fatal, never retried.
    #[error("malformed identifier {id:?}: {reason}")]
    MalformedIdentifier { id: String, reason: String },

    /// The remote service rejected a call for a reason other than "nothing to do".
    #[error("conflict: {0}")]
    Conflict(DirectoryError),

    /// A read following a write stayed invisible for the whole retry budget.
    #[error("transient unavailable after {attempts} attempt(s): {last}")]
    TransientUnavailable { attempts: u32, last: DirectoryError },

    /// A declaration cannot be turned into a remote request.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),
}

impl ReconcileError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// The remote error behind this failure, if any.
    pub fn remote(&self) -> Option<&DirectoryError> {
        match self {
            Self::Conflict(e) => Some(e),
            Self::TransientUnavailable { last, .. } => Some(last),
            Self::MalformedIdentifier { .. } | Self::InvalidDeclaration(_) => None,
        }
    }
}
