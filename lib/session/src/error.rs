//! Error taxonomy for session resolution.
//!
//! Every failure mode of the identity lookup is classified into one of
//! these variants, and all of them are handled inside the session
//! provider. Authorization gates only ever observe a
//! [`SessionState`](crate::state::SessionState), never an error.

use std::fmt;

/// Failure classification for a session resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No credential is stored. Expected on a first visit.
    NoCredential,
    /// The identity endpoint rejected the credential. The credential
    /// has already been removed from the store when this is returned.
    Rejected,
    /// The identity endpoint answered with a payload that violates its
    /// contract, such as an unknown role. Logged as a defect.
    MalformedProfile { reason: String },
    /// Network or infrastructure failure. The credential is untouched
    /// and a known-good session must be preserved.
    Transient { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredential => {
                write!(f, "no credential stored")
            }
            Self::Rejected => {
                write!(f, "credential rejected by the identity endpoint")
            }
            Self::MalformedProfile { reason } => {
                write!(f, "malformed profile payload: {reason}")
            }
            Self::Transient { reason } => {
                write!(f, "transient identity lookup failure: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
