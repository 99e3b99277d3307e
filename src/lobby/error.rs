//! Lobby Errors
//!
//! None of these reach a controller device. The session controller absorbs
//! them and logs at a level matching their severity.

use thiserror::Error;

use crate::core::ids::DeviceId;

/// Errors raised by the roster, the registry and payload validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    /// Operation referenced a device that is not registered.
    #[error("{0} is not registered")]
    NotFound(DeviceId),

    /// A payload field could not be interpreted.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An internal invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(&'static str),

    /// Number and team were already assigned to this device.
    #[error("{0} is already onboarded")]
    AlreadyOnboarded(DeviceId),
}

impl LobbyError {
    /// True for errors that are expected during normal play
    /// (stale device ids, bad client payloads).
    pub fn is_benign(&self) -> bool {
        matches!(self, LobbyError::NotFound(_) | LobbyError::MalformedPayload(_))
    }
}
