//! Identifiers
//!
//! Newtypes for the identities that flow between the gateway, the lobby and
//! the avatar world. All of them order deterministically so they can key a
//! `BTreeMap`.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// DEVICE ID
// =============================================================================

/// Controller device identifier assigned by the messaging gateway.
///
/// Unique among connected devices; the gateway may reuse it after the device
/// disconnects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i32);

impl DeviceId {
    /// Get the raw integer.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

// =============================================================================
// TEAM NUMBER
// =============================================================================

/// Zero-based team index. Stable for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamNumber(pub u8);

impl TeamNumber {
    /// True for teams 0, 2, ...
    #[inline]
    pub fn is_even(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for TeamNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

// =============================================================================
// AVATAR HANDLE
// =============================================================================

/// Opaque reference to an avatar owned by the game world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarHandle(pub u64);
