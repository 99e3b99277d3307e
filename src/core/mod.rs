//! Core primitives shared by the lobby and gameplay layers.
//!
//! Everything here is pure and free of I/O.

pub mod ids;
pub mod numbering;

// Re-export core types
pub use ids::{AvatarHandle, DeviceId, TeamNumber};
pub use numbering::{next_number, PlayerNumber};
