//! Lobby Module
//!
//! Everything that happens between the first controller connecting and the
//! game starting.
//!
//! ## Module Structure
//!
//! - `team`: Fixed team set with balanced assignment
//! - `player`: Connected players and their readiness
//! - `countdown`: Scheduled-tick countdown
//! - `display`: Shared-screen text collaborator
//! - `session`: The lobby state machine
//! - `error`: Lobby error taxonomy

pub mod countdown;
pub mod display;
pub mod error;
pub mod player;
pub mod session;
pub mod team;

// Re-export key types
pub use countdown::{Countdown, CountdownStep};
pub use display::{LobbyDisplay, TextDisplay, TracingDisplay};
pub use error::LobbyError;
pub use player::{Player, PlayerRegistry};
pub use session::{LobbySnapshot, SessionConfig, SessionController, SessionPhase};
pub use team::{Team, TeamRoster};
