//! # Joust Lobby Server
//!
//! Lobby and session manager for a party game played with phones as
//! controllers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    JOUST LOBBY SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Pure primitives                           │
//! │  ├── ids.rs      - Device, team and avatar identifiers       │
//! │  └── numbering.rs- Smallest-free player numbers              │
//! │                                                              │
//! │  lobby/          - Lobby state machine (synchronous)         │
//! │  ├── team.rs     - Balanced team roster                      │
//! │  ├── player.rs   - Player registry and readiness             │
//! │  ├── countdown.rs- Countdown steps                           │
//! │  ├── display.rs  - Shared-screen text                        │
//! │  └── session.rs  - Lobby -> CountingDown -> Started          │
//! │                                                              │
//! │  game/           - Gameplay handoff                          │
//! │  ├── input.rs    - Controller input to movement              │
//! │  └── avatar.rs   - Avatar spawning and the world seam        │
//! │                                                              │
//! │  network/        - Networking (async)                        │
//! │  ├── protocol.rs - Device messages and gateway events        │
//! │  ├── gateway.rs  - Outbound messaging seam                   │
//! │  ├── actor.rs    - Session task and countdown timer          │
//! │  └── server.rs   - WebSocket controller gateway              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering Guarantee
//!
//! All session mutations (gateway events and countdown ticks) are applied
//! one at a time by a single task, in arrival order. The `lobby/` and
//! `game/` modules never block and never touch the clock.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod lobby;
pub mod network;

// Re-export commonly used types
pub use crate::config::{AppConfig, ConfigError};
pub use crate::core::{next_number, AvatarHandle, DeviceId, PlayerNumber, TeamNumber};
pub use game::{GameWorld, HeadlessWorld, MovementCommand, MovementTranslator};
pub use lobby::{
    LobbyDisplay, LobbyError, LobbySnapshot, SessionConfig, SessionController, SessionPhase,
};
pub use network::{spawn_session, DeviceMessage, GameServer, GatewayEvent, SessionHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
