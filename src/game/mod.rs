//! Gameplay Handoff
//!
//! What the session needs from gameplay once the lobby is over.
//!
//! ## Module Structure
//!
//! - `input`: Controller input to movement command translation
//! - `avatar`: Avatar world seam and the headless implementation

pub mod avatar;
pub mod input;

// Re-export key types
pub use avatar::{AvatarSpawn, GameWorld, HeadlessWorld, SpawnPoint};
pub use input::{ControllerInput, MovementCommand, MovementTranslator};
