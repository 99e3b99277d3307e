//! Avatar World
//!
//! Seam between the session and whatever owns the in-game entities.
//! The session only spawns, despawns and drives avatars; rendering and physics
//! live behind [`GameWorld`].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::ids::{AvatarHandle, TeamNumber};
use crate::core::numbering::PlayerNumber;
use crate::game::input::MovementCommand;

/// Default horizontal distance of a spawn point from the arena center.
pub const DEFAULT_SPAWN_OFFSET: f32 = 1.0;

/// World-space spawn location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpawnPoint {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl SpawnPoint {
    /// Spawn point for a team: right of center for even teams, left for odd.
    pub fn for_team(team: TeamNumber, offset: f32) -> Self {
        let side = if team.is_even() { 1.0 } else { -1.0 };
        Self { x: side * offset, y: 0.0 }
    }
}

/// Request to create one avatar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AvatarSpawn {
    /// Owning team.
    pub team: TeamNumber,
    /// Owning player's number.
    pub number: PlayerNumber,
    /// Where to place it.
    pub position: SpawnPoint,
}

/// The engine-side collaborator that owns avatars and the gameplay scene.
pub trait GameWorld {
    /// Switch to the gameplay scene.
    fn load_gameplay(&mut self);

    /// Create an avatar and return its handle.
    fn spawn_avatar(&mut self, spawn: AvatarSpawn) -> AvatarHandle;

    /// Remove an avatar. Unknown handles are ignored.
    fn despawn_avatar(&mut self, handle: AvatarHandle);

    /// Apply a movement command to an avatar. Unknown handles are ignored.
    fn drive_avatar(&mut self, handle: AvatarHandle, command: MovementCommand);
}

// =============================================================================
// HEADLESS WORLD
// =============================================================================

/// Avatar state tracked by [`HeadlessWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeadlessAvatar {
    /// Spawn request it was created from.
    pub spawn: AvatarSpawn,
    /// Most recent command.
    pub last_command: MovementCommand,
    /// Commands received so far.
    pub commands_received: u64,
}

/// In-memory world used when no engine is attached.
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    avatars: BTreeMap<AvatarHandle, HeadlessAvatar>,
    next_handle: u64,
    gameplay_loaded: bool,
}

impl HeadlessWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an avatar.
    pub fn avatar(&self, handle: AvatarHandle) -> Option<&HeadlessAvatar> {
        self.avatars.get(&handle)
    }

    /// Number of live avatars.
    pub fn avatar_count(&self) -> usize {
        self.avatars.len()
    }

    /// True once the gameplay scene was requested.
    pub fn gameplay_loaded(&self) -> bool {
        self.gameplay_loaded
    }
}

impl GameWorld for HeadlessWorld {
    fn load_gameplay(&mut self) {
        self.gameplay_loaded = true;
        info!("Gameplay scene loaded");
    }

    fn spawn_avatar(&mut self, spawn: AvatarSpawn) -> AvatarHandle {
        self.next_handle += 1;
        let handle = AvatarHandle(self.next_handle);
        self.avatars.insert(
            handle,
            HeadlessAvatar {
                spawn,
                last_command: MovementCommand::IDLE,
                commands_received: 0,
            },
        );
        debug!(
            "Spawned avatar {:?} for player {} on {} at ({:.1}, {:.1})",
            handle, spawn.number, spawn.team, spawn.position.x, spawn.position.y
        );
        handle
    }

    fn despawn_avatar(&mut self, handle: AvatarHandle) {
        if self.avatars.remove(&handle).is_some() {
            debug!("Despawned avatar {:?}", handle);
        }
    }

    fn drive_avatar(&mut self, handle: AvatarHandle, command: MovementCommand) {
        if let Some(avatar) = self.avatars.get_mut(&handle) {
            avatar.last_command = command;
            avatar.commands_received += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_side_alternates_by_team_parity() {
        assert_eq!(SpawnPoint::for_team(TeamNumber(0), 1.0).x, 1.0);
        assert_eq!(SpawnPoint::for_team(TeamNumber(1), 1.0).x, -1.0);
        assert_eq!(SpawnPoint::for_team(TeamNumber(2), 2.5).x, 2.5);
    }

    #[test]
    fn test_headless_world_lifecycle() {
        let mut world = HeadlessWorld::new();
        let spawn = AvatarSpawn {
            team: TeamNumber(1),
            number: 2,
            position: SpawnPoint::for_team(TeamNumber(1), DEFAULT_SPAWN_OFFSET),
        };

        let a = world.spawn_avatar(spawn);
        let b = world.spawn_avatar(spawn);
        assert_ne!(a, b);
        assert_eq!(world.avatar_count(), 2);

        world.drive_avatar(a, MovementCommand { horizontal: -1, up: false });
        let avatar = world.avatar(a).unwrap();
        assert_eq!(avatar.last_command.horizontal, -1);
        assert_eq!(avatar.commands_received, 1);

        world.despawn_avatar(a);
        world.despawn_avatar(a);
        assert_eq!(world.avatar_count(), 1);

        // Unknown handle is ignored
        world.drive_avatar(a, MovementCommand::IDLE);
        assert!(world.avatar(a).is_none());
    }
}
