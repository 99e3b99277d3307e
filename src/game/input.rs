//! Input Translation
//!
//! Turns a controller's button snapshot into the movement command an avatar
//! consumes. Left and right are resolved to a single horizontal axis; pressing
//! both cancels out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::ids::DeviceId;
use crate::game::avatar::GameWorld;
use crate::lobby::player::PlayerRegistry;

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Button state reported by a controller in one message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInput {
    /// Left held.
    #[serde(default)]
    pub left: bool,
    /// Right held.
    #[serde(default)]
    pub right: bool,
    /// Flap requested.
    #[serde(default)]
    pub up: bool,
}

impl ControllerInput {
    /// Read the `left`, `right` and `up` flags from a message payload.
    ///
    /// Missing or non-boolean flags count as not pressed; other fields are
    /// ignored.
    pub fn from_payload(data: &Value) -> Self {
        let flag = |name: &str| data.get(name).and_then(Value::as_bool).unwrap_or(false);
        Self {
            left: flag("left"),
            right: flag("right"),
            up: flag("up"),
        }
    }
}

/// Movement command handed to an avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCommand {
    /// -1 (left), 0, or +1 (right).
    pub horizontal: i8,
    /// Vertical impulse requested this tick.
    pub up: bool,
}

impl MovementCommand {
    /// No movement.
    pub const IDLE: MovementCommand = MovementCommand { horizontal: 0, up: false };

    /// Check if this command moves the avatar at all.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.horizontal == 0 && !self.up
    }
}

// =============================================================================
// TRANSLATION
// =============================================================================

/// Resolve left/right into a horizontal axis value.
#[inline]
pub fn resolve_horizontal(left: bool, right: bool) -> i8 {
    match (left, right) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

/// Maps controller input onto avatars.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementTranslator;

impl MovementTranslator {
    /// Translate a snapshot into a command.
    pub fn translate(input: ControllerInput) -> MovementCommand {
        MovementCommand {
            horizontal: resolve_horizontal(input.left, input.right),
            up: input.up,
        }
    }

    /// Translate and forward `input` to the avatar owned by `device`.
    ///
    /// Unknown devices and devices without an avatar are skipped.
    /// Returns the command if it was delivered.
    pub fn forward<W: GameWorld>(
        registry: &PlayerRegistry,
        world: &mut W,
        device: DeviceId,
        input: ControllerInput,
    ) -> Option<MovementCommand> {
        let avatar = registry.find_by_device(device)?.avatar()?;
        let command = Self::translate(input);
        world.drive_avatar(avatar, command);
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::TeamNumber;
    use crate::game::avatar::{AvatarSpawn, HeadlessWorld, SpawnPoint};
    use serde_json::json;

    #[test]
    fn test_resolve_horizontal() {
        assert_eq!(resolve_horizontal(true, false), -1);
        assert_eq!(resolve_horizontal(false, true), 1);
        assert_eq!(resolve_horizontal(true, true), 0);
        assert_eq!(resolve_horizontal(false, false), 0);
    }

    #[test]
    fn test_both_pressed_cancels() {
        let input = ControllerInput::from_payload(&json!({"left": true, "right": true, "up": false}));
        let command = MovementTranslator::translate(input);
        assert_eq!(command.horizontal, 0);
        assert!(!command.up);
        assert!(command.is_idle());
    }

    #[test]
    fn test_missing_and_non_bool_flags() {
        let input = ControllerInput::from_payload(&json!({"up": true, "left": "yes"}));
        assert_eq!(input, ControllerInput { left: false, right: false, up: true });

        let input = ControllerInput::from_payload(&json!(null));
        assert_eq!(input, ControllerInput::default());
    }

    #[test]
    fn test_forward_requires_avatar() {
        let mut registry = PlayerRegistry::new();
        let mut world = HeadlessWorld::new();
        registry.add_player(DeviceId(1));

        let input = ControllerInput { left: false, right: true, up: true };

        // Registered but not spawned
        assert_eq!(MovementTranslator::forward(&registry, &mut world, DeviceId(1), input), None);
        // Unknown device
        assert_eq!(MovementTranslator::forward(&registry, &mut world, DeviceId(2), input), None);

        let handle = world.spawn_avatar(AvatarSpawn {
            team: TeamNumber(0),
            number: 1,
            position: SpawnPoint::for_team(TeamNumber(0), 1.0),
        });
        registry.set_avatar(DeviceId(1), handle).unwrap();

        let sent = MovementTranslator::forward(&registry, &mut world, DeviceId(1), input);
        assert_eq!(sent, Some(MovementCommand { horizontal: 1, up: true }));
        assert_eq!(world.avatar(handle).map(|a| a.last_command), Some(MovementCommand { horizontal: 1, up: true }));
    }
}
