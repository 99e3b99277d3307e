//! Player Registry
//!
//! Tracks the devices currently connected to the session, their readiness,
//! number, team and (once gameplay starts) avatar.
//! Uses BTreeMap so iteration order is stable across runs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::ids::{AvatarHandle, DeviceId, TeamNumber};
use crate::core::numbering::PlayerNumber;
use crate::lobby::error::LobbyError;

/// A connected controller device and its lobby state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    device_id: DeviceId,
    number: Option<PlayerNumber>,
    team: Option<TeamNumber>,
    /// Ready flag toggled from the controller.
    pub is_ready: bool,
    avatar: Option<AvatarHandle>,
}

impl Player {
    fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            number: None,
            team: None,
            is_ready: false,
            avatar: None,
        }
    }

    /// Gateway identity.
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Player number, once assigned.
    pub fn number(&self) -> Option<PlayerNumber> {
        self.number
    }

    /// Team, once assigned.
    pub fn team(&self) -> Option<TeamNumber> {
        self.team
    }

    /// Spawned avatar, if gameplay has started.
    pub fn avatar(&self) -> Option<AvatarHandle> {
        self.avatar
    }

    /// True once both number and team are set.
    pub fn is_onboarded(&self) -> bool {
        self.number.is_some() && self.team.is_some()
    }
}

/// Owns the set of connected players.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: BTreeMap<DeviceId, Player>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device. The player starts not ready, without number or team.
    ///
    /// A device id that is still registered is replaced with a fresh player,
    /// matching a gateway that reuses ids.
    pub fn add_player(&mut self, device_id: DeviceId) -> &mut Player {
        let slot = self
            .players
            .entry(device_id)
            .or_insert_with(|| Player::new(device_id));
        *slot = Player::new(device_id);
        slot
    }

    /// Unregister a device, returning its final state.
    pub fn remove_player(&mut self, device_id: DeviceId) -> Result<Player, LobbyError> {
        self.players
            .remove(&device_id)
            .ok_or(LobbyError::NotFound(device_id))
    }

    /// Set number and team. Each may only be set once.
    pub fn onboard(
        &mut self,
        device_id: DeviceId,
        number: PlayerNumber,
        team: TeamNumber,
    ) -> Result<&Player, LobbyError> {
        let player = self
            .players
            .get_mut(&device_id)
            .ok_or(LobbyError::NotFound(device_id))?;

        if player.is_onboarded() {
            return Err(LobbyError::AlreadyOnboarded(device_id));
        }

        player.number = Some(number);
        player.team = Some(team);
        Ok(&*player)
    }

    /// Update readiness. Unknown devices are ignored.
    ///
    /// Returns true if the device was found.
    pub fn set_ready(&mut self, device_id: DeviceId, ready: bool) -> bool {
        match self.players.get_mut(&device_id) {
            Some(player) => {
                player.is_ready = ready;
                true
            }
            None => false,
        }
    }

    /// Record the avatar spawned for this device.
    pub fn set_avatar(&mut self, device_id: DeviceId, avatar: AvatarHandle) -> Result<(), LobbyError> {
        let player = self
            .players
            .get_mut(&device_id)
            .ok_or(LobbyError::NotFound(device_id))?;
        player.avatar = Some(avatar);
        Ok(())
    }

    /// Look up a player.
    pub fn find_by_device(&self, device_id: DeviceId) -> Option<&Player> {
        self.players.get(&device_id)
    }

    /// True if at least one player is registered and every player is ready.
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.is_ready)
    }

    /// Number of registered players.
    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// Number of ready players.
    pub fn ready_count(&self) -> usize {
        self.players.values().filter(|p| p.is_ready).count()
    }

    /// Numbers held by registered players.
    pub fn numbers(&self) -> impl Iterator<Item = PlayerNumber> + '_ {
        self.players.values().filter_map(Player::number)
    }

    /// Iterate players ordered by device id.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// True if nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_player() {
        let mut registry = PlayerRegistry::new();

        let player = registry.add_player(DeviceId(4));
        assert!(!player.is_ready);
        assert!(player.number().is_none());
        assert_eq!(registry.count(), 1);

        let removed = registry.remove_player(DeviceId(4)).unwrap();
        assert_eq!(removed.device_id(), DeviceId(4));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let mut registry = PlayerRegistry::new();
        assert_eq!(
            registry.remove_player(DeviceId(1)),
            Err(LobbyError::NotFound(DeviceId(1)))
        );
    }

    #[test]
    fn test_all_ready_empty_registry() {
        let registry = PlayerRegistry::new();
        assert!(!registry.all_ready());
    }

    #[test]
    fn test_all_ready() {
        let mut registry = PlayerRegistry::new();
        registry.add_player(DeviceId(1));
        registry.add_player(DeviceId(2));

        registry.set_ready(DeviceId(1), true);
        assert!(!registry.all_ready());
        assert_eq!(registry.ready_count(), 1);

        registry.set_ready(DeviceId(2), true);
        assert!(registry.all_ready());
    }

    #[test]
    fn test_set_ready_idempotent() {
        let mut once = PlayerRegistry::new();
        once.add_player(DeviceId(1));
        once.set_ready(DeviceId(1), true);

        let mut twice = once.clone();
        twice.set_ready(DeviceId(1), true);

        assert_eq!(once.find_by_device(DeviceId(1)), twice.find_by_device(DeviceId(1)));
        assert_eq!(once.ready_count(), twice.ready_count());
    }

    #[test]
    fn test_set_ready_unknown_device() {
        let mut registry = PlayerRegistry::new();
        assert!(!registry.set_ready(DeviceId(9), true));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_onboard_once() {
        let mut registry = PlayerRegistry::new();
        registry.add_player(DeviceId(1));

        let player = registry.onboard(DeviceId(1), 1, TeamNumber(0)).unwrap();
        assert!(player.is_onboarded());
        assert_eq!(player.number(), Some(1));

        assert_eq!(
            registry.onboard(DeviceId(1), 2, TeamNumber(1)),
            Err(LobbyError::AlreadyOnboarded(DeviceId(1)))
        );
        assert_eq!(registry.find_by_device(DeviceId(1)).and_then(Player::team), Some(TeamNumber(0)));
    }

    #[test]
    fn test_numbers_skip_unassigned() {
        let mut registry = PlayerRegistry::new();
        registry.add_player(DeviceId(1));
        registry.add_player(DeviceId(2));
        registry.onboard(DeviceId(2), 3, TeamNumber(0)).unwrap();

        assert_eq!(registry.numbers().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_iter_ordered_by_device() {
        let mut registry = PlayerRegistry::new();
        for d in [7, 2, 5] {
            registry.add_player(DeviceId(d));
        }

        let order: Vec<DeviceId> = registry.iter().map(Player::device_id).collect();
        assert_eq!(order, vec![DeviceId(2), DeviceId(5), DeviceId(7)]);
    }
}
