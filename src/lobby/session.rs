//! Session Controller
//!
//! The lobby state machine. Reacts to validated gateway events, keeps the
//! registry and roster consistent, drives the countdown and hands the players
//! over to gameplay.
//!
//! ```text
//!   Lobby ──all ready──▶ CountingDown ──countdown hits 0──▶ Started
//!     ▲  │                    │
//!     └──┘ connect /          └─ connect / disconnect / ready still mutate
//!          disconnect /          players but never touch the countdown
//!          ready                 or the counters on screen
//! ```
//!
//! The controller is synchronous and owns no clock. Whoever owns it must
//! serialize calls and invoke [`SessionController::tick`] once per second
//! while the phase is [`SessionPhase::CountingDown`].

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::ids::{DeviceId, TeamNumber};
use crate::core::numbering::{next_number, PlayerNumber};
use crate::game::avatar::{AvatarSpawn, GameWorld, SpawnPoint, DEFAULT_SPAWN_OFFSET};
use crate::game::input::{ControllerInput, MovementTranslator};
use crate::lobby::countdown::{countdown_text, Countdown, CountdownStep};
use crate::lobby::display::LobbyDisplay;
use crate::lobby::error::LobbyError;
use crate::lobby::player::PlayerRegistry;
use crate::lobby::team::TeamRoster;
use crate::network::gateway::Gateway;
use crate::network::protocol::{DeviceMessage, SessionEvent};

/// Default number of teams.
pub const DEFAULT_NUM_TEAMS: usize = 2;

/// Default countdown length in seconds.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Accepting players and readiness changes.
    Lobby,
    /// Readiness locked, countdown running.
    CountingDown,
    /// Gameplay owns the players.
    Started,
}

/// Configuration for a lobby session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Teams to create (2, or 3 when set to 3 or more).
    pub num_teams: usize,
    /// Countdown length in seconds.
    pub countdown_time: u32,
    /// Horizontal distance of spawn points from center.
    pub spawn_offset: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            num_teams: DEFAULT_NUM_TEAMS,
            countdown_time: DEFAULT_COUNTDOWN_SECS,
            spawn_offset: DEFAULT_SPAWN_OFFSET,
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Serializable view of one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSnapshot {
    /// Team index.
    pub number: TeamNumber,
    /// Color label.
    pub color: &'static str,
    /// Member player numbers in join order.
    pub players: Vec<PlayerNumber>,
}

/// Serializable view of the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbySnapshot {
    /// Session identifier.
    pub session_id: Uuid,
    /// Current phase.
    pub phase: SessionPhase,
    /// Seconds left, while counting down.
    pub countdown_remaining: Option<u32>,
    /// Connected players.
    pub player_count: usize,
    /// Ready players.
    pub ready_count: usize,
    /// Teams in number order.
    pub teams: Vec<TeamSnapshot>,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// The lobby state machine.
pub struct SessionController<G, D, W> {
    id: Uuid,
    config: SessionConfig,
    phase: SessionPhase,
    countdown: Option<Countdown>,
    registry: PlayerRegistry,
    roster: TeamRoster,
    gateway: G,
    display: D,
    world: W,
}

impl<G, D, W> SessionController<G, D, W>
where
    G: Gateway,
    D: LobbyDisplay,
    W: GameWorld,
{
    /// Create a session in the lobby phase and draw the initial display.
    pub fn new(config: SessionConfig, gateway: G, display: D, world: W) -> Self {
        let roster = TeamRoster::new(config.num_teams);
        let mut controller = Self {
            id: Uuid::new_v4(),
            config,
            phase: SessionPhase::Lobby,
            countdown: None,
            registry: PlayerRegistry::new(),
            roster,
            gateway,
            display,
            world,
        };

        controller.display.set_countdown_text("");
        controller.refresh_counts();
        controller
    }

    /// Dispatch one event. Returns the new phase if the event caused a
    /// transition.
    pub fn handle(&mut self, event: SessionEvent) -> Option<SessionPhase> {
        match event {
            SessionEvent::Connect(device) => self.on_connect(device),
            SessionEvent::Disconnect(device) => self.on_disconnect(device),
            SessionEvent::ReadyChanged { device, ready } => self.on_ready_changed(device, ready),
            SessionEvent::Input { device, input } => {
                self.on_input(device, input);
                None
            }
        }
    }

    /// A device connected: register it, place it on a team and number it.
    pub fn on_connect(&mut self, device: DeviceId) -> Option<SessionPhase> {
        if let Some(stale) = self.registry.find_by_device(device) {
            warn!("{} connected while still registered, replacing", device);
            let avatar = stale.avatar();
            self.roster.remove_player(device);
            if let Some(avatar) = avatar {
                self.world.despawn_avatar(avatar);
            }
        }

        self.registry.add_player(device);

        let assigned = self
            .roster
            .assign_smallest_team(device)
            .map(|team| (team.number(), team.color()));

        let (team, color) = match assigned {
            Ok(assigned) => assigned,
            Err(e) => {
                let _ = self.registry.remove_player(device);
                self.absorb(e);
                return None;
            }
        };

        let number = next_number(self.registry.numbers());
        if let Err(e) = self.registry.onboard(device, number, team) {
            self.absorb(e);
        }

        self.gateway.send(device, DeviceMessage::Team { value: color.to_string() });
        info!("{} joined as player {} on {} ({})", device, number, team, color);

        if self.phase != SessionPhase::Lobby {
            debug!("{} joined during {:?}", device, self.phase);
            return None;
        }

        self.refresh_counts();
        self.maybe_begin_countdown()
    }

    /// A device disconnected: drop it from the roster and the registry.
    pub fn on_disconnect(&mut self, device: DeviceId) -> Option<SessionPhase> {
        if self.registry.find_by_device(device).is_none() {
            self.absorb(LobbyError::NotFound(device));
            return None;
        }

        // Roster first, while the team link is still resolvable
        let team = self.roster.remove_player(device);

        match self.registry.remove_player(device) {
            Ok(player) => {
                info!("{} left (player {:?}, {:?})", device, player.number(), team);
                if let Some(avatar) = player.avatar() {
                    self.world.despawn_avatar(avatar);
                }
            }
            Err(e) => self.absorb(e),
        }

        if self.phase == SessionPhase::Lobby {
            self.refresh_counts();
        }
        None
    }

    /// A device reported its ready flag.
    pub fn on_ready_changed(
        &mut self,
        device: DeviceId,
        ready: Result<bool, LobbyError>,
    ) -> Option<SessionPhase> {
        if self.registry.find_by_device(device).is_none() {
            self.absorb(LobbyError::NotFound(device));
            return None;
        }

        match ready {
            Ok(ready) => {
                self.registry.set_ready(device, ready);
                debug!("{} ready = {}", device, ready);
            }
            Err(e) => self.absorb(e),
        }

        if self.phase != SessionPhase::Lobby {
            return None;
        }

        self.refresh_counts();
        self.maybe_begin_countdown()
    }

    /// Forward controller input to the device's avatar, if it has one.
    pub fn on_input(&mut self, device: DeviceId, input: ControllerInput) {
        MovementTranslator::forward(&self.registry, &mut self.world, device, input);
    }

    /// Advance the countdown by one second.
    ///
    /// No-op outside [`SessionPhase::CountingDown`]. Returns
    /// `Some(SessionPhase::Started)` on the tick that starts the game.
    pub fn tick(&mut self) -> Option<SessionPhase> {
        if self.phase != SessionPhase::CountingDown {
            return None;
        }

        let step = self.countdown.as_mut().and_then(Countdown::tick)?;
        self.display.set_countdown_text(&countdown_text(step));

        match step {
            CountdownStep::Remaining(seconds) => {
                self.gateway.broadcast(DeviceMessage::Countdown { value: seconds });
                debug!("Session {} starting in {}", self.id, seconds);
                None
            }
            CountdownStep::Go => {
                self.start_game();
                Some(SessionPhase::Started)
            }
        }
    }

    fn maybe_begin_countdown(&mut self) -> Option<SessionPhase> {
        if self.phase != SessionPhase::Lobby || !self.registry.all_ready() {
            return None;
        }

        self.phase = SessionPhase::CountingDown;
        self.countdown = Some(Countdown::new(self.config.countdown_time));
        self.gateway.broadcast(DeviceMessage::Lock);

        info!(
            "Session {} counting down from {} with {} players",
            self.id,
            self.config.countdown_time,
            self.registry.count()
        );
        Some(SessionPhase::CountingDown)
    }

    fn start_game(&mut self) {
        self.phase = SessionPhase::Started;
        self.countdown = None;
        self.gateway.broadcast(DeviceMessage::Start);
        self.world.load_gameplay();
        self.spawn_avatars();

        info!("Session {} started with {} players", self.id, self.registry.count());
    }

    fn spawn_avatars(&mut self) {
        for team in self.roster.teams() {
            let position = SpawnPoint::for_team(team.number(), self.config.spawn_offset);

            for device in team.members() {
                let number = match self.registry.find_by_device(*device).and_then(|p| p.number()) {
                    Some(number) => number,
                    None => {
                        error!("{} on {} has no player number", device, team.number());
                        continue;
                    }
                };

                let handle = self.world.spawn_avatar(AvatarSpawn {
                    team: team.number(),
                    number,
                    position,
                });

                if let Err(e) = self.registry.set_avatar(*device, handle) {
                    error!("Failed to record avatar for {}: {}", device, e);
                }
            }
        }
    }

    fn refresh_counts(&mut self) {
        self.display.set_player_count(self.registry.count());
        self.display.set_ready_count(self.registry.ready_count());
    }

    fn absorb(&self, err: LobbyError) {
        if err.is_benign() {
            debug!("Session {}: ignored: {}", self.id, err);
        } else {
            error!("Session {}: {}", self.id, err);
        }
    }
}

impl<G, D, W> SessionController<G, D, W> {
    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Seconds left, while counting down.
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    /// Connected players.
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Team membership.
    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    /// Outbound gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Outbound gateway, mutably (for attaching connections).
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Lobby display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Avatar world.
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Capture the current state.
    pub fn snapshot(&self) -> LobbySnapshot {
        let teams = self
            .roster
            .teams()
            .iter()
            .map(|team| TeamSnapshot {
                number: team.number(),
                color: team.color(),
                players: team
                    .members()
                    .iter()
                    .filter_map(|d| self.registry.find_by_device(*d).and_then(|p| p.number()))
                    .collect(),
            })
            .collect();

        LobbySnapshot {
            session_id: self.id,
            phase: self.phase,
            countdown_remaining: self.countdown_remaining(),
            player_count: self.registry.count(),
            ready_count: self.registry.ready_count(),
            teams,
        }
    }
}
