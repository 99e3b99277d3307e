//! Team Roster
//!
//! The fixed set of teams for a session and their member lists.
//! Teams are created once and never added or removed afterwards; players are
//! always placed on the currently smallest team.

use serde::Serialize;

use crate::core::ids::{DeviceId, TeamNumber};
use crate::lobby::error::LobbyError;

/// Color labels sent to devices, indexed by team number.
pub const TEAM_COLORS: [&str; 3] = ["blue", "green", "red"];

/// Teams every session starts with.
pub const BASE_TEAM_COUNT: usize = 2;

/// Upper bound on teams per session.
pub const MAX_TEAM_COUNT: usize = TEAM_COLORS.len();

/// One team and its current members, in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    number: TeamNumber,
    color: &'static str,
    members: Vec<DeviceId>,
}

impl Team {
    fn new(number: TeamNumber, color: &'static str) -> Self {
        Self {
            number,
            color,
            members: Vec::new(),
        }
    }

    /// Team index.
    pub fn number(&self) -> TeamNumber {
        self.number
    }

    /// Label sent to member devices.
    pub fn color(&self) -> &'static str {
        self.color
    }

    /// Member devices in join order.
    pub fn members(&self) -> &[DeviceId] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if nobody is on this team.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check membership.
    pub fn contains(&self, device: DeviceId) -> bool {
        self.members.contains(&device)
    }
}

/// Owns team membership for one session.
#[derive(Debug, Clone)]
pub struct TeamRoster {
    teams: Vec<Team>,
}

impl TeamRoster {
    /// Create the roster for `configured_teams`.
    ///
    /// Two teams are always created; a third is added when the configured
    /// count is three or more. Larger counts are capped at [`MAX_TEAM_COUNT`].
    pub fn new(configured_teams: usize) -> Self {
        let count = configured_teams.clamp(BASE_TEAM_COUNT, MAX_TEAM_COUNT);
        let teams = TEAM_COLORS
            .iter()
            .take(count)
            .enumerate()
            .map(|(idx, color)| Team::new(TeamNumber(idx as u8), *color))
            .collect();

        Self { teams }
    }

    /// Place `device` on the team with the fewest members.
    ///
    /// Ties go to the lowest team number.
    pub fn assign_smallest_team(&mut self, device: DeviceId) -> Result<&Team, LobbyError> {
        // min_by_key keeps the first of equal minima
        let team = self
            .teams
            .iter_mut()
            .min_by_key(|team| team.len())
            .ok_or(LobbyError::InvariantViolation("team roster is empty"))?;

        team.members.push(device);
        Ok(&*team)
    }

    /// Remove `device` from whichever team holds it.
    ///
    /// Returns the team it was removed from, or `None` if no team held it.
    pub fn remove_player(&mut self, device: DeviceId) -> Option<TeamNumber> {
        for team in &mut self.teams {
            if let Some(pos) = team.members.iter().position(|d| *d == device) {
                team.members.remove(pos);
                return Some(team.number);
            }
        }
        None
    }

    /// Look up a team by number.
    pub fn team(&self, number: TeamNumber) -> Option<&Team> {
        self.teams.get(number.0 as usize)
    }

    /// Find the team a device belongs to.
    pub fn team_of(&self, device: DeviceId) -> Option<&Team> {
        self.teams.iter().find(|team| team.contains(device))
    }

    /// All teams in number order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Number of teams.
    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Difference between the largest and smallest team.
    pub fn imbalance(&self) -> usize {
        let sizes = self.teams.iter().map(Team::len);
        let max = sizes.clone().max().unwrap_or(0);
        let min = sizes.min().unwrap_or(0);
        max - min
    }
}
