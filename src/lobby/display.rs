//! Lobby Display
//!
//! Text shown on the shared screen while players gather.

use tracing::info;

/// Screen collaborator for the lobby.
pub trait LobbyDisplay {
    /// Show the connected player count.
    fn set_player_count(&mut self, count: usize);

    /// Show the ready player count.
    fn set_ready_count(&mut self, count: usize);

    /// Show the countdown line (blank, "Starting in N" or "GO!").
    fn set_countdown_text(&mut self, text: &str);
}

/// Player count line.
pub fn player_count_text(count: usize) -> String {
    format!("# Players: {}", count)
}

/// Ready count line.
pub fn ready_count_text(count: usize) -> String {
    format!("# Ready Players: {}", count)
}

/// Display that writes every change to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDisplay;

impl LobbyDisplay for TracingDisplay {
    fn set_player_count(&mut self, count: usize) {
        info!(target: "joust::display", "{}", player_count_text(count));
    }

    fn set_ready_count(&mut self, count: usize) {
        info!(target: "joust::display", "{}", ready_count_text(count));
    }

    fn set_countdown_text(&mut self, text: &str) {
        if !text.is_empty() {
            info!(target: "joust::display", "{}", text);
        }
    }
}

/// Display that keeps the current text of each line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextDisplay {
    /// Player count line.
    pub players: String,
    /// Ready count line.
    pub ready: String,
    /// Countdown line.
    pub countdown: String,
    /// Count updates applied so far.
    pub count_updates: usize,
}

impl TextDisplay {
    /// Create a blank display.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LobbyDisplay for TextDisplay {
    fn set_player_count(&mut self, count: usize) {
        self.players = player_count_text(count);
        self.count_updates += 1;
    }

    fn set_ready_count(&mut self, count: usize) {
        self.ready = ready_count_text(count);
    }

    fn set_countdown_text(&mut self, text: &str) {
        self.countdown = text.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_display_lines() {
        let mut display = TextDisplay::new();
        display.set_player_count(3);
        display.set_ready_count(1);
        display.set_countdown_text("Starting in 2");

        assert_eq!(display.players, "# Players: 3");
        assert_eq!(display.ready, "# Ready Players: 1");
        assert_eq!(display.countdown, "Starting in 2");
        assert_eq!(display.count_updates, 1);
    }
}
