//! Countdown
//!
//! Scheduled-tick abstraction for the pre-game countdown. The owner polls
//! [`Countdown::tick`] once per second; the countdown never reads a clock.

use serde::Serialize;

/// What a single countdown tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountdownStep {
    /// Seconds left before the game starts.
    Remaining(u32),
    /// The countdown reached zero.
    Go,
}

/// Counts from `total` down to zero, one step per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    finished: bool,
}

impl Countdown {
    /// Arm a countdown of `total` seconds.
    pub fn new(total: u32) -> Self {
        Self {
            remaining: total,
            finished: false,
        }
    }

    /// Advance by one tick.
    ///
    /// Yields `Remaining(total)`, ..., `Remaining(1)`, then `Go` exactly once.
    /// Returns `None` once finished.
    pub fn tick(&mut self) -> Option<CountdownStep> {
        if self.finished {
            return None;
        }

        if self.remaining == 0 {
            self.finished = true;
            return Some(CountdownStep::Go);
        }

        let shown = self.remaining;
        self.remaining -= 1;
        Some(CountdownStep::Remaining(shown))
    }

    /// Seconds still to be shown.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// True after `Go` has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Display text for a countdown step.
pub fn countdown_text(step: CountdownStep) -> String {
    match step {
        CountdownStep::Remaining(n) => format!("Starting in {}", n),
        CountdownStep::Go => "GO!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_second_countdown() {
        let mut countdown = Countdown::new(3);

        assert_eq!(countdown.tick(), Some(CountdownStep::Remaining(3)));
        assert_eq!(countdown.tick(), Some(CountdownStep::Remaining(2)));
        assert_eq!(countdown.tick(), Some(CountdownStep::Remaining(1)));
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_finished());

        assert_eq!(countdown.tick(), Some(CountdownStep::Go));
        assert!(countdown.is_finished());
        assert_eq!(countdown.tick(), None);
    }

    #[test]
    fn test_zero_length_goes_immediately() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), Some(CountdownStep::Go));
        assert_eq!(countdown.tick(), None);
    }

    #[test]
    fn test_countdown_text() {
        assert_eq!(countdown_text(CountdownStep::Remaining(2)), "Starting in 2");
        assert_eq!(countdown_text(CountdownStep::Go), "GO!");
    }
}
