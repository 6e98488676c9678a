//! Phase duration configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How long each phase of the game runs.
///
/// Injected per room at creation, so different rooms can play at
/// different speeds. The discussion window is the first part of each
/// day; voting opens when it elapses and stays open for the rest of
/// the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Length of the night phase.
    pub night: Duration,

    /// Length of the whole day phase (discussion + voting).
    pub day: Duration,

    /// Length of the discussion window at the start of each day.
    /// Must be shorter than `day`.
    pub discussion: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            night: Duration::from_secs(30),
            day: Duration::from_secs(90),
            discussion: Duration::from_secs(45),
        }
    }
}

impl GameConfig {
    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically when a room is spawned. A discussion window
    /// at or beyond the day length would leave no time to vote, so it
    /// is clamped to half the day.
    pub fn validated(mut self) -> Self {
        if self.discussion >= self.day {
            warn!(
                discussion_ms = self.discussion.as_millis(),
                day_ms = self.day.as_millis(),
                "discussion window exceeds day length, clamping to day/2"
            );
            self.discussion = self.day / 2;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_leaves_time_to_vote() {
        let cfg = GameConfig::default();
        assert!(cfg.discussion < cfg.day);
    }

    #[test]
    fn test_validated_clamps_oversized_discussion() {
        let cfg = GameConfig {
            night: Duration::from_secs(10),
            day: Duration::from_secs(20),
            discussion: Duration::from_secs(20),
        }
        .validated();
        assert_eq!(cfg.discussion, Duration::from_secs(10));
    }

    #[test]
    fn test_validated_keeps_sane_config() {
        let cfg = GameConfig::default().validated();
        assert_eq!(cfg.discussion, GameConfig::default().discussion);
    }
}
