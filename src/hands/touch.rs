use std::time::{Duration, Instant};

use super::landmarks::{distance, Landmark};

/// Tuning for the left-hand touch pulse.
#[derive(Debug, Clone, Copy)]
pub struct TouchFeedbackConfig {
    /// Where the touchable object sits, in normalized coordinates.
    pub target: Landmark,
    /// Index-tip distances to the target below this count as a touch.
    pub trigger_radius: f32,
    /// Minimum spacing between pulses while the touch is held.
    pub cooldown: Duration,
}

impl Default for TouchFeedbackConfig {
    fn default() -> Self {
        Self {
            target: Landmark::new(0.5, 0.5, 0.0),
            trigger_radius: 0.1,
            cooldown: Duration::from_millis(500),
        }
    }
}

/// Rate-limited touch detector.
///
/// A held touch keeps pulsing at the cooldown rate rather than firing
/// once, matching the repeating color feedback on the left hand.
#[derive(Debug)]
pub struct TouchFeedback {
    config: TouchFeedbackConfig,
    last_pulse: Option<Instant>,
}

impl TouchFeedback {
    pub fn new(config: TouchFeedbackConfig) -> Self {
        Self {
            config,
            last_pulse: None,
        }
    }

    /// Returns true when this index-tip observation should emit a pulse.
    pub fn observe(&mut self, index_tip: Landmark, now: Instant) -> bool {
        if distance(index_tip, self.config.target) >= self.config.trigger_radius {
            return false;
        }
        if !self.cooldown_elapsed(now) {
            return false;
        }
        self.last_pulse = Some(now);
        true
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_pulse {
            Some(last) => now.duration_since(last) >= self.config.cooldown,
            None => true,
        }
    }
}
