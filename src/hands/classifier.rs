/// Thresholds for turning a pinch distance into a gesture signal.
///
/// The gap between `pinch_close` and `open_release` is a dead zone:
/// distances inside it report `Neutral`, so a hand drifting near one
/// threshold cannot flicker between grab and release.
#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    /// Below this the thumb and index finger count as touching.
    pub pinch_close: f32,
    /// Above this the hand counts as fully open.
    pub open_release: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_close: 0.05,
            open_release: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSignal {
    Pinched,
    Open,
    /// Inside the dead zone; drives no lifecycle transition.
    Neutral,
}

pub fn classify(pinch_distance: f32, config: &GestureConfig) -> GestureSignal {
    if pinch_distance < config.pinch_close {
        GestureSignal::Pinched
    } else if pinch_distance > config.open_release {
        GestureSignal::Open
    } else {
        GestureSignal::Neutral
    }
}
