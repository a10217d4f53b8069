use serde::Deserialize;

/// Landmarks per tracked hand as reported by the tracker.
pub const LANDMARK_COUNT: usize = 21;

/// Index of the thumb tip in a landmark set.
pub const THUMB_TIP: usize = 4;

/// Index of the index-finger tip in a landmark set.
pub const INDEX_TIP: usize = 8;

/// A single landmark in normalized tracker coordinates.
///
/// Trackers that only report 2D leave `z` out; it defaults to the
/// camera plane.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

pub fn distance(a: Landmark, b: Landmark) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// One tracked hand: its reported side plus the full landmark set.
#[derive(Debug, Clone, Deserialize)]
pub struct HandLandmarks {
    pub handedness: Handedness,
    pub points: Vec<Landmark>,
}

impl HandLandmarks {
    /// Thumb-tip to index-tip distance, the raw pinch measure.
    ///
    /// Returns `None` when the tracker delivered a truncated or padded
    /// landmark set; such hands produce no gesture signal at all.
    pub fn pinch_distance(&self) -> Option<f32> {
        if self.points.len() != LANDMARK_COUNT {
            return None;
        }
        Some(distance(self.points[THUMB_TIP], self.points[INDEX_TIP]))
    }

    /// Index fingertip position, with the same truncation guard.
    pub fn index_tip(&self) -> Option<Landmark> {
        if self.points.len() != LANDMARK_COUNT {
            return None;
        }
        Some(self.points[INDEX_TIP])
    }

    /// Synthetic hand with a chosen pinch gap, for demos and tests.
    pub fn with_pinch(handedness: Handedness, gap: f32) -> Self {
        let mut points = vec![Landmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
        points[INDEX_TIP] = Landmark::new(gap, 0.0, 0.0);
        Self { handedness, points }
    }

    /// Synthetic hand with the index tip at a chosen point.
    pub fn with_index_at(handedness: Handedness, x: f32, y: f32) -> Self {
        let mut points = vec![Landmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
        points[INDEX_TIP] = Landmark::new(x, y, 0.0);
        Self { handedness, points }
    }
}

/// Everything the tracker saw in one camera frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandFrame {
    pub hands: Vec<HandLandmarks>,
}

impl HandFrame {
    pub fn hand(&self, handedness: Handedness) -> Option<&HandLandmarks> {
        self.hands.iter().find(|h| h.handedness == handedness)
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean_3d() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(1.0, 2.0, 2.0);
        assert!((distance(a, b) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn pinch_distance_matches_synthetic_gap() {
        let hand = HandLandmarks::with_pinch(Handedness::Right, 0.2);
        let gap = hand.pinch_distance().unwrap();
        assert!((gap - 0.2).abs() < 1e-6);
    }

    #[test]
    fn truncated_landmark_set_yields_no_distance() {
        let hand = HandLandmarks {
            handedness: Handedness::Right,
            points: vec![Landmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT - 1],
        };
        assert!(hand.pinch_distance().is_none());
        assert!(hand.index_tip().is_none());
    }

    #[test]
    fn index_tip_reads_the_placed_point() {
        let hand = HandLandmarks::with_index_at(Handedness::Left, 0.5, 0.25);
        let tip = hand.index_tip().unwrap();
        assert_eq!((tip.x, tip.y, tip.z), (0.5, 0.25, 0.0));
    }

    #[test]
    fn frame_finds_hand_by_side() {
        let frame = HandFrame {
            hands: vec![
                HandLandmarks::with_pinch(Handedness::Left, 0.3),
                HandLandmarks::with_pinch(Handedness::Right, 0.01),
            ],
        };
        assert!(frame.hand(Handedness::Right).is_some());
        assert!(frame.hand(Handedness::Left).is_some());
        assert!(!frame.is_empty());
    }

    #[test]
    fn landmark_z_defaults_when_absent() {
        let lm: Landmark = serde_json::from_str(r#"{"x": 0.5, "y": 0.25}"#).unwrap();
        assert_eq!(lm.z, 0.0);
        assert_eq!(lm.x, 0.5);
    }
}
