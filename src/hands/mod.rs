mod classifier;
mod landmarks;
mod touch;

pub use classifier::{classify, GestureConfig, GestureSignal};
pub use landmarks::{
    distance, HandFrame, HandLandmarks, Handedness, Landmark, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP,
};
pub use touch::{TouchFeedback, TouchFeedbackConfig};
