mod unblur;

pub use unblur::{
    normalized_level, reading_duration, StoryCard, StoryDeck, StoryReveal, UnblurConfig,
};
