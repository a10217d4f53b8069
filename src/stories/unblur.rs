use std::time::Duration;

/// Mean loudness of a byte-frequency spectrum, normalized to 0..=1.
pub fn normalized_level(samples: &[u8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u32 = samples.iter().map(|&sample| u32::from(sample)).sum();
    (sum as f32 / samples.len() as f32) / 255.0
}

/// Estimated time to read a story aloud at the given pace.
pub fn reading_duration(story: &str, words_per_minute: u32) -> Duration {
    let words = story.split_whitespace().count();
    if words == 0 || words_per_minute == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(words as f64 * 60.0 / f64::from(words_per_minute))
}

#[derive(Debug, Clone, Copy)]
pub struct UnblurConfig {
    /// Blur radius a freshly activated story starts at.
    pub initial_blur: f32,
    /// Levels at or below this are ambient noise and change nothing.
    pub loudness_floor: f32,
    /// Blur removed per unit of loudness above the floor.
    pub unblur_gain: f32,
    /// Pace used to size the silent reading fade.
    pub reading_wpm: u32,
}

impl Default for UnblurConfig {
    fn default() -> Self {
        Self {
            initial_blur: 20.0,
            loudness_floor: 0.1,
            unblur_gain: 0.5,
            reading_wpm: 200,
        }
    }
}

/// Blur state for the active story.
///
/// Speaking into the microphone clears it fastest; the reading fade
/// clears it linearly over the story's estimated reading time when the
/// room stays quiet.
#[derive(Debug, Clone)]
pub struct StoryReveal {
    config: UnblurConfig,
    blur: f32,
}

impl StoryReveal {
    pub fn new(config: UnblurConfig) -> Self {
        Self {
            config,
            blur: config.initial_blur,
        }
    }

    pub fn blur(&self) -> f32 {
        self.blur
    }

    pub fn is_clear(&self) -> bool {
        self.blur <= 0.0
    }

    pub fn reset(&mut self) {
        self.blur = self.config.initial_blur;
    }

    /// Apply one loudness reading. Returns true when the blur moved.
    pub fn on_loudness(&mut self, level: f32) -> bool {
        if level <= self.config.loudness_floor {
            return false;
        }
        self.fade_by(level * self.config.unblur_gain)
    }

    /// Remove `amount` of blur, clamped at fully clear.
    pub fn fade_by(&mut self, amount: f32) -> bool {
        if amount <= 0.0 || self.blur <= 0.0 {
            return false;
        }
        self.blur = (self.blur - amount).max(0.0);
        true
    }

    /// Blur to shed per `tick` so a silent viewer finishes exactly when
    /// they finish reading. A story with no words clears at once.
    pub fn reading_fade_step(&self, tick: Duration, story: &str) -> f32 {
        let total = reading_duration(story, self.config.reading_wpm);
        if total.is_zero() {
            return self.config.initial_blur;
        }
        self.config.initial_blur * (tick.as_secs_f32() / total.as_secs_f32())
    }
}

#[derive(Debug, Clone)]
pub struct StoryCard {
    pub image: String,
    pub story: String,
}

impl StoryCard {
    pub fn new(image: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            story: story.into(),
        }
    }
}

/// The wall of story cards; at most one is active and revealing.
#[derive(Debug, Clone)]
pub struct StoryDeck {
    cards: Vec<StoryCard>,
    active: Option<usize>,
    reveal: StoryReveal,
}

impl StoryDeck {
    pub fn new(cards: Vec<StoryCard>, config: UnblurConfig) -> Self {
        Self {
            cards,
            active: None,
            reveal: StoryReveal::new(config),
        }
    }

    /// Activate a card. Re-activating the current card is a no-op so
    /// an excited double-tap cannot re-blur progress; switching cards
    /// starts the new one fully blurred.
    pub fn activate(&mut self, index: usize) -> bool {
        if index >= self.cards.len() || self.active == Some(index) {
            return false;
        }
        self.active = Some(index);
        self.reveal.reset();
        true
    }

    pub fn active_card(&self) -> Option<&StoryCard> {
        self.active.map(|index| &self.cards[index])
    }

    pub fn blur(&self) -> f32 {
        self.reveal.blur()
    }

    pub fn on_loudness(&mut self, level: f32) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.reveal.on_loudness(level)
    }

    pub fn reveal(&self) -> &StoryReveal {
        &self.reveal
    }
}
