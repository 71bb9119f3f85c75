use snake_hazards_core::{
    check_non_negative, CellCoord, DifficultyTuning, MovementPattern, TuningError,
};

/// Shortest lifetime, in seconds, assigned to generated obstacles by default.
pub const DEFAULT_MIN_LIFETIME_SECS: f32 = 5.0;

/// Longest lifetime, in seconds, assigned to generated obstacles by default.
pub const DEFAULT_MAX_LIFETIME_SECS: f32 = 15.0;

/// Placement attempts per obstacle before it is skipped, by default.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Description of one batch of obstacles to generate.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Number of static obstacles to place.
    pub static_count: usize,
    /// Number of moving obstacles to place.
    pub moving_count: usize,
    /// Cells no generated obstacle may occupy.
    pub forbidden: Vec<CellCoord>,
    /// Patterns to draw from for moving obstacles; empty means the basic set.
    pub preferred_patterns: Vec<MovementPattern>,
    /// Lower bound of the uniformly drawn lifetime in seconds.
    pub min_lifetime: f32,
    /// Upper bound of the uniformly drawn lifetime in seconds.
    pub max_lifetime: f32,
    /// Placement attempts per obstacle.
    pub max_retries: u32,
    /// Speed assigned to generated moving obstacles.
    pub moving_speed: f32,
}

impl GenerationConfig {
    /// Creates a request for the given counts with every other field defaulted.
    #[must_use]
    pub fn with_counts(static_count: usize, moving_count: usize) -> Self {
        Self {
            static_count,
            moving_count,
            ..Self::default()
        }
    }

    /// Total number of obstacles requested.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.static_count.saturating_add(self.moving_count)
    }

    /// Checks lifetimes and speed for values the generator cannot sample.
    pub fn validate(&self) -> Result<(), TuningError> {
        check_non_negative("min_lifetime", self.min_lifetime)?;
        check_non_negative("max_lifetime", self.max_lifetime)?;
        check_non_negative("moving_speed", self.moving_speed)?;
        if self.min_lifetime > self.max_lifetime {
            return Err(TuningError::InvertedRange {
                field: "lifetime",
                min: self.min_lifetime,
                max: self.max_lifetime,
            });
        }
        Ok(())
    }

    pub(crate) fn pattern_pool(&self) -> &[MovementPattern] {
        if self.preferred_patterns.is_empty() {
            &MovementPattern::BASIC
        } else {
            &self.preferred_patterns
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            static_count: 0,
            moving_count: 0,
            forbidden: Vec::new(),
            preferred_patterns: Vec::new(),
            min_lifetime: DEFAULT_MIN_LIFETIME_SECS,
            max_lifetime: DEFAULT_MAX_LIFETIME_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            moving_speed: DifficultyTuning::default().initial_speed,
        }
    }
}
