use std::time::Duration;

use snake_hazards_core::DifficultyTuning;

/// Spawn timer and difficulty state driven by the simulation thread.
#[derive(Clone, Debug)]
pub struct SpawnSchedule {
    tuning: DifficultyTuning,
    difficulty_level: u32,
    spawn_rate: f32,
    moving_speed: f32,
    accumulator: Duration,
}

impl SpawnSchedule {
    /// Creates a schedule at the tuning's initial spawn rate and speed.
    #[must_use]
    pub fn new(tuning: DifficultyTuning) -> Self {
        Self {
            tuning,
            difficulty_level: 0,
            spawn_rate: tuning.initial_spawn_rate,
            moving_speed: tuning.initial_speed,
            accumulator: Duration::ZERO,
        }
    }

    /// Level most recently applied through [`SpawnSchedule::set_difficulty_level`].
    #[must_use]
    pub const fn difficulty_level(&self) -> u32 {
        self.difficulty_level
    }

    /// Obstacles spawned per second.
    #[must_use]
    pub const fn spawn_rate(&self) -> f32 {
        self.spawn_rate
    }

    /// Speed handed to newly created moving obstacles.
    #[must_use]
    pub const fn moving_speed(&self) -> f32 {
        self.moving_speed
    }

    /// Time accumulated toward the next spawn.
    #[must_use]
    pub const fn accumulated(&self) -> Duration {
        self.accumulator
    }

    /// Recomputes spawn rate and speed from the difficulty curve.
    ///
    /// Returns the new moving speed so callers can apply it to live obstacles.
    pub fn set_difficulty_level(&mut self, level: u32) -> f32 {
        self.difficulty_level = level;
        self.spawn_rate = self.tuning.spawn_rate_for(level);
        self.moving_speed = self.tuning.speed_for(level);
        log::debug!(
            "difficulty {level}: spawn rate {:.2}/s, moving speed {:.3}",
            self.spawn_rate,
            self.moving_speed
        );
        self.moving_speed
    }

    /// Overrides the spawn rate.
    pub fn set_spawn_rate(&mut self, rate: f32) {
        self.spawn_rate = rate;
    }

    /// Overrides the speed of future moving obstacles.
    pub fn set_moving_speed(&mut self, speed: f32) {
        self.moving_speed = speed;
    }

    /// Accumulates elapsed time and reports whether a spawn is due.
    ///
    /// The timer resets to zero whenever a spawn fires, so at most one spawn
    /// is reported per call. A non-positive or non-finite rate never spawns.
    pub fn should_spawn(&mut self, elapsed: Duration) -> bool {
        let Some(interval) = self.spawn_interval() else {
            return false;
        };

        self.accumulator = self.accumulator.saturating_add(elapsed);
        if self.accumulator >= interval {
            self.accumulator = Duration::ZERO;
            return true;
        }
        false
    }

    fn spawn_interval(&self) -> Option<Duration> {
        if !self.spawn_rate.is_finite() || self.spawn_rate <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f32(self.spawn_rate.recip()).ok()
    }
}

impl Default for SpawnSchedule {
    fn default() -> Self {
        Self::new(DifficultyTuning::default())
    }
}
