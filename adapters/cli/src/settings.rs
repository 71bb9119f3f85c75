use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use snake_hazards_core::{DifficultyTuning, GridSize, LifetimeDefaults, MovementPattern};
use snake_hazards_system_generation::{
    GenerationConfig, DEFAULT_MAX_LIFETIME_SECS, DEFAULT_MAX_RETRIES, DEFAULT_MIN_LIFETIME_SECS,
    DEFAULT_POOL_SIZE, DEFAULT_SAFETY_MARGIN,
};
use snake_hazards_system_lifetime::LifetimeWorkerConfig;
use snake_hazards_world::ManagerConfig;

use crate::args::CliArgs;

/// Smallest grid edge that still leaves room for the snake's inset loop.
const MIN_GRID_EDGE: u32 = 4;

/// Complete run configuration, loaded from TOML and overridden by flags.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) grid: GridSettings,
    pub(crate) run: RunSettings,
    pub(crate) prepopulate: PrepopulateSettings,
    pub(crate) lifetimes: LifetimeDefaults,
    pub(crate) difficulty: DifficultyTuning,
    pub(crate) worker: WorkerSettings,
    pub(crate) generator: GeneratorSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSettings {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            columns: 24,
            rows: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunSettings {
    pub(crate) ticks: u64,
    pub(crate) tick_ms: u64,
    pub(crate) difficulty: u32,
    pub(crate) seed: u64,
    pub(crate) realtime: bool,
    pub(crate) snake_length: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            ticks: 600,
            tick_ms: 50,
            difficulty: 1,
            seed: 1,
            realtime: false,
            snake_length: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PrepopulateSettings {
    pub(crate) static_obstacles: usize,
    pub(crate) moving_obstacles: usize,
}

impl Default for PrepopulateSettings {
    fn default() -> Self {
        Self {
            static_obstacles: 6,
            moving_obstacles: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorkerSettings {
    pub(crate) decay_ms: u64,
    pub(crate) sweep_ms: u64,
    pub(crate) sweep_lock_timeout_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        let defaults = LifetimeWorkerConfig::default();
        Self {
            decay_ms: duration_ms(defaults.decay_interval()),
            sweep_ms: duration_ms(defaults.sweep_interval()),
            sweep_lock_timeout_ms: duration_ms(defaults.sweep_lock_timeout()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GeneratorSettings {
    pub(crate) pool_size: usize,
    pub(crate) safety_margin: u32,
    pub(crate) min_lifetime: f32,
    pub(crate) max_lifetime: f32,
    pub(crate) max_retries: u32,
    pub(crate) preferred_patterns: Vec<MovementPattern>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            min_lifetime: DEFAULT_MIN_LIFETIME_SECS,
            max_lifetime: DEFAULT_MAX_LIFETIME_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            preferred_patterns: Vec::new(),
        }
    }
}

impl Settings {
    /// Builds the settings for a run: file first, then flags, then validation.
    pub(crate) fn resolve(args: &CliArgs) -> Result<Self> {
        let mut settings = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply(args);
        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid settings file at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse settings toml contents")
    }

    fn apply(&mut self, args: &CliArgs) {
        if let Some(columns) = args.columns {
            self.grid.columns = columns;
        }
        if let Some(rows) = args.rows {
            self.grid.rows = rows;
        }
        if let Some(ticks) = args.ticks {
            self.run.ticks = ticks;
        }
        if let Some(tick_ms) = args.tick_ms {
            self.run.tick_ms = tick_ms;
        }
        if let Some(difficulty) = args.difficulty {
            self.run.difficulty = difficulty;
        }
        if let Some(seed) = args.seed {
            self.run.seed = seed;
        }
        if let Some(count) = args.prepopulate_static {
            self.prepopulate.static_obstacles = count;
        }
        if let Some(count) = args.prepopulate_moving {
            self.prepopulate.moving_obstacles = count;
        }
        self.run.realtime |= args.realtime;
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.grid.columns < MIN_GRID_EDGE || self.grid.rows < MIN_GRID_EDGE {
            bail!(
                "grid must be at least {MIN_GRID_EDGE}x{MIN_GRID_EDGE}, got {}x{}",
                self.grid.columns,
                self.grid.rows
            );
        }
        if self.run.tick_ms == 0 {
            bail!("tick_ms must be positive");
        }
        if self.run.snake_length == 0 {
            bail!("snake_length must be at least 1");
        }
        let _ = self.manager_config()?;
        let _ = self.worker_config()?;
        self.generation_template()
            .validate()
            .context("invalid generator settings")?;
        Ok(())
    }

    pub(crate) const fn grid(&self) -> GridSize {
        GridSize::new(self.grid.columns, self.grid.rows)
    }

    pub(crate) const fn tick(&self) -> Duration {
        Duration::from_millis(self.run.tick_ms)
    }

    pub(crate) fn manager_config(&self) -> Result<ManagerConfig> {
        ManagerConfig::new(self.run.seed)
            .with_lifetimes(self.lifetimes)
            .context("invalid lifetime settings")?
            .with_tuning(self.difficulty)
            .context("invalid difficulty settings")
    }

    pub(crate) fn worker_config(&self) -> Result<LifetimeWorkerConfig> {
        LifetimeWorkerConfig::new(
            Duration::from_millis(self.worker.decay_ms),
            Duration::from_millis(self.worker.sweep_ms),
            Duration::from_millis(self.worker.sweep_lock_timeout_ms),
        )
        .context("invalid worker settings")
    }

    /// Generation request for one round of pre-population, minus forbidden cells.
    pub(crate) fn generation_template(&self) -> GenerationConfig {
        GenerationConfig {
            preferred_patterns: self.generator.preferred_patterns.clone(),
            min_lifetime: self.generator.min_lifetime,
            max_lifetime: self.generator.max_lifetime,
            max_retries: self.generator.max_retries,
            moving_speed: self.difficulty.speed_for(self.run.difficulty),
            ..GenerationConfig::with_counts(
                self.prepopulate.static_obstacles,
                self.prepopulate.moving_obstacles,
            )
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
