use std::time::Duration;

use snake_hazards_core::{
    CellCoord, CellRect, DifficultyTuning, GridSize, LifetimeDefaults, MovementPattern,
    ObstacleKind, ObstacleView, PlayerView, TuningError,
};

use crate::{obstacle::Obstacle, population::Population, schedule::SpawnSchedule, spawner::Spawner};

/// Configuration parameters shared by both population managers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManagerConfig {
    lifetimes: LifetimeDefaults,
    tuning: DifficultyTuning,
    seed: u64,
}

impl ManagerConfig {
    /// Creates a configuration with default lifetimes and tuning.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            lifetimes: LifetimeDefaults::default(),
            tuning: DifficultyTuning::default(),
            seed,
        }
    }

    /// Replaces the default lifetimes after validating them.
    pub fn with_lifetimes(mut self, lifetimes: LifetimeDefaults) -> Result<Self, TuningError> {
        lifetimes.validate()?;
        self.lifetimes = lifetimes;
        Ok(self)
    }

    /// Replaces the difficulty tuning after validating it.
    pub fn with_tuning(mut self, tuning: DifficultyTuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        self.tuning = tuning;
        Ok(self)
    }

    /// Default lifetimes for new obstacles.
    #[must_use]
    pub const fn lifetimes(&self) -> LifetimeDefaults {
        self.lifetimes
    }

    /// Difficulty curve coefficients.
    #[must_use]
    pub const fn tuning(&self) -> DifficultyTuning {
        self.tuning
    }

    /// Seed of the spawn generator.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Splits the configuration into the simulation-thread spawn state.
    #[must_use]
    pub fn into_parts(self) -> (SpawnSchedule, Spawner) {
        (
            SpawnSchedule::new(self.tuning),
            Spawner::new(self.seed, self.lifetimes),
        )
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Single-threaded owner of the obstacle population.
///
/// Every operation takes the manager by reference for its whole duration, so
/// each call observes one consistent collection.
#[derive(Debug)]
pub struct ObstacleManager {
    population: Population,
    schedule: SpawnSchedule,
    spawner: Spawner,
}

impl ObstacleManager {
    /// Creates an empty manager with default configuration and the provided seed.
    #[must_use]
    pub fn new(grid: GridSize, seed: u64) -> Self {
        Self::with_config(grid, ManagerConfig::new(seed))
    }

    /// Creates an empty manager from an explicit configuration.
    #[must_use]
    pub fn with_config(grid: GridSize, config: ManagerConfig) -> Self {
        let (schedule, spawner) = config.into_parts();
        Self {
            population: Population::new(grid),
            schedule,
            spawner,
        }
    }

    /// Bounds of the managed grid.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.population.grid()
    }

    /// Adds a static obstacle with the default lifetime.
    pub fn add_fixed_obstacle(&mut self, cell: CellCoord) -> bool {
        let lifetime = self.spawner.lifetimes().static_secs;
        self.add_fixed_obstacle_with_lifetime(cell, lifetime)
    }

    /// Adds a static obstacle if the cell is in bounds and free.
    pub fn add_fixed_obstacle_with_lifetime(
        &mut self,
        cell: CellCoord,
        lifetime_secs: f32,
    ) -> bool {
        let grid = self.grid();
        self.population.insert(Obstacle::fixed(cell, grid, lifetime_secs))
    }

    /// Adds a moving obstacle with the default lifetime.
    pub fn add_moving_obstacle(&mut self, cell: CellCoord, pattern: MovementPattern) -> bool {
        let lifetime = self.spawner.lifetimes().moving_secs;
        self.add_moving_obstacle_with_lifetime(cell, pattern, lifetime)
    }

    /// Adds a moving obstacle at the current moving speed if the cell is in bounds and free.
    pub fn add_moving_obstacle_with_lifetime(
        &mut self,
        cell: CellCoord,
        pattern: MovementPattern,
        lifetime_secs: f32,
    ) -> bool {
        let grid = self.grid();
        let seed = self.spawner.motion_seed();
        let speed = self.schedule.moving_speed();
        self.population.insert(Obstacle::moving(
            cell,
            grid,
            pattern,
            speed,
            lifetime_secs,
            seed,
        ))
    }

    /// Attempts a single random spawn.
    ///
    /// The cell is drawn once; if it is taken the spawn is abandoned. Returns
    /// the kind of the obstacle that was added.
    pub fn spawn_random_obstacle(&mut self) -> Option<ObstacleKind> {
        let grid = self.grid();
        let speed = self.schedule.moving_speed();
        let candidate = self.spawner.roll(grid, speed)?;
        let kind = candidate.kind();
        self.population.insert(candidate).then_some(kind)
    }

    /// Commits a pre-generated batch, skipping obstacles whose cell is taken.
    ///
    /// Returns the number of obstacles added.
    pub fn insert_batch<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = Obstacle>,
    {
        self.population.insert_batch(batch)
    }

    /// Removes expired obstacles and returns how many were removed.
    pub fn clear_expired_obstacles(&mut self) -> usize {
        self.population.sweep_expired()
    }

    /// Removes every obstacle.
    pub fn clear_all_obstacles(&mut self) {
        self.population.clear();
    }

    /// Advances every obstacle by one tick.
    pub fn update_obstacle_movement(&self) {
        self.population.update_movement();
    }

    /// Subtracts the elapsed time from every obstacle's lifetime.
    pub fn update_obstacle_lifetimes(&self, elapsed: Duration) {
        self.population.decay(elapsed);
    }

    /// Reports whether any obstacle occupies the cell.
    #[must_use]
    pub fn check_collision_with_point(&self, cell: CellCoord) -> bool {
        self.population.is_occupied(cell)
    }

    /// Reports whether any obstacle lies inside the rectangle.
    #[must_use]
    pub fn check_collision_with_rect(&self, rect: CellRect) -> bool {
        self.population.intersects_rect(rect)
    }

    /// Reports whether the player's head shares a cell with an obstacle.
    #[must_use]
    pub fn check_collision_with_player<P>(&self, player: &P) -> bool
    where
        P: PlayerView + ?Sized,
    {
        self.check_collision_with_point(player.head())
    }

    /// Reports whether food may be placed on the cell.
    #[must_use]
    pub fn is_valid_food_position(&self, cell: CellCoord) -> bool {
        !self.check_collision_with_point(cell)
    }

    /// Applies a difficulty level to the spawn rate and every moving speed.
    pub fn set_difficulty_level(&mut self, level: u32) {
        let speed = self.schedule.set_difficulty_level(level);
        self.population.set_moving_speed(speed);
    }

    /// Overrides the spawn rate in obstacles per second.
    pub fn set_spawn_rate(&mut self, rate: f32) {
        self.schedule.set_spawn_rate(rate);
    }

    /// Overrides the moving speed for new and live moving obstacles.
    pub fn set_moving_obstacle_speed(&mut self, speed: f32) {
        self.schedule.set_moving_speed(speed);
        self.population.set_moving_speed(speed);
    }

    /// Accumulates elapsed time and reports whether a spawn is due.
    pub fn should_spawn_obstacle(&mut self, elapsed: Duration) -> bool {
        self.schedule.should_spawn(elapsed)
    }

    /// Number of live obstacles.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.population.len()
    }

    /// Number of live static obstacles.
    #[must_use]
    pub fn fixed_obstacle_count(&self) -> usize {
        self.population.count_of(ObstacleKind::Static)
    }

    /// Number of live moving obstacles.
    #[must_use]
    pub fn moving_obstacle_count(&self) -> usize {
        self.population.count_of(ObstacleKind::Moving)
    }

    /// Snapshot of every obstacle for rendering.
    #[must_use]
    pub fn snapshots(&self) -> ObstacleView {
        self.population.view()
    }

    /// Most recently applied difficulty level.
    #[must_use]
    pub const fn difficulty_level(&self) -> u32 {
        self.schedule.difficulty_level()
    }

    /// Current spawn rate in obstacles per second.
    #[must_use]
    pub const fn spawn_rate(&self) -> f32 {
        self.schedule.spawn_rate()
    }

    /// Speed handed to new moving obstacles.
    #[must_use]
    pub const fn moving_obstacle_speed(&self) -> f32 {
        self.schedule.moving_speed()
    }

    /// Read-only access to the underlying population.
    #[must_use]
    pub const fn population(&self) -> &Population {
        &self.population
    }
}
