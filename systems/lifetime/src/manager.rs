use std::{
    io,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};

use snake_hazards_core::{
    CellCoord, CellRect, GridSize, MovementPattern, ObstacleKind, ObstacleView, PlayerView,
};
use snake_hazards_world::{ManagerConfig, Obstacle, Population, SpawnSchedule, Spawner};
use thiserror::Error;

use crate::{
    config::LifetimeWorkerConfig,
    metrics::{LifetimeStats, LockMetrics},
    sweep::{sweep_with_timeout, SweepTask},
    worker::LifetimeWorker,
};

/// Reasons the lifetime worker could not be started.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The operating system refused to create the worker thread.
    #[error("failed to spawn the lifetime worker thread")]
    Spawn(#[from] io::Error),
}

/// Obstacle manager whose lifetimes decay on a background worker.
///
/// The population sits behind a reader-writer lock. Movement, collision
/// queries and lifetime decay share it; insertions, spawns, clears and
/// sweeps take it exclusively. Spawn scheduling stays on the simulation
/// thread and is never touched by the worker.
#[derive(Debug)]
pub struct ConcurrentObstacleManager {
    population: Arc<RwLock<Population>>,
    grid: GridSize,
    schedule: SpawnSchedule,
    spawner: Spawner,
    worker_config: LifetimeWorkerConfig,
    metrics: Arc<LockMetrics>,
    worker: Option<LifetimeWorker>,
}

impl ConcurrentObstacleManager {
    /// Creates a manager with default configuration. The worker is not started.
    #[must_use]
    pub fn new(grid: GridSize, seed: u64) -> Self {
        Self::with_config(grid, ManagerConfig::new(seed), LifetimeWorkerConfig::default())
    }

    /// Creates a manager from explicit configuration. The worker is not started.
    #[must_use]
    pub fn with_config(
        grid: GridSize,
        config: ManagerConfig,
        worker_config: LifetimeWorkerConfig,
    ) -> Self {
        let (schedule, spawner) = config.into_parts();
        Self {
            population: Arc::new(RwLock::new(Population::new(grid))),
            grid,
            schedule,
            spawner,
            worker_config,
            metrics: Arc::new(LockMetrics::new()),
            worker: None,
        }
    }

    /// Bounds of the managed grid.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Starts the lifetime worker. Calling it while the worker runs does nothing.
    pub fn start_lifetime_thread(&mut self) -> Result<(), WorkerError> {
        if self.worker.is_some() {
            return Ok(());
        }
        let worker = LifetimeWorker::spawn(
            Arc::clone(&self.population),
            self.worker_config,
            Arc::clone(&self.metrics),
        )?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Stops and joins the lifetime worker. Calling it while stopped does nothing.
    pub fn stop_lifetime_thread(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }

    /// Reports whether the lifetime worker is running.
    #[must_use]
    pub const fn is_lifetime_thread_running(&self) -> bool {
        self.worker.is_some()
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
        let obstacle = Obstacle::fixed(cell, self.grid, lifetime_secs);
        self.write("add_fixed").insert(obstacle)
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
        let seed = self.spawner.motion_seed();
        let obstacle = Obstacle::moving(
            cell,
            self.grid,
            pattern,
            self.schedule.moving_speed(),
            lifetime_secs,
            seed,
        );
        self.write("add_moving").insert(obstacle)
    }

    /// Attempts a single random spawn without retrying occupied cells.
    pub fn spawn_random_obstacle(&mut self) -> Option<ObstacleKind> {
        let speed = self.schedule.moving_speed();
        let candidate = self.spawner.roll(self.grid, speed)?;
        let kind = candidate.kind();
        self.write("spawn").insert(candidate).then_some(kind)
    }

    /// Commits a pre-generated batch, skipping obstacles whose cell is taken.
    pub fn insert_batch<I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = Obstacle>,
    {
        self.write("insert_batch").insert_batch(batch)
    }

    /// Removes expired obstacles, blocking until the exclusive lock is available.
    pub fn cleanup_expired(&self) -> usize {
        let removed = self.write("cleanup").sweep_expired();
        self.metrics.record_sweep(removed);
        removed
    }

    /// Same as [`ConcurrentObstacleManager::cleanup_expired`].
    pub fn clear_expired_obstacles(&self) -> usize {
        self.cleanup_expired()
    }

    /// Removes expired obstacles on a separate thread.
    ///
    /// The sweep gives up after the configured lock timeout and removes
    /// nothing in that case.
    pub fn cleanup_expired_async(&self) -> SweepTask {
        SweepTask::spawn(
            Arc::clone(&self.population),
            self.worker_config.sweep_lock_timeout(),
            Arc::clone(&self.metrics),
        )
    }

    /// Runs one sweep on the calling thread, deferring after the lock timeout.
    pub fn try_cleanup_expired(&self) -> usize {
        sweep_with_timeout(
            &self.population,
            self.worker_config.sweep_lock_timeout(),
            &self.metrics,
        )
    }

    /// Removes every obstacle.
    pub fn clear_all_obstacles(&self) {
        self.write("clear_all").clear();
    }

    /// Advances every obstacle by one tick under the shared lock.
    pub fn update_obstacle_movement(&self) {
        self.read("movement").update_movement();
    }

    /// Subtracts the elapsed time from every lifetime under the shared lock.
    pub fn update_obstacle_lifetimes(&self, elapsed: Duration) {
        self.read("decay").decay(elapsed);
    }

    /// Reports whether any obstacle occupies the cell.
    #[must_use]
    pub fn check_collision_with_point(&self, cell: CellCoord) -> bool {
        self.read("collision").is_occupied(cell)
    }

    /// Reports whether any obstacle lies inside the rectangle.
    #[must_use]
    pub fn check_collision_with_rect(&self, rect: CellRect) -> bool {
        self.read("collision").intersects_rect(rect)
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
        self.read("difficulty").set_moving_speed(speed);
    }

    /// Overrides the spawn rate in obstacles per second.
    pub fn set_spawn_rate(&mut self, rate: f32) {
        self.schedule.set_spawn_rate(rate);
    }

    /// Overrides the moving speed for new and live moving obstacles.
    pub fn set_moving_obstacle_speed(&mut self, speed: f32) {
        self.schedule.set_moving_speed(speed);
        self.read("speed").set_moving_speed(speed);
    }

    /// Accumulates elapsed time and reports whether a spawn is due.
    pub fn should_spawn_obstacle(&mut self, elapsed: Duration) -> bool {
        self.schedule.should_spawn(elapsed)
    }

    /// Number of live obstacles.
    #[must_use]
    pub fn obstacle_count_safe(&self) -> usize {
        self.read("count").len()
    }

    /// Number of live static obstacles.
    #[must_use]
    pub fn fixed_obstacle_count_safe(&self) -> usize {
        self.read("count").count_of(ObstacleKind::Static)
    }

    /// Number of live moving obstacles.
    #[must_use]
    pub fn moving_obstacle_count_safe(&self) -> usize {
        self.read("count").count_of(ObstacleKind::Moving)
    }

    /// Number of expired obstacles awaiting a sweep.
    #[must_use]
    pub fn expired_obstacle_count(&self) -> usize {
        self.read("count").expired_count()
    }

    /// Snapshot of every obstacle for rendering.
    #[must_use]
    pub fn snapshots(&self) -> ObstacleView {
        self.read("snapshots").view()
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

    /// Worker cadence in effect.
    #[must_use]
    pub const fn worker_config(&self) -> LifetimeWorkerConfig {
        self.worker_config
    }

    /// Counters describing decay, sweeps and lock waits so far.
    #[must_use]
    pub fn lifetime_stats(&self) -> LifetimeStats {
        self.metrics.snapshot()
    }

    fn read(&self, context: &str) -> RwLockReadGuard<'_, Population> {
        let requested = Instant::now();
        let guard = self
            .population
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        self.metrics.record_read_wait(context, requested.elapsed());
        guard
    }

    fn write(&self, context: &str) -> RwLockWriteGuard<'_, Population> {
        let requested = Instant::now();
        let guard = self
            .population
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.metrics.record_write_wait(context, requested.elapsed());
        guard
    }
}

impl Drop for ConcurrentObstacleManager {
    fn drop(&mut self) {
        self.stop_lifetime_thread();
    }
}
