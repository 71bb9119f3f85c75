use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use snake_hazards_core::{CellCoord, GridSize, PlayerView};
use snake_hazards_world::Obstacle;

use crate::{
    config::GenerationConfig,
    error::GenerationError,
    pending::Pending,
    placement::{
        place_batch, place_positions, validate_placement, PlayerFootprint, DEFAULT_SAFETY_MARGIN,
    },
    pool::ThreadPool,
    stats::{GenerationStats, StatsRecorder},
};

/// Number of pool workers used when no size is given.
pub const DEFAULT_POOL_SIZE: usize = 2;

const SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Generates obstacle batches on an owned worker pool.
///
/// The generator never touches a live population. Callers wait on the
/// returned [`Pending`] handle and commit the batch themselves, typically
/// through `insert_batch` on the simulation thread.
#[derive(Debug)]
pub struct AsyncBatchGenerator {
    grid: GridSize,
    pool: ThreadPool,
    base_seed: u64,
    next_job: AtomicU64,
    safety_margin: u32,
    stats: Arc<StatsRecorder>,
}

impl AsyncBatchGenerator {
    /// Starts a generator with [`DEFAULT_POOL_SIZE`] workers.
    pub fn new(grid: GridSize, seed: u64) -> Result<Self, GenerationError> {
        Self::with_pool_size(grid, DEFAULT_POOL_SIZE, seed)
    }

    /// Starts a generator with `pool_size` workers. Zero is raised to one.
    pub fn with_pool_size(
        grid: GridSize,
        pool_size: usize,
        seed: u64,
    ) -> Result<Self, GenerationError> {
        let pool = ThreadPool::new(pool_size, "obstacle-gen")?;
        log::info!(
            "batch generator started with {} workers for a {}x{} grid",
            pool.worker_count(),
            grid.columns(),
            grid.rows()
        );
        Ok(Self {
            grid,
            pool,
            base_seed: seed,
            next_job: AtomicU64::new(0),
            safety_margin: DEFAULT_SAFETY_MARGIN,
            stats: Arc::new(StatsRecorder::default()),
        })
    }

    /// Replaces the Manhattan distance kept between obstacles and the player.
    #[must_use]
    pub fn with_safety_margin(mut self, safety_margin: u32) -> Self {
        self.safety_margin = safety_margin;
        self
    }

    /// Bounds generated obstacles are placed within.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Manhattan distance kept between obstacles and the player.
    #[must_use]
    pub const fn safety_margin(&self) -> u32 {
        self.safety_margin
    }

    /// Queues a batch and returns a handle to its result.
    pub fn generate(
        &self,
        config: GenerationConfig,
    ) -> Result<Pending<Vec<Obstacle>>, GenerationError> {
        let (sender, pending) = Pending::channel();
        self.generate_with_callback(config, move |batch| {
            let _ = sender.send(batch);
        })?;
        Ok(pending)
    }

    /// Queues a batch of the given counts with default lifetimes and retries.
    pub fn generate_counts(
        &self,
        static_count: usize,
        moving_count: usize,
        forbidden: Vec<CellCoord>,
    ) -> Result<Pending<Vec<Obstacle>>, GenerationError> {
        self.generate(GenerationConfig {
            forbidden,
            ..GenerationConfig::with_counts(static_count, moving_count)
        })
    }

    /// Queues a batch and hands it to `callback` on a pool worker.
    ///
    /// The callback never runs on the calling thread.
    pub fn generate_with_callback<F>(
        &self,
        config: GenerationConfig,
        callback: F,
    ) -> Result<(), GenerationError>
    where
        F: FnOnce(Vec<Obstacle>) + Send + 'static,
    {
        config.validate()?;
        let grid = self.grid;
        let seed = self.job_seed();
        let stats = Arc::clone(&self.stats);
        self.pool.execute(Box::new(move || {
            let started = Instant::now();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let batch = place_batch(&config, grid, &mut rng);
            stats.record(batch.len(), started.elapsed());
            if batch.len() < config.requested() {
                log::debug!(
                    "generated {} of {} requested obstacles",
                    batch.len(),
                    config.requested()
                );
            }
            callback(batch);
        }))
    }

    /// Queues a search for up to `count` distinct free cells.
    pub fn generate_positions(
        &self,
        count: usize,
        forbidden: Vec<CellCoord>,
    ) -> Result<Pending<Vec<CellCoord>>, GenerationError> {
        let (sender, pending) = Pending::channel();
        let grid = self.grid;
        let seed = self.job_seed();
        self.pool.execute(Box::new(move || {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let _ = sender.send(place_positions(count, &forbidden, grid, &mut rng));
        }))?;
        Ok(pending)
    }

    /// Checks candidate cells against the food cell and the player's footprint.
    #[must_use]
    pub fn validate_placement<P>(
        &self,
        candidates: &[CellCoord],
        player: &P,
        food: CellCoord,
    ) -> bool
    where
        P: PlayerView + ?Sized,
    {
        validate_placement(candidates, player, food, self.safety_margin)
    }

    /// Runs [`AsyncBatchGenerator::validate_placement`] on a pool worker.
    pub fn validate_placement_async(
        &self,
        candidates: Vec<CellCoord>,
        player: PlayerFootprint,
        food: CellCoord,
    ) -> Result<Pending<bool>, GenerationError> {
        let (sender, pending) = Pending::channel();
        let safety_margin = self.safety_margin;
        self.pool.execute(Box::new(move || {
            let _ = sender.send(validate_placement(&candidates, &player, food, safety_margin));
        }))?;
        Ok(pending)
    }

    /// Throughput counters gathered so far.
    #[must_use]
    pub fn stats(&self) -> GenerationStats {
        self.stats.snapshot()
    }

    /// Reports whether the pool still accepts work.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.pool.is_running()
    }

    /// Number of workers owned by the pool.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Number of worker threads that have started and not yet exited.
    #[must_use]
    pub fn running_worker_count(&self) -> usize {
        self.pool.running_workers()
    }

    /// Number of workers currently executing a job.
    #[must_use]
    pub fn active_worker_count(&self) -> usize {
        self.pool.active_workers()
    }

    /// Stops the pool, dropping queued jobs and joining every worker.
    pub fn shutdown(&mut self) {
        if !self.pool.is_running() {
            return;
        }
        self.pool.shutdown();
        log::info!("batch generator stopped");
    }

    fn job_seed(&self) -> u64 {
        let job = self.next_job.fetch_add(1, Ordering::Relaxed);
        self.base_seed ^ job.wrapping_add(1).wrapping_mul(SEED_STRIDE)
    }
}
