use std::{fmt, thread, time::Duration};

use anyhow::{Context, Result};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use snake_hazards_core::{CellCoord, PlayerView};
use snake_hazards_system_generation::{
    AsyncBatchGenerator, GenerationConfig, GenerationStats, PlayerFootprint,
};
use snake_hazards_system_lifetime::{ConcurrentObstacleManager, LifetimeStats};
use snake_hazards_world::Obstacle;

use crate::{settings::Settings, snake::ScriptedSnake};

const PROGRESS_EVERY: u64 = 100;

/// Totals reported once the run completes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) rounds: u64,
    pub(crate) collisions: u64,
    pub(crate) food_eaten: u64,
    pub(crate) spawned: u64,
    pub(crate) prepopulated: u64,
    pub(crate) swept: u64,
    pub(crate) peak_obstacles: usize,
    pub(crate) final_obstacles: usize,
    pub(crate) lifetime: LifetimeStats,
    pub(crate) generation: GenerationStats,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks simulated:     {}", self.ticks)?;
        writeln!(f, "rounds played:       {}", self.rounds)?;
        writeln!(f, "collisions:          {}", self.collisions)?;
        writeln!(f, "food eaten:          {}", self.food_eaten)?;
        writeln!(f, "obstacles spawned:   {}", self.spawned)?;
        writeln!(f, "obstacles generated: {}", self.prepopulated)?;
        writeln!(f, "obstacles swept:     {}", self.swept)?;
        writeln!(f, "peak obstacles:      {}", self.peak_obstacles)?;
        writeln!(f, "final obstacles:     {}", self.final_obstacles)?;
        writeln!(
            f,
            "worker decay passes: {} (sweeps {}, deferred {})",
            self.lifetime.decay_cycles,
            self.lifetime.sweeps_completed,
            self.lifetime.sweeps_deferred
        )?;
        write!(
            f,
            "generator batches:   {} ({:?} per obstacle)",
            self.generation.batches, self.generation.average_generation_time
        )
    }
}

/// Headless frame loop around the concurrent manager and the batch generator.
pub(crate) struct Simulation {
    settings: Settings,
    manager: ConcurrentObstacleManager,
    generator: AsyncBatchGenerator,
    snake: ScriptedSnake,
    food: CellCoord,
    rng: ChaCha8Rng,
    since_sweep: Duration,
    summary: Summary,
}

impl Simulation {
    pub(crate) fn new(settings: Settings) -> Result<Self> {
        let grid = settings.grid();
        let mut manager = ConcurrentObstacleManager::with_config(
            grid,
            settings.manager_config()?,
            settings.worker_config()?,
        );
        manager.set_difficulty_level(settings.run.difficulty);

        let generator = AsyncBatchGenerator::with_pool_size(
            grid,
            settings.generator.pool_size,
            settings.run.seed,
        )
        .context("failed to start the batch generator")?
        .with_safety_margin(settings.generator.safety_margin);

        let snake = ScriptedSnake::new(grid, settings.run.snake_length);
        let rng = ChaCha8Rng::seed_from_u64(settings.run.seed.rotate_left(32));

        Ok(Self {
            food: grid.center(),
            settings,
            manager,
            generator,
            snake,
            rng,
            since_sweep: Duration::ZERO,
            summary: Summary::default(),
        })
    }

    pub(crate) fn run(mut self) -> Result<Summary> {
        if self.settings.run.realtime {
            self.manager
                .start_lifetime_thread()
                .context("failed to start the lifetime worker")?;
        }

        self.start_round()?;
        for _ in 0..self.settings.run.ticks {
            self.step()?;
            if self.summary.ticks % PROGRESS_EVERY == 0 {
                log::info!(
                    "tick {}: {} obstacles ({} static, {} moving, {} expired), snake length {}",
                    self.summary.ticks,
                    self.manager.obstacle_count_safe(),
                    self.manager.fixed_obstacle_count_safe(),
                    self.manager.moving_obstacle_count_safe(),
                    self.manager.expired_obstacle_count(),
                    self.snake.len()
                );
            }
        }

        self.manager.stop_lifetime_thread();
        self.generator.shutdown();

        let mut summary = self.summary;
        summary.final_obstacles = self.manager.obstacle_count_safe();
        summary.lifetime = self.manager.lifetime_stats();
        summary.generation = self.generator.stats();
        Ok(summary)
    }

    fn step(&mut self) -> Result<()> {
        let tick = self.settings.tick();
        self.summary.ticks += 1;

        self.snake.advance();
        self.manager.update_obstacle_movement();
        if self.manager.should_spawn_obstacle(tick) {
            if let Some(kind) = self.manager.spawn_random_obstacle() {
                log::debug!("spawned a {kind:?} obstacle");
                self.summary.spawned += 1;
            }
        }
        self.advance_lifetimes(tick);
        self.summary.peak_obstacles = self
            .summary
            .peak_obstacles
            .max(self.manager.obstacle_count_safe());

        if self.snake.is_alive() && self.manager.check_collision_with_player(&self.snake) {
            self.summary.collisions += 1;
            log::info!(
                "snake hit an obstacle at {:?} on tick {}",
                self.snake.head(),
                self.summary.ticks
            );
            self.snake.kill();
            return self.start_round();
        }

        if self.snake.head() == self.food {
            self.summary.food_eaten += 1;
            self.snake.grow();
            self.relocate_food();
        } else if !self.manager.is_valid_food_position(self.food) {
            self.relocate_food();
        }
        Ok(())
    }

    /// Decays lifetimes by one frame unless the background worker owns decay.
    fn advance_lifetimes(&mut self, tick: Duration) {
        if self.settings.run.realtime {
            thread::sleep(tick);
            return;
        }
        self.manager.update_obstacle_lifetimes(tick);
        self.since_sweep += tick;
        if self.since_sweep >= self.manager.worker_config().sweep_interval() {
            self.since_sweep = Duration::ZERO;
            self.summary.swept += self.manager.try_cleanup_expired() as u64;
        }
    }

    fn start_round(&mut self) -> Result<()> {
        self.summary.rounds += 1;
        self.manager.clear_all_obstacles();
        self.snake.reset();
        self.relocate_food();

        let placed = self.prepopulate()?;
        self.summary.prepopulated += placed as u64;
        log::info!("round {} started with {placed} obstacles", self.summary.rounds);
        Ok(())
    }

    /// Generates the round's opening obstacles away from the snake and the food.
    fn prepopulate(&mut self) -> Result<usize> {
        let template = self.settings.generation_template();
        if template.requested() == 0 {
            return Ok(0);
        }

        let mut forbidden = self.snake.occupied();
        forbidden.push(self.food);
        let config = GenerationConfig {
            forbidden,
            moving_speed: self.manager.moving_obstacle_speed(),
            ..template
        };
        let batch = self
            .generator
            .generate(config)
            .context("failed to queue the opening batch")?
            .wait()
            .context("opening batch was never produced")?;

        let footprint = PlayerFootprint::capture(&self.snake);
        let generated = batch.len();
        let safe: Vec<Obstacle> = batch
            .into_iter()
            .filter(|obstacle| {
                self.generator
                    .validate_placement(&[obstacle.cell()], &footprint, self.food)
            })
            .collect();
        if safe.len() < generated {
            log::debug!(
                "discarded {} generated obstacles too close to the snake",
                generated - safe.len()
            );
        }
        Ok(self.manager.insert_batch(safe))
    }

    /// Moves the food onto a free cell of the snake's loop, or anywhere free.
    fn relocate_food(&mut self) {
        let occupied = self.snake.occupied();
        let is_free = |cell: &CellCoord| {
            !occupied.contains(cell) && self.manager.is_valid_food_position(*cell)
        };

        let on_loop: Vec<CellCoord> = self.snake.path().iter().copied().filter(is_free).collect();
        if let Some(&cell) = on_loop.choose(&mut self.rng) {
            self.food = cell;
            return;
        }

        let grid = self.manager.grid();
        let anywhere: Vec<CellCoord> = (0..grid.rows())
            .flat_map(|row| (0..grid.columns()).map(move |column| CellCoord::new(column, row)))
            .filter(is_free)
            .collect();
        match anywhere.choose(&mut self.rng) {
            Some(&cell) => self.food = cell,
            None => log::warn!("no free cell left for food; keeping {:?}", self.food),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn settings(ticks: u64) -> Settings {
        let mut settings = Settings::default();
        settings.grid.columns = 16;
        settings.grid.rows = 12;
        settings.run.ticks = ticks;
        settings.run.tick_ms = 50;
        settings
    }

    #[test]
    fn short_run_reports_every_tick() {
        let summary = Simulation::new(settings(200))
            .expect("simulation starts")
            .run()
            .expect("run completes");
        assert_eq!(summary.ticks, 200);
        assert!(summary.rounds >= 1);
        assert_eq!(summary.rounds, summary.collisions + 1);
        assert!(summary.generation.batches >= 1);
        assert!(summary.peak_obstacles >= summary.final_obstacles);
    }

    #[test]
    fn runs_are_reproducible_for_a_seed() {
        let run = || {
            let summary = Simulation::new(settings(300))
                .expect("simulation starts")
                .run()
                .expect("run completes");
            (
                summary.collisions,
                summary.food_eaten,
                summary.spawned,
                summary.prepopulated,
                summary.final_obstacles,
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn simulated_sweeps_remove_expired_obstacles() {
        let mut settings = settings(120);
        settings.prepopulate.static_obstacles = 0;
        settings.prepopulate.moving_obstacles = 0;
        settings.difficulty.initial_spawn_rate = 0.0;
        settings.difficulty.spawn_rate_base = 0.0;
        settings.difficulty.spawn_rate_per_level = 0.0;
        settings.worker.sweep_ms = 1_000;

        let mut simulation = Simulation::new(settings).expect("simulation starts");
        simulation.start_round().expect("round starts");
        let grid = simulation.manager.grid();
        let corner = CellCoord::new(grid.columns() - 1, grid.rows() - 1);
        assert!(simulation
            .manager
            .add_fixed_obstacle_with_lifetime(corner, 1.0));

        for _ in 0..40 {
            simulation.step().expect("tick runs");
        }
        assert_eq!(simulation.manager.obstacle_count_safe(), 0);
        assert_eq!(simulation.summary.swept, 1);
    }

    #[test]
    fn opening_obstacles_keep_clear_of_snake_and_food() {
        let mut settings = settings(0);
        settings.prepopulate.static_obstacles = 20;
        settings.prepopulate.moving_obstacles = 10;
        let mut simulation = Simulation::new(settings).expect("simulation starts");
        simulation.start_round().expect("round starts");

        let footprint = PlayerFootprint::capture(&simulation.snake);
        let cells: Vec<CellCoord> = simulation
            .manager
            .snapshots()
            .iter()
            .map(|snapshot| snapshot.cell)
            .collect();
        assert!(!cells.is_empty());
        assert!(simulation
            .generator
            .validate_placement(&cells, &footprint, simulation.food));
        assert!(simulation.manager.is_valid_food_position(simulation.food));
    }
}
