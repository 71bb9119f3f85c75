use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use snake_hazards_core::{CellCoord, GridSize, LifetimeDefaults, MovementPattern, ObstacleKind};

use crate::obstacle::Obstacle;

/// Share of random spawns that produce static obstacles.
pub const STATIC_SPAWN_PROBABILITY: f64 = 0.6;

/// Seeded source of random obstacles and per-obstacle motion seeds.
#[derive(Clone, Debug)]
pub struct Spawner {
    rng: ChaCha8Rng,
    lifetimes: LifetimeDefaults,
}

impl Spawner {
    /// Creates a spawner whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn new(seed: u64, lifetimes: LifetimeDefaults) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            lifetimes,
        }
    }

    /// Lifetimes applied when no explicit lifetime is given.
    #[must_use]
    pub const fn lifetimes(&self) -> LifetimeDefaults {
        self.lifetimes
    }

    /// Draws a seed for a new moving obstacle's random walk.
    pub fn motion_seed(&mut self) -> u64 {
        self.rng.gen()
    }

    /// Rolls a random obstacle on a uniformly chosen cell.
    ///
    /// The candidate is not checked against existing obstacles; callers
    /// insert it and drop it when the cell is taken. Returns `None` on an
    /// empty grid.
    pub fn roll(&mut self, grid: GridSize, moving_speed: f32) -> Option<Obstacle> {
        if grid.is_empty() {
            return None;
        }

        let cell = CellCoord::new(
            self.rng.gen_range(0..grid.columns()),
            self.rng.gen_range(0..grid.rows()),
        );
        let kind = if self.rng.gen_bool(STATIC_SPAWN_PROBABILITY) {
            ObstacleKind::Static
        } else {
            ObstacleKind::Moving
        };
        let lifetime = self.lifetimes.for_kind(kind);

        let obstacle = match kind {
            ObstacleKind::Static => Obstacle::fixed(cell, grid, lifetime),
            ObstacleKind::Moving => {
                let pattern = MovementPattern::BASIC
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(MovementPattern::LinearHorizontal);
                let seed = self.motion_seed();
                Obstacle::moving(cell, grid, pattern, moving_speed, lifetime, seed)
            }
        };
        Some(obstacle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_rolls_same_sequence() {
        let grid = GridSize::new(16, 9);
        let mut first = Spawner::new(11, LifetimeDefaults::default());
        let mut second = Spawner::new(11, LifetimeDefaults::default());
        for _ in 0..50 {
            let a = first.roll(grid, 0.05).expect("non-empty grid").snapshot();
            let b = second.roll(grid, 0.05).expect("non-empty grid").snapshot();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn rolls_respect_bounds_and_default_lifetimes() {
        let grid = GridSize::new(3, 2);
        let lifetimes = LifetimeDefaults::new(4.0, 2.0).expect("valid lifetimes");
        let mut spawner = Spawner::new(5, lifetimes);
        for _ in 0..200 {
            let obstacle = spawner.roll(grid, 0.05).expect("non-empty grid");
            assert!(grid.contains(obstacle.cell()));
            assert_eq!(
                obstacle.remaining_lifetime(),
                lifetimes.for_kind(obstacle.kind())
            );
        }
    }

    #[test]
    fn kind_split_favours_static_obstacles() {
        let grid = GridSize::new(10, 10);
        let mut spawner = Spawner::new(3, LifetimeDefaults::default());
        let rolls = 5_000;
        let statics = (0..rolls)
            .filter_map(|_| spawner.roll(grid, 0.05))
            .filter(|obstacle| obstacle.kind() == ObstacleKind::Static)
            .count();
        let share = statics as f64 / f64::from(rolls);
        assert!((0.55..0.65).contains(&share), "static share {share}");
    }

    #[test]
    fn moving_rolls_use_only_basic_patterns() {
        let grid = GridSize::new(10, 10);
        let mut spawner = Spawner::new(8, LifetimeDefaults::default());
        let patterns: HashSet<_> = (0..2_000)
            .filter_map(|_| spawner.roll(grid, 0.05))
            .filter_map(|obstacle| obstacle.pattern())
            .collect();
        let basic: HashSet<_> = MovementPattern::BASIC.into_iter().collect();
        assert_eq!(patterns, basic);
    }

    #[test]
    fn empty_grid_rolls_nothing() {
        let mut spawner = Spawner::new(0, LifetimeDefaults::default());
        assert!(spawner.roll(GridSize::new(0, 5), 0.05).is_none());
    }
}
