use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};
use rand_chacha::ChaCha8Rng;
use snake_hazards_core::{CellCoord, GridSize, MovementPattern, PlayerView};
use snake_hazards_world::Obstacle;

use crate::config::GenerationConfig;

/// Minimum Manhattan distance between generated obstacles and the player, by default.
pub const DEFAULT_SAFETY_MARGIN: u32 = 2;

/// Multiplier bounding the attempts spent by position generation.
pub const POSITION_ATTEMPTS_PER_CELL: usize = 10;

/// Owned copy of the player's occupied cells that can cross thread boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerFootprint {
    head: CellCoord,
    body: Vec<CellCoord>,
}

impl PlayerFootprint {
    /// Creates a footprint from explicit head and body cells.
    #[must_use]
    pub fn new(head: CellCoord, body: Vec<CellCoord>) -> Self {
        Self { head, body }
    }

    /// Copies the cells currently occupied by the player.
    #[must_use]
    pub fn capture<P>(player: &P) -> Self
    where
        P: PlayerView + ?Sized,
    {
        Self::new(player.head(), player.body().to_vec())
    }
}

impl PlayerView for PlayerFootprint {
    fn head(&self) -> CellCoord {
        self.head
    }

    fn body(&self) -> &[CellCoord] {
        &self.body
    }

    fn is_alive(&self) -> bool {
        true
    }
}

/// Checks candidate cells against the food cell and the player's footprint.
///
/// Returns `false` if any candidate sits on the food, the head or a body
/// segment, or lies closer than `safety_margin` to any of the player's cells.
pub fn validate_placement<P>(
    candidates: &[CellCoord],
    player: &P,
    food: CellCoord,
    safety_margin: u32,
) -> bool
where
    P: PlayerView + ?Sized,
{
    candidates.iter().all(|&candidate| {
        candidate != food
            && !player.occupies(candidate)
            && std::iter::once(player.head())
                .chain(player.body().iter().copied())
                .all(|segment| candidate.manhattan_distance(segment) >= safety_margin)
    })
}

/// Places the requested obstacles on distinct cells outside the forbidden set.
///
/// Each obstacle gets up to `max_retries` uniform samples. One that finds no
/// free cell is skipped, so the batch may be shorter than requested. Placement
/// stops as soon as every free cell is taken.
pub(crate) fn place_batch(
    config: &GenerationConfig,
    grid: GridSize,
    rng: &mut ChaCha8Rng,
) -> Vec<Obstacle> {
    let mut taken: HashSet<CellCoord> = config.forbidden.iter().copied().collect();
    let free = free_cells(grid, &taken);
    if free == 0 || config.max_retries == 0 {
        return Vec::new();
    }
    let mut batch = Vec::with_capacity(config.requested().min(free));

    for _ in 0..config.static_count {
        if batch.len() == free {
            return batch;
        }
        if let Some(cell) = sample_free_cell(grid, &mut taken, config.max_retries, rng) {
            let lifetime = sample_lifetime(config, rng);
            batch.push(Obstacle::fixed(cell, grid, lifetime));
        }
    }

    let patterns = config.pattern_pool();
    for _ in 0..config.moving_count {
        if batch.len() == free {
            break;
        }
        if let Some(cell) = sample_free_cell(grid, &mut taken, config.max_retries, rng) {
            let lifetime = sample_lifetime(config, rng);
            let pattern = patterns
                .choose(rng)
                .copied()
                .unwrap_or(MovementPattern::LinearHorizontal);
            let seed = rng.gen();
            batch.push(Obstacle::moving(
                cell,
                grid,
                pattern,
                config.moving_speed,
                lifetime,
                seed,
            ));
        }
    }

    batch
}

/// Samples up to `count` distinct cells outside the forbidden set.
///
/// At most `count * POSITION_ATTEMPTS_PER_CELL` samples are drawn, and the
/// search ends early once every free cell is taken.
pub(crate) fn place_positions(
    count: usize,
    forbidden: &[CellCoord],
    grid: GridSize,
    rng: &mut ChaCha8Rng,
) -> Vec<CellCoord> {
    let mut taken: HashSet<CellCoord> = forbidden.iter().copied().collect();
    let target = count.min(free_cells(grid, &taken));
    let mut positions = Vec::with_capacity(target);
    let attempts = count.saturating_mul(POSITION_ATTEMPTS_PER_CELL);
    for _ in 0..attempts {
        if positions.len() == target {
            break;
        }
        let cell = random_cell(grid, rng);
        if taken.insert(cell) {
            positions.push(cell);
        }
    }
    positions
}

/// Number of in-bounds cells not already taken.
fn free_cells(grid: GridSize, taken: &HashSet<CellCoord>) -> usize {
    let blocked = taken.iter().filter(|cell| grid.contains(**cell)).count() as u64;
    usize::try_from(grid.cell_count().saturating_sub(blocked)).unwrap_or(usize::MAX)
}

fn sample_free_cell(
    grid: GridSize,
    taken: &mut HashSet<CellCoord>,
    max_retries: u32,
    rng: &mut ChaCha8Rng,
) -> Option<CellCoord> {
    (0..max_retries)
        .map(|_| random_cell(grid, rng))
        .find(|cell| taken.insert(*cell))
}

fn sample_lifetime(config: &GenerationConfig, rng: &mut ChaCha8Rng) -> f32 {
    if config.min_lifetime >= config.max_lifetime {
        return config.min_lifetime;
    }
    rng.gen_range(config.min_lifetime..=config.max_lifetime)
}

fn random_cell(grid: GridSize, rng: &mut ChaCha8Rng) -> CellCoord {
    CellCoord::new(
        rng.gen_range(0..grid.columns()),
        rng.gen_range(0..grid.rows()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use snake_hazards_core::ObstacleKind;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn batch_avoids_forbidden_and_duplicate_cells() {
        let grid = GridSize::new(6, 6);
        let forbidden: Vec<_> = (0..6).map(|column| CellCoord::new(column, 0)).collect();
        let config = GenerationConfig {
            forbidden: forbidden.clone(),
            ..GenerationConfig::with_counts(10, 10)
        };
        let batch = place_batch(&config, grid, &mut rng(1));
        let cells: HashSet<_> = batch.iter().map(Obstacle::cell).collect();
        assert_eq!(cells.len(), batch.len());
        assert!(cells.iter().all(|cell| !forbidden.contains(cell)));
        assert!(cells.iter().all(|cell| grid.contains(*cell)));
    }

    #[test]
    fn exhausted_retries_skip_obstacles() {
        let grid = GridSize::new(2, 1);
        let config = GenerationConfig {
            max_retries: 50,
            ..GenerationConfig::with_counts(5, 0)
        };
        let batch = place_batch(&config, grid, &mut rng(2));
        assert_eq!(batch.len(), 2, "only two free cells exist");
    }

    #[test]
    fn zero_retries_place_nothing() {
        let config = GenerationConfig {
            max_retries: 0,
            ..GenerationConfig::with_counts(3, 3)
        };
        assert!(place_batch(&config, GridSize::new(10, 10), &mut rng(3)).is_empty());
    }

    #[test]
    fn oversized_requests_stop_once_the_grid_is_full() {
        let grid = GridSize::new(4, 4);
        let config = GenerationConfig {
            forbidden: vec![CellCoord::new(0, 0), CellCoord::new(40, 40)],
            max_retries: 1,
            ..GenerationConfig::with_counts(1 << 40, 1 << 40)
        };
        let batch = place_batch(&config, grid, &mut rng(7));
        assert_eq!(batch.len(), 15);
        assert!(batch.iter().all(|obstacle| obstacle.cell() != CellCoord::new(0, 0)));

        let positions = place_positions(usize::MAX / 4, &[], grid, &mut rng(8));
        assert_eq!(positions.len(), 16);
    }

    #[test]
    fn fully_forbidden_grid_places_nothing() {
        let grid = GridSize::new(2, 2);
        let forbidden: Vec<_> = (0..2)
            .flat_map(|column| (0..2).map(move |row| CellCoord::new(column, row)))
            .collect();
        let config = GenerationConfig {
            forbidden: forbidden.clone(),
            ..GenerationConfig::with_counts(usize::MAX, 0)
        };
        assert!(place_batch(&config, grid, &mut rng(9)).is_empty());
        assert!(place_positions(usize::MAX, &forbidden, grid, &mut rng(9)).is_empty());
    }

    #[test]
    fn lifetimes_and_patterns_follow_request() {
        let config = GenerationConfig {
            min_lifetime: 2.0,
            max_lifetime: 4.0,
            preferred_patterns: vec![MovementPattern::FigureEight, MovementPattern::Noise],
            ..GenerationConfig::with_counts(20, 20)
        };
        let batch = place_batch(&config, GridSize::new(30, 30), &mut rng(4));
        assert_eq!(batch.len(), 40);
        for obstacle in &batch {
            let lifetime = obstacle.remaining_lifetime();
            assert!((2.0..=4.0).contains(&lifetime), "lifetime {lifetime}");
            if obstacle.kind() == ObstacleKind::Moving {
                let pattern = obstacle.pattern().expect("moving obstacles have patterns");
                assert!(config.preferred_patterns.contains(&pattern));
            }
        }
    }

    #[test]
    fn fixed_lifetime_range_collapses_to_single_value() {
        let config = GenerationConfig {
            min_lifetime: 6.0,
            max_lifetime: 6.0,
            ..GenerationConfig::with_counts(4, 0)
        };
        let batch = place_batch(&config, GridSize::new(10, 10), &mut rng(5));
        assert!(batch.iter().all(|obstacle| obstacle.remaining_lifetime() == 6.0));
    }

    #[test]
    fn positions_are_distinct_and_bounded() {
        let grid = GridSize::new(3, 3);
        let positions = place_positions(20, &[CellCoord::new(1, 1)], grid, &mut rng(6));
        let unique: HashSet<_> = positions.iter().copied().collect();
        assert_eq!(unique.len(), positions.len());
        assert!(positions.len() <= 8);
        assert!(!positions.contains(&CellCoord::new(1, 1)));
    }

    #[test]
    fn validation_rejects_food_player_and_margin() {
        let player = PlayerFootprint::new(
            CellCoord::new(5, 5),
            vec![CellCoord::new(4, 5), CellCoord::new(3, 5)],
        );
        let food = CellCoord::new(9, 9);
        assert!(validate_placement(
            &[CellCoord::new(0, 0), CellCoord::new(8, 2)],
            &player,
            food,
            DEFAULT_SAFETY_MARGIN
        ));
        assert!(!validate_placement(&[food], &player, food, DEFAULT_SAFETY_MARGIN));
        assert!(!validate_placement(
            &[CellCoord::new(5, 5)],
            &player,
            food,
            DEFAULT_SAFETY_MARGIN
        ));
        assert!(!validate_placement(
            &[CellCoord::new(3, 6)],
            &player,
            food,
            DEFAULT_SAFETY_MARGIN
        ));
        assert!(validate_placement(&[CellCoord::new(3, 7)], &player, food, DEFAULT_SAFETY_MARGIN));
        assert!(validate_placement(&[], &player, food, DEFAULT_SAFETY_MARGIN));
    }
}
