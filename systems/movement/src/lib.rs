#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement math for moving obstacles.
//!
//! Every pattern is a pure function of the current cell, the grid bounds and
//! a [`MotionState`]. The state owns the phase counter, the sub-cell progress
//! accumulator and a seeded generator, so replaying the same seed always
//! reproduces the same trajectory. All results stay inside the grid.

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use snake_hazards_core::{CellCoord, Direction, GridSize, MovementPattern};

/// Vertical amplitude, in cells, of the zigzag oscillation.
pub const ZIGZAG_AMPLITUDE: f32 = 3.0;

/// Number of ticks between two random walk steps.
pub const RANDOM_WALK_CADENCE: u32 = 10;

const SPIRAL_GROWTH: f32 = 0.5;
const NOISE_SCALE: f64 = 0.1;
const NOISE_ROW_OFFSET: f64 = 31.7;

/// Travel direction along the primary axis of linear and zigzag patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heading {
    /// Toward increasing coordinates.
    Forward,
    /// Toward decreasing coordinates.
    Backward,
}

impl Heading {
    /// Signed unit step for the heading.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Heading::Forward => 1,
            Heading::Backward => -1,
        }
    }

    /// Heading pointing the opposite way.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Heading::Forward => Heading::Backward,
            Heading::Backward => Heading::Forward,
        }
    }
}

/// Mutable motion parameters owned by a single moving obstacle.
#[derive(Clone, Debug)]
pub struct MotionState {
    pattern: MovementPattern,
    speed: f32,
    heading: Heading,
    phase: f32,
    progress: f32,
    ticks: u32,
    rng: ChaCha8Rng,
    field: Perlin,
}

impl MotionState {
    /// Creates a motion state heading forward with a zeroed phase.
    ///
    /// Non-finite or negative speeds are treated as zero.
    #[must_use]
    pub fn new(pattern: MovementPattern, speed: f32, seed: u64) -> Self {
        Self {
            pattern,
            speed: sanitize_speed(speed),
            heading: Heading::Forward,
            phase: 0.0,
            progress: 0.0,
            ticks: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            field: Perlin::new(perlin_seed(seed)),
        }
    }

    /// Pattern currently driving the obstacle.
    #[must_use]
    pub const fn pattern(&self) -> MovementPattern {
        self.pattern
    }

    /// Speed multiplier applied every tick.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Current heading along the primary axis.
    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    /// Free-running phase counter in radians.
    #[must_use]
    pub const fn phase(&self) -> f32 {
        self.phase
    }

    /// Number of ticks processed since the pattern was last set.
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Replaces the speed multiplier.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = sanitize_speed(speed);
    }

    /// Replaces the heading along the primary axis.
    pub fn set_heading(&mut self, heading: Heading) {
        self.heading = heading;
    }

    /// Switches to a new pattern, restarting its phase.
    pub fn set_pattern(&mut self, pattern: MovementPattern) {
        self.pattern = pattern;
        self.phase = 0.0;
        self.progress = 0.0;
        self.ticks = 0;
    }
}

/// Advances the motion state by one tick and returns the next cell.
///
/// The returned cell always lies inside `grid`. Empty grids leave the cell untouched.
#[must_use]
pub fn step(cell: CellCoord, grid: GridSize, state: &mut MotionState) -> CellCoord {
    if grid.is_empty() {
        return cell;
    }

    state.ticks = state.ticks.wrapping_add(1);
    let cell = grid.clamp(i64::from(cell.column()), i64::from(cell.row()));

    match state.pattern {
        MovementPattern::LinearHorizontal => {
            let steps = state.take_whole_steps();
            let column = bounce(cell.column(), grid.columns(), steps, &mut state.heading);
            CellCoord::new(column, cell.row())
        }
        MovementPattern::LinearVertical => {
            let steps = state.take_whole_steps();
            let row = bounce(cell.row(), grid.rows(), steps, &mut state.heading);
            CellCoord::new(cell.column(), row)
        }
        MovementPattern::Circular => {
            state.phase += state.speed;
            let radius = quarter_extent(grid);
            orbit(grid, radius * state.phase.cos(), radius * state.phase.sin())
        }
        MovementPattern::Zigzag => {
            let column = bounce(cell.column(), grid.columns(), 1, &mut state.heading);
            state.phase += state.speed;
            let offset = ZIGZAG_AMPLITUDE * (2.0 * state.phase).sin();
            let row = i64::from(grid.center().row()) + offset as i64;
            grid.clamp(i64::from(column), row)
        }
        MovementPattern::RandomWalk => {
            if state.ticks % RANDOM_WALK_CADENCE != 0 {
                return cell;
            }
            let direction = Direction::ALL[state.rng.gen_range(0..Direction::ALL.len())];
            grid.neighbor(cell, direction).unwrap_or(cell)
        }
        MovementPattern::Spiral => {
            state.phase += state.speed;
            let max_radius = (grid.columns().min(grid.rows()) / 2).saturating_sub(1) as f32;
            let radius = if max_radius > 0.0 {
                (state.phase * SPIRAL_GROWTH).rem_euclid(max_radius + 1.0)
            } else {
                0.0
            };
            orbit(grid, radius * state.phase.cos(), radius * state.phase.sin())
        }
        MovementPattern::FigureEight => {
            state.phase += state.speed;
            let radius = quarter_extent(grid);
            orbit(
                grid,
                radius * state.phase.cos(),
                radius * (2.0 * state.phase).sin(),
            )
        }
        MovementPattern::Noise => {
            state.phase += state.speed;
            let phase = f64::from(state.phase);
            let x = f64::from(cell.column()) * NOISE_SCALE;
            let y = f64::from(cell.row()) * NOISE_SCALE + NOISE_ROW_OFFSET;
            let dx = noise_offset(state.sample_noise(x, phase));
            let dy = noise_offset(state.sample_noise(y, phase));
            grid.clamp(i64::from(cell.column()) + dx, i64::from(cell.row()) + dy)
        }
    }
}

impl MotionState {
    fn take_whole_steps(&mut self) -> u64 {
        self.progress += self.speed;
        let whole = self.progress.floor();
        self.progress -= whole;
        whole as u64
    }

    /// Perlin sample at `(x, y)` mapped from `[-1, 1]` onto `[0, 1]`.
    fn sample_noise(&self, x: f64, y: f64) -> f32 {
        let value = self.field.get([x, y]);
        if value.is_finite() {
            ((value + 1.0) / 2.0).clamp(0.0, 1.0) as f32
        } else {
            0.5
        }
    }
}

fn perlin_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

fn bounce(coord: u32, extent: u32, steps: u64, heading: &mut Heading) -> u32 {
    if extent <= 1 || steps == 0 {
        return coord.min(extent.saturating_sub(1));
    }

    let last = i64::from(extent) - 1;
    // A full bounce cycle returns to the same coordinate and heading.
    let steps = steps % (2 * last as u64);
    let mut position = i64::from(coord).min(last);
    for _ in 0..steps {
        let mut next = position + heading.sign();
        if !(0..=last).contains(&next) {
            *heading = heading.reversed();
            next = position + heading.sign();
        }
        position = next;
    }
    u32::try_from(position).unwrap_or(0)
}

fn quarter_extent(grid: GridSize) -> f32 {
    grid.columns().min(grid.rows()) as f32 / 4.0
}

fn orbit(grid: GridSize, dx: f32, dy: f32) -> CellCoord {
    let center = grid.center();
    grid.clamp(
        i64::from(center.column()) + dx as i64,
        i64::from(center.row()) + dy as i64,
    )
}

fn noise_offset(sample: f32) -> i64 {
    if sample < 1.0 / 3.0 {
        -1
    } else if sample > 2.0 / 3.0 {
        1
    } else {
        0
    }
}

fn sanitize_speed(speed: f32) -> f32 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        0.0
    }
}
