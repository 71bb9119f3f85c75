#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Snake Hazards engine.
//!
//! This crate defines the value types that connect the obstacle world, the
//! lifetime and generation systems, and the adapters that drive them. Cells
//! and grid bounds describe where hazards live, [`ObstacleKind`] and
//! [`MovementPattern`] describe what they are, [`ObstacleSnapshot`] values are
//! handed to renderers, and the player entity is consumed through the
//! read-only [`PlayerView`] trait. Tuning structs carry every adjustable knob
//! and validate themselves before the engine accepts them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default lifetime, in seconds, granted to static obstacles.
pub const DEFAULT_STATIC_LIFETIME_SECS: f32 = 12.0;

/// Default lifetime, in seconds, granted to moving obstacles.
pub const DEFAULT_MOVING_LIFETIME_SECS: f32 = 7.0;

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Immutable dimensions of the playfield measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new grid description.
    ///
    /// Zero-sized grids are accepted but nothing can ever be placed on them.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells contained in the grid.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }

    /// Reports whether the grid has no cells at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }

    /// Reports whether the cell lies inside the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column < self.columns && cell.row < self.rows
    }

    /// Cell at the integer centre of the grid.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        CellCoord::new(self.columns / 2, self.rows / 2)
    }

    /// Clamps signed coordinates onto the nearest in-bounds cell.
    ///
    /// Returns the origin for an empty grid.
    #[must_use]
    pub fn clamp(&self, column: i64, row: i64) -> CellCoord {
        let max_column = i64::from(self.columns.saturating_sub(1));
        let max_row = i64::from(self.rows.saturating_sub(1));
        let column = column.clamp(0, max_column);
        let row = row.clamp(0, max_row);
        CellCoord::new(
            u32::try_from(column).unwrap_or(0),
            u32::try_from(row).unwrap_or(0),
        )
    }

    /// Returns the neighbouring cell in the provided direction if it lies inside the grid.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let (column, row) = (cell.column(), cell.row());
        let next = match direction {
            Direction::North => CellCoord::new(column, row.checked_sub(1)?),
            Direction::East => CellCoord::new(column.checked_add(1)?, row),
            Direction::South => CellCoord::new(column, row.checked_add(1)?),
            Direction::West => CellCoord::new(column.checked_sub(1)?, row),
        };
        self.contains(next).then_some(next)
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Reports whether the cell lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column_end = u64::from(self.origin.column()) + u64::from(self.size.width());
        let row_end = u64::from(self.origin.row()) + u64::from(self.size.height());
        cell.column() >= self.origin.column()
            && u64::from(cell.column()) < column_end
            && cell.row() >= self.origin.row()
            && u64::from(cell.row()) < row_end
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Cardinal movement directions on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four cardinal directions in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];
}

/// Identity tag distinguishing the obstacle variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Obstacle that never leaves its spawn cell.
    Static,
    /// Obstacle that follows a [`MovementPattern`] every tick.
    Moving,
}

/// Movement patterns available to moving obstacles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Bounces left and right along its row.
    LinearHorizontal,
    /// Bounces up and down along its column.
    LinearVertical,
    /// Orbits the grid centre.
    Circular,
    /// Sweeps across columns while oscillating around the middle row.
    Zigzag,
    /// Takes an occasional single step in a random cardinal direction.
    RandomWalk,
    /// Orbits the grid centre on a radius that grows and restarts.
    Spiral,
    /// Traces a figure eight around the grid centre.
    FigureEight,
    /// Drifts according to a Perlin noise field.
    Noise,
}

impl MovementPattern {
    /// Patterns chosen by randomized spawning when no preference is given.
    pub const BASIC: [MovementPattern; 5] = [
        MovementPattern::LinearHorizontal,
        MovementPattern::LinearVertical,
        MovementPattern::Circular,
        MovementPattern::Zigzag,
        MovementPattern::RandomWalk,
    ];

    /// Every supported pattern, basic ones first.
    pub const ALL: [MovementPattern; 8] = [
        MovementPattern::LinearHorizontal,
        MovementPattern::LinearVertical,
        MovementPattern::Circular,
        MovementPattern::Zigzag,
        MovementPattern::RandomWalk,
        MovementPattern::Spiral,
        MovementPattern::FigureEight,
        MovementPattern::Noise,
    ];
}

/// Immutable representation of a single obstacle used by renderers and statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleSnapshot {
    /// Variant of the obstacle.
    pub kind: ObstacleKind,
    /// Cell occupied by the obstacle when the snapshot was taken.
    pub cell: CellCoord,
    /// Movement pattern for moving obstacles.
    pub pattern: Option<MovementPattern>,
    /// Remaining lifetime in seconds.
    pub remaining_lifetime: f32,
}

/// Read-only snapshot describing every obstacle in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ObstacleView {
    snapshots: Vec<ObstacleSnapshot>,
}

impl ObstacleView {
    /// Creates a new obstacle view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<ObstacleSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &ObstacleSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of captured snapshots of the provided kind.
    #[must_use]
    pub fn count_of(&self, kind: ObstacleKind) -> usize {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.kind == kind)
            .count()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ObstacleSnapshot> {
        self.snapshots
    }
}

/// Read-only access to the player-controlled entity.
///
/// The engine only ever inspects the head cell for collisions; the body is
/// consulted when validating generated placements.
pub trait PlayerView {
    /// Cell currently occupied by the head.
    fn head(&self) -> CellCoord;

    /// Cells occupied by the body, excluding the head.
    fn body(&self) -> &[CellCoord];

    /// Reports whether the player is still alive this round.
    fn is_alive(&self) -> bool;

    /// Reports whether the head or any body segment occupies the cell.
    fn occupies(&self, cell: CellCoord) -> bool {
        self.head() == cell || self.body().contains(&cell)
    }
}

/// Default lifetimes applied when spawning without an explicit lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeDefaults {
    /// Lifetime of static obstacles in seconds.
    pub static_secs: f32,
    /// Lifetime of moving obstacles in seconds.
    pub moving_secs: f32,
}

impl Default for LifetimeDefaults {
    fn default() -> Self {
        Self {
            static_secs: DEFAULT_STATIC_LIFETIME_SECS,
            moving_secs: DEFAULT_MOVING_LIFETIME_SECS,
        }
    }
}

impl LifetimeDefaults {
    /// Creates validated lifetime defaults.
    pub fn new(static_secs: f32, moving_secs: f32) -> Result<Self, TuningError> {
        let defaults = Self {
            static_secs,
            moving_secs,
        };
        defaults.validate()?;
        Ok(defaults)
    }

    /// Default lifetime for obstacles of the provided kind.
    #[must_use]
    pub fn for_kind(&self, kind: ObstacleKind) -> f32 {
        match kind {
            ObstacleKind::Static => self.static_secs,
            ObstacleKind::Moving => self.moving_secs,
        }
    }

    /// Checks that both lifetimes are finite and non-negative.
    pub fn validate(&self) -> Result<(), TuningError> {
        check_non_negative("static_secs", self.static_secs)?;
        check_non_negative("moving_secs", self.moving_secs)
    }
}

/// Coefficients mapping a difficulty level onto spawn rate and moving speed.
///
/// Both curves are linear: `base + level * per_level`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Spawn rate, in obstacles per second, used before any level is applied.
    pub initial_spawn_rate: f32,
    /// Moving obstacle speed used before any level is applied.
    pub initial_speed: f32,
    /// Spawn rate intercept of the difficulty curve.
    pub spawn_rate_base: f32,
    /// Spawn rate added per difficulty level.
    pub spawn_rate_per_level: f32,
    /// Speed intercept of the difficulty curve.
    pub speed_base: f32,
    /// Speed added per difficulty level.
    pub speed_per_level: f32,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            initial_spawn_rate: 0.5,
            initial_speed: 0.05,
            spawn_rate_base: 0.3,
            spawn_rate_per_level: 0.1,
            speed_base: 0.05,
            speed_per_level: 0.01,
        }
    }
}

impl DifficultyTuning {
    /// Spawn rate, in obstacles per second, for the provided level.
    #[must_use]
    pub fn spawn_rate_for(&self, level: u32) -> f32 {
        self.spawn_rate_base + level as f32 * self.spawn_rate_per_level
    }

    /// Moving obstacle speed for the provided level.
    #[must_use]
    pub fn speed_for(&self, level: u32) -> f32 {
        self.speed_base + level as f32 * self.speed_per_level
    }

    /// Checks that every coefficient is finite and non-negative.
    pub fn validate(&self) -> Result<(), TuningError> {
        check_non_negative("initial_spawn_rate", self.initial_spawn_rate)?;
        check_non_negative("initial_speed", self.initial_speed)?;
        check_non_negative("spawn_rate_base", self.spawn_rate_base)?;
        check_non_negative("spawn_rate_per_level", self.spawn_rate_per_level)?;
        check_non_negative("speed_base", self.speed_base)?;
        check_non_negative("speed_per_level", self.speed_per_level)
    }
}

/// Reasons a tuning value is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TuningError {
    /// The value was NaN or infinite.
    #[error("{field} must be finite (received {value})")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// The value was negative.
    #[error("{field} must not be negative (received {value})")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// A lower bound exceeded its upper bound.
    #[error("{field} range is inverted ({min} > {max})")]
    InvertedRange {
        /// Name of the offending range.
        field: &'static str,
        /// Provided lower bound.
        min: f32,
        /// Provided upper bound.
        max: f32,
    },
    /// A duration or count that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Rejects NaN, infinite and negative values.
pub fn check_non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if !value.is_finite() {
        return Err(TuningError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(TuningError::Negative { field, value });
    }
    Ok(())
}
