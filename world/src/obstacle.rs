use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use snake_hazards_core::{
    CellCoord, CellRect, GridSize, MovementPattern, ObstacleKind, ObstacleSnapshot,
};
use snake_hazards_system_movement::{step, Heading, MotionState};

use crate::lifetime::Lifetime;

/// Obstacle pinned to the cell it spawned on.
#[derive(Debug)]
pub struct StaticObstacle {
    cell: CellCoord,
    grid: GridSize,
    lifetime: Lifetime,
}

impl StaticObstacle {
    /// Creates a static obstacle with the provided lifetime in seconds.
    #[must_use]
    pub fn new(cell: CellCoord, grid: GridSize, lifetime_secs: f32) -> Self {
        Self {
            cell,
            grid,
            lifetime: Lifetime::new(lifetime_secs),
        }
    }

    /// Cell occupied by the obstacle.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }
}

/// Obstacle that follows a movement pattern every tick.
///
/// The current cell is mirrored in an atomic so collision checks never wait
/// on the motion lock, which only [`MovingObstacle::update`] and the
/// configuration setters take.
#[derive(Debug)]
pub struct MovingObstacle {
    cell: AtomicU64,
    grid: GridSize,
    lifetime: Lifetime,
    motion: Mutex<MotionState>,
}

impl MovingObstacle {
    /// Creates a moving obstacle heading forward along its pattern.
    ///
    /// `seed` drives the obstacle's random walk steps.
    #[must_use]
    pub fn new(
        cell: CellCoord,
        grid: GridSize,
        pattern: MovementPattern,
        speed: f32,
        lifetime_secs: f32,
        seed: u64,
    ) -> Self {
        Self {
            cell: AtomicU64::new(pack(cell)),
            grid,
            lifetime: Lifetime::new(lifetime_secs),
            motion: Mutex::new(MotionState::new(pattern, speed, seed)),
        }
    }

    /// Cell occupied by the obstacle after its latest update.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        unpack(self.cell.load(Ordering::Acquire))
    }

    /// Advances the obstacle one tick along its pattern.
    pub fn update(&self) {
        let mut motion = self.motion();
        let next = step(self.cell(), self.grid, &mut motion);
        self.cell.store(pack(next), Ordering::Release);
    }

    /// Pattern currently driving the obstacle.
    #[must_use]
    pub fn pattern(&self) -> MovementPattern {
        self.motion().pattern()
    }

    /// Speed multiplier applied every tick.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.motion().speed()
    }

    /// Current heading along the primary axis.
    #[must_use]
    pub fn heading(&self) -> Heading {
        self.motion().heading()
    }

    /// Replaces the speed multiplier.
    pub fn set_speed(&self, speed: f32) {
        self.motion().set_speed(speed);
    }

    /// Replaces the heading along the primary axis.
    pub fn set_heading(&self, heading: Heading) {
        self.motion().set_heading(heading);
    }

    /// Switches to another pattern and restarts its phase.
    pub fn set_pattern(&self, pattern: MovementPattern) {
        self.motion().set_pattern(pattern);
    }

    fn motion(&self) -> MutexGuard<'_, MotionState> {
        self.motion.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Transient hazard occupying a single grid cell.
#[derive(Debug)]
pub enum Obstacle {
    /// Obstacle that never moves.
    Static(StaticObstacle),
    /// Obstacle following a movement pattern.
    Moving(MovingObstacle),
}

impl Obstacle {
    /// Creates a static obstacle.
    #[must_use]
    pub fn fixed(cell: CellCoord, grid: GridSize, lifetime_secs: f32) -> Self {
        Self::Static(StaticObstacle::new(cell, grid, lifetime_secs))
    }

    /// Creates a moving obstacle.
    #[must_use]
    pub fn moving(
        cell: CellCoord,
        grid: GridSize,
        pattern: MovementPattern,
        speed: f32,
        lifetime_secs: f32,
        seed: u64,
    ) -> Self {
        Self::Moving(MovingObstacle::new(
            cell,
            grid,
            pattern,
            speed,
            lifetime_secs,
            seed,
        ))
    }

    /// Variant of the obstacle.
    #[must_use]
    pub const fn kind(&self) -> ObstacleKind {
        match self {
            Self::Static(_) => ObstacleKind::Static,
            Self::Moving(_) => ObstacleKind::Moving,
        }
    }

    /// Cell currently occupied by the obstacle.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        match self {
            Self::Static(obstacle) => obstacle.cell(),
            Self::Moving(obstacle) => obstacle.cell(),
        }
    }

    /// Bounds the obstacle was spawned into.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        match self {
            Self::Static(obstacle) => obstacle.grid,
            Self::Moving(obstacle) => obstacle.grid,
        }
    }

    /// Movement pattern for moving obstacles.
    #[must_use]
    pub fn pattern(&self) -> Option<MovementPattern> {
        match self {
            Self::Static(_) => None,
            Self::Moving(obstacle) => Some(obstacle.pattern()),
        }
    }

    /// Moving variant, if this is one.
    #[must_use]
    pub const fn as_moving(&self) -> Option<&MovingObstacle> {
        match self {
            Self::Static(_) => None,
            Self::Moving(obstacle) => Some(obstacle),
        }
    }

    /// Advances the obstacle by one tick. Static obstacles ignore the call.
    pub fn update(&self) {
        if let Self::Moving(obstacle) = self {
            obstacle.update();
        }
    }

    /// Reports whether the obstacle occupies the cell.
    #[must_use]
    pub fn collides_with_point(&self, cell: CellCoord) -> bool {
        self.cell() == cell
    }

    /// Reports whether the obstacle lies inside the rectangle.
    #[must_use]
    pub fn collides_with_rect(&self, rect: CellRect) -> bool {
        rect.contains(self.cell())
    }

    /// Seconds left before the obstacle expires.
    #[must_use]
    pub fn remaining_lifetime(&self) -> f32 {
        self.lifetime().remaining()
    }

    /// Subtracts elapsed time from the lifetime, flooring at zero.
    pub fn decrement_lifetime(&self, elapsed: Duration) {
        self.lifetime().decrement(elapsed);
    }

    /// Reports whether the lifetime has run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.lifetime().is_expired()
    }

    /// Captures the obstacle's observable state.
    #[must_use]
    pub fn snapshot(&self) -> ObstacleSnapshot {
        ObstacleSnapshot {
            kind: self.kind(),
            cell: self.cell(),
            pattern: self.pattern(),
            remaining_lifetime: self.remaining_lifetime(),
        }
    }

    const fn lifetime(&self) -> &Lifetime {
        match self {
            Self::Static(obstacle) => &obstacle.lifetime,
            Self::Moving(obstacle) => &obstacle.lifetime,
        }
    }
}

fn pack(cell: CellCoord) -> u64 {
    (u64::from(cell.column()) << 32) | u64::from(cell.row())
}

fn unpack(bits: u64) -> CellCoord {
    CellCoord::new((bits >> 32) as u32, bits as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_hazards_core::CellRectSize;

    const GRID: GridSize = GridSize::new(5, 5);

    #[test]
    fn static_obstacle_never_moves() {
        let obstacle = Obstacle::fixed(CellCoord::new(2, 3), GRID, 12.0);
        for _ in 0..50 {
            obstacle.update();
        }
        assert_eq!(obstacle.cell(), CellCoord::new(2, 3));
        assert_eq!(obstacle.kind(), ObstacleKind::Static);
        assert_eq!(obstacle.pattern(), None);
    }

    #[test]
    fn moving_obstacle_bounces_along_row() {
        let obstacle = Obstacle::moving(
            CellCoord::new(0, 0),
            GRID,
            MovementPattern::LinearHorizontal,
            1.0,
            7.0,
            0,
        );
        let mut columns = Vec::new();
        for _ in 0..5 {
            obstacle.update();
            columns.push(obstacle.cell().column());
        }
        assert_eq!(columns, vec![1, 2, 3, 4, 3]);
    }

    #[test]
    fn point_collision_is_exact_cell_equality() {
        let obstacle = Obstacle::fixed(CellCoord::new(3, 4), GRID, 1.0);
        assert!(obstacle.collides_with_point(CellCoord::new(3, 4)));
        assert!(!obstacle.collides_with_point(CellCoord::new(4, 3)));
    }

    #[test]
    fn rect_collision_uses_current_cell() {
        let obstacle = Obstacle::fixed(CellCoord::new(1, 1), GRID, 1.0);
        let covering =
            CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(2, 2));
        let distant =
            CellRect::from_origin_and_size(CellCoord::new(2, 2), CellRectSize::new(3, 3));
        assert!(obstacle.collides_with_rect(covering));
        assert!(!obstacle.collides_with_rect(distant));
    }

    #[test]
    fn lifetime_and_position_are_independent() {
        let obstacle = Obstacle::moving(
            CellCoord::new(0, 2),
            GRID,
            MovementPattern::LinearHorizontal,
            1.0,
            3.0,
            0,
        );
        obstacle.decrement_lifetime(Duration::from_secs(1));
        assert_eq!(obstacle.cell(), CellCoord::new(0, 2));
        obstacle.update();
        assert!((obstacle.remaining_lifetime() - 2.0).abs() < 1e-6);
        assert_eq!(obstacle.cell(), CellCoord::new(1, 2));
    }

    #[test]
    fn snapshot_reports_pattern_and_lifetime() {
        let obstacle = Obstacle::moving(
            CellCoord::new(4, 4),
            GRID,
            MovementPattern::Zigzag,
            0.1,
            7.0,
            0,
        );
        let snapshot = obstacle.snapshot();
        assert_eq!(snapshot.kind, ObstacleKind::Moving);
        assert_eq!(snapshot.cell, CellCoord::new(4, 4));
        assert_eq!(snapshot.pattern, Some(MovementPattern::Zigzag));
        assert_eq!(snapshot.remaining_lifetime, 7.0);
    }

    #[test]
    fn pattern_and_speed_change_at_runtime() {
        let obstacle = MovingObstacle::new(
            CellCoord::new(2, 2),
            GRID,
            MovementPattern::Circular,
            0.05,
            7.0,
            0,
        );
        obstacle.set_speed(0.4);
        obstacle.set_pattern(MovementPattern::RandomWalk);
        assert_eq!(obstacle.speed(), 0.4);
        assert_eq!(obstacle.pattern(), MovementPattern::RandomWalk);
        assert_eq!(obstacle.heading(), Heading::Forward);
    }

    #[test]
    fn packed_cells_survive_extreme_coordinates() {
        let cell = CellCoord::new(u32::MAX, 7);
        assert_eq!(unpack(pack(cell)), cell);
    }
}
