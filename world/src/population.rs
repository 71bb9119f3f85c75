use std::time::Duration;

use snake_hazards_core::{CellCoord, CellRect, GridSize, ObstacleKind, ObstacleView};

use crate::obstacle::Obstacle;

/// Insertion-ordered collection that exclusively owns every live obstacle.
///
/// Insertions refuse out-of-bounds and occupied cells. Nothing keeps moving
/// obstacles apart once they are live, so two of them may share a cell.
/// Read paths take `&self` and rely on the obstacles' interior mutability,
/// letting a shared lock cover movement and lifetime decay.
#[derive(Debug)]
pub struct Population {
    grid: GridSize,
    obstacles: Vec<Obstacle>,
}

impl Population {
    /// Creates an empty population bound to the grid.
    #[must_use]
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            obstacles: Vec::new(),
        }
    }

    /// Bounds every obstacle must lie within.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Inserts the obstacle when its cell is in bounds and free.
    ///
    /// Returns `false`, dropping the obstacle, when the placement is refused.
    pub fn insert(&mut self, obstacle: Obstacle) -> bool {
        let cell = obstacle.cell();
        if obstacle.grid() != self.grid || !self.grid.contains(cell) || self.is_occupied(cell) {
            return false;
        }
        self.obstacles.push(obstacle);
        true
    }

    /// Inserts every acceptable obstacle from the batch and returns how many were kept.
    pub fn insert_batch<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = Obstacle>,
    {
        let mut inserted = 0;
        for obstacle in batch {
            if self.insert(obstacle) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Reports whether any obstacle currently occupies the cell.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.obstacles
            .iter()
            .any(|obstacle| obstacle.collides_with_point(cell))
    }

    /// Reports whether any obstacle lies inside the rectangle.
    #[must_use]
    pub fn intersects_rect(&self, rect: CellRect) -> bool {
        self.obstacles
            .iter()
            .any(|obstacle| obstacle.collides_with_rect(rect))
    }

    /// Advances every obstacle by one tick.
    pub fn update_movement(&self) {
        for obstacle in &self.obstacles {
            obstacle.update();
        }
    }

    /// Subtracts the elapsed time from every lifetime.
    pub fn decay(&self, elapsed: Duration) {
        for obstacle in &self.obstacles {
            obstacle.decrement_lifetime(elapsed);
        }
    }

    /// Applies the speed to every live moving obstacle.
    pub fn set_moving_speed(&self, speed: f32) {
        self.obstacles
            .iter()
            .filter_map(Obstacle::as_moving)
            .for_each(|obstacle| obstacle.set_speed(speed));
    }

    /// Removes expired obstacles, preserving the order of the survivors.
    ///
    /// Returns the number of obstacles removed.
    pub fn sweep_expired(&mut self) -> usize {
        let before = self.obstacles.len();
        self.obstacles.retain(|obstacle| !obstacle.is_expired());
        before - self.obstacles.len()
    }

    /// Number of expired obstacles still awaiting a sweep.
    #[must_use]
    pub fn expired_count(&self) -> usize {
        self.obstacles
            .iter()
            .filter(|obstacle| obstacle.is_expired())
            .count()
    }

    /// Removes every obstacle.
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// Number of live obstacles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Reports whether the population holds no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Number of live obstacles of the provided kind.
    #[must_use]
    pub fn count_of(&self, kind: ObstacleKind) -> usize {
        self.obstacles
            .iter()
            .filter(|obstacle| obstacle.kind() == kind)
            .count()
    }

    /// Iterator over the obstacles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    /// Captures a snapshot of every obstacle in insertion order.
    #[must_use]
    pub fn view(&self) -> ObstacleView {
        ObstacleView::from_snapshots(self.obstacles.iter().map(Obstacle::snapshot).collect())
    }
}
