use snake_hazards_core::{CellCoord, GridSize, PlayerView};

/// Snake that circles a fixed loop one cell inside the grid border.
#[derive(Clone, Debug)]
pub(crate) struct ScriptedSnake {
    path: Vec<CellCoord>,
    cursor: usize,
    initial_length: usize,
    length: usize,
    body: Vec<CellCoord>,
    alive: bool,
}

impl ScriptedSnake {
    pub(crate) fn new(grid: GridSize, length: usize) -> Self {
        let path = loop_path(grid);
        let initial_length = length.clamp(1, path.len().max(1));
        let mut snake = Self {
            path,
            cursor: 0,
            initial_length,
            length: initial_length,
            body: Vec::new(),
            alive: true,
        };
        snake.rebuild_body();
        snake
    }

    /// Cells the head visits, in order.
    pub(crate) fn path(&self) -> &[CellCoord] {
        &self.path
    }

    pub(crate) fn len(&self) -> usize {
        self.length
    }

    pub(crate) fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.path.len().max(1);
        self.rebuild_body();
    }

    /// Adds one segment, never covering the whole loop.
    pub(crate) fn grow(&mut self) {
        if self.length + 1 < self.path.len() {
            self.length += 1;
            self.rebuild_body();
        }
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    /// Returns to the start of the loop at the initial length.
    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
        self.length = self.initial_length;
        self.alive = true;
        self.rebuild_body();
    }

    pub(crate) fn occupied(&self) -> Vec<CellCoord> {
        std::iter::once(self.head())
            .chain(self.body.iter().copied())
            .collect()
    }

    fn rebuild_body(&mut self) {
        let len = self.path.len();
        self.body.clear();
        if len == 0 {
            return;
        }
        self.body.extend(
            (1..self.length).map(|offset| self.path[(self.cursor + len - offset % len) % len]),
        );
    }
}

impl PlayerView for ScriptedSnake {
    fn head(&self) -> CellCoord {
        self.path.get(self.cursor).copied().unwrap_or(CellCoord::new(0, 0))
    }

    fn body(&self) -> &[CellCoord] {
        &self.body
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Clockwise perimeter of the rectangle inset by one cell from the border.
fn loop_path(grid: GridSize) -> Vec<CellCoord> {
    if grid.columns() < 4 || grid.rows() < 4 {
        return vec![grid.center()];
    }
    let (left, right) = (1, grid.columns() - 2);
    let (top, bottom) = (1, grid.rows() - 2);

    let mut path = Vec::new();
    path.extend((left..=right).map(|column| CellCoord::new(column, top)));
    path.extend((top + 1..=bottom).map(|row| CellCoord::new(right, row)));
    path.extend((left..right).rev().map(|column| CellCoord::new(column, bottom)));
    path.extend((top + 1..bottom).rev().map(|row| CellCoord::new(left, row)));
    path
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn loop_is_closed_and_inset() {
        let grid = GridSize::new(6, 5);
        let snake = ScriptedSnake::new(grid, 3);
        let path = snake.path();
        assert_eq!(path.len(), 2 * (4 + 3) - 4);
        let unique: HashSet<_> = path.iter().copied().collect();
        assert_eq!(unique.len(), path.len());
        for window in path.windows(2) {
            assert_eq!(window[0].manhattan_distance(window[1]), 1);
        }
        let (first, last) = (path[0], path[path.len() - 1]);
        assert_eq!(first.manhattan_distance(last), 1);
        assert!(path.iter().all(|cell| {
            (1..=4).contains(&cell.column()) && (1..=3).contains(&cell.row())
        }));
    }

    #[test]
    fn body_trails_the_head() {
        let mut snake = ScriptedSnake::new(GridSize::new(8, 8), 3);
        for _ in 0..5 {
            snake.advance();
        }
        let path = snake.path().to_vec();
        assert_eq!(snake.head(), path[5]);
        assert_eq!(snake.body(), &[path[4], path[3]]);
        assert_eq!(snake.occupied().len(), 3);
    }

    #[test]
    fn body_wraps_around_the_loop() {
        let snake = ScriptedSnake::new(GridSize::new(4, 4), 3);
        let path = snake.path().to_vec();
        assert_eq!(path.len(), 4);
        assert_eq!(snake.body(), &[path[3], path[2]]);
    }

    #[test]
    fn growth_is_capped_and_reset_restores_start() {
        let mut snake = ScriptedSnake::new(GridSize::new(4, 4), 2);
        for _ in 0..10 {
            snake.grow();
        }
        assert_eq!(snake.len(), 3);
        snake.advance();
        snake.kill();
        assert!(!snake.is_alive());

        snake.reset();
        assert!(snake.is_alive());
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.head(), snake.path()[0]);
    }
}
