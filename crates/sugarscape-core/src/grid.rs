use crate::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer lattice coordinate in `[0, width) x [0, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between cell coordinates.
    pub fn distance(self, other: Cell) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("cell {cell} is outside the {width}x{height} grid")]
    OutOfBounds {
        cell: Cell,
        width: usize,
        height: usize,
    },

    #[error("cell {cell} is already occupied by agent {occupant}")]
    Occupied { cell: Cell, occupant: AgentId },
}

/// Finite, non-wrapping lattice holding the cell -> agent occupancy index.
///
/// Agents remember their own cell; the grid is the single place that maps
/// a cell back to its occupant, so every occupancy change goes through
/// [`Grid::place`], [`Grid::relocate`] or [`Grid::vacate`].
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    occupants: Vec<Option<AgentId>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            width,
            height,
            occupants: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// All cells, row-major over `x`.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Cell::new(x, y)))
    }

    /// Cells within Manhattan distance `radius` of `center`, clipped to the
    /// grid, in row-major order. The center is included only on request.
    pub fn neighborhood(&self, center: Cell, radius: usize, include_center: bool) -> Vec<Cell> {
        let x_lo = center.x.saturating_sub(radius);
        let x_hi = center.x.saturating_add(radius).min(self.width - 1);
        let mut cells = Vec::new();
        for x in x_lo..=x_hi {
            let rest = radius - x.abs_diff(center.x);
            let y_lo = center.y.saturating_sub(rest);
            let y_hi = center.y.saturating_add(rest).min(self.height - 1);
            for y in y_lo..=y_hi {
                let cell = Cell::new(x, y);
                if include_center || cell != center {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    pub fn is_empty(&self, cell: Cell) -> bool {
        self.occupant(cell).is_none()
    }

    pub fn occupant(&self, cell: Cell) -> Option<AgentId> {
        self.occupants[self.index(cell)]
    }

    pub fn occupied_count(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_some()).count()
    }

    /// Put `agent` on an empty cell.
    pub fn place(&mut self, cell: Cell, agent: AgentId) -> Result<(), GridError> {
        if !self.contains(cell) {
            return Err(GridError::OutOfBounds {
                cell,
                width: self.width,
                height: self.height,
            });
        }
        let idx = self.index(cell);
        if let Some(occupant) = self.occupants[idx] {
            return Err(GridError::Occupied { cell, occupant });
        }
        self.occupants[idx] = Some(agent);
        Ok(())
    }

    /// Move `agent` from `from` to `to` in one update. A no-op when the cells
    /// are equal.
    pub fn relocate(&mut self, agent: AgentId, from: Cell, to: Cell) {
        if from == to {
            return;
        }
        let to_idx = self.index(to);
        if let Some(occupant) = self.occupants[to_idx] {
            panic!("agent {agent} cannot enter {to}: occupied by agent {occupant}");
        }
        self.vacate(from, agent);
        self.occupants[to_idx] = Some(agent);
    }

    /// Clear `cell`, which must currently hold `agent`.
    pub fn vacate(&mut self, cell: Cell, agent: AgentId) {
        let idx = self.index(cell);
        assert_eq!(
            self.occupants[idx],
            Some(agent),
            "agent {agent} does not occupy {cell}"
        );
        self.occupants[idx] = None;
    }

    fn index(&self, cell: Cell) -> usize {
        assert!(
            self.contains(cell),
            "cell {cell} outside {}x{} grid",
            self.width,
            self.height
        );
        cell.x * self.height + cell.y
    }
}
