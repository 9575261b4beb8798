use crate::grid::Cell;

/// Per-cell sugar on a `width x height` lattice.
///
/// `capacity` is the static carrying capacity loaded at construction and
/// `level` the currently harvestable amount. Both are stored row-major over
/// `x` (index `x * height + y`), matching the orientation of the text
/// datasets accepted by [`SugarField::parse`]. Invariant:
/// `0 <= level <= capacity` for every cell.
#[derive(Clone, Debug)]
pub struct SugarField {
    width: usize,
    height: usize,
    capacity: Vec<f64>,
    level: Vec<f64>,
    total: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapacityError {
    #[error("capacity map must be non-empty")]
    Empty,

    #[error("capacity map has {actual} entries, expected {expected} ({width}x{height})")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: cannot parse {token:?} as a number")]
    Malformed { line: usize, token: String },

    #[error("capacity at ({x}, {y}) must be finite and non-negative (got {value})")]
    InvalidValue { x: usize, y: usize, value: f64 },
}

impl SugarField {
    /// Build a field from `width * height` capacities in row-major-over-x
    /// order. Every cell starts full.
    pub fn from_capacity(
        width: usize,
        height: usize,
        capacity: Vec<f64>,
    ) -> Result<Self, CapacityError> {
        if width == 0 || height == 0 {
            return Err(CapacityError::Empty);
        }
        let expected = width * height;
        if capacity.len() != expected {
            return Err(CapacityError::SizeMismatch {
                width,
                height,
                expected,
                actual: capacity.len(),
            });
        }
        if let Some(idx) = capacity.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(CapacityError::InvalidValue {
                x: idx / height,
                y: idx % height,
                value: capacity[idx],
            });
        }
        let total = capacity.iter().sum();
        Ok(Self {
            width,
            height,
            level: capacity.clone(),
            capacity,
            total,
        })
    }

    /// Build a field from a matrix whose outer index is `x`.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, CapacityError> {
        let width = rows.len();
        let height = rows.first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(width * height);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != height {
                return Err(CapacityError::RaggedRow {
                    row,
                    expected: height,
                    actual: cols.len(),
                });
            }
            values.extend(cols);
        }
        Self::from_capacity(width, height, values)
    }

    /// Parse a whitespace-separated numeric matrix, one `x` row per line.
    /// Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, CapacityError> {
        let mut rows = Vec::new();
        let mut expected = None;
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| CapacityError::Malformed {
                        line: idx + 1,
                        token: token.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            let expected = *expected.get_or_insert(row.len());
            if row.len() != expected {
                return Err(CapacityError::RaggedRow {
                    row: rows.len(),
                    expected,
                    actual: row.len(),
                });
            }
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Classic two-hill landscape: Gaussian peaks centred in opposite
    /// quadrants, rounded to whole units in `0..=max_capacity`.
    pub fn two_peaks(width: usize, height: usize, max_capacity: u32) -> Result<Self, CapacityError> {
        let peaks = [
            (width as f64 * 0.7, height as f64 * 0.3),
            (width as f64 * 0.3, height as f64 * 0.7),
        ];
        let sigma = (width.min(height) as f64 / 5.0).max(1.0);
        let mut capacity = Vec::with_capacity(width * height);
        for x in 0..width {
            for y in 0..height {
                let falloff = peaks
                    .iter()
                    .map(|&(px, py)| {
                        let dx = x as f64 + 0.5 - px;
                        let dy = y as f64 + 0.5 - py;
                        (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp()
                    })
                    .fold(0.0f64, f64::max);
                capacity.push((falloff * max_capacity as f64).round());
            }
        }
        Self::from_capacity(width, height, capacity)
    }

    /// Every cell gains one unit, capped at its capacity.
    pub fn regrow(&mut self) {
        for (level, cap) in self.level.iter_mut().zip(&self.capacity) {
            let before = *level;
            *level = (*level + 1.0).min(*cap);
            self.total += *level - before;
        }
    }

    /// Take everything in `cell`, leaving it empty.
    pub fn harvest(&mut self, cell: Cell) -> f64 {
        let idx = self.index(cell);
        let amount = std::mem::take(&mut self.level[idx]);
        self.total -= amount;
        amount
    }

    pub fn level(&self, cell: Cell) -> f64 {
        self.level[self.index(cell)]
    }

    pub fn capacity(&self, cell: Cell) -> f64 {
        self.capacity[self.index(cell)]
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Current levels, row-major over `x`.
    pub fn levels(&self) -> &[f64] {
        &self.level
    }

    pub fn capacities(&self) -> &[f64] {
        &self.capacity
    }

    /// Sum of current levels across the field.
    pub fn total(&self) -> f64 {
        self.total
    }

    fn index(&self, cell: Cell) -> usize {
        assert!(
            cell.x < self.width && cell.y < self.height,
            "cell {cell} outside {}x{} sugar field",
            self.width,
            self.height
        );
        cell.x * self.height + cell.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_field() -> SugarField {
        SugarField::from_rows(vec![vec![0.0, 2.0, 4.0], vec![1.0, 3.0, 0.5]]).unwrap()
    }

    #[test]
    fn rows_index_by_x() {
        let field = small_field();
        assert_eq!(field.width(), 2);
        assert_eq!(field.height(), 3);
        assert!((field.capacity(Cell::new(0, 2)) - 4.0).abs() < f64::EPSILON);
        assert!((field.capacity(Cell::new(1, 0)) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn starts_full() {
        let field = small_field();
        assert_eq!(field.levels(), field.capacities());
        assert!((field.total() - 10.5).abs() < 1e-9);
    }

    #[test]
    fn harvest_empties_cell_and_returns_level() {
        let mut field = small_field();
        let cell = Cell::new(1, 1);
        assert!((field.harvest(cell) - 3.0).abs() < f64::EPSILON);
        assert_eq!(field.level(cell), 0.0);
        assert_eq!(field.harvest(cell), 0.0);
        assert!((field.total() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn regrow_adds_one_and_caps_at_capacity() {
        let mut field = small_field();
        for x in 0..2 {
            for y in 0..3 {
                field.harvest(Cell::new(x, y));
            }
        }
        field.regrow();
        assert!((field.level(Cell::new(0, 2)) - 1.0).abs() < f64::EPSILON);
        assert!((field.level(Cell::new(1, 2)) - 0.5).abs() < f64::EPSILON);
        assert_eq!(field.level(Cell::new(0, 0)), 0.0);
        for _ in 0..10 {
            field.regrow();
        }
        assert_eq!(field.levels(), field.capacities());
        assert!((field.total() - 10.5).abs() < 1e-9);
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let field = SugarField::parse("# map\n0 1 2\n\n3 4 5 # tail\n").unwrap();
        assert_eq!(field.width(), 2);
        assert_eq!(field.height(), 3);
        assert!((field.capacity(Cell::new(1, 2)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_reports_bad_tokens_with_line() {
        let err = SugarField::parse("0 1\n1 x\n").unwrap_err();
        assert_eq!(
            err,
            CapacityError::Malformed {
                line: 2,
                token: "x".to_string()
            }
        );
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        assert!(matches!(
            SugarField::parse("0 1 2\n1 2\n"),
            Err(CapacityError::RaggedRow {
                row: 1,
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn rejects_negative_capacity() {
        assert!(matches!(
            SugarField::from_capacity(2, 1, vec![1.0, -1.0]),
            Err(CapacityError::InvalidValue { x: 1, y: 0, .. })
        ));
    }

    #[test]
    fn rejects_size_mismatch() {
        assert!(matches!(
            SugarField::from_capacity(2, 2, vec![1.0; 3]),
            Err(CapacityError::SizeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn two_peaks_stays_within_bounds() {
        let field = SugarField::two_peaks(50, 50, 4).unwrap();
        assert!(field.capacities().iter().all(|c| (0.0..=4.0).contains(c)));
        assert!(field.capacities().iter().any(|c| *c == 4.0));
        assert!(field.capacities().iter().any(|c| *c == 0.0));
    }
}
