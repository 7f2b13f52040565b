//! Scan Path Planner
//!
//! Decides, row by row from the bottom up, which columns get scanned and in
//! which direction. Rows without a burning pixel are skipped; the direction
//! alternates on every scanned row (serpentine scan).

use crate::power_grid::PowerGrid;

/// Traversal direction of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    LeftToRight,
    RightToLeft,
}

impl ScanDirection {
    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Self::LeftToRight => Self::RightToLeft,
            Self::RightToLeft => Self::LeftToRight,
        }
    }
}

/// Inclusive column range `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub start: usize,
    pub end: usize,
}

impl ColumnRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of columns (at least one)
    pub fn columns(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn contains(&self, col: usize) -> bool {
        (self.start..=self.end).contains(&col)
    }
}

/// Plan for one grid row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPlan {
    /// Nothing to burn
    Skip { row: usize },
    /// Scan `range` in `direction`
    Scan {
        row: usize,
        range: ColumnRange,
        direction: ScanDirection,
    },
}

impl RowPlan {
    pub fn row(&self) -> usize {
        match self {
            Self::Skip { row } | Self::Scan { row, .. } => *row,
        }
    }
}

/// Plan every row of the grid, bottom row first
pub fn plan_rows(grid: &PowerGrid) -> Vec<RowPlan> {
    let mut direction = ScanDirection::LeftToRight;
    (0..grid.height())
        .map(|row| match grid.active_range(row) {
            None => RowPlan::Skip { row },
            Some(range) => {
                let plan = RowPlan::Scan {
                    row,
                    range,
                    direction,
                };
                direction = direction.reversed();
                plan
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_alternates_on_scanned_rows() {
        let grid = PowerGrid::from_rows(&[
            vec![0, 1, 1, 0],
            vec![0, 0, 0, 0],
            vec![1, 0, 0, 0],
            vec![0, 0, 0, 2],
        ])
        .unwrap();

        let plan = plan_rows(&grid);
        assert_eq!(
            plan,
            vec![
                RowPlan::Scan {
                    row: 0,
                    range: ColumnRange::new(1, 2),
                    direction: ScanDirection::LeftToRight,
                },
                RowPlan::Skip { row: 1 },
                RowPlan::Scan {
                    row: 2,
                    range: ColumnRange::new(0, 0),
                    direction: ScanDirection::RightToLeft,
                },
                RowPlan::Scan {
                    row: 3,
                    range: ColumnRange::new(3, 3),
                    direction: ScanDirection::LeftToRight,
                },
            ]
        );
        assert_eq!(plan[1].row(), 1);
    }

    #[test]
    fn test_blank_grid_is_all_skips() {
        let grid = PowerGrid::from_rows(&[vec![0; 5], vec![0; 5]]).unwrap();
        assert!(plan_rows(&grid)
            .iter()
            .all(|plan| matches!(plan, RowPlan::Skip { .. })));
    }

    #[test]
    fn test_column_range() {
        let range = ColumnRange::new(3, 12);
        assert_eq!(range.columns(), 10);
        assert!(range.contains(3));
        assert!(range.contains(12));
        assert!(!range.contains(13));
    }
}
