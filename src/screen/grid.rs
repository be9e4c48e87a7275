//! Character grid
//!
//! 2D array of optional styled cells backing the screen model.
//! Holds cursor position, scroll-region bounds, the active highlight style
//! and the workspace colors; the event processor in the parent module
//! mutates it and accounts the damage.

use smol_str::SmolStr;

use crate::color::Rgba;
use crate::style::Style;

/// Data for one grid slot
///
/// Replaced wholesale on write; an empty glyph means the slot was cleared
/// but keeps its style for background painting.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Glyph text (commonly one character, empty means "cleared")
    pub glyph: SmolStr,
    /// Highlight attributes stamped at write time
    pub style: Style,
    /// False when the glyph renders wider than one standard cell
    pub normal_width: bool,
}

/// Scroll region bounds: top, bottom, left, right (inclusive).
/// All-zero is the sentinel for "whole grid".
pub type ScrollRegion = [usize; 4];

/// Character grid
pub struct Grid {
    /// Cell matrix, row-major outer Vec (rows x cols)
    content: Vec<Vec<Option<Cell>>>,
    rows: usize,
    cols: usize,
    /// Cursor position (row, col). Not clamped on `cursor_goto`; writes
    /// beyond the grid are dropped at write time instead.
    pub cursor: (usize, usize),
    /// Scroll region, all-zero sentinel resolved lazily by `scroll`
    pub scroll_region: ScrollRegion,
    /// Active style applied to subsequent writes
    pub active_style: Style,
    /// Workspace foreground (fallback when a cell style has none)
    pub foreground: Option<Rgba>,
    /// Workspace background (fallback when a cell style has none)
    pub background: Option<Rgba>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            content: vec![vec![None; cols]; rows],
            rows,
            cols,
            cursor: (0, 0),
            scroll_region: [0; 4],
            active_style: Style::default(),
            foreground: None,
            background: None,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Reallocate the matrix to the given size and reset the cursor.
    /// Used by both `resize` and `clear`; idempotent for equal dimensions.
    pub fn realloc(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.content = vec![vec![None; cols]; rows];
        self.cursor = (0, 0);
    }

    /// Cell at (row, col); None when empty or out of bounds
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.content.get(row)?.get(col)?.as_ref()
    }

    /// Full row slice; None when out of bounds
    pub fn row(&self, row: usize) -> Option<&[Option<Cell>]> {
        self.content.get(row).map(|r| r.as_slice())
    }

    pub fn row_mut(&mut self, row: usize) -> Option<&mut Vec<Option<Cell>>> {
        self.content.get_mut(row)
    }

    /// Resolve the scroll region, mapping the all-zero sentinel to the whole
    /// grid and clamping stored bounds into the current dimensions.
    /// Returns None for an empty grid or a region that cannot be satisfied.
    pub fn resolve_scroll_region(&self) -> Option<ScrollRegion> {
        if self.rows == 0 || self.cols == 0 {
            return None;
        }
        let [top, bot, left, right] = self.scroll_region;
        if top == 0 && bot == 0 && left == 0 && right == 0 {
            return Some([0, self.rows - 1, 0, self.cols - 1]);
        }
        let top = top.min(self.rows - 1);
        let bot = bot.min(self.rows - 1);
        let left = left.min(self.cols - 1);
        let right = right.min(self.cols - 1);
        if top > bot || left > right {
            return None;
        }
        Some([top, bot, left, right])
    }

    /// Shift content within the region vertically by `count` rows.
    ///
    /// Positive count moves content up (scroll down); negative is the
    /// reverse. Rows vacated at the trailing edge are cleared. `count` is
    /// assumed pre-clamped to the region height.
    pub fn shift_region(&mut self, region: ScrollRegion, count: i64) {
        let [top, bot, left, right] = region;
        let height = bot - top + 1;
        if count > 0 {
            let count = (count as usize).min(height);
            if count < height {
                for row in top..=bot - count {
                    for col in left..=right {
                        self.content[row][col] = self.content[row + count][col].take();
                    }
                }
            }
            for row in (bot + 1 - count)..=bot {
                for col in left..=right {
                    self.content[row][col] = None;
                }
            }
        } else {
            let count = ((-count) as usize).min(height);
            // Iterate in reverse to avoid overwriting source rows
            for row in ((top + count)..=bot).rev() {
                for col in left..=right {
                    self.content[row][col] = self.content[row - count][col].take();
                }
            }
            for row in top..top + count {
                for col in left..=right {
                    self.content[row][col] = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;

    fn glyph_cell(ch: &str) -> Option<Cell> {
        Some(Cell {
            glyph: SmolStr::new(ch),
            style: Style::default(),
            normal_width: true,
        })
    }

    fn glyph_at(grid: &Grid, row: usize, col: usize) -> Option<&str> {
        grid.cell(row, col).map(|c| c.glyph.as_str())
    }

    #[test]
    fn test_realloc_clears_and_homes_cursor() {
        let mut grid = Grid::new(3, 4);
        *grid.row_mut(1).unwrap() = vec![glyph_cell("x"), None, None, None];
        grid.cursor = (2, 3);
        grid.realloc(3, 4);
        assert_eq!(grid.cursor, (0, 0));
        assert!(grid.cell(1, 0).is_none());
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
    }

    #[test]
    fn test_sentinel_resolves_to_full_grid() {
        let grid = Grid::new(5, 10);
        assert_eq!(grid.resolve_scroll_region(), Some([0, 4, 0, 9]));
    }

    #[test]
    fn test_region_clamped_to_bounds() {
        let mut grid = Grid::new(5, 10);
        grid.scroll_region = [1, 99, 2, 99];
        assert_eq!(grid.resolve_scroll_region(), Some([1, 4, 2, 9]));
    }

    #[test]
    fn test_shift_up_clears_trailing_rows() {
        let mut grid = Grid::new(3, 2);
        *grid.row_mut(1).unwrap() = vec![glyph_cell("a"), glyph_cell("b")];
        *grid.row_mut(2).unwrap() = vec![glyph_cell("c"), None];
        grid.shift_region([0, 2, 0, 1], 1);
        assert_eq!(glyph_at(&grid, 0, 0), Some("a"));
        assert_eq!(glyph_at(&grid, 1, 0), Some("c"));
        assert!(grid.cell(2, 0).is_none());
        assert!(grid.cell(2, 1).is_none());
    }

    #[test]
    fn test_shift_down_clears_leading_rows() {
        let mut grid = Grid::new(3, 2);
        *grid.row_mut(0).unwrap() = vec![glyph_cell("a"), None];
        *grid.row_mut(1).unwrap() = vec![glyph_cell("b"), None];
        grid.shift_region([0, 2, 0, 1], -1);
        assert!(grid.cell(0, 0).is_none());
        assert_eq!(glyph_at(&grid, 1, 0), Some("a"));
        assert_eq!(glyph_at(&grid, 2, 0), Some("b"));
    }

    #[test]
    fn test_shift_respects_column_bounds() {
        let mut grid = Grid::new(2, 3);
        *grid.row_mut(0).unwrap() = vec![glyph_cell("x"), glyph_cell("y"), glyph_cell("z")];
        *grid.row_mut(1).unwrap() = vec![glyph_cell("p"), glyph_cell("q"), glyph_cell("r")];
        // Only the middle column participates
        grid.shift_region([0, 1, 1, 1], 1);
        assert_eq!(glyph_at(&grid, 0, 0), Some("x"));
        assert_eq!(glyph_at(&grid, 0, 1), Some("q"));
        assert_eq!(glyph_at(&grid, 0, 2), Some("z"));
        assert!(grid.cell(1, 1).is_none());
        assert_eq!(glyph_at(&grid, 1, 0), Some("p"));
    }
}
