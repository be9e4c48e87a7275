//! Render compositing
//!
//! Turns an exposed pixel rectangle into an ordered list of drawing
//! instructions: merged background fill runs, text runs grouped by shared
//! style, individually placed wide glyphs, and split-window border overlays.
//! A painter executes the list; nothing here touches a toolkit.

use std::sync::Mutex;
use std::time::Duration;

use log::trace;
use smol_str::SmolStr;

use crate::color::Rgba;
use crate::constants::{
    BORDER_EDGE_COLOR, BORDER_SHADOW_COLOR, BORDER_SHADOW_FADE, BORDER_SHADOW_HEIGHT_PX,
    BORDER_SHADOW_WIDTH_PX,
};
use crate::overlay::{LayoutSnapshot, OverlayResolver, WindowInfo};
use crate::screen::grid::Grid;
use crate::screen::{FontMetrics, Screen};
use crate::style::{StyleAttrs, TextRunKey};

/// Exposed region in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Cell-space paint range derived from an exposed pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

/// One drawing instruction for the painter
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgba,
    },
    /// Linear gradient between two colors; `horizontal` selects the axis,
    /// fading from the (x, y) edge toward the far edge
    GradientRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        from: Rgba,
        to: Rgba,
        horizontal: bool,
    },
    /// Monospaced text run; gaps inside it are pre-filled with spaces
    TextRun {
        x: f64,
        y: f64,
        text: String,
        foreground: Rgba,
        bold: bool,
        italic: bool,
    },
    /// Individually placed wide glyph, excluded from run merging so its
    /// rendering is not stretched by the monospaced placement assumption
    Glyph {
        x: f64,
        y: f64,
        glyph: SmolStr,
        foreground: Rgba,
        bold: bool,
        italic: bool,
    },
}

/// Fallback text color when neither the cell nor the workspace has one
const FALLBACK_FOREGROUND: Rgba = Rgba::rgb(255, 255, 255);

/// Convert an exposed pixel rectangle to an inclusive cell range.
/// Far edges round up so partially exposed cells are repainted.
pub fn cell_rect(font: FontMetrics, exposed: &PixelRect) -> CellRect {
    let row = (exposed.y / font.line_height).floor() as usize;
    let col = (exposed.x / font.cell_width).floor() as usize;
    let bottom = exposed.y + exposed.height;
    let right = exposed.x + exposed.width;
    let rows = (bottom / font.line_height).ceil() as usize - row;
    let cols = (right / font.cell_width).ceil() as usize - col;
    CellRect { row, col, rows, cols }
}

/// Batches draw instructions for exposed regions.
///
/// The paint lock serializes full paint execution against itself; grid
/// mutation is not excluded, which is safe under the over-damage contract
/// (a racing mutation marks its region dirty and a following paint covers
/// it).
pub struct Compositor {
    paint_lock: Mutex<()>,
    refresh_timeout: Duration,
}

impl Compositor {
    pub fn new(refresh_timeout: Duration) -> Self {
        Self {
            paint_lock: Mutex::new(()),
            refresh_timeout,
        }
    }

    /// Full paint entry: refresh the window overlay under its bound, then
    /// compose the exposed rectangle against the latest snapshot
    pub fn compose(
        &self,
        screen: &Screen,
        resolver: &OverlayResolver,
        exposed: PixelRect,
    ) -> Vec<DrawOp> {
        let snapshot = resolver.refresh(self.refresh_timeout, screen.grid().rows());
        self.compose_snapshot(screen, &snapshot, exposed)
    }

    /// Compose against an already-resolved window snapshot
    pub fn compose_snapshot(
        &self,
        screen: &Screen,
        snapshot: &LayoutSnapshot,
        exposed: PixelRect,
    ) -> Vec<DrawOp> {
        let _paint = match self.paint_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let font = screen.font();
        let grid = screen.grid();
        let rect = cell_rect(font, &exposed);
        trace!("compose {:?} -> {:?}", exposed, rect);

        let mut ops = Vec::new();
        if let Some(bg) = grid.background {
            ops.push(DrawOp::FillRect {
                x: exposed.x,
                y: exposed.y,
                width: exposed.width,
                height: exposed.height,
                color: bg,
            });
        }

        for y in rect.row..rect.row + rect.rows {
            if y >= grid.rows() {
                continue;
            }
            fill_backgrounds(&mut ops, grid, font, y, rect.col, rect.cols);
            draw_text(&mut ops, grid, font, y, rect.col, rect.cols);
        }

        for win in &snapshot.windows {
            if win.pos.0 + win.height < rect.row && win.pos.1 + win.width + 1 < rect.col {
                continue;
            }
            if win.pos.0 > rect.row + rect.rows && win.pos.1 + win.width > rect.col + rect.cols {
                continue;
            }
            draw_window_border(&mut ops, win, grid, font);
        }

        ops
    }
}

/// Merge adjacent same-background columns of one row into fill rectangles.
///
/// A wide cell's background carries onto the slot to its right (the glyph
/// visually covers both), and a transition to "no background" flushes the
/// current run.
fn fill_backgrounds(
    ops: &mut Vec<DrawOp>,
    grid: &Grid,
    font: FontMetrics,
    y: usize,
    col: usize,
    cols: usize,
) {
    let Some(line) = grid.row(y) else {
        return;
    };

    let flush = |ops: &mut Vec<DrawOp>, start: usize, end: usize, bg: Rgba| {
        ops.push(DrawOp::FillRect {
            x: start as f64 * font.cell_width,
            y: y as f64 * font.line_height,
            width: (end - start + 1) as f64 * font.cell_width,
            height: font.line_height,
            color: bg,
        });
    };

    let mut start = 0;
    let mut end = 0;
    let mut run_bg: Option<Rgba> = None;
    let mut last_cell: Option<&crate::screen::grid::Cell> = None;
    for x in col..col + cols {
        if x >= line.len() {
            continue;
        }
        let cell = line[x].as_ref();
        let mut bg = cell.and_then(|c| c.style.background);
        if let Some(prev) = last_cell {
            if !prev.normal_width {
                bg = prev.style.background;
            }
        }
        match (bg, run_bg) {
            (Some(bg), None) => {
                start = x;
                end = x;
                run_bg = Some(bg);
            }
            (Some(bg), Some(current)) => {
                if bg == current {
                    end = x;
                } else {
                    flush(ops, start, end, current);
                    start = x;
                    end = x;
                    run_bg = Some(bg);
                }
            }
            (None, Some(current)) => {
                flush(ops, start, end, current);
                run_bg = None;
            }
            (None, None) => {}
        }
        last_cell = cell;
    }
    if let Some(current) = run_bg {
        flush(ops, start, end, current);
    }
}

/// Group one row's glyphs into per-style text runs.
///
/// Cells group by attribute + foreground equality in first-appearance order
/// (deterministic output); gaps inside a run render as spaces to keep the
/// monospaced alignment, and wide cells are drawn individually afterward.
fn draw_text(
    ops: &mut Vec<DrawOp>,
    grid: &Grid,
    font: FontMetrics,
    y: usize,
    col: usize,
    cols: usize,
) {
    let Some(line) = grid.row(y) else {
        return;
    };

    // Back up one column when the cell just left of the range is wide:
    // its glyph bleeds into the first exposed column
    let (mut col, mut cols) = (col, cols);
    if col > 0 {
        if let Some(prev) = line.get(col - 1).and_then(|slot| slot.as_ref()) {
            if !prev.glyph.is_empty() && !prev.normal_width {
                col -= 1;
                cols += 1;
            }
        }
    }

    let mut groups: Vec<(TextRunKey, Vec<usize>)> = Vec::new();
    let mut wide: Vec<usize> = Vec::new();
    for x in col..col + cols {
        if x >= line.len() {
            continue;
        }
        let Some(cell) = line[x].as_ref() else {
            continue;
        };
        if cell.glyph == " " || cell.glyph.is_empty() {
            continue;
        }
        if !cell.normal_width {
            wide.push(x);
            continue;
        }
        let key = TextRunKey {
            attrs: cell.style.attrs,
            foreground: cell
                .style
                .foreground
                .or(grid.foreground)
                .unwrap_or(FALLBACK_FOREGROUND),
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(x),
            None => groups.push((key, vec![x])),
        }
    }

    for (key, members) in &groups {
        let mut text = String::new();
        let mut next = members.iter().peekable();
        for x in col..col + cols {
            let Some(&&index) = next.peek() else {
                break;
            };
            if x < index {
                text.push(' ');
                continue;
            }
            if x == index {
                // Members are column-ordered, so this never misses
                if let Some(cell) = line[x].as_ref() {
                    text.push_str(&cell.glyph);
                }
                next.next();
            }
        }
        if !text.is_empty() {
            ops.push(DrawOp::TextRun {
                x: col as f64 * font.cell_width,
                y: y as f64 * font.line_height,
                text,
                foreground: key.foreground,
                bold: key.attrs.contains(StyleAttrs::BOLD),
                italic: key.attrs.contains(StyleAttrs::ITALIC),
            });
        }
    }

    for &x in &wide {
        let Some(cell) = line[x].as_ref() else {
            continue;
        };
        if cell.glyph == " " {
            continue;
        }
        ops.push(DrawOp::Glyph {
            x: x as f64 * font.cell_width,
            y: y as f64 * font.line_height,
            glyph: cell.glyph.clone(),
            foreground: cell
                .style
                .foreground
                .or(grid.foreground)
                .unwrap_or(FALLBACK_FOREGROUND),
            bold: cell.style.bold(),
            italic: cell.style.italic(),
        });
    }
}

/// Border overlay for one window: a one-cell separator column to its right
/// with a hard 1px edge and inward shadow, plus a top edge and downward
/// shadow for windows below the first grid row
fn draw_window_border(ops: &mut Vec<DrawOp>, win: &WindowInfo, grid: &Grid, font: FontMetrics) {
    let Some(bg) = win.bg.or(grid.background) else {
        return;
    };
    let (row, col) = win.pos;
    let mut height = win.height;
    if win.statusline {
        height += 1;
    }
    let top_px = row as f64 * font.line_height;
    let height_px = height as f64 * font.line_height;

    // Separator column sharing the window (or workspace) background
    ops.push(DrawOp::FillRect {
        x: (col + win.width) as f64 * font.cell_width,
        y: top_px,
        width: font.cell_width,
        height: height_px,
        color: bg,
    });
    let sep_right = (col + win.width + 1) as f64 * font.cell_width;
    ops.push(DrawOp::FillRect {
        x: sep_right - 1.0,
        y: top_px,
        width: 1.0,
        height: height_px,
        color: BORDER_EDGE_COLOR,
    });
    ops.push(DrawOp::GradientRect {
        x: sep_right - BORDER_SHADOW_WIDTH_PX,
        y: top_px,
        width: BORDER_SHADOW_WIDTH_PX,
        height: height_px,
        from: BORDER_SHADOW_FADE,
        to: BORDER_SHADOW_COLOR,
        horizontal: true,
    });

    // Top edge and downward shadow, omitted at the very top row
    if row > 0 {
        let left_px = col as f64 * font.cell_width;
        let width_px = (win.width + 1) as f64 * font.cell_width;
        ops.push(DrawOp::FillRect {
            x: left_px,
            y: top_px - 1.0,
            width: width_px,
            height: 1.0,
            color: BORDER_EDGE_COLOR,
        });
        ops.push(DrawOp::GradientRect {
            x: left_px,
            y: top_px,
            width: width_px,
            height: BORDER_SHADOW_HEIGHT_PX,
            from: BORDER_SHADOW_COLOR,
            to: BORDER_SHADOW_FADE,
            horizontal: false,
        });
    }
}
