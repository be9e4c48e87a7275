//! Screen model
//!
//! Core module applying the backend's redraw instruction stream to the
//! character grid and accounting damage for the paint path.
//!
//! Events arrive in order and order is significant; there is one handler
//! per event kind and no batching or reordering across kinds. A malformed
//! payload is logged and skipped so one bad event never takes down an
//! interactive session.

pub mod damage;
pub mod event;
pub mod grid;

use std::sync::mpsc::Sender;
use std::sync::Arc;

use log::{trace, warn};
use smol_str::SmolStr;
use unicode_width::UnicodeWidthStr;

use crate::color::decode_rgb24;
use crate::color::Rgba;
use crate::style::{Style, StyleAttrs};
use damage::DamageTracker;
use event::{EventError, HighlightAttrs, RedrawEvent};
use grid::{Cell, Grid};

/// Cell geometry reported by the host's font stack
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    /// Advance width of one cell in pixels
    pub cell_width: f64,
    /// Height of one row in pixels
    pub line_height: f64,
}

/// Cell-display-width classification seam.
///
/// The default answers from `unicode-width`; a host with real font metrics
/// substitutes its own probe (a glyph is "normal" when its rendered advance
/// equals one standard cell width).
pub trait WidthProbe: Send + Sync {
    fn is_normal_width(&self, glyph: &str) -> bool;
}

/// Default probe backed by `unicode-width`, with an ASCII fast path
pub struct UnicodeWidthProbe;

impl WidthProbe for UnicodeWidthProbe {
    fn is_normal_width(&self, glyph: &str) -> bool {
        if glyph.is_empty() {
            return true;
        }
        if glyph.as_bytes()[0] <= 127 {
            return true;
        }
        glyph.width() <= 1
    }
}

/// Outbound request to the backend dispatch channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Ask the backend for a new grid size (columns, rows)
    TryResize { cols: usize, rows: usize },
}

/// The screen model: grid, damage accounting and event dispatch
pub struct Screen {
    grid: Grid,
    damage: Arc<DamageTracker>,
    font: FontMetrics,
    width_probe: Box<dyn WidthProbe>,
    /// Negotiated grid size; the grid itself reallocates on the next
    /// `resize`/`clear` event
    cols: usize,
    rows: usize,
    command_tx: Option<Sender<UiCommand>>,
}

impl Screen {
    pub fn new(rows: usize, cols: usize, font: FontMetrics) -> Self {
        Self {
            grid: Grid::new(rows, cols),
            damage: Arc::new(DamageTracker::new(cols, rows)),
            font,
            width_probe: Box::new(UnicodeWidthProbe),
            cols,
            rows,
            command_tx: None,
        }
    }

    /// Channel used for outbound backend requests (UI resize)
    pub fn set_command_channel(&mut self, tx: Sender<UiCommand>) {
        self.command_tx = Some(tx);
    }

    /// Replace the width classification probe
    pub fn set_width_probe(&mut self, probe: Box<dyn WidthProbe>) {
        self.width_probe = probe;
    }

    /// Workspace-wide default colors (fallbacks for styles without one)
    pub fn set_workspace_colors(&mut self, foreground: Option<Rgba>, background: Option<Rgba>) {
        self.grid.foreground = foreground;
        self.grid.background = background;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn font(&self) -> FontMetrics {
        self.font
    }

    /// Shared damage tracker (cloneable handle for the paint path)
    pub fn damage(&self) -> Arc<DamageTracker> {
        Arc::clone(&self.damage)
    }

    // ========== Event dispatch ==========

    /// Decode and apply one raw backend instruction.
    ///
    /// Malformed payloads are skipped (warn + continue); silent corruption
    /// of the grid would be worse than a dropped instruction.
    pub fn handle_raw(&mut self, name: &str, args: &[serde_json::Value]) {
        match RedrawEvent::decode(name, args) {
            Ok(event) => self.apply(event),
            Err(EventError::Unknown(name)) => {
                trace!("ignoring unhandled redraw event {:?}", name);
            }
            Err(err) => {
                warn!("skipping redraw event: {}", err);
            }
        }
    }

    /// Apply one typed redraw instruction
    pub fn apply(&mut self, event: RedrawEvent) {
        match event {
            RedrawEvent::Resize(dims) => self.resize(dims),
            RedrawEvent::Clear => self.clear(),
            RedrawEvent::EolClear => self.eol_clear(),
            RedrawEvent::CursorGoto { row, col } => self.cursor_goto(row, col),
            RedrawEvent::Put(glyphs) => self.put(&glyphs),
            RedrawEvent::HighlightSet(attrs) => self.highlight_set(&attrs),
            RedrawEvent::SetScrollRegion { top, bot, left, right } => {
                self.set_scroll_region(top, bot, left, right)
            }
            RedrawEvent::Scroll(count) => self.scroll(count),
            RedrawEvent::UpdateBg(color) => self.update_bg(color),
        }
    }

    // ========== Handlers ==========

    /// Reallocate the grid at the negotiated size and mark everything dirty.
    /// A payload renegotiates the size first.
    pub fn resize(&mut self, dims: Option<(usize, usize)>) {
        if let Some((cols, rows)) = dims {
            self.cols = cols;
            self.rows = rows;
        }
        self.grid.realloc(self.rows, self.cols);
        self.damage.set_bounds(self.cols, self.rows);
        self.damage.mark_all_dirty();
        trace!("resize to {}x{}", self.cols, self.rows);
    }

    /// Clear behaves as a resize at the current negotiated size
    pub fn clear(&mut self) {
        self.grid.realloc(self.rows, self.cols);
        self.damage.mark_all_dirty();
    }

    /// Erase from the cursor column to the end of the row.
    /// Damage covers one extra trailing column for wide-cell boundaries.
    pub fn eol_clear(&mut self) {
        let (row, col) = self.grid.cursor;
        let Some(line) = self.grid.row_mut(row) else {
            return;
        };
        let mut cleared = 0;
        for slot in line.iter_mut().skip(col) {
            *slot = None;
            cleared += 1;
        }
        self.damage.mark_dirty(col, row, cleared + 1, 1);
    }

    /// Move the cursor without clamping; out-of-bounds writes are dropped
    /// at write time instead
    pub fn cursor_goto(&mut self, row: usize, col: usize) {
        self.grid.cursor = (row, col);
    }

    /// Write a run of glyphs left-to-right from the cursor.
    ///
    /// Each glyph advances the column by one logical slot regardless of its
    /// display width. The damage span widens at wide/narrow boundaries:
    /// one extra column when the run ends on a wide cell or overwrote one,
    /// and a one-column shift left when the cell before the run start is
    /// (or was) wide.
    pub fn put(&mut self, glyphs: &[SmolStr]) {
        let (row, start_col) = self.grid.cursor;
        if row >= self.grid.rows() {
            return;
        }
        let cols = self.grid.cols();
        let style = self.grid.active_style;

        let wide_at = |grid: &Grid, col: usize| {
            grid.cell(row, col).is_some_and(|c| !c.normal_width)
        };

        // Width class of the first overwritten slot, before this write
        let old_first_normal = !wide_at(&self.grid, start_col);

        let mut col = start_col;
        let mut num_chars = 0;
        let mut old_normal_width = true;
        let mut last_normal = true;
        for glyph in glyphs {
            if col >= cols {
                // Column no longer advances; the rest of the run drops
                continue;
            }
            old_normal_width = !wide_at(&self.grid, col);
            let normal = self.width_probe.is_normal_width(glyph);
            if let Some(line) = self.grid.row_mut(row) {
                line[col] = Some(Cell {
                    glyph: glyph.clone(),
                    style,
                    normal_width: normal,
                });
            }
            last_normal = normal;
            col += 1;
            num_chars += 1;
        }

        if num_chars > 0 && !last_normal {
            num_chars += 1;
        }
        if !old_normal_width {
            num_chars += 1;
        }
        self.grid.cursor = (row, col);

        // Shift the redraw start left when the neighbor to the left of the
        // run is wide, or was wide before this write
        let mut redraw_start = start_col;
        if start_col > 0 {
            let left_is_wide = self
                .grid
                .cell(row, start_col - 1)
                .is_some_and(|c| !c.glyph.is_empty() && !c.normal_width);
            if left_is_wide || !old_first_normal {
                redraw_start -= 1;
                num_chars += 1;
            }
        }

        trace!("put {} glyphs at ({}, {})", glyphs.len(), row, start_col);
        self.damage.mark_dirty(redraw_start, row, num_chars, 1);
    }

    /// Decode attribute maps into the active style.
    ///
    /// `reverse` swaps the current foreground/background pair; explicit
    /// colors decode from packed 24-bit values, absent or undecodable ones
    /// fall back to the workspace colors.
    pub fn highlight_set(&mut self, attrs: &[HighlightAttrs]) {
        for attr in attrs {
            let mut style = Style::default();
            style.attrs.set(StyleAttrs::BOLD, attr.bold);
            style.attrs.set(StyleAttrs::ITALIC, attr.italic);

            if attr.reverse {
                style.foreground = self.grid.active_style.background;
                style.background = self.grid.active_style.foreground;
                self.grid.active_style = style;
                continue;
            }

            style.foreground = attr
                .foreground
                .and_then(decode_rgb24)
                .or(self.grid.foreground);
            style.background = attr
                .background
                .and_then(decode_rgb24)
                .or(self.grid.background);
            self.grid.active_style = style;
        }
    }

    /// Store scroll-region bounds; all-zero is the whole-grid sentinel,
    /// resolved lazily by `scroll`
    pub fn set_scroll_region(&mut self, top: usize, bot: usize, left: usize, right: usize) {
        self.grid.scroll_region = [top, bot, left, right];
    }

    /// Shift content within the active scroll region by `count` rows.
    ///
    /// Dirty marks: the whole region span, the vacated band at the trailing
    /// edge, and a band of the same size just outside the region's leading
    /// edge when the region does not touch the grid edge there (rows outside
    /// the boundary visually abut the scrolled content).
    pub fn scroll(&mut self, count: i64) {
        if count == 0 {
            return;
        }
        let Some(region) = self.grid.resolve_scroll_region() else {
            return;
        };
        let [top, bot, left, right] = region;
        self.damage.mark_dirty(left, top, right - left + 1, bot - top + 1);

        self.grid.shift_region(region, count);

        let band = count.unsigned_abs() as usize;
        let band = band.min(bot - top + 1);
        if count > 0 {
            self.damage.mark_dirty(left, bot + 1 - band, right - left, band);
            if top > 0 {
                self.damage
                    .mark_dirty(left, top.saturating_sub(band), right - left, band);
            }
        } else {
            self.damage.mark_dirty(left, top, right - left, band);
            if bot + 1 < self.grid.rows() {
                self.damage.mark_dirty(left, bot + 1, right - left, band);
            }
        }
        trace!("scroll {} in region {:?}", count, region);
    }

    /// Set the workspace background; a negative color is the backend's
    /// "no color" sentinel and maps to opaque black
    pub fn update_bg(&mut self, color: i64) {
        if color == -1 {
            self.grid.background = Some(Rgba::BLACK);
            return;
        }
        match decode_rgb24(color) {
            Some(rgba) => self.grid.background = Some(rgba),
            None => warn!("update_bg: undecodable color {:#x}, keeping current", color),
        }
    }

    /// Window containing the cursor, looked up in a layout snapshot
    pub fn cursor_win<'a>(
        &self,
        snapshot: &'a crate::overlay::LayoutSnapshot,
    ) -> Option<&'a crate::overlay::WindowInfo> {
        let (row, col) = self.grid.cursor;
        snapshot.window_at(col, row)
    }

    // ========== Size negotiation ==========

    /// Recompute the cell-grid size from the widget's pixel size and ask the
    /// backend to resize when it changed
    pub fn update_size(&mut self, px_width: f64, px_height: f64) {
        let cols = (px_width / self.font.cell_width) as usize;
        let rows = (px_height / self.font.line_height) as usize;
        if cols != self.cols || rows != self.rows {
            if let Some(tx) = &self.command_tx {
                let _ = tx.send(UiCommand::TryResize { cols, rows });
            }
        }
        self.cols = cols;
        self.rows = rows;
    }
}
