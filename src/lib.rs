//! nvscreen - screen model and damage engine for an editor front end
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             Redraw Stream                │
//! ├──────────────────────────────────────────┤
//! │  Events (decode)  →  Screen / Grid       │
//! │                          ↓               │
//! │        Damage Tracker (dirty rect)       │
//! │                          ↓               │
//! │   Compositor (+ window overlay) → DrawOp │
//! └──────────────────────────────────────────┘
//! ```
//!
//! The backend streams positional redraw events; [`screen::Screen`] applies
//! them to a cell [`screen::grid::Grid`] while widening a shared
//! [`screen::damage::DamageTracker`] rectangle. When the host repaints, the
//! [`render::Compositor`] turns the exposed region into an ordered
//! [`render::DrawOp`] list, consulting the [`overlay::OverlayResolver`] for
//! split-window geometry under a bounded wait. No drawing backend lives
//! here; a painter executes the ops.

pub mod color;
pub mod config;
pub mod constants;
pub mod overlay;
pub mod render;
pub mod screen;
pub mod style;

pub use render::{Compositor, DrawOp, PixelRect};
pub use screen::damage::DamageRect;
pub use screen::{FontMetrics, Screen, UiCommand};
