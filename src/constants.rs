//! Global constants for nvscreen
//!
//! Consolidates timing and border-rendering constants to eliminate magic
//! numbers throughout the codebase.

use crate::color::Rgba;

// ============================================================================
// Timing Constants
// ============================================================================

/// Bound on the per-paint window-metadata refresh wait in milliseconds.
/// Past this the paint proceeds with the previous snapshot.
pub const OVERLAY_REFRESH_TIMEOUT_MS: u64 = 50;

// ============================================================================
// Border Rendering Constants
// ============================================================================

/// Width of the vertical separator shadow in pixels (drawn inward from the
/// separator's right edge)
pub const BORDER_SHADOW_WIDTH_PX: f64 = 6.0;

/// Height of the top-edge shadow in pixels (drawn downward from the window's
/// first row)
pub const BORDER_SHADOW_HEIGHT_PX: f64 = 5.0;

/// Shadow gradient start color (near the edge)
pub const BORDER_SHADOW_COLOR: Rgba = Rgba::new(10, 10, 10, 125.0 / 255.0);

/// Shadow gradient end color (fully faded)
pub const BORDER_SHADOW_FADE: Rgba = Rgba::new(10, 10, 10, 0.0);

/// Hard 1-pixel border edge color
pub const BORDER_EDGE_COLOR: Rgba = Rgba::BLACK;

// ============================================================================
// Default Workspace Colors
// ============================================================================

/// Default workspace foreground (hex, overridable in config)
pub const DEFAULT_FOREGROUND: &str = "#cdd3de";

/// Default workspace background (hex, overridable in config)
pub const DEFAULT_BACKGROUND: &str = "#181d22";
