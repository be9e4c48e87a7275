//! Highlight styles
//!
//! The active style is set by `highlight_set` and stamped onto every cell
//! written by subsequent `put` events. Full value equality makes [`Style`]
//! usable as a grouping key when the compositor merges draw runs.

use bitflags::bitflags;

use crate::color::Rgba;

bitflags! {
    /// Cell attribute flags
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct StyleAttrs: u8 {
        const BOLD   = 0b01;
        const ITALIC = 0b10;
    }
}

/// Highlight attributes attached to a cell.
///
/// `foreground`/`background` of None mean "use the workspace color".
/// Immutable once attached; `put` clones the active style into each cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub attrs: StyleAttrs,
    pub foreground: Option<Rgba>,
    pub background: Option<Rgba>,
}

impl Style {
    pub fn bold(&self) -> bool {
        self.attrs.contains(StyleAttrs::BOLD)
    }

    pub fn italic(&self) -> bool {
        self.attrs.contains(StyleAttrs::ITALIC)
    }
}

/// Text-run grouping key: attributes and foreground only.
///
/// Backgrounds are merged separately into fill runs, so two cells that
/// differ only in background still share one text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRunKey {
    pub attrs: StyleAttrs,
    pub foreground: Rgba,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_equality_is_full_value() {
        let a = Style {
            attrs: StyleAttrs::BOLD,
            foreground: Some(Rgba::rgb(255, 0, 0)),
            background: None,
        };
        let b = Style { background: Some(Rgba::BLACK), ..a };
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_attr_accessors() {
        let s = Style { attrs: StyleAttrs::BOLD | StyleAttrs::ITALIC, ..Default::default() };
        assert!(s.bold());
        assert!(s.italic());
        assert!(!Style::default().bold());
    }
}
