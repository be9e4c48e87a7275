//! Color values and decoding
//!
//! The backend reports colors as packed 24-bit integers and highlight-group
//! lookups answer with hex strings; both decode into [`Rgba`].

/// Color value with 8-bit channels and a fractional alpha.
///
/// Equality is exact component comparison; used directly as part of the
/// run-grouping keys in the compositor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha as 0.0-1.0 fraction
    pub a: f32,
}

impl Rgba {
    /// Opaque color from RGB components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black (the `update_bg` sentinel fallback)
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
}

/// Decode a packed 24-bit color integer (0xRRGGBB) from the backend.
///
/// Negative values are the backend's "no color" sentinel and values above
/// 24 bits are malformed; both return None so callers can fall back to the
/// ambient workspace color.
pub fn decode_rgb24(value: i64) -> Option<Rgba> {
    if !(0..=0xFF_FF_FF).contains(&value) {
        return None;
    }
    let r = ((value >> 16) & 0xFF) as u8;
    let g = ((value >> 8) & 0xFF) as u8;
    let b = (value & 0xFF) as u8;
    Some(Rgba::rgb(r, g, b))
}

/// Parse 6-digit hex color (e.g., "#ff0000" -> (255, 0, 0))
/// Also supports 3-digit short format (e.g., "#f00" -> (255, 0, 0))
/// Returns None on invalid input.
pub fn parse_hex_color(hex: &str) -> Option<Rgba> {
    let hex = hex.trim_start_matches('#');
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba::rgb(r, g, b))
        }
        3 => {
            // Short format: expand F -> FF
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Rgba::rgb(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rgb24() {
        assert_eq!(decode_rgb24(0xFF0000), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(decode_rgb24(0x00FF7F), Some(Rgba::rgb(0, 255, 127)));
        assert_eq!(decode_rgb24(-1), None);
        assert_eq!(decode_rgb24(0x1_00_00_00), None);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("336699"), Some(Rgba::rgb(0x33, 0x66, 0x99)));
        assert_eq!(parse_hex_color("#f00"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("#ff00"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }

    #[test]
    fn test_exact_equality() {
        assert_ne!(Rgba::new(10, 10, 10, 0.5), Rgba::new(10, 10, 10, 0.49));
        assert_eq!(Rgba::rgb(1, 2, 3), Rgba::new(1, 2, 3, 1.0));
    }
}
