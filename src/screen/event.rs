//! Redraw event decoding
//!
//! The backend streams redraw instructions as `(name, positional args)`
//! pairs with untyped payloads. This module turns them into typed
//! [`RedrawEvent`] values; anything that does not match the documented
//! shape is a [`EventError`] and the processor skips it, keeping the rest
//! of the grid consistent.

use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;

/// Typed redraw instruction
#[derive(Debug, Clone, PartialEq)]
pub enum RedrawEvent {
    /// New grid size when the payload carries one; absent means
    /// "reallocate at the currently negotiated size"
    Resize(Option<(usize, usize)>),
    Clear,
    EolClear,
    CursorGoto { row: usize, col: usize },
    /// Glyphs written left-to-right from the cursor
    Put(Vec<SmolStr>),
    /// One attribute map per batched argument, applied in order
    HighlightSet(Vec<HighlightAttrs>),
    SetScrollRegion { top: usize, bot: usize, left: usize, right: usize },
    Scroll(i64),
    /// Packed 24-bit color; negative is the "no color" sentinel
    UpdateBg(i64),
}

/// Decoded `highlight_set` attribute map
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HighlightAttrs {
    pub bold: bool,
    pub italic: bool,
    /// Swap the active foreground/background instead of setting colors
    pub reverse: bool,
    pub foreground: Option<i64>,
    pub background: Option<i64>,
}

/// Malformed-event description; policy is warn + skip, never abort
#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown redraw event {0:?}")]
    Unknown(String),
    #[error("malformed {event} payload: {reason}")]
    BadPayload { event: &'static str, reason: &'static str },
}

fn bad(event: &'static str, reason: &'static str) -> EventError {
    EventError::BadPayload { event, reason }
}

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64()
}

fn as_usize(value: &Value) -> Option<usize> {
    value.as_u64().map(|v| v as usize)
}

/// First argument as a positional array, the common payload wrapper
fn first_array<'a>(
    event: &'static str,
    args: &'a [Value],
) -> Result<&'a Vec<Value>, EventError> {
    args.first()
        .and_then(Value::as_array)
        .ok_or_else(|| bad(event, "expected a leading array argument"))
}

impl RedrawEvent {
    /// Decode one backend instruction.
    ///
    /// Payload shapes are positional and backend-defined; see the handler
    /// documentation on [`crate::screen::Screen`] for the semantics.
    pub fn decode(name: &str, args: &[Value]) -> Result<RedrawEvent, EventError> {
        match name {
            "resize" => {
                // Optional [cols, rows] payload
                if let Some(arr) = args.first().and_then(Value::as_array) {
                    let cols = arr
                        .first()
                        .and_then(as_usize)
                        .ok_or_else(|| bad("resize", "bad column count"))?;
                    let rows = arr
                        .get(1)
                        .and_then(as_usize)
                        .ok_or_else(|| bad("resize", "bad row count"))?;
                    Ok(RedrawEvent::Resize(Some((cols, rows))))
                } else {
                    Ok(RedrawEvent::Resize(None))
                }
            }
            "clear" => Ok(RedrawEvent::Clear),
            "eol_clear" => Ok(RedrawEvent::EolClear),
            "cursor_goto" => {
                let pos = first_array("cursor_goto", args)?;
                let row = pos
                    .first()
                    .and_then(as_usize)
                    .ok_or_else(|| bad("cursor_goto", "bad row"))?;
                let col = pos
                    .get(1)
                    .and_then(as_usize)
                    .ok_or_else(|| bad("cursor_goto", "bad column"))?;
                Ok(RedrawEvent::CursorGoto { row, col })
            }
            "put" => {
                // Each argument is itself a run of glyph strings
                let mut glyphs = Vec::new();
                for arg in args {
                    let run = arg
                        .as_array()
                        .ok_or_else(|| bad("put", "expected glyph run array"))?;
                    for glyph in run {
                        let text = glyph
                            .as_str()
                            .ok_or_else(|| bad("put", "glyph is not a string"))?;
                        glyphs.push(SmolStr::new(text));
                    }
                }
                Ok(RedrawEvent::Put(glyphs))
            }
            "highlight_set" => {
                let mut attrs = Vec::new();
                for arg in args {
                    let map = arg
                        .as_array()
                        .and_then(|a| a.first())
                        .and_then(Value::as_object)
                        .ok_or_else(|| bad("highlight_set", "expected [map] argument"))?;
                    attrs.push(HighlightAttrs {
                        bold: map.contains_key("bold"),
                        italic: map.contains_key("italic"),
                        reverse: map.contains_key("reverse"),
                        foreground: map.get("foreground").and_then(as_i64),
                        background: map.get("background").and_then(as_i64),
                    });
                }
                Ok(RedrawEvent::HighlightSet(attrs))
            }
            "set_scroll_region" => {
                let bounds = first_array("set_scroll_region", args)?;
                let field = |i: usize, reason| {
                    bounds
                        .get(i)
                        .and_then(as_usize)
                        .ok_or_else(|| bad("set_scroll_region", reason))
                };
                Ok(RedrawEvent::SetScrollRegion {
                    top: field(0, "bad top")?,
                    bot: field(1, "bad bottom")?,
                    left: field(2, "bad left")?,
                    right: field(3, "bad right")?,
                })
            }
            "scroll" => {
                let count = first_array("scroll", args)?
                    .first()
                    .and_then(as_i64)
                    .ok_or_else(|| bad("scroll", "bad count"))?;
                Ok(RedrawEvent::Scroll(count))
            }
            "update_bg" => {
                // An absent payload behaves as the "no color" sentinel
                let color = match args.first() {
                    Some(value) => as_i64(value).ok_or_else(|| bad("update_bg", "bad color"))?,
                    None => -1,
                };
                Ok(RedrawEvent::UpdateBg(color))
            }
            other => Err(EventError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_cursor_goto() {
        let args = vec![json!([3, 7])];
        assert_eq!(
            RedrawEvent::decode("cursor_goto", &args).unwrap(),
            RedrawEvent::CursorGoto { row: 3, col: 7 }
        );
    }

    #[test]
    fn test_decode_put_flattens_runs() {
        let args = vec![json!(["a"]), json!(["b", "c"])];
        assert_eq!(
            RedrawEvent::decode("put", &args).unwrap(),
            RedrawEvent::Put(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_decode_highlight_set() {
        let args = vec![json!([{ "bold": true, "foreground": 0xFF0000 }])];
        let RedrawEvent::HighlightSet(attrs) =
            RedrawEvent::decode("highlight_set", &args).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(attrs.len(), 1);
        assert!(attrs[0].bold);
        assert!(!attrs[0].italic);
        assert_eq!(attrs[0].foreground, Some(0xFF0000));
        assert_eq!(attrs[0].background, None);
    }

    #[test]
    fn test_decode_scroll_and_region() {
        assert_eq!(
            RedrawEvent::decode("scroll", &[json!([-2])]).unwrap(),
            RedrawEvent::Scroll(-2)
        );
        assert_eq!(
            RedrawEvent::decode("set_scroll_region", &[json!([1, 10, 0, 79])]).unwrap(),
            RedrawEvent::SetScrollRegion { top: 1, bot: 10, left: 0, right: 79 }
        );
    }

    #[test]
    fn test_decode_update_bg_sentinel() {
        assert_eq!(
            RedrawEvent::decode("update_bg", &[json!(-1)]).unwrap(),
            RedrawEvent::UpdateBg(-1)
        );
        // Missing payload behaves as the sentinel
        assert_eq!(
            RedrawEvent::decode("update_bg", &[]).unwrap(),
            RedrawEvent::UpdateBg(-1)
        );
    }

    #[test]
    fn test_malformed_payloads_are_errors() {
        assert!(RedrawEvent::decode("cursor_goto", &[json!("oops")]).is_err());
        assert!(RedrawEvent::decode("put", &[json!([42])]).is_err());
        assert!(RedrawEvent::decode("scroll", &[json!([])]).is_err());
        assert!(RedrawEvent::decode("highlight_set", &[json!([])]).is_err());
        assert!(matches!(
            RedrawEvent::decode("mode_change", &[]),
            Err(EventError::Unknown(_))
        ));
    }
}
