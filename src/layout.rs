//! Fixed-width text layout for character LCD lines.
//!
//! Character LCDs have no notion of alignment: every cell is addressed
//! explicitly, so "left / center / right" has to be baked into the string
//! itself. This module turns 1–3 text segments into one line of exactly the
//! display width, and renders whole text buffers into bordered blocks for
//! console/dev visualization.
//!
//! Widths are measured in `char`s, not bytes: the glyph set used by the
//! frame builders (`°`, `🌧`, ...) is multi-byte UTF-8 but occupies a single
//! LCD cell.
//!
//! # Example
//!
//! ```
//! use kitchenpi::layout::justify;
//!
//! assert_eq!(justify(&["abc", "xyz"], 16).unwrap(), "abc          xyz");
//! assert_eq!(justify(&["abc", "qwe", "xyz"], 16).unwrap(), "abc   qwe    xyz");
//! ```

use crate::error::Error;

/// Maximum number of segments [`justify`] accepts per line.
///
/// Plenty for a 16-character display; the engine deliberately does not
/// generalize further.
pub const MAX_SEGMENTS: usize = 3;

/// Justify 1–3 text segments into a single line of `width` characters.
///
/// - 0 or 1 segment, or a combined length of `width` or more: the segments
///   are concatenated unpadded. Overflow is not clipped — callers are
///   expected to pre-truncate.
/// - 2 segments: first flush left, second flush right.
/// - 3 segments: first flush left, third flush right, second centered in the
///   remaining gap. When the slack around the middle segment is odd, the left
///   side gets the smaller half.
///
/// # Errors
///
/// Returns [`Error::TooManySegments`] for more than [`MAX_SEGMENTS`] segments.
pub fn justify<S: AsRef<str>>(segments: &[S], width: usize) -> Result<String, Error> {
    if segments.len() > MAX_SEGMENTS {
        return Err(Error::TooManySegments(segments.len()));
    }

    let joined: String = segments.iter().map(|s| s.as_ref()).collect();
    if segments.len() <= 1 || char_width(&joined) >= width {
        return Ok(joined);
    }

    match segments {
        [left, right] => {
            let (left, right) = (left.as_ref(), right.as_ref());
            let pad = width - char_width(left) - char_width(right);
            Ok(format!("{left}{}{right}", " ".repeat(pad)))
        }
        [left, middle, right] => {
            let (left, middle, right) = (left.as_ref(), middle.as_ref(), right.as_ref());
            let gap = width - char_width(left) - char_width(right);
            let slack = gap - char_width(middle);
            let lead = slack / 2;
            Ok(format!(
                "{left}{}{middle}{}{right}",
                " ".repeat(lead),
                " ".repeat(slack - lead)
            ))
        }
        // 0 and 1 segments returned above, >3 rejected above
        _ => Ok(joined),
    }
}

/// Render a text buffer as a bordered block of `height` rows, each padded to
/// `width` characters.
///
/// The frame (`┌─┐`, `│`, `└─┘`) is a developer/console visualization aid;
/// hardware rendering consumes only the inner rows. Missing rows are emitted
/// as blank lines.
pub fn render_block(text: &str, width: usize, height: usize) -> Vec<String> {
    let rows: Vec<&str> = text.split('\n').collect();
    let mut lines = Vec::with_capacity(height + 2);

    lines.push(format!("┌{}┐", "─".repeat(width)));
    for row in 0..height {
        let content = rows.get(row).copied().unwrap_or("");
        lines.push(format!("│{}│", pad_right(content, width)));
    }
    lines.push(format!("└{}┘", "─".repeat(width)));

    lines
}

/// Join several bordered blocks side by side, one row of text per output
/// line, for printing every display of a multi-LCD setup at once.
pub fn panels_side_by_side(blocks: &[Vec<String>]) -> String {
    let max_rows = blocks.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = String::new();

    for row in 0..max_rows {
        let mut first = true;
        for block in blocks {
            if let Some(line) = block.get(row) {
                if !first {
                    out.push_str("  ");
                }
                out.push_str(line);
                first = false;
            }
        }
        out.push('\n');
    }

    out
}

fn char_width(s: &str) -> usize {
    s.chars().count()
}

fn pad_right(s: &str, width: usize) -> String {
    let len = char_width(s);
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}
