//! The boundary between the scheduler and the physical output device.
//!
//! The scheduler drives anything that implements [`DisplayHandle`]. Two
//! implementations ship with the crate: [`MockDisplay`] (an in-memory buffer
//! for tests) and [`ConsoleDisplay`] (prints its bordered buffer on every
//! update, for running without hardware). A real HD44780-class driver lives
//! outside this crate and plugs in through the same trait — pick the
//! implementation once at construction; nothing branches on it afterwards.

use crate::error::Error;
use crate::layout::render_block;

/// One fixed-size character display.
///
/// Implementations are expected to be fast and non-blocking; there is no
/// per-call timeout. A failed write surfaces as [`Error::Render`] and the
/// scheduler skips that cycle.
pub trait DisplayHandle: Send {
    /// Replace the display contents. Lines are separated by `\n` and already
    /// justified to the display width.
    fn set_text(&mut self, text: &str) -> Result<(), Error>;

    /// Blank the display.
    fn clear(&mut self) -> Result<(), Error>;

    /// Width in characters.
    fn width(&self) -> usize;

    /// Height in rows.
    fn height(&self) -> usize;
}

/// In-memory display for tests and headless use.
#[derive(Debug, Clone)]
pub struct MockDisplay {
    width: usize,
    height: usize,
    text: String,
}

impl MockDisplay {
    /// Create a blank mock display of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            text: String::new(),
        }
    }

    /// The current buffer contents.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl DisplayHandle for MockDisplay {
    fn set_text(&mut self, text: &str) -> Result<(), Error> {
        self.text = text.to_string();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.text.clear();
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}

/// Display that prints its bordered buffer to stdout on every update.
///
/// Purely a debugging surface for machines without LCDs attached. Use the
/// scheduler's shared-channel mode with this handle so concurrent prints
/// from different displays don't interleave.
#[derive(Debug, Clone)]
pub struct ConsoleDisplay {
    label: String,
    width: usize,
    height: usize,
    text: String,
}

impl ConsoleDisplay {
    /// Create a console display with a label shown above its panel.
    pub fn new(label: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            text: String::new(),
        }
    }

    fn print(&self) {
        println!("{}", self.label);
        for line in render_block(&self.text, self.width, self.height) {
            println!("{line}");
        }
    }
}

impl DisplayHandle for ConsoleDisplay {
    fn set_text(&mut self, text: &str) -> Result<(), Error> {
        self.text = text.to_string();
        self.print();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.text.clear();
        self.print();
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_display_buffer() {
        let mut display = MockDisplay::new(16, 2);
        assert_eq!(display.text(), "");
        assert_eq!(display.width(), 16);
        assert_eq!(display.height(), 2);

        display.set_text("line1\nline2").unwrap();
        assert_eq!(display.text(), "line1\nline2");

        display.clear().unwrap();
        assert_eq!(display.text(), "");
    }

    #[test]
    fn test_console_display_dimensions() {
        let display = ConsoleDisplay::new("LCD 0", 16, 2);
        assert_eq!(display.width(), 16);
        assert_eq!(display.height(), 2);
    }
}
