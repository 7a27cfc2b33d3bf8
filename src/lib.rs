//! # kitchenpi
//!
//! A rotating weather dashboard for small fixed-size character LCDs
//! (HD44780-class 16×2 modules and friends).
//!
//! The crate has three core pieces:
//! - A [`layout`] engine that justifies 1–3 text segments into one
//!   fixed-width line and renders bordered panels for console/dev use
//! - A [`weather`] aggregator turning raw numeric weather fields into
//!   display-sized values (condition labels, compass buckets, a single
//!   "will it rain at all" probability)
//! - A [`RotationScheduler`] that owns one background task per display and
//!   cycles timed frames of content through a [`DisplayHandle`]
//!
//! Plus an optional [`OpenMeteo`] client (feature `open-meteo`, on by
//! default) that fetches and aggregates the forecast series.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use kitchenpi::{ConsoleDisplay, Frame, OpenMeteo, RotationScheduler, LCD_HEIGHT, LCD_WIDTH};
//!
//! # async fn example() -> Result<(), kitchenpi::Error> {
//! let scheduler = RotationScheduler::shared_channel(vec![
//!     Box::new(ConsoleDisplay::new("today", LCD_WIDTH, LCD_HEIGHT)),
//! ]);
//!
//! let forecast = OpenMeteo::new().fetch(44.9778, -93.2650).await?;
//! scheduler.set_rotation(0, vec![
//!     Frame::new(forecast.current.frame_lines(), Duration::from_secs(5)),
//!     Frame::new(forecast.daily[0].today_lines(forecast.current.uv), Duration::from_secs(5)),
//! ])?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Display model
//!
//! A *frame* is one timed screenful (lines of justified segments plus a
//! duration); a *rotation* is the cyclically-repeating frame sequence
//! assigned to one display. Rotations are replaced, never appended, and the
//! display's background task is never restarted by an update — the current
//! frame position survives wherever it can.
//!
//! ## Feature Flags
//!
//! - `open-meteo` (default) - Open-Meteo forecast client

pub mod display;
mod error;
pub mod layout;
pub mod scheduler;
pub mod weather;

pub use display::{ConsoleDisplay, DisplayHandle, MockDisplay};
pub use error::Error;
pub use scheduler::{Frame, RotationScheduler};
pub use weather::{
    bucket_wind_direction, classify_condition, persistence_probability, CompassPoint,
    CurrentConditions, DailyForecast, Forecast, HourlyForecast,
};

/// Display width in characters of the stock 16×2 module
pub const LCD_WIDTH: usize = 16;

/// Display height in rows of the stock 16×2 module
pub const LCD_HEIGHT: usize = 2;

// Optional modules
#[cfg(feature = "open-meteo")]
pub mod open_meteo;
#[cfg(feature = "open-meteo")]
pub use open_meteo::{OpenMeteo, OPEN_METEO_URL};

/// Single-cell glyphs used by the frame builders.
///
/// These are ordinary Unicode here; a hardware driver maps them to CGRAM
/// custom characters on the device.
pub mod glyphs {
    /// Degree sign for temperatures
    pub const DEGREES: char = '°';
    /// "Feels like" marker
    pub const APPROX: char = '≈';
    /// Wind speed/gusts marker
    pub const WIND: char = '≋';
    /// Cloud cover marker
    pub const CLOUD: char = '☁';
    /// Relative humidity marker
    pub const HUMIDITY: char = '⸪';
    /// Precipitation chance marker
    pub const PRECIP: char = '🌧';
    /// UV index marker
    pub const SUN: char = '☼';
}
