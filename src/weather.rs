//! Weather-signal aggregation: turning raw numeric weather fields into the
//! compact values a 16-character display can show.
//!
//! Everything in this module is a pure function over already-fetched data;
//! the HTTP side lives in [`crate::open_meteo`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Error;
use crate::glyphs;

/// Average duration, in hours, assumed for a single rain event when deriving
/// the start hazard from an hourly probability-of-precipitation series.
pub const MEAN_RAIN_EVENT_HOURS: f64 = 2.0;

/// One of the eight compass points a wind direction is bucketed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    /// All points, in clockwise order starting at north.
    pub const ALL: [CompassPoint; 8] = [
        CompassPoint::N,
        CompassPoint::NE,
        CompassPoint::E,
        CompassPoint::SE,
        CompassPoint::S,
        CompassPoint::SW,
        CompassPoint::W,
        CompassPoint::NW,
    ];

    /// Short display label (`"N"`, `"NE"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NE => "NE",
            CompassPoint::E => "E",
            CompassPoint::SE => "SE",
            CompassPoint::S => "S",
            CompassPoint::SW => "SW",
            CompassPoint::W => "W",
            CompassPoint::NW => "NW",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a WMO weather code to a short mnemonic label sized for a 16-character
/// display.
///
/// `~` marks the light variant, `!` the heavy one. Unknown codes degrade to
/// the literal code followed by `(?)` and are logged as anomalies — a bad
/// code must never halt the display loop.
pub fn classify_condition(code: u16) -> String {
    let label = match code {
        0 | 1 => "Clear",
        2 => "Pt.Cl.",
        3 => "Cloudy",
        45 | 48 => "Fog",
        51 => "~Driz",
        53 => "Driz",
        55 => "Driz!",
        56 => "FrzDrz",
        57 => "FrzDrz!",
        61 => "~Rain",
        63 => "Rain",
        65 => "Rain!",
        66 => "FrzRain",
        67 => "FrzRain!",
        71 => "~Snow",
        73 => "Snow",
        75 => "Snow!",
        77 => "Snow",
        80 => "~Shower",
        81 => "Shower",
        82 => "Shower!",
        85 => "SnShowr",
        86 => "SnShowr!",
        95 | 96 | 99 => "Storm",
        unknown => {
            tracing::warn!(code = unknown, "unknown weather code");
            return format!("{unknown}(?)");
        }
    };
    label.to_string()
}

/// Bucket a wind direction in degrees into one of the eight compass points.
///
/// `360` is treated as `0`. Each point owns a 45° arc centered on its
/// heading, exclusive on both bounds: values landing exactly on a boundary
/// (e.g. `22.5`) match no bucket and return [`Error::DirectionBucket`]. That
/// gap is a known edge case kept for compatibility; well-formed provider data
/// never hits it.
pub fn bucket_wind_direction(degrees: f64) -> Result<CompassPoint, Error> {
    let deg = if degrees == 360.0 { 0.0 } else { degrees };

    // Centers run 0..=360 so the final arc catches values just west of north.
    for (idx, center) in (0..=360u32).step_by(45).enumerate() {
        let center = f64::from(center);
        if center - 22.5 < deg && deg < center + 22.5 {
            return Ok(CompassPoint::ALL[idx % CompassPoint::ALL.len()]);
        }
    }

    Err(Error::DirectionBucket(degrees))
}

/// Probability (0–100) that at least one rain event starts somewhere in the
/// given hourly window, using [`MEAN_RAIN_EVENT_HOURS`] as the assumed event
/// duration.
///
/// Open-Meteo publishes a pointwise probability of rain per hour; a run of
/// `70 70 70` is usually one event, not three. Modeling each hour's value as
/// a Bernoulli "event starts now" hazard `s = min(p/100/D, 1)` and taking the
/// complement of the no-start product collapses the series into a single
/// headline number. Events are not truly independent across hours — the
/// approximation is deliberate.
pub fn persistence_probability(hourly_probabilities: &[u8]) -> u8 {
    persistence_probability_with(hourly_probabilities, MEAN_RAIN_EVENT_HOURS)
}

/// [`persistence_probability`] with an explicit mean event duration in hours.
///
/// Ties round to the even neighbor (a single 25% hour lands on exactly 12.5
/// and yields 12), keeping the output bit-compatible with earlier published
/// series.
pub fn persistence_probability_with(hourly_probabilities: &[u8], mean_event_hours: f64) -> u8 {
    let mut no_start = 1.0f64;
    for &p in hourly_probabilities {
        let start_hazard = ((f64::from(p) / 100.0) / mean_event_hours).min(1.0);
        no_start *= 1.0 - start_hazard;
    }
    round_half_even((1.0 - no_start) * 100.0) as u8
}

/// Round half-to-even for the non-negative probability range.
fn round_half_even(value: f64) -> f64 {
    let floor = value.floor();
    let diff = value - floor;
    if diff > 0.5 {
        floor + 1.0
    } else if diff < 0.5 {
        floor
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    }
}

/// Weather observed right now.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Temperature, rounded to whole degrees
    pub temp: i32,
    /// Apparent ("feels like") temperature
    pub feels_like: i32,
    /// Display label from [`classify_condition`]
    pub condition: String,
    /// Sustained wind speed
    pub wind_speed: i32,
    /// Wind gust speed
    pub wind_gusts: i32,
    /// Wind direction bucket
    pub wind_dir: CompassPoint,
    /// Relative humidity percent
    pub humidity: u8,
    /// Cloud cover percent
    pub cloud_cover: u8,
    /// UV index
    pub uv: i32,
}

/// One day of forecast, aggregated for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub condition: String,
    pub temp_max: i32,
    pub temp_min: i32,
    pub feels_like_max: i32,
    pub feels_like_min: i32,
    /// Chance that rain starts at all during the day, from
    /// [`persistence_probability`]
    pub precip: u8,
    pub wind_speed: i32,
    pub wind_gusts: i32,
    pub wind_dir: CompassPoint,
    pub avg_cloud_cover: u8,
    pub humidity: u8,
}

/// One hour of forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    pub time: NaiveDateTime,
    pub temp: i32,
    pub feels_like: i32,
    /// Probability of precipitation percent for this hour
    pub precip: u8,
    pub condition: String,
    pub wind_speed: i32,
    pub wind_gusts: i32,
    pub wind_dir: CompassPoint,
    pub cloud_cover: u8,
    pub uv: i32,
}

/// A full fetch: current conditions plus daily and hourly series.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub current: CurrentConditions,
    pub daily: Vec<DailyForecast>,
    pub hourly: Vec<HourlyForecast>,
}

impl CurrentConditions {
    /// Lines-of-segments for the "right now" frame:
    /// temperature / feels-like / condition on top, wind and humidity below.
    pub fn frame_lines(&self) -> Vec<Vec<String>> {
        vec![
            vec![
                format!("={}{}", self.temp, glyphs::DEGREES),
                format!("{}{}{}", glyphs::APPROX, self.feels_like, glyphs::DEGREES),
                self.condition.clone(),
            ],
            vec![
                format!(
                    "{}{}/{}{}",
                    glyphs::WIND,
                    self.wind_speed,
                    self.wind_gusts,
                    self.wind_dir
                ),
                format!("{}{}%", glyphs::HUMIDITY, self.humidity),
            ],
        ]
    }
}

impl DailyForecast {
    /// Lines-of-segments for a forecast-day frame: weekday and temperature
    /// range on top, condition, humidity and rain chance below.
    pub fn frame_lines(&self) -> Vec<Vec<String>> {
        vec![
            vec![
                self.date.format("%a").to_string(),
                format!(
                    "{}{}/{}{}",
                    self.temp_max,
                    glyphs::DEGREES,
                    self.temp_min,
                    glyphs::DEGREES
                ),
            ],
            vec![
                self.condition.clone(),
                format!("{}{}%", glyphs::HUMIDITY, self.humidity),
                format!("{}{}%", glyphs::PRECIP, self.precip),
            ],
        ]
    }

    /// Lines-of-segments for the "rest of today" frame. The UV index comes
    /// from the current conditions rather than the daily maximum.
    pub fn today_lines(&self, uv: i32) -> Vec<Vec<String>> {
        vec![
            vec![
                format!("={}/{}{}", self.temp_max, self.temp_min, glyphs::DEGREES),
                format!(
                    "{}{}/{}{}",
                    glyphs::APPROX,
                    self.feels_like_max,
                    self.feels_like_min,
                    glyphs::DEGREES
                ),
            ],
            vec![
                format!("{}{}%", glyphs::PRECIP, self.precip),
                format!("{}{}%", glyphs::CLOUD, self.avg_cloud_cover),
                format!("{}{}", glyphs::SUN, uv),
            ],
        ]
    }
}

impl HourlyForecast {
    /// Lines-of-segments for an hourly frame: hour, temperature and condition
    /// on top, wind and rain chance below.
    pub fn frame_lines(&self) -> Vec<Vec<String>> {
        vec![
            vec![
                format!("{}:", self.time.format("%H")),
                format!("{}{}", self.temp, glyphs::DEGREES),
                self.condition.clone(),
            ],
            vec![
                format!(
                    "{}{}/{}{}",
                    glyphs::WIND,
                    self.wind_speed,
                    self.wind_gusts,
                    self.wind_dir
                ),
                format!("{}{}%", glyphs::PRECIP, self.precip),
            ],
        ]
    }
}
