//! Open-Meteo forecast client.
//!
//! Fetches the current/daily/hourly series the dashboard needs and converts
//! them into the compact display-ready types in [`crate::weather`]. The
//! conversion helpers are pure, so they are testable without touching the
//! network.
//!
//! A failed fetch is expected to be caught per refresh cycle by the caller:
//! the displays keep showing the previous rotation until the next successful
//! fetch.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::Error;
use crate::weather::{
    bucket_wind_direction, classify_condition, persistence_probability, CurrentConditions,
    DailyForecast, Forecast, HourlyForecast,
};

/// Default Open-Meteo forecast endpoint.
pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
                              wind_speed_10m,wind_direction_10m,wind_gusts_10m,weather_code,\
                              cloud_cover";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
                            apparent_temperature_max,apparent_temperature_min,\
                            wind_speed_10m_max,wind_gusts_10m_max,wind_direction_10m_dominant,\
                            cloud_cover_mean,relative_humidity_2m_mean";
const HOURLY_FIELDS: &str = "uv_index,temperature_2m,apparent_temperature,\
                             precipitation_probability,weather_code,cloud_cover,\
                             wind_speed_10m,wind_direction_10m,wind_gusts_10m";

/// Open-Meteo client.
///
/// # Example
///
/// ```rust,no_run
/// use kitchenpi::OpenMeteo;
///
/// # async fn example() -> Result<(), kitchenpi::Error> {
/// let client = OpenMeteo::new();
/// let forecast = client.fetch(44.9778, -93.2650).await?;
/// println!("now: {}", forecast.current.condition);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    http: reqwest::Client,
    base_url: String,
}

impl Default for OpenMeteo {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteo {
    /// Create a client against the public Open-Meteo endpoint.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: OPEN_METEO_URL.to_string(),
        }
    }

    /// Set a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Fetch and aggregate the forecast for a location.
    ///
    /// Requests imperial units and a 24-hour hourly window.
    ///
    /// # Errors
    ///
    /// [`Error::Request`] on transport failure, [`Error::Api`] on a non-2xx
    /// status (body included), [`Error::Payload`] when the body doesn't
    /// decode or the series are inconsistent.
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Forecast, Error> {
        tracing::debug!(latitude, longitude, url = %self.base_url, "fetching forecast");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("wind_speed_unit", "mph".to_string()),
                ("temperature_unit", "fahrenheit".to_string()),
                ("precipitation_unit", "inch".to_string()),
                ("forecast_hours", "24".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "Open-Meteo request failed");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let payload: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| Error::Payload(e.to_string()))?;

        convert(&payload)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ForecastResponse {
    current: CurrentResponse,
    daily: DailyResponse,
    hourly: HourlyResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct CurrentResponse {
    temperature_2m: f64,
    relative_humidity_2m: u8,
    apparent_temperature: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
    wind_gusts_10m: f64,
    weather_code: u16,
    cloud_cover: u8,
}

#[derive(Debug, Clone, Deserialize)]
struct DailyResponse {
    time: Vec<String>,
    weather_code: Vec<u16>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    apparent_temperature_max: Vec<f64>,
    apparent_temperature_min: Vec<f64>,
    wind_speed_10m_max: Vec<f64>,
    wind_gusts_10m_max: Vec<f64>,
    wind_direction_10m_dominant: Vec<f64>,
    cloud_cover_mean: Vec<u8>,
    relative_humidity_2m_mean: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
struct HourlyResponse {
    time: Vec<String>,
    uv_index: Vec<f64>,
    temperature_2m: Vec<f64>,
    apparent_temperature: Vec<f64>,
    precipitation_probability: Vec<u8>,
    weather_code: Vec<u16>,
    cloud_cover: Vec<u8>,
    wind_speed_10m: Vec<f64>,
    wind_direction_10m: Vec<f64>,
    wind_gusts_10m: Vec<f64>,
}

fn convert(payload: &ForecastResponse) -> Result<Forecast, Error> {
    Ok(Forecast {
        current: convert_current(payload)?,
        daily: convert_daily(payload)?,
        hourly: convert_hourly(&payload.hourly)?,
    })
}

fn convert_current(payload: &ForecastResponse) -> Result<CurrentConditions, Error> {
    let current = &payload.current;
    // UV is only published as an hourly series; take the current hour's value
    let uv = payload.hourly.uv_index.first().copied().unwrap_or(0.0);

    Ok(CurrentConditions {
        temp: round(current.temperature_2m),
        feels_like: round(current.apparent_temperature),
        condition: classify_condition(current.weather_code),
        wind_speed: round(current.wind_speed_10m),
        wind_gusts: round(current.wind_gusts_10m),
        wind_dir: bucket_wind_direction(current.wind_direction_10m)?,
        humidity: current.relative_humidity_2m,
        cloud_cover: current.cloud_cover,
        uv: round(uv),
    })
}

fn convert_daily(payload: &ForecastResponse) -> Result<Vec<DailyForecast>, Error> {
    let daily = &payload.daily;
    let hourly = &payload.hourly;
    let days = daily.time.len();
    check_lengths(
        "daily",
        days,
        &[
            daily.weather_code.len(),
            daily.temperature_2m_max.len(),
            daily.temperature_2m_min.len(),
            daily.apparent_temperature_max.len(),
            daily.apparent_temperature_min.len(),
            daily.wind_speed_10m_max.len(),
            daily.wind_gusts_10m_max.len(),
            daily.wind_direction_10m_dominant.len(),
            daily.cloud_cover_mean.len(),
            daily.relative_humidity_2m_mean.len(),
        ],
    )?;

    let mut forecast = Vec::with_capacity(days);
    for day in 0..days {
        let date_str = &daily.time[day];
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| Error::Payload(format!("bad daily date '{date_str}': {e}")))?;

        // Chance that rain starts at all during this day's hours, within the
        // fetched 24-hour window.
        let day_probabilities: Vec<u8> = hourly
            .time
            .iter()
            .zip(&hourly.precipitation_probability)
            .filter(|(time, _)| time.starts_with(date_str.as_str()))
            .map(|(_, &p)| p)
            .collect();

        forecast.push(DailyForecast {
            date,
            condition: classify_condition(daily.weather_code[day]),
            temp_max: round(daily.temperature_2m_max[day]),
            temp_min: round(daily.temperature_2m_min[day]),
            feels_like_max: round(daily.apparent_temperature_max[day]),
            feels_like_min: round(daily.apparent_temperature_min[day]),
            precip: persistence_probability(&day_probabilities),
            wind_speed: round(daily.wind_speed_10m_max[day]),
            wind_gusts: round(daily.wind_gusts_10m_max[day]),
            wind_dir: bucket_wind_direction(daily.wind_direction_10m_dominant[day])?,
            avg_cloud_cover: daily.cloud_cover_mean[day],
            humidity: daily.relative_humidity_2m_mean[day],
        });
    }

    Ok(forecast)
}

fn convert_hourly(hourly: &HourlyResponse) -> Result<Vec<HourlyForecast>, Error> {
    let hours = hourly.time.len();
    check_lengths(
        "hourly",
        hours,
        &[
            hourly.uv_index.len(),
            hourly.temperature_2m.len(),
            hourly.apparent_temperature.len(),
            hourly.precipitation_probability.len(),
            hourly.weather_code.len(),
            hourly.cloud_cover.len(),
            hourly.wind_speed_10m.len(),
            hourly.wind_direction_10m.len(),
            hourly.wind_gusts_10m.len(),
        ],
    )?;

    let mut forecast = Vec::with_capacity(hours);
    for hour in 0..hours {
        let time_str = &hourly.time[hour];
        let time = NaiveDateTime::parse_from_str(time_str, "%Y-%m-%dT%H:%M")
            .map_err(|e| Error::Payload(format!("bad hourly time '{time_str}': {e}")))?;

        forecast.push(HourlyForecast {
            time,
            temp: round(hourly.temperature_2m[hour]),
            feels_like: round(hourly.apparent_temperature[hour]),
            precip: hourly.precipitation_probability[hour],
            condition: classify_condition(hourly.weather_code[hour]),
            wind_speed: round(hourly.wind_speed_10m[hour]),
            wind_gusts: round(hourly.wind_gusts_10m[hour]),
            wind_dir: bucket_wind_direction(hourly.wind_direction_10m[hour])?,
            cloud_cover: hourly.cloud_cover[hour],
            uv: round(hourly.uv_index[hour]),
        });
    }

    Ok(forecast)
}

fn check_lengths(series: &str, expected: usize, lengths: &[usize]) -> Result<(), Error> {
    if lengths.iter().any(|&len| len < expected) {
        return Err(Error::Payload(format!(
            "{series} series shorter than its time axis ({expected} entries)"
        )));
    }
    Ok(())
}

fn round(value: f64) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::CompassPoint;

    const SAMPLE: &str = r#"{
        "current": {
            "temperature_2m": 71.6,
            "relative_humidity_2m": 40,
            "apparent_temperature": 69.8,
            "wind_speed_10m": 5.4,
            "wind_direction_10m": 315,
            "wind_gusts_10m": 10.1,
            "weather_code": 0,
            "cloud_cover": 10
        },
        "daily": {
            "time": ["2026-08-29", "2026-08-30"],
            "weather_code": [0, 63],
            "temperature_2m_max": [72.3, 66.0],
            "temperature_2m_min": [55.1, 52.9],
            "apparent_temperature_max": [70.2, 63.5],
            "apparent_temperature_min": [50.4, 49.8],
            "wind_speed_10m_max": [5.4, 12.2],
            "wind_gusts_10m_max": [10.1, 22.8],
            "wind_direction_10m_dominant": [315, 180],
            "cloud_cover_mean": [10, 85],
            "relative_humidity_2m_mean": [40, 70]
        },
        "hourly": {
            "time": ["2026-08-29T14:00", "2026-08-29T15:00", "2026-08-30T00:00"],
            "uv_index": [5.2, 4.1, 0.0],
            "temperature_2m": [71.6, 70.2, 56.0],
            "apparent_temperature": [69.8, 68.0, 53.0],
            "precipitation_probability": [0, 10, 80],
            "weather_code": [0, 2, 63],
            "cloud_cover": [10, 30, 90],
            "wind_speed_10m": [5.4, 6.0, 11.0],
            "wind_direction_10m": [315, 300, 180],
            "wind_gusts_10m": [10.1, 11.0, 20.0]
        }
    }"#;

    fn sample() -> ForecastResponse {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_convert_current() {
        let current = convert_current(&sample()).unwrap();
        assert_eq!(current.temp, 72);
        assert_eq!(current.feels_like, 70);
        assert_eq!(current.condition, "Clear");
        assert_eq!(current.wind_dir, CompassPoint::NW);
        assert_eq!(current.humidity, 40);
        // current UV comes from the first hourly entry
        assert_eq!(current.uv, 5);
    }

    #[test]
    fn test_convert_daily_scopes_precip_to_the_day() {
        let daily = convert_daily(&sample()).unwrap();
        assert_eq!(daily.len(), 2);

        // day 0 sees only its own hours (p=0 and p=10)
        assert_eq!(daily[0].precip, persistence_probability(&[0, 10]));
        // day 1 sees the single 80% hour
        assert_eq!(daily[1].precip, persistence_probability(&[80]));

        assert_eq!(daily[0].condition, "Clear");
        assert_eq!(daily[1].condition, "Rain");
        assert_eq!(daily[1].wind_dir, CompassPoint::S);
        assert_eq!(daily[0].temp_max, 72);
        assert_eq!(daily[0].temp_min, 55);
    }

    #[test]
    fn test_convert_hourly() {
        let hourly = convert_hourly(&sample().hourly).unwrap();
        assert_eq!(hourly.len(), 3);
        assert_eq!(hourly[0].time.format("%H").to_string(), "14");
        assert_eq!(hourly[1].condition, "Pt.Cl.");
        assert_eq!(hourly[2].precip, 80);
        assert_eq!(hourly[2].wind_dir, CompassPoint::S);
    }

    #[test]
    fn test_convert_rejects_short_series() {
        let mut payload = sample();
        payload.hourly.uv_index.pop();
        let err = convert(&payload).unwrap_err();
        assert!(matches!(err, Error::Payload(_)));
        assert!(err.to_string().contains("hourly"));
    }

    #[test]
    fn test_convert_rejects_malformed_dates() {
        let mut payload = sample();
        payload.daily.time[0] = "yesterday".to_string();
        let err = convert(&payload).unwrap_err();
        assert!(matches!(err, Error::Payload(_)));
    }

    #[test]
    fn test_client_builder() {
        let client = OpenMeteo::new()
            .with_base_url("http://localhost:8080/v1/forecast")
            .with_http_client(reqwest::Client::new());
        assert_eq!(client.base_url, "http://localhost:8080/v1/forecast");
    }
}
