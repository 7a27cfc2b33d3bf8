//! Three-panel console dashboard: current conditions, three-day forecast,
//! and the next hours, refreshed from Open-Meteo every two minutes.
//!
//! Run with `cargo run --example dev_console`.

use std::time::Duration;

use kitchenpi::{
    ConsoleDisplay, DisplayHandle, Forecast, Frame, OpenMeteo, RotationScheduler, LCD_HEIGHT,
    LCD_WIDTH,
};

// Minneapolis
const LATITUDE: f64 = 44.9778;
const LONGITUDE: f64 = -93.2650;

const REFRESH_INTERVAL: Duration = Duration::from_secs(2 * 60);
const FRAME_SECS: Duration = Duration::from_secs(5);
const HOURLY_FRAME_SECS: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let client = OpenMeteo::new();
    let scheduler = RotationScheduler::shared_channel(vec![
        Box::new(ConsoleDisplay::new("[0 today]", LCD_WIDTH, LCD_HEIGHT)) as Box<dyn DisplayHandle>,
        Box::new(ConsoleDisplay::new("[1 forecast]", LCD_WIDTH, LCD_HEIGHT))
            as Box<dyn DisplayHandle>,
        Box::new(ConsoleDisplay::new("[2 hourly]", LCD_WIDTH, LCD_HEIGHT))
            as Box<dyn DisplayHandle>,
    ]);

    loop {
        match client.fetch(LATITUDE, LONGITUDE).await {
            Ok(forecast) => {
                if let Err(e) = apply_forecast(&scheduler, &forecast) {
                    tracing::error!(error = %e, "could not build rotations from forecast");
                }
            }
            Err(e) => {
                // previous rotation keeps displaying until the next good fetch
                tracing::error!(error = %e, "weather refresh failed, skipping cycle");
            }
        }
        tokio::time::sleep(REFRESH_INTERVAL).await;
    }
}

fn apply_forecast(
    scheduler: &RotationScheduler,
    forecast: &Forecast,
) -> Result<(), kitchenpi::Error> {
    if let Some(today) = forecast.daily.first() {
        scheduler.set_rotation(
            0,
            vec![
                Frame::new(forecast.current.frame_lines(), FRAME_SECS),
                Frame::new(today.today_lines(forecast.current.uv), FRAME_SECS),
            ],
        )?;
    }

    scheduler.set_rotation(
        1,
        forecast
            .daily
            .iter()
            .skip(1)
            .take(3)
            .map(|day| Frame::new(day.frame_lines(), FRAME_SECS))
            .collect(),
    )?;

    // every second hour, up to eight hours out
    scheduler.set_rotation(
        2,
        forecast
            .hourly
            .iter()
            .skip(2)
            .step_by(2)
            .take(4)
            .map(|hour| Frame::new(hour.frame_lines(), HOURLY_FRAME_SECS))
            .collect(),
    )?;

    Ok(())
}
