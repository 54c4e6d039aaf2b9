use std::collections::HashMap;

use chrono::{DateTime, DurationRound as _, TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::Location,
    tide::{HeightRange, TideError, TideReading, TideSource, get_body},
};

// Ref: https://open-meteo.com/en/docs/marine-weather-api
pub const OPEN_METEO_MARINE_URL: &str = "https://marine-api.open-meteo.com/v1/marine";

pub const DEFAULT_HOURLY_VARIABLE: &str = "swell_wave_height";

const HOUR_KEY_FORMAT: &str = "%Y-%m-%dT%H:00";

// One UTC day of hourly samples
const FORECAST_DAYS: u8 = 1;

#[derive(Debug, Deserialize)]
struct MarineResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,

    #[serde(flatten)]
    variables: HashMap<String, Vec<Option<f64>>>,
}

/// Hourly marine forecast from Open-Meteo. The current height is the sample
/// stamped with the current UTC hour; there is no nearest-sample fallback.
/// Only the current UTC day is requested, so [`HeightRange::Observed`] spans
/// that day's 24 hourly samples.
pub struct OpenMeteoSource {
    client: Client,
    location: Location,
    variable: String,
    range: HeightRange,
}

impl OpenMeteoSource {
    pub fn new(client: Client, location: Location, variable: String, range: HeightRange) -> Self {
        Self {
            client,
            location,
            variable,
            range,
        }
    }
}

impl OpenMeteoSource {
    fn query(&self) -> [(&'static str, String); 5] {
        [
            ("latitude", self.location.latitude.to_string()),
            ("longitude", self.location.longitude.to_string()),
            ("hourly", self.variable.clone()),
            ("timezone", "GMT".to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
        ]
    }
}

impl TideSource for OpenMeteoSource {
    async fn fetch(&self) -> Result<TideReading, TideError> {
        let now = Utc::now();

        tracing::debug!(variable = %self.variable, "requesting Open-Meteo marine forecast");

        let request = self
            .client
            .get(OPEN_METEO_MARINE_URL)
            .query(&self.query());

        let body = get_body(request).await?;

        parse_marine_response(&body, &self.variable, self.range, now)
    }
}

pub fn current_hour_key(now: DateTime<Utc>) -> String {
    now.format(HOUR_KEY_FORMAT).to_string()
}

pub fn parse_marine_response(
    body: &str,
    variable: &str,
    range: HeightRange,
    now: DateTime<Utc>,
) -> Result<TideReading, TideError> {
    let MarineResponse { hourly } = serde_json::from_str(body)?;
    let HourlySeries {
        time,
        mut variables,
    } = hourly;

    let heights = variables
        .remove(variable)
        .ok_or_else(|| TideError::UnknownVariable {
            variable: variable.to_string(),
        })?;

    if heights.len() != time.len() {
        return Err(TideError::SeriesLengthMismatch {
            times: time.len(),
            heights: heights.len(),
        });
    }

    let key = current_hour_key(now);
    let Some(current_height) = time
        .iter()
        .position(|t| *t == key)
        .and_then(|idx| heights[idx])
    else {
        return Err(TideError::NoSampleForHour { key });
    };

    let observed_at = now.duration_trunc(TimeDelta::hours(1)).unwrap_or(now);

    let (range_min, range_max) = range.resolve(heights.iter().flatten().copied())?;

    Ok(TideReading {
        current_height,
        range_min,
        range_max,
        observed_at,
    })
}
