use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset as _, TimeDelta, Utc,
};
use chrono_tz::Tz;
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;

use crate::{
    config::Location,
    tide::{HeightRange, TideError, TideReading, TideSource, get_body},
};

// Ref: https://docs.stormglass.io/#/tide?id=sea-level-point-request
pub const STORMGLASS_SEA_LEVEL_URL: &str = "https://api.stormglass.io/v2/tide/sea-level/point";

const WINDOW_BOUND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

// Longer than any DST jump
const GAP_LOOKBACK_HOURS: i64 = 3;

const END_OF_DAY: NaiveTime = NaiveTime::from_hms_opt(23, 59, 59).unwrap();

#[derive(Debug, Deserialize)]
struct SeaLevelResponse {
    data: Vec<SeaLevelSample>,
}

#[derive(Debug, Deserialize)]
struct SeaLevelSample {
    time: DateTime<Utc>,

    sg: Option<f64>,
}

/// Sea level from the Stormglass tide API, sampled over today's local day.
/// The current height is the sample closest to now.
pub struct StormglassSource {
    client: Client,
    api_key: String,
    location: Location,
    timezone: Tz,
    range: HeightRange,
}

impl StormglassSource {
    pub fn new(
        client: Client,
        api_key: String,
        location: Location,
        timezone: Tz,
        range: HeightRange,
    ) -> Self {
        Self {
            client,
            api_key,
            location,
            timezone,
            range,
        }
    }
}

impl TideSource for StormglassSource {
    async fn fetch(&self) -> Result<TideReading, TideError> {
        let now = Utc::now();
        let (start, end) = today_window(now, self.timezone)?;

        tracing::debug!(%start, %end, "requesting Stormglass sea level");

        let request = self
            .client
            .get(STORMGLASS_SEA_LEVEL_URL)
            .query(&[
                ("lat", self.location.latitude.to_string()),
                ("lng", self.location.longitude.to_string()),
                ("start", start.format(WINDOW_BOUND_FORMAT).to_string()),
                ("end", end.format(WINDOW_BOUND_FORMAT).to_string()),
            ])
            .header(AUTHORIZATION, &self.api_key);

        let body = get_body(request).await?;

        parse_sea_level_response(&body, self.range, now)
    }
}

/// Start and end of the local calendar day containing `now`, in UTC.
pub fn today_window(
    now: DateTime<Utc>,
    timezone: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TideError> {
    let today = now.with_timezone(&timezone).date_naive();

    let start = local_to_utc(today, NaiveTime::MIN, timezone)?;
    let end = local_to_utc(today, END_OF_DAY, timezone)?;

    Ok((start, end))
}

fn local_to_utc(
    date: NaiveDate,
    time: NaiveTime,
    timezone: Tz,
) -> Result<DateTime<Utc>, TideError> {
    let naive = date.and_time(time);
    match naive.and_local_timezone(timezone) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => first_instant_after_gap(naive, timezone),
    }
}

/// `naive` falls in a DST gap. Reading it with the offset in force before
/// the gap gives the instant the clocks jumped, the first valid local time.
fn first_instant_after_gap(
    naive: NaiveDateTime,
    timezone: Tz,
) -> Result<DateTime<Utc>, TideError> {
    let before_gap = (naive - TimeDelta::hours(GAP_LOOKBACK_HOURS))
        .and_local_timezone(timezone)
        .earliest()
        .ok_or(TideError::NonexistentLocalTime {
            time: naive,
            timezone,
        })?;

    let offset_secs = before_gap.offset().fix().local_minus_utc();

    Ok((naive - TimeDelta::seconds(i64::from(offset_secs))).and_utc())
}

pub fn parse_sea_level_response(
    body: &str,
    range: HeightRange,
    now: DateTime<Utc>,
) -> Result<TideReading, TideError> {
    let response: SeaLevelResponse = serde_json::from_str(body)?;

    let samples: Vec<(DateTime<Utc>, f64)> = response
        .data
        .into_iter()
        .filter_map(|s| s.sg.map(|h| (s.time, h)))
        .collect();

    let (observed_at, current_height) = samples
        .iter()
        .copied()
        .min_by_key(|(time, _)| (*time - now).abs())
        .ok_or(TideError::EmptySeries)?;

    let (range_min, range_max) = range.resolve(samples.iter().map(|(_, h)| *h))?;

    Ok(TideReading {
        current_height,
        range_min,
        range_max,
        observed_at,
    })
}
