use chrono::NaiveDateTime;
use chrono_tz::Tz;
use reqwest::StatusCode;
use thiserror::Error;

/// Reasons a poll cycle could not produce a [`TideReading`](super::TideReading).
///
/// None of these are fatal: the controller logs them and skips actuation for
/// the cycle.
#[derive(Debug, Error)]
pub enum TideError {
    #[error("tide data request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("tide data API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse tide data response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tide data response contains no height samples")]
    EmptySeries,

    #[error("no height sample for the current hour: {key}")]
    NoSampleForHour { key: String },

    #[error("hourly variable not found in response: {variable}")]
    UnknownVariable { variable: String },

    #[error("hourly series length mismatch: {times} timestamps, {heights} heights")]
    SeriesLengthMismatch { times: usize, heights: usize },

    #[error("local time does not exist in {timezone}: {time}")]
    NonexistentLocalTime { time: NaiveDateTime, timezone: Tz },
}
