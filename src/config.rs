use chrono_tz::Tz;
use tokio::time::Duration;

use crate::switchbot::CurtainTarget;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1800);

pub const DEFAULT_INTER_TARGET_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,

    pub longitude: f64,
}

/// Startup configuration. Built once in `main` and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub left: CurtainTarget,

    pub right: CurtainTarget,

    pub location: Location,

    pub timezone: Tz,

    pub poll_interval: Duration,

    pub inter_target_pause: Duration,
}
