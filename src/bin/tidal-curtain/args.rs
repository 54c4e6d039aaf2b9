use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use macaddr::MacAddr6;
use tidal_curtain::tide::DEFAULT_HOURLY_VARIABLE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// Stormglass sea level, scaled to today's observed range
    Stormglass,

    /// Open-Meteo hourly marine forecast, sample for the current hour
    OpenMeteo,
}

#[derive(Debug, Parser)]
#[command(version, about = "Moves two SwitchBot curtains with the tide")]
pub struct Args {
    #[arg(long, env = "LEFT_CURTAIN")]
    pub left_curtain: MacAddr6,

    #[arg(long, env = "RIGHT_CURTAIN")]
    pub right_curtain: MacAddr6,

    // Woolloomooloo Bay, Sydney
    #[arg(long, env = "LATITUDE", default_value_t = -33.865, allow_negative_numbers = true)]
    pub latitude: f64,

    #[arg(long, env = "LONGITUDE", default_value_t = 151.222, allow_negative_numbers = true)]
    pub longitude: f64,

    #[arg(long, env = "TZ", default_value = "Australia/Sydney")]
    pub timezone: Tz,

    #[arg(long, env = "TIDE_SOURCE", value_enum, default_value_t = Source::Stormglass)]
    pub source: Source,

    #[arg(long, env = "STORMGLASS_API_KEY", hide_env_values = true)]
    pub stormglass_api_key: Option<String>,

    #[arg(long, env = "OPEN_METEO_VARIABLE", default_value = DEFAULT_HOURLY_VARIABLE)]
    pub open_meteo_variable: String,

    /// Low tide baseline in metres; without it the range is taken from the fetched series
    #[arg(long, env = "MIN_HEIGHT", requires = "max_height", allow_negative_numbers = true)]
    pub min_height: Option<f64>,

    /// High tide baseline in metres
    #[arg(long, env = "MAX_HEIGHT", requires = "min_height", allow_negative_numbers = true)]
    pub max_height: Option<f64>,

    #[arg(
        long,
        env = "POLL_INTERVAL_SECS",
        default_value_t = 1800,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURTAINS: [&str; 7] = [
        "tidal-curtain",
        "--left-curtain",
        "DF:9E:2B:BD:3B:7B",
        "--right-curtain",
        "DE:31:2E:85:FA:C2",
        "--timezone",
        "Australia/Sydney",
    ];

    #[test]
    fn defaults_to_half_hour_interval() {
        let args = Args::try_parse_from(CURTAINS).unwrap();

        assert_eq!(args.interval_secs, 1800);
        assert_eq!(args.source, Source::Stormglass);
    }

    #[test]
    fn rejects_zero_interval() {
        let err = Args::try_parse_from(CURTAINS.into_iter().chain(["--interval-secs", "0"]))
            .unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_placeholder_address() {
        let result = Args::try_parse_from([
            "tidal-curtain",
            "--left-curtain",
            "XX:XX:XX:XX:XX:XX",
            "--right-curtain",
            "DE:31:2E:85:FA:C2",
            "--timezone",
            "Australia/Sydney",
        ]);

        assert!(result.is_err());
    }
}
