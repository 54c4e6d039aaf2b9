mod args;

use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use args::{Args, Source};
use clap::Parser as _;
use tidal_curtain::{
    actuator::CurtainActuator,
    config::{Config, DEFAULT_INTER_TARGET_PAUSE, Location},
    controller::{Controller, CycleReport},
    retry::RetryPolicy,
    switchbot::{BleCurtainClient, CurtainTarget},
    tide::{HeightRange, OpenMeteoSource, StormglassSource, TideBackend, new_http_client},
};
use tokio::{signal, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Stormglass free tier
const STORMGLASS_DAILY_REQUEST_QUOTA: u64 = 50;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let config = Config {
        left: CurtainTarget::new("Left", args.left_curtain),
        right: CurtainTarget::new("Right", args.right_curtain),
        location: Location {
            latitude: args.latitude,
            longitude: args.longitude,
        },
        timezone: args.timezone,
        poll_interval: Duration::from_secs(args.interval_secs),
        inter_target_pause: DEFAULT_INTER_TARGET_PAUSE,
    };

    if config.left.address == config.right.address {
        warn!(address = %config.left.address, "left and right curtains share an address");
    }

    let range = height_range(args.min_height, args.max_height)?;
    let http = new_http_client()?;

    let source = match args.source {
        Source::Stormglass => {
            let api_key = args.stormglass_api_key.clone().context(
                "Stormglass API key is required: pass --stormglass-api-key or set STORMGLASS_API_KEY",
            )?;

            if !args.once
                && args.interval_secs.saturating_mul(STORMGLASS_DAILY_REQUEST_QUOTA) < 86_400
            {
                warn!(
                    interval_secs = args.interval_secs,
                    "poll interval exceeds the Stormglass free tier of {STORMGLASS_DAILY_REQUEST_QUOTA} requests per day"
                );
            }

            TideBackend::Stormglass(StormglassSource::new(
                http,
                api_key,
                config.location,
                config.timezone,
                range,
            ))
        }
        Source::OpenMeteo => TideBackend::OpenMeteo(OpenMeteoSource::new(
            http,
            config.location,
            args.open_meteo_variable.clone(),
            range,
        )),
    };

    info!(
        source = source.name(),
        left = %config.left,
        right = %config.right,
        ?range,
        "tidal curtain starting"
    );

    let client = BleCurtainClient::new()
        .await
        .context("failed to set up Bluetooth")?;

    let controller = Controller::new(
        config,
        source,
        CurtainActuator::new(client, RetryPolicy::default()),
    );

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl-C, shutting down");
                shutdown.cancel();
            }
            Err(err) => error!("failed to listen for Ctrl-C: {err}"),
        }
    });

    if !args.once {
        controller.run(token).await;
        return Ok(());
    }

    match controller.run_cycle(&token).await {
        CycleReport::Actuated { left, right, .. } if left.is_success() && right.is_success() => {
            Ok(())
        }
        CycleReport::Actuated { left, right, .. } => {
            bail!("not every curtain was positioned: left {left:?}, right {right:?}")
        }
        CycleReport::Skipped => bail!("no tide reading available"),
        CycleReport::Cancelled => bail!("cancelled"),
    }
}

fn height_range(min_height: Option<f64>, max_height: Option<f64>) -> Result<HeightRange> {
    match (min_height, max_height) {
        (Some(min), Some(max)) => {
            if min.is_nan() || max.is_nan() || min > max {
                bail!("--min-height ({min}) must not exceed --max-height ({max})");
            }
            Ok(HeightRange::Fixed { min, max })
        }
        (None, None) => Ok(HeightRange::Observed),
        _ => bail!("--min-height and --max-height must be given together"),
    }
}
