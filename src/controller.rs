use chrono::Utc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    actuator::{CurtainActuator, MoveOutcome},
    config::Config,
    position::{ClosurePercent, closure_percent},
    switchbot::CurtainClient,
    tide::{TideReading, TideSource},
};

const LOCAL_TIME_FORMAT: &str = "%H:%M:%S %d %b %Y (%Z)";

#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// No tide reading this cycle; no curtain was touched.
    Skipped,

    Actuated {
        reading: TideReading,
        closure: ClosurePercent,
        left: MoveOutcome,
        right: MoveOutcome,
    },

    Cancelled,
}

/// Polls the tide source and moves both curtains, forever.
pub struct Controller<S, C> {
    config: Config,
    source: S,
    actuator: CurtainActuator<C>,
}

impl<S, C> Controller<S, C>
where
    S: TideSource,
    C: CurtainClient,
{
    pub fn new(config: Config, source: S, actuator: CurtainActuator<C>) -> Self {
        Self {
            config,
            source,
            actuator,
        }
    }

    /// Runs cycles separated by the poll interval until `token` is cancelled.
    /// Failures never end the loop.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, token: CancellationToken) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            "started"
        );

        loop {
            if self.run_cycle(&token).await == CycleReport::Cancelled {
                warn!("cancelled");
                break;
            }

            tokio::select! {
                _ = token.cancelled() => {
                    warn!("cancelled");
                    break;
                },
                _ = sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// One fetch, map, actuate pass. Left moves first, then the right after a
    /// short pause; the two never run concurrently on the BLE radio.
    #[tracing::instrument(skip_all)]
    pub async fn run_cycle(&self, token: &CancellationToken) -> CycleReport {
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => return CycleReport::Cancelled,
            fetched = self.source.fetch() => fetched,
        };

        let reading = match fetched {
            Ok(r) => r,
            Err(err) => {
                warn!(
                    "could not retrieve tide data, retrying in {}s: {err}",
                    self.config.poll_interval.as_secs()
                );
                return CycleReport::Skipped;
            }
        };

        let now = Utc::now().with_timezone(&self.config.timezone);
        let closure = closure_percent(&reading);

        info!(
            local_time = %now.format(LOCAL_TIME_FORMAT),
            "tidal range {:.3} m -> {:.3} m, current sea level {:.3} m, curtain position {closure} closed",
            reading.range_min,
            reading.range_max,
            reading.current_height,
        );

        let left = self
            .actuator
            .move_to(&self.config.left, closure, token)
            .await;

        tokio::select! {
            biased;
            _ = token.cancelled() => return CycleReport::Cancelled,
            _ = sleep(self.config.inter_target_pause) => {}
        }

        let right = self
            .actuator
            .move_to(&self.config.right, closure, token)
            .await;

        if matches!(left, MoveOutcome::Cancelled { .. })
            || matches!(right, MoveOutcome::Cancelled { .. })
        {
            return CycleReport::Cancelled;
        }

        if left.is_success() && right.is_success() {
            info!("both curtains synchronised");
        } else {
            warn!(?left, ?right, "curtains out of sync until next cycle");
        }

        CycleReport::Actuated {
            reading,
            closure,
            left,
            right,
        }
    }
}
