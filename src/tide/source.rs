use std::future::Future;

use crate::tide::{OpenMeteoSource, StormglassSource, TideError, TideReading};

/// Produces the current tide reading. One request per call, no retry.
pub trait TideSource {
    fn fetch(&self) -> impl Future<Output = Result<TideReading, TideError>> + Send;
}

/// The tide data providers selectable at startup.
pub enum TideBackend {
    Stormglass(StormglassSource),
    OpenMeteo(OpenMeteoSource),
}

impl TideBackend {
    pub fn name(&self) -> &'static str {
        match self {
            TideBackend::Stormglass(_) => "Stormglass",
            TideBackend::OpenMeteo(_) => "Open-Meteo",
        }
    }
}

impl TideSource for TideBackend {
    async fn fetch(&self) -> Result<TideReading, TideError> {
        match self {
            TideBackend::Stormglass(source) => source.fetch().await,
            TideBackend::OpenMeteo(source) => source.fetch().await,
        }
    }
}
