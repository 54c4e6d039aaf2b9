use std::future::Future;

use anyhow::{Context as _, Result, anyhow, bail};
use btleplug::{
    api::{
        CentralEvent, CharPropFlags, Central as _, Manager as _, Peripheral as _, ScanFilter,
        WriteType,
    },
    platform::{Adapter, Manager, Peripheral},
};
use macaddr::MacAddr6;
use tokio::time::{Duration, Instant, timeout_at};
use tokio_stream::StreamExt as _;

use crate::switchbot::{CurtainTarget, WRITE_CHARACTERISTIC_UUID};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivers one command to one curtain. A single attempt, no retry.
pub trait CurtainClient {
    fn send(
        &self,
        target: &CurtainTarget,
        command: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Writes commands over the host's first Bluetooth adapter.
pub struct BleCurtainClient {
    adapter: Adapter,
    connect_timeout: Duration,
}

impl BleCurtainClient {
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .context("failed to initialize Bluetooth manager")?;

        let adapters = manager
            .adapters()
            .await
            .context("failed to get Bluetooth adapters")?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no Bluetooth adapters found"))?;

        Ok(Self {
            adapter,
            connect_timeout: CONNECT_TIMEOUT,
        })
    }

    async fn find_peripheral(&self, address: MacAddr6) -> Result<Peripheral> {
        let mut events = self
            .adapter
            .events()
            .await
            .context("failed to subscribe to BLE events")?;

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .context("failed to start BLE scan")?;

        let known = self
            .adapter
            .peripherals()
            .await
            .context("failed to get BLE peripherals")?;

        if let Some(peripheral) = known.into_iter().find(|p| peripheral_address(p) == address) {
            return Ok(peripheral);
        }

        while let Some(event) = events.next().await {
            let (CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id)) = event
            else {
                continue;
            };

            let peripheral = self
                .adapter
                .peripheral(&id)
                .await
                .with_context(|| format!("failed to get BLE peripheral: {id:?}"))?;

            if peripheral_address(&peripheral) == address {
                return Ok(peripheral);
            }
        }

        bail!("BLE event stream ended before {address} was discovered")
    }

    async fn stop_scan(&self) {
        if let Err(err) = self.adapter.stop_scan().await {
            tracing::debug!("failed to stop BLE scan: {err:#}");
        }
    }

    async fn connect_and_write(
        &self,
        peripheral: &Peripheral,
        target: &CurtainTarget,
        command: &[u8],
        deadline: Instant,
    ) -> Result<()> {
        timeout_at(deadline, ensure_connected(peripheral))
            .await
            .map_err(|_| self.timed_out(target))??;

        write_command(peripheral, command)
            .await
            .with_context(|| format!("failed to write command to {target}"))
    }

    fn timed_out(&self, target: &CurtainTarget) -> anyhow::Error {
        anyhow!(
            "timed out connecting to {target} after {}s",
            self.connect_timeout.as_secs()
        )
    }
}

impl CurtainClient for BleCurtainClient {
    async fn send(&self, target: &CurtainTarget, command: &[u8]) -> Result<()> {
        // Discovery and connection share one deadline.
        let deadline = Instant::now() + self.connect_timeout;

        let peripheral = then_cleanup(
            timeout_at(deadline, self.find_peripheral(target.address)),
            self.stop_scan(),
        )
        .await
        .map_err(|_| self.timed_out(target))??;

        let session = self.connect_and_write(&peripheral, target, command, deadline);

        then_cleanup(session, disconnect(&peripheral, target)).await
    }
}

/// Awaits `operation`, then `cleanup`, whatever the operation returned.
/// A deadline belongs inside `operation` so that elapsing it still reaches
/// the cleanup.
async fn then_cleanup<T>(
    operation: impl Future<Output = T>,
    cleanup: impl Future<Output = ()>,
) -> T {
    let output = operation.await;
    cleanup.await;
    output
}

async fn ensure_connected(peripheral: &Peripheral) -> Result<()> {
    let connected = peripheral
        .is_connected()
        .await
        .context("failed to get connection state")?;

    if !connected {
        peripheral.connect().await.context("failed to connect")?;
    }

    Ok(())
}

async fn disconnect(peripheral: &Peripheral, target: &CurtainTarget) {
    if let Err(err) = peripheral.disconnect().await {
        tracing::debug!("failed to disconnect from {target}: {err:#}");
    }
}

async fn write_command(peripheral: &Peripheral, command: &[u8]) -> Result<()> {
    peripheral
        .discover_services()
        .await
        .context("failed to discover GATT services")?;

    let characteristic = peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == WRITE_CHARACTERISTIC_UUID)
        .ok_or_else(|| anyhow!("write characteristic not found: {WRITE_CHARACTERISTIC_UUID}"))?;

    let write_type = if characteristic
        .properties
        .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE)
    {
        WriteType::WithoutResponse
    } else {
        WriteType::WithResponse
    };

    peripheral
        .write(&characteristic, command, write_type)
        .await
        .context("GATT write failed")
}

fn peripheral_address(peripheral: &Peripheral) -> MacAddr6 {
    peripheral.address().into_inner().into()
}
