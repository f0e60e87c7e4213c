//! CO2 Relay - Main Entry Point

use relay::{init_logging, init_metrics, RelayConfig};
use status_led::{StatusIndicator, TraceLed};
use std::sync::Arc;
use tracing::info;
use uplink::{BatchTransmitter, ConnectionManager, ExitRestart, HttpTransport, RouteLink};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let config = RelayConfig::load(config_path.as_deref())?;

    init_logging(config.log_level()?)?;
    if let Some(addr) = config.metrics_addr()? {
        init_metrics(addr)?;
    }

    info!("=== CO2 Relay v{} ===", env!("CARGO_PKG_VERSION"));

    let mut indicator = StatusIndicator::new(
        TraceLed::default(),
        config.status.palette,
        config.status.error_dwell(),
    );

    // Bring the network up before touching the sensor
    let endpoint = config.uplink.endpoint_url()?;
    let link = Arc::new(RouteLink::new(endpoint.clone()));
    let mut connection = ConnectionManager::new(Arc::clone(&link), ExitRestart::default(), config.uplink.connect_config());
    relay::startup(&mut connection, &mut indicator).await?;

    let mut sensor = config.sensor.open()?;
    info!("Sensor on {}", sensor.device());
    sensor.initialize().await?;

    let transport = HttpTransport::new(endpoint, config.uplink.transmit_timeout())?;
    info!("Relaying batches to {}", transport.endpoint());
    let transmitter =
        BatchTransmitter::new(transport, link).with_link_check_timeout(config.uplink.link_check_timeout());

    let report = relay::run(sensor, transmitter, indicator, config.pipeline_settings()).await?;
    info!("Relay finished: {:?}", report);

    Ok(())
}
