use std::sync::Arc;

use error::ResultOkLogExt;
use tokio::time::MissedTickBehavior;

/// Docker Monitor: reports per-container network, memory and CPU metrics for all
/// containers of a Docker daemon.
///
/// Every container gets a monitor that keeps a streaming stats subscription open in the
/// background. A fixed-interval collection cycle reads the freshest sample of each
/// monitor, computes CPU deltas across cycles and emits the results as field groups.
pub mod api;
pub mod config;
pub mod container;
pub mod docker;
pub mod error;
pub mod monitor;
pub mod sink;
pub mod stats;

/// Runs the Docker Monitor application.
///
/// Starts the HTTP endpoint (if enabled) and then runs a collection cycle on every
/// interval tick, writing the gathered field groups to stdout in line protocol.
///
/// # Errors
///
/// Returns an error if the configuration is invalid. Failed collection cycles are
/// logged and do not stop the loop.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    log::debug!("Configuration: {config:?}");

    let client = docker::DockerClient::new(&config.socket_path);
    let gatherer = monitor::Gatherer::new(client);

    let (latest_tx, latest_rx) = tokio::sync::watch::channel(Arc::new(Vec::new()));
    if let Some(addr) = config.metrics_addr.clone() {
        let api = api::APIServer::new(latest_rx);
        tokio::spawn(async move { api.listen(addr).await.ok_log() });
    }

    let mut writer =
        sink::LineProtocolWriter::new(std::io::stdout(), config.measurement_prefix.as_str());
    let mut interval = tokio::time::interval(config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;

        let before = std::time::Instant::now();
        let mut acc = sink::MemoryAccumulator::default();
        if gatherer.gather(&mut acc).await.ok_log().is_none() {
            continue;
        }
        log::trace!("gather() took {} microseconds", before.elapsed().as_micros());
        log::debug!(
            "Gathered {} field groups from {} containers",
            acc.len(),
            gatherer.monitored()
        );

        acc.replay(&mut writer);
        writer.flush();
        latest_tx.send_replace(Arc::new(acc.into_points()));
    }
}
