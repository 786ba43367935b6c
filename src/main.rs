/// Entry point for the Docker Monitor telemetry collector.
///
/// Connects to the Docker daemon's unix socket, keeps a stats subscription open for every
/// running container and prints per-container metrics in line protocol on a fixed
/// interval. The most recent cycle is also served as JSON over HTTP.
///
/// # Errors
///
/// Returns an error if the configuration taken from the environment is invalid.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug COLLECT_INTERVAL_SECS=5 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    docker_monitor::run().await
}
