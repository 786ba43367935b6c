//! Access to the container runtime daemon.
//!
//! The monitoring core only depends on the [`DaemonClient`] and [`StatsSubscription`]
//! traits. [`DockerClient`] implements them against the Docker Engine API served on a
//! unix socket.
mod client;
mod connector;
mod error;
mod models;

pub use client::{DockerClient, DockerStatsStream};
pub use error::{Error, Result};
pub use models::ContainerListing;

use std::future::Future;

use crate::container::ContainerID;
use crate::stats::StatsSnapshot;

/// Operations the monitoring core needs from the runtime daemon.
pub trait DaemonClient: Send + Sync + 'static {
    type Subscription: StatsSubscription;

    /// Lists the currently running containers.
    fn list_containers(&self) -> impl Future<Output = Result<Vec<ContainerListing>>> + Send;

    /// Opens a streaming stats subscription for a single container.
    fn open_stats(
        &self,
        container_id: &ContainerID,
    ) -> impl Future<Output = Result<Self::Subscription>> + Send;
}

/// A lazy, non-restartable sequence of stats samples for one container.
pub trait StatsSubscription: Send + 'static {
    /// Waits for the next sample.
    ///
    /// Returns `Ok(None)` once the daemon closed the stream, e.g. because the container
    /// stopped.
    fn next_sample(&mut self) -> impl Future<Output = Result<Option<StatsSnapshot>>> + Send;
}
