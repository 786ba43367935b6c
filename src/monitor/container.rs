use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{Error, Result};
use crate::container::ContainerTags;
use crate::docker::{DaemonClient, StatsSubscription};
use crate::error::ResultOkLogExt;
use crate::stats::{self, CpuSample, Fields, StatsSnapshot};

/// Progress of a container's stats subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorState {
    /// No sample has been received yet.
    NotStarted,
    /// The most recent sample pushed by the daemon.
    Streaming(Arc<StatsSnapshot>),
    /// The subscription ended. Terminal.
    Ended,
}

/// Supervises the stats subscription of a single container.
///
/// The background task is the only writer of the state; it replaces the whole value on
/// every sample, so readers always see one complete snapshot.
#[derive(Debug)]
pub struct ContainerMonitor {
    tags: ContainerTags,
    state: watch::Receiver<MonitorState>,
    previous_cpu: Option<CpuSample>,
    task: JoinHandle<()>,
}

impl ContainerMonitor {
    /// Starts supervising the container described by `tags`.
    ///
    /// Returns immediately; the subscription is opened by the spawned task.
    pub fn spawn<C: DaemonClient>(client: &Arc<C>, tags: ContainerTags) -> Self {
        let (tx, rx) = watch::channel(MonitorState::NotStarted);
        let task = tokio::spawn(consume_stats(Arc::clone(client), tags.clone(), tx));

        Self {
            tags,
            state: rx,
            previous_cpu: None,
            task,
        }
    }

    pub fn tags(&self) -> &ContainerTags {
        &self.tags
    }

    pub fn state(&self) -> MonitorState {
        self.state.borrow().clone()
    }

    /// Returns the most recently received sample, if the subscription is streaming.
    pub fn latest_snapshot(&self) -> Option<Arc<StatsSnapshot>> {
        match &*self.state.borrow() {
            MonitorState::Streaming(snapshot) => Some(Arc::clone(snapshot)),
            MonitorState::NotStarted | MonitorState::Ended => None,
        }
    }

    /// Returns `false` once the subscription task has terminated.
    pub fn is_alive(&self) -> bool {
        !matches!(*self.state.borrow(), MonitorState::Ended) && !self.task.is_finished()
    }

    /// Builds the field groups for the latest sample and remembers its CPU counters for
    /// the next cycle.
    pub(super) fn report(&mut self) -> Option<Report> {
        let snapshot = self.latest_snapshot()?;

        let current = snapshot.cpu_sample();
        let cpu = stats::compute_deltas(&current, self.previous_cpu.as_ref());
        self.previous_cpu = Some(current);

        Some(Report {
            tags: self.tags.clone(),
            timestamp: snapshot.read,
            network: stats::network_fields(&snapshot.network),
            memory: stats::memory_fields(&snapshot.memory),
            cpu,
        })
    }
}

/// Field groups computed for one container during a collection cycle.
#[derive(Debug)]
pub(super) struct Report {
    pub(super) tags: ContainerTags,
    pub(super) timestamp: OffsetDateTime,
    pub(super) network: Fields,
    pub(super) memory: Option<Fields>,
    pub(super) cpu: Fields,
}

async fn consume_stats<C: DaemonClient>(
    client: Arc<C>,
    tags: ContainerTags,
    state: watch::Sender<MonitorState>,
) {
    log::debug!("Starting stats subscription for {tags}");
    if forward_samples(&*client, &tags, &state)
        .await
        .ok_log_at(log::Level::Warn)
        .is_some()
    {
        log::debug!("Stats stream of {tags} closed");
    }

    state.send_replace(MonitorState::Ended);
}

async fn forward_samples<C: DaemonClient>(
    client: &C,
    tags: &ContainerTags,
    state: &watch::Sender<MonitorState>,
) -> Result<()> {
    let subscription_err = |source| Error::Subscription {
        container_id: tags.id().clone(),
        source,
    };

    let mut subscription = client
        .open_stats(tags.id())
        .await
        .map_err(subscription_err)?;

    while let Some(snapshot) = subscription
        .next_sample()
        .await
        .map_err(subscription_err)?
    {
        log::trace!("New sample for {tags} read at {}", snapshot.read);
        state.send_replace(MonitorState::Streaming(Arc::new(snapshot)));
    }

    Ok(())
}
