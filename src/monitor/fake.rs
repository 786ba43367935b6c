//! In-process daemon used to drive monitors from tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::container::ContainerID;
use crate::docker::{self, ContainerListing, DaemonClient, StatsSubscription};
use crate::stats::{CpuCounters, MemoryCounters, NetworkCounters, StatsSnapshot};

type Feed = mpsc::UnboundedSender<docker::Result<StatsSnapshot>>;
type Stream = mpsc::UnboundedReceiver<docker::Result<StatsSnapshot>>;

#[derive(Debug, Default)]
pub(crate) struct FakeDaemon {
    /// `None` makes the listing fail.
    listing: Mutex<Option<Vec<ContainerListing>>>,
    feeds: Mutex<HashMap<String, Feed>>,
    pending: Mutex<HashMap<String, Stream>>,
}

impl FakeDaemon {
    /// Replaces the listing with the given containers and prepares a stats stream for
    /// every container that has none.
    pub(crate) fn set_running(&self, ids: &[&str]) {
        let listing = ids
            .iter()
            .map(|id| ContainerListing {
                id: (*id).to_owned(),
                image: "busybox:latest".to_owned(),
                names: vec![format!("/{id}-name")],
            })
            .collect();
        *self.listing.lock().unwrap() = Some(listing);

        for id in ids {
            self.prepare_stream(id);
        }
    }

    /// Creates a fresh stats stream for `id`, to be picked up by the next subscription.
    pub(crate) fn prepare_stream(&self, id: &str) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut feeds = self.feeds.lock().unwrap();
        if feeds.get(id).is_some_and(|feed| !feed.is_closed()) {
            return;
        }
        feeds.insert(id.to_owned(), tx);
        self.pending.lock().unwrap().insert(id.to_owned(), rx);
    }

    /// Removes the stream prepared for `id` before any subscription picks it up.
    pub(crate) fn take_pending(&self, id: &str) -> Option<Stream> {
        self.pending.lock().unwrap().remove(id)
    }

    pub(crate) fn fail_listing(&self) {
        *self.listing.lock().unwrap() = None;
    }

    pub(crate) fn push(&self, id: &str, snapshot: StatsSnapshot) {
        if let Some(feed) = self.feeds.lock().unwrap().get(id) {
            let _ = feed.send(Ok(snapshot));
        }
    }

    /// Terminates the stream of `id` with an error.
    pub(crate) fn fail(&self, id: &str) {
        if let Some(feed) = self.feeds.lock().unwrap().remove(id) {
            let _ = feed.send(Err(docker::Error::Status {
                status: hyper::StatusCode::INTERNAL_SERVER_ERROR,
                body: "connection reset".to_owned(),
            }));
        }
    }

    /// Closes the stream of `id` without an error.
    pub(crate) fn close(&self, id: &str) {
        self.feeds.lock().unwrap().remove(id);
    }
}

impl DaemonClient for FakeDaemon {
    type Subscription = FakeSubscription;

    async fn list_containers(&self) -> docker::Result<Vec<ContainerListing>> {
        let listing = self.listing.lock().unwrap().clone();
        listing.ok_or_else(|| docker::Error::Status {
            status: hyper::StatusCode::SERVICE_UNAVAILABLE,
            body: "daemon unavailable".to_owned(),
        })
    }

    async fn open_stats(&self, container_id: &ContainerID) -> docker::Result<FakeSubscription> {
        let stream = self.pending.lock().unwrap().remove(container_id.as_str());
        stream.map(FakeSubscription).ok_or_else(|| docker::Error::Status {
            status: hyper::StatusCode::NOT_FOUND,
            body: format!("No such container: {container_id}"),
        })
    }
}

#[derive(Debug)]
pub(crate) struct FakeSubscription(Stream);

impl StatsSubscription for FakeSubscription {
    async fn next_sample(&mut self) -> docker::Result<Option<StatsSnapshot>> {
        self.0.recv().await.transpose()
    }
}

/// A sample read `secs` after the epoch whose counters all equal `value`.
pub(crate) fn snapshot(secs: i64, value: u64) -> StatsSnapshot {
    StatsSnapshot {
        read: OffsetDateTime::from_unix_timestamp(secs).unwrap(),
        network: NetworkCounters {
            rx_bytes: value,
            rx_dropped: value,
            rx_errors: value,
            rx_packets: value,
            tx_bytes: value,
            tx_dropped: value,
            tx_errors: value,
            tx_packets: value,
        },
        memory: MemoryCounters {
            usage: value,
            max_usage: value,
            failcnt: value,
            limit: value,
            cache: value,
            rss: value,
        },
        cpu: CpuCounters {
            count: 2,
            total_usage: value,
            user_usage: value,
            kernel_usage: value,
            system_usage: value,
        },
    }
}

/// Polls `cond` until it holds, yielding to spawned tasks in between.
pub(crate) async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached in time");
}
