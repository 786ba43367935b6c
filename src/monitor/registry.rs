use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::container::{ContainerMonitor, MonitorState};
use super::{Error, Result};
use crate::container::ContainerID;
use crate::docker::DaemonClient;

/// The set of supervised containers, keyed by container id.
#[derive(Debug, Default)]
pub struct Registry {
    monitors: DashMap<ContainerID, ContainerMonitor>,
}

impl Registry {
    /// Aligns the supervised containers with the daemon's live containers.
    ///
    /// Removes every monitor whose subscription has ended, then spawns a monitor for every
    /// listed container that is not supervised. Monitors spawned here are never reaped
    /// in the same call, even if their subscription fails at once. Does not wait for new
    /// monitors to receive their first sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the daemon listing fails. The registry is left
    /// untouched in that case.
    pub async fn reconcile<C: DaemonClient>(&self, client: &Arc<C>) -> Result<()> {
        let listing = client.list_containers().await.map_err(Error::Discovery)?;

        self.monitors.retain(|_, monitor| {
            let alive = monitor.is_alive();
            if !alive {
                log::debug!("Reaping container: {}", monitor.tags());
            }
            alive
        });

        for container in listing {
            let tags = match container.tags() {
                Ok(tags) => tags,
                Err(err) => {
                    log::warn!("Skipping listed container `{}`: {}", container.id, err);
                    continue;
                }
            };
            if let Entry::Vacant(entry) = self.monitors.entry(tags.id().clone()) {
                log::debug!("New container: {tags}");
                entry.insert(ContainerMonitor::spawn(client, tags));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn contains(&self, container_id: &str) -> bool {
        self.monitors.contains_key(container_id)
    }

    /// Returns the subscription state of a supervised container.
    pub fn state(&self, container_id: &str) -> Option<MonitorState> {
        self.monitors
            .get(container_id)
            .map(|monitor| monitor.state())
    }

    pub(super) fn for_each_mut(&self, mut f: impl FnMut(&mut ContainerMonitor)) {
        for mut monitor in self.monitors.iter_mut() {
            f(monitor.value_mut());
        }
    }
}
