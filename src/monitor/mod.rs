//! Supervision of per-container stats subscriptions.
//!
//! Two timing domains meet here. Every supervised container has a [`ContainerMonitor`]
//! whose background task consumes the daemon's push-based stats stream, while the
//! [`Gatherer`] is invoked on a fixed interval and pulls the freshest sample of every
//! monitor.
//!
//! # Key Components
//!
//! - [`ContainerMonitor`]: Owns one container's subscription task and publishes its
//!   latest [`MonitorState`].
//! - [`Registry`]: Aligns the supervised set with the daemon's live containers and reaps
//!   monitors whose stream ended.
//! - [`Gatherer`]: Runs one collection cycle and emits field groups into an
//!   [`crate::sink::Accumulator`].
//!
//! # Lifecycle
//!
//! A monitor is created the first time its container shows up in the daemon listing. It
//! stays registered until its stream ends; the next reconciliation then removes it.
//! Nothing ever cancels a running subscription.
mod container;
mod error;
mod gather;
mod registry;

#[cfg(test)]
pub(crate) mod fake;

pub use container::{ContainerMonitor, MonitorState};
pub use error::{Error, Result};
pub use gather::Gatherer;
pub use registry::Registry;
