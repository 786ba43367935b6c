//! Runtime configuration read from environment variables.
//!
//! | Variable                | Default                       |
//! |-------------------------|-------------------------------|
//! | `DOCKER_HOST`           | `unix:///var/run/docker.sock` |
//! | `COLLECT_INTERVAL_SECS` | `10`                          |
//! | `METRICS_ADDR`          | `0.0.0.0:3000` (empty disables the HTTP endpoint) |
//! | `MEASUREMENT_PREFIX`    | `docker`                      |

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";
const DEFAULT_INTERVAL_SECS: u64 = 10;
const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MEASUREMENT_PREFIX: &str = "docker";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the daemon's unix socket.
    pub socket_path: PathBuf,
    /// Time between two collection cycles.
    pub interval: Duration,
    /// Listen address of the HTTP endpoint, if enabled.
    pub metrics_addr: Option<String>,
    pub measurement_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let docker_host =
            lookup("DOCKER_HOST").unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_owned());
        let socket_path = parse_socket_path(&docker_host)?;

        let interval = match lookup("COLLECT_INTERVAL_SECS") {
            None => Duration::from_secs(DEFAULT_INTERVAL_SECS),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::Invalid {
                        key: "COLLECT_INTERVAL_SECS",
                        value,
                        reason: "expected a positive number of seconds",
                    });
                }
            },
        };

        let metrics_addr = match lookup("METRICS_ADDR") {
            None => Some(DEFAULT_METRICS_ADDR.to_owned()),
            Some(addr) if addr.trim().is_empty() => None,
            Some(addr) => Some(addr.trim().to_owned()),
        };

        let measurement_prefix = lookup("MEASUREMENT_PREFIX")
            .unwrap_or_else(|| DEFAULT_MEASUREMENT_PREFIX.to_owned());
        if measurement_prefix.is_empty() {
            return Err(Error::Invalid {
                key: "MEASUREMENT_PREFIX",
                value: measurement_prefix,
                reason: "must not be empty",
            });
        }

        Ok(Self {
            socket_path,
            interval,
            metrics_addr,
            measurement_prefix,
        })
    }
}

fn parse_socket_path(docker_host: &str) -> Result<PathBuf> {
    let path = docker_host.strip_prefix("unix://").unwrap_or(docker_host);
    if !path.starts_with('/') {
        return Err(Error::Invalid {
            key: "DOCKER_HOST",
            value: docker_host.to_owned(),
            reason: "only absolute unix socket paths are supported",
        });
    }

    Ok(PathBuf::from(path))
}
