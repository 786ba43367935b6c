use crate::container::ContainerID;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to discover containers: {0}")]
    Discovery(#[source] crate::docker::Error),
    #[error("stats subscription for container `{container_id}` failed: {source}")]
    Subscription {
        container_id: ContainerID,
        #[source]
        source: crate::docker::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
