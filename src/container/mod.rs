use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Length of the abbreviated id the daemon shows in its CLI output.
const SHORT_ID_LEN: usize = 12;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use docker_monitor::container::ContainerID;
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.short(), "abc123abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or its length exceeds
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated form of the id (at most 12 characters).
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_ID_LEN).unwrap_or(self.as_str())
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Labels attached to every metric emitted for a container.
///
/// Set once when the container is first discovered and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerTags {
    id: ContainerID,
    image: String,
    name: String,
}

impl ContainerTags {
    /// Builds the tags for a container from its listing entry.
    ///
    /// The name is the first entry of `names` with its leading `/` removed. Containers
    /// listed without any name are labelled with their short id instead.
    pub fn new(id: ContainerID, image: impl Into<String>, names: &[String]) -> Self {
        let name = names
            .first()
            .map(|name| name.strip_prefix('/').unwrap_or(name).to_owned())
            .unwrap_or_else(|| id.short().to_owned());

        Self {
            id,
            image: image.into(),
            name,
        }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tags as `(key, value)` pairs in a stable order.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("id", self.id.as_str()),
            ("image", &self.image),
            ("name", &self.name),
        ]
    }
}

impl fmt::Display for ContainerTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id.short())
    }
}

impl serde::Serialize for ContainerTags {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(3))?;
        for (key, value) in self.pairs() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
