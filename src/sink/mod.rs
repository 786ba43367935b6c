//! Destinations for the field groups produced by a collection cycle.
mod line_protocol;

pub use line_protocol::LineProtocolWriter;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::container::ContainerTags;
use crate::stats::Fields;

/// Receives the metrics emitted during a collection cycle.
pub trait Accumulator {
    /// Adds one field group (`network`, `memory` or `cpu`) for a container.
    fn add_fields(
        &mut self,
        group: &str,
        fields: Fields,
        tags: &ContainerTags,
        timestamp: OffsetDateTime,
    );
}

/// A field group as emitted by the collection cycle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Point {
    pub group: String,
    pub tags: ContainerTags,
    pub fields: Fields,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub timestamp: OffsetDateTime,
}

fn serialize_rfc3339<S: serde::Serializer>(
    timestamp: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let formatted = timestamp
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

/// Keeps every emitted field group in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryAccumulator {
    points: Vec<Point>,
}

impl MemoryAccumulator {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Forwards the collected points, in emission order, to another accumulator.
    pub fn replay<A: Accumulator + ?Sized>(&self, other: &mut A) {
        for point in &self.points {
            other.add_fields(
                &point.group,
                point.fields.clone(),
                &point.tags,
                point.timestamp,
            );
        }
    }
}

impl Accumulator for MemoryAccumulator {
    fn add_fields(
        &mut self,
        group: &str,
        fields: Fields,
        tags: &ContainerTags,
        timestamp: OffsetDateTime,
    ) {
        self.points.push(Point {
            group: group.to_owned(),
            tags: tags.clone(),
            fields,
            timestamp,
        });
    }
}
