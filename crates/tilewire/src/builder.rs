//! Builders for encoding tiles incrementally.
//!
//! A [`LayerBuilder`] owns its key/value tables and a buffer of committed
//! features; a [`FeatureBuilder`] accumulates geometry and properties on
//! its own and appends itself to a layer at [`FeatureBuilder::commit`].
//! Builders only ever append; length prefixes are written when a
//! sub-message is finalized.

use crate::codec::geometry::{GeometryEncoder, COMMAND_LINE_TO, COMMAND_MOVE_TO};
use crate::codec::primitives::Writer;
use crate::codec::tile::{
    FEATURE_GEOMETRY, FEATURE_ID, FEATURE_TAGS, FEATURE_TYPE, LAYER_EXTENT, LAYER_FEATURES,
    LAYER_KEYS, LAYER_NAME, LAYER_VALUES, LAYER_VERSION, TILE_LAYERS,
};
use crate::codec::value::encode_value;
use crate::error::BuilderError;
use crate::limits::{DEFAULT_EXTENT, DEFAULT_LAYER_VERSION, MAX_COMMAND_COUNT};
use crate::model::geometry::{GeomType, IntoPoint, Point};
use crate::model::value::PropertyValue;

/// Top-level builder collecting finished layers.
#[derive(Debug, Default)]
pub struct TileBuilder {
    layers: Vec<LayerBuilder>,
}

impl TileBuilder {
    /// Creates an empty tile builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer; layers serialize in insertion order.
    pub fn add_layer(&mut self, layer: LayerBuilder) {
        self.layers.push(layer);
    }

    /// Returns the number of layers added so far.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Encodes the tile into a newly allocated buffer.
    ///
    /// The output decodes with [`crate::Tile`] unchanged.
    pub fn serialize(&self) -> Vec<u8> {
        let estimate: usize = self.layers.iter().map(|l| l.encoded_len_estimate()).sum();
        let mut writer = Writer::with_capacity(estimate);
        for layer in &self.layers {
            writer.write_len_field(TILE_LAYERS, &layer.encode_body());
        }
        writer.into_bytes()
    }
}

/// Builder for one layer: name, version, extent, shared key/value tables,
/// and the committed features.
#[derive(Debug)]
pub struct LayerBuilder {
    name: String,
    version: u32,
    extent: u32,
    keys: Vec<String>,
    values: Vec<Vec<u8>>,
    features: Writer,
}

impl LayerBuilder {
    /// Creates a layer builder with version 2 and extent 4096.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_LAYER_VERSION,
            extent: DEFAULT_EXTENT,
            keys: Vec::new(),
            values: Vec::new(),
            features: Writer::new(),
        }
    }

    /// Sets the layer version written to the wire.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the layer's coordinate extent.
    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    /// Returns the layer's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a key to the key table and returns its index.
    ///
    /// No deduplication is performed; use [`crate::KeyIndex`] to share
    /// slots between repeated keys.
    pub fn add_key(&mut self, key: &str) -> u32 {
        let index = self.keys.len() as u32;
        self.keys.push(key.to_string());
        index
    }

    /// Appends a value to the value table and returns its index.
    ///
    /// No deduplication is performed; use [`crate::ValueIndex`] to share
    /// slots between repeated values.
    pub fn add_value(&mut self, value: &PropertyValue) -> u32 {
        self.add_encoded_value(encode_value(value))
    }

    pub(crate) fn add_encoded_value(&mut self, body: Vec<u8>) -> u32 {
        let index = self.values.len() as u32;
        self.values.push(body);
        index
    }

    /// Returns the number of keys in the key table.
    pub fn key_count(&self) -> u32 {
        self.keys.len() as u32
    }

    /// Returns the number of values in the value table.
    pub fn value_count(&self) -> u32 {
        self.values.len() as u32
    }

    fn push_feature(&mut self, body: &[u8]) {
        self.features.write_len_field(LAYER_FEATURES, body);
    }

    fn encoded_len_estimate(&self) -> usize {
        let tables: usize = self.keys.iter().map(|k| k.len() + 2).sum::<usize>()
            + self.values.iter().map(|v| v.len() + 2).sum::<usize>();
        self.name.len() + tables + self.features.len() + 16
    }

    fn encode_body(&self) -> Vec<u8> {
        let mut writer = Writer::with_capacity(self.encoded_len_estimate());
        writer.write_varint_field(LAYER_VERSION, self.version as u64);
        writer.write_len_field(LAYER_NAME, self.name.as_bytes());
        for key in &self.keys {
            writer.write_len_field(LAYER_KEYS, key.as_bytes());
        }
        for value in &self.values {
            writer.write_len_field(LAYER_VALUES, value);
        }
        writer.write_bytes(self.features.as_bytes());
        writer.write_varint_field(LAYER_EXTENT, self.extent as u64);
        writer.into_bytes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Empty,
    InProgress,
    Committed,
}

#[derive(Debug)]
enum TagEntry {
    Literal { key: String, value: PropertyValue },
    Indexed { key: u32, value: u32 },
}

/// Builder for one feature of a fixed geometry kind.
///
/// Geometry and properties accumulate locally; nothing reaches the layer
/// until [`FeatureBuilder::commit`]. A builder dropped without committing
/// contributes nothing.
#[derive(Debug)]
pub struct FeatureBuilder {
    geom_type: GeomType,
    id: Option<u64>,
    geometry: GeometryEncoder,
    tags: Vec<TagEntry>,
    state: BuildState,
}

impl FeatureBuilder {
    /// Creates a builder for a point (or multipoint) feature.
    pub fn point() -> Self {
        Self::new(GeomType::Point)
    }

    /// Creates a builder for a linestring feature.
    pub fn linestring() -> Self {
        Self::new(GeomType::Linestring)
    }

    /// Creates a builder for a polygon feature.
    pub fn polygon() -> Self {
        Self::new(GeomType::Polygon)
    }

    fn new(geom_type: GeomType) -> Self {
        Self {
            geom_type,
            id: None,
            geometry: GeometryEncoder::new(),
            tags: Vec::new(),
            state: BuildState::Empty,
        }
    }

    /// Sets the feature id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    fn ensure_open(&self) -> Result<(), BuilderError> {
        if self.state == BuildState::Committed {
            return Err(BuilderError::AlreadyCommitted);
        }
        Ok(())
    }

    /// Adds the single point of a point feature.
    pub fn add_point(&mut self, point: impl IntoPoint) -> Result<(), BuilderError> {
        self.add_points(&[point.into_point()])
    }

    /// Adds all points of a point feature in one command.
    ///
    /// Valid exactly once per feature; the point grammar allows a single
    /// MoveTo.
    pub fn add_points<P: IntoPoint + Copy>(&mut self, points: &[P]) -> Result<(), BuilderError> {
        self.ensure_open()?;
        if self.geom_type != GeomType::Point {
            return Err(BuilderError::InvalidGeometryState {
                context: "add_points on a non-point feature",
            });
        }
        if self.state == BuildState::InProgress {
            return Err(BuilderError::InvalidGeometryState {
                context: "point feature already has its points",
            });
        }
        if points.is_empty() {
            return Err(BuilderError::InvalidGeometryState {
                context: "point feature needs at least 1 point",
            });
        }
        if points.len() > MAX_COMMAND_COUNT as usize {
            return Err(BuilderError::InvalidGeometryState {
                context: "too many points for one command",
            });
        }
        self.geometry.command(COMMAND_MOVE_TO, points.len() as u32);
        for point in points {
            self.geometry.point((*point).into_point());
        }
        self.state = BuildState::InProgress;
        Ok(())
    }

    /// Adds one linestring segment (at least 2 points). May be called
    /// repeatedly to build a multi-linestring.
    pub fn add_linestring<P: IntoPoint + Copy>(&mut self, points: &[P]) -> Result<(), BuilderError> {
        self.ensure_open()?;
        if self.geom_type != GeomType::Linestring {
            return Err(BuilderError::InvalidGeometryState {
                context: "add_linestring on a non-linestring feature",
            });
        }
        if points.len() < 2 {
            return Err(BuilderError::InvalidGeometryState {
                context: "linestring needs at least 2 points",
            });
        }
        if points.len() - 1 > MAX_COMMAND_COUNT as usize {
            return Err(BuilderError::InvalidGeometryState {
                context: "too many points for one command",
            });
        }
        self.geometry.command(COMMAND_MOVE_TO, 1);
        self.geometry.point(points[0].into_point());
        self.geometry.command(COMMAND_LINE_TO, (points.len() - 1) as u32);
        for point in &points[1..] {
            self.geometry.point((*point).into_point());
        }
        self.state = BuildState::InProgress;
        Ok(())
    }

    /// Adds one polygon ring (at least 3 distinct points). A ring given
    /// with its first point repeated last is accepted and the duplicate
    /// dropped; closing is carried by the ClosePath command. May be
    /// called repeatedly to build a multi-ring polygon.
    pub fn add_ring<P: IntoPoint + Copy>(&mut self, points: &[P]) -> Result<(), BuilderError> {
        self.ensure_open()?;
        if self.geom_type != GeomType::Polygon {
            return Err(BuilderError::InvalidGeometryState {
                context: "add_ring on a non-polygon feature",
            });
        }
        let mut ring: Vec<Point> = points.iter().map(|p| (*p).into_point()).collect();
        if ring.len() >= 2 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(BuilderError::InvalidGeometryState {
                context: "ring needs at least 3 distinct points",
            });
        }
        if ring.len() - 1 > MAX_COMMAND_COUNT as usize {
            return Err(BuilderError::InvalidGeometryState {
                context: "too many points for one command",
            });
        }
        self.geometry.command(COMMAND_MOVE_TO, 1);
        self.geometry.point(ring[0]);
        self.geometry.command(COMMAND_LINE_TO, (ring.len() - 1) as u32);
        for point in &ring[1..] {
            self.geometry.point(*point);
        }
        self.geometry.close_path();
        self.state = BuildState::InProgress;
        Ok(())
    }

    /// Records a property as a literal key and value; both are resolved
    /// against the layer's tables (append-only) at commit time.
    pub fn add_property(
        &mut self,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), BuilderError> {
        self.ensure_open()?;
        self.tags.push(TagEntry::Literal {
            key: key.to_string(),
            value: value.into(),
        });
        Ok(())
    }

    /// Records a property from pre-resolved table indexes, e.g. indexes
    /// returned by [`LayerBuilder::add_key`] or a dedup index.
    pub fn add_property_indexed(&mut self, key: u32, value: u32) -> Result<(), BuilderError> {
        self.ensure_open()?;
        self.tags.push(TagEntry::Indexed { key, value });
        Ok(())
    }

    /// Finalizes the feature into the layer.
    ///
    /// Fails with [`BuilderError::InvalidGeometryState`] if no geometry
    /// was added, and with [`BuilderError::AlreadyCommitted`] on a second
    /// commit.
    pub fn commit(&mut self, layer: &mut LayerBuilder) -> Result<(), BuilderError> {
        if self.state == BuildState::Committed {
            return Err(BuilderError::AlreadyCommitted);
        }
        if self.state == BuildState::Empty || self.geometry.is_empty() {
            return Err(BuilderError::InvalidGeometryState {
                context: "commit with no geometry",
            });
        }

        let mut writer = Writer::with_capacity(self.geometry.data().len() + 32);
        if let Some(id) = self.id {
            writer.write_varint_field(FEATURE_ID, id);
        }
        if !self.tags.is_empty() {
            let mut tag_writer = Writer::new();
            for entry in &self.tags {
                let (key, value) = match entry {
                    TagEntry::Literal { key, value } => {
                        (layer.add_key(key), layer.add_value(value))
                    }
                    TagEntry::Indexed { key, value } => (*key, *value),
                };
                tag_writer.write_varint(key as u64);
                tag_writer.write_varint(value as u64);
            }
            writer.write_len_field(FEATURE_TAGS, tag_writer.as_bytes());
        }
        writer.write_varint_field(FEATURE_TYPE, self.geom_type as u64);
        writer.write_len_field(FEATURE_GEOMETRY, self.geometry.data());

        layer.push_feature(writer.as_bytes());
        self.state = BuildState::Committed;
        Ok(())
    }
}
