//! Zero-copy decode views over tiles, layers, and features.
//!
//! Every view is a borrowed slice plus eagerly parsed scalar fields;
//! features, keys, and values are re-scanned on each traversal, so
//! nothing is materialized and a malformed element surfaces its error
//! only when it is actually reached.

use crate::codec::geometry::{
    decode_linestring_geometry, decode_point_geometry, decode_polygon_geometry, GeometryHandler,
};
use crate::codec::primitives::{Reader, WireType};
use crate::codec::value::decode_value;
use crate::error::{GeometryError, ProtocolError};
use crate::limits::{
    DEFAULT_EXTENT, IMPLICIT_LAYER_VERSION, MAX_LAYER_VERSION, MIN_LAYER_VERSION,
};
use crate::model::geometry::GeomType;
use crate::model::value::ValueView;

// Tile message fields (vector tile schema)
pub(crate) const TILE_LAYERS: u32 = 3;

// Layer message fields
pub(crate) const LAYER_NAME: u32 = 1;
pub(crate) const LAYER_FEATURES: u32 = 2;
pub(crate) const LAYER_KEYS: u32 = 3;
pub(crate) const LAYER_VALUES: u32 = 4;
pub(crate) const LAYER_EXTENT: u32 = 5;
pub(crate) const LAYER_VERSION: u32 = 15;

// Feature message fields
pub(crate) const FEATURE_ID: u32 = 1;
pub(crate) const FEATURE_TAGS: u32 = 2;
pub(crate) const FEATURE_TYPE: u32 = 3;
pub(crate) const FEATURE_GEOMETRY: u32 = 4;

/// A read-only view over an encoded tile.
///
/// Construction performs no parsing; layers are validated lazily as they
/// are iterated, so a malformed layer does not prevent reading the
/// well-formed layers before it.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    data: &'a [u8],
}

impl<'a> Tile<'a> {
    /// Creates a tile view over a buffer. Nothing is copied or parsed.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Iterates the tile's layers in encoding order.
    pub fn layers(&self) -> Layers<'a> {
        Layers {
            reader: Reader::new(self.data),
            done: false,
        }
    }
}

impl<'a> From<&'a [u8]> for Tile<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

/// Iterator over a tile's layers.
///
/// The iterator fuses after the first error.
#[derive(Debug, Clone)]
pub struct Layers<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> Iterator for Layers<'a> {
    type Item = Result<Layer<'a>, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.reader.is_empty() {
                return None;
            }
            let (field, wire) = match self.reader.read_tag("tile") {
                Ok(tag) => tag,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            if field == TILE_LAYERS && wire == WireType::Len {
                let data = match self.reader.read_len_prefixed("layer") {
                    Ok(data) => data,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                };
                return Some(Layer::parse(data));
            }
            if let Err(e) = self.reader.skip_field(wire, "tile") {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// A read-only view over one layer.
///
/// Scalar fields (version, name, extent) are parsed when the layer is
/// reached; features and the key/value tables are scanned on demand.
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    data: &'a [u8],
    version: u32,
    name: &'a str,
    extent: u32,
}

impl<'a> Layer<'a> {
    fn parse(data: &'a [u8]) -> Result<Layer<'a>, ProtocolError> {
        let mut reader = Reader::new(data);
        let mut version = None;
        let mut name = None;
        let mut extent = None;

        while !reader.is_empty() {
            let (field, wire) = reader.read_tag("layer")?;
            match (field, wire) {
                (LAYER_VERSION, WireType::Varint) => {
                    version = Some(reader.read_varint32("layer version")?);
                }
                (LAYER_NAME, WireType::Len) => {
                    name = Some(reader.read_str("layer name")?);
                }
                (LAYER_EXTENT, WireType::Varint) => {
                    extent = Some(reader.read_varint32("layer extent")?);
                }
                _ => reader.skip_field(wire, "layer")?,
            }
        }

        let version = version.unwrap_or(IMPLICIT_LAYER_VERSION);
        if !(MIN_LAYER_VERSION..=MAX_LAYER_VERSION).contains(&version) {
            return Err(ProtocolError::UnsupportedVersion { version });
        }
        let name = name.ok_or(ProtocolError::MissingField { field: "name" })?;

        Ok(Layer {
            data,
            version,
            name,
            extent: extent.unwrap_or(DEFAULT_EXTENT),
        })
    }

    /// Returns the layer's name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the layer's version (1 or 2).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the layer's coordinate extent.
    pub fn extent(&self) -> u32 {
        self.extent
    }

    /// Iterates the layer's features in encoding order.
    pub fn features(&self) -> Features<'a> {
        Features {
            layer: *self,
            reader: Reader::new(self.data),
            done: false,
        }
    }

    /// Looks up the key table entry at `index` (bounds-checked re-scan).
    pub fn key(&self, index: u32) -> Result<&'a str, ProtocolError> {
        let bytes = self.nth_len_field(LAYER_KEYS, index, "keys")?;
        std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8 { field: "key" })
    }

    /// Looks up and decodes the value table entry at `index`.
    pub fn value(&self, index: u32) -> Result<ValueView<'a>, ProtocolError> {
        decode_value(self.nth_len_field(LAYER_VALUES, index, "values")?)
    }

    fn nth_len_field(
        &self,
        target: u32,
        index: u32,
        table: &'static str,
    ) -> Result<&'a [u8], ProtocolError> {
        let mut reader = Reader::new(self.data);
        let mut seen = 0u32;
        while !reader.is_empty() {
            let (field, wire) = reader.read_tag("layer")?;
            if field == target && wire == WireType::Len {
                let bytes = reader.read_len_prefixed(table)?;
                if seen == index {
                    return Ok(bytes);
                }
                seen += 1;
            } else {
                reader.skip_field(wire, "layer")?;
            }
        }
        Err(ProtocolError::IndexOutOfRange {
            table,
            index,
            size: seen,
        })
    }
}

/// Iterator over a layer's features.
///
/// The iterator fuses after the first error.
#[derive(Debug, Clone)]
pub struct Features<'a> {
    layer: Layer<'a>,
    reader: Reader<'a>,
    done: bool,
}

impl<'a> Iterator for Features<'a> {
    type Item = Result<Feature<'a>, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.reader.is_empty() {
                return None;
            }
            let (field, wire) = match self.reader.read_tag("layer") {
                Ok(tag) => tag,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            if field == LAYER_FEATURES && wire == WireType::Len {
                let data = match self.reader.read_len_prefixed("feature") {
                    Ok(data) => data,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                };
                return Some(Feature::parse(self.layer, data));
            }
            if let Err(e) = self.reader.skip_field(wire, "layer") {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// A read-only view over one feature.
#[derive(Debug, Clone, Copy)]
pub struct Feature<'a> {
    layer: Layer<'a>,
    id: u64,
    geom_type: GeomType,
    tags: &'a [u8],
    geometry: &'a [u8],
}

impl<'a> Feature<'a> {
    fn parse(layer: Layer<'a>, data: &'a [u8]) -> Result<Feature<'a>, ProtocolError> {
        let mut reader = Reader::new(data);
        let mut id = 0u64;
        let mut geom_type = GeomType::Unknown;
        let mut tags: &'a [u8] = &[];
        let mut geometry: &'a [u8] = &[];

        while !reader.is_empty() {
            let (field, wire) = reader.read_tag("feature")?;
            match (field, wire) {
                (FEATURE_ID, WireType::Varint) => {
                    id = reader.read_varint("feature id")?;
                }
                (FEATURE_TYPE, WireType::Varint) => {
                    let value = reader.read_varint("feature type")?;
                    geom_type = u8::try_from(value)
                        .ok()
                        .and_then(GeomType::from_u8)
                        .ok_or(ProtocolError::InvalidGeometryType { value })?;
                }
                (FEATURE_TAGS, WireType::Len) => {
                    tags = reader.read_len_prefixed("feature tags")?;
                }
                (FEATURE_GEOMETRY, WireType::Len) => {
                    geometry = reader.read_len_prefixed("feature geometry")?;
                }
                _ => reader.skip_field(wire, "feature")?,
            }
        }

        Ok(Feature {
            layer,
            id,
            geom_type,
            tags,
            geometry,
        })
    }

    /// Returns the feature id (wire default 0).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the feature's geometry kind.
    pub fn geom_type(&self) -> GeomType {
        self.geom_type
    }

    /// Returns the raw packed geometry words.
    pub fn geometry(&self) -> &'a [u8] {
        self.geometry
    }

    /// Returns the layer this feature belongs to.
    pub fn layer(&self) -> Layer<'a> {
        self.layer
    }

    /// Returns the number of properties (tag pairs).
    pub fn num_properties(&self) -> Result<usize, ProtocolError> {
        let mut reader = Reader::new(self.tags);
        let mut count = 0usize;
        while !reader.is_empty() {
            reader.read_varint32("property tags")?;
            count += 1;
        }
        if count % 2 != 0 {
            return Err(ProtocolError::MalformedPropertyTags);
        }
        Ok(count / 2)
    }

    /// Iterates the feature's properties, resolving each tag pair against
    /// the layer's key and value tables.
    pub fn properties(&self) -> Properties<'a> {
        Properties {
            layer: self.layer,
            reader: Reader::new(self.tags),
            done: false,
        }
    }

    /// Decodes this feature's geometry, dispatching on its kind.
    pub fn decode_geometry<H: GeometryHandler>(&self, handler: &mut H) -> Result<(), GeometryError> {
        match self.geom_type {
            GeomType::Point => decode_point_geometry(self.geometry, handler),
            GeomType::Linestring => decode_linestring_geometry(self.geometry, handler),
            GeomType::Polygon => decode_polygon_geometry(self.geometry, handler),
            GeomType::Unknown => Err(GeometryError::InvalidSequence {
                context: "feature has unknown geometry type",
            }),
        }
    }
}

/// One resolved property: a key from the layer's key table and a value
/// view from its value table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property<'a> {
    pub key: &'a str,
    pub value: ValueView<'a>,
}

/// Iterator over a feature's resolved properties.
///
/// The iterator fuses after the first error.
#[derive(Debug, Clone)]
pub struct Properties<'a> {
    layer: Layer<'a>,
    reader: Reader<'a>,
    done: bool,
}

impl<'a> Iterator for Properties<'a> {
    type Item = Result<Property<'a>, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.is_empty() {
            return None;
        }
        let result = self.next_property();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl<'a> Properties<'a> {
    fn next_property(&mut self) -> Result<Property<'a>, ProtocolError> {
        let key_index = self.reader.read_varint32("property tags")?;
        if self.reader.is_empty() {
            return Err(ProtocolError::MalformedPropertyTags);
        }
        let value_index = self.reader.read_varint32("property tags")?;
        Ok(Property {
            key: self.layer.key(key_index)?,
            value: self.layer.value(value_index)?,
        })
    }
}
