//! tilewire: zero-copy reader and incremental writer for Mapbox vector
//! tiles.
//!
//! A vector tile is a sequence of named layers; each layer shares one
//! key table and one value table across its features, and every feature
//! carries a packed integer geometry plus `(key, value)` index pairs.
//! This crate implements both directions of that format without an
//! external protobuf runtime:
//!
//! - **Decoding** hands out borrowed views ([`Tile`], [`Layer`],
//!   [`Feature`], [`ValueView`]) over the input buffer. Nothing is
//!   copied or materialized; layers, features, keys and values are
//!   re-scanned lazily as they are traversed, and a malformed element
//!   reports its error only when it is reached.
//! - **Encoding** goes through builders ([`TileBuilder`],
//!   [`LayerBuilder`], [`FeatureBuilder`]) that append to growable
//!   buffers, with optional dedup indexes ([`ValueIndex`], [`KeyIndex`])
//!   so repeated keys and values occupy one table slot.
//!
//! # Quick start
//!
//! ```rust
//! use tilewire::{FeatureBuilder, LayerBuilder, Tile, TileBuilder};
//!
//! // Build a tile with one point feature
//! let mut layer = LayerBuilder::new("points");
//! let mut feature = FeatureBuilder::point().with_id(7);
//! feature.add_point((10, 10)).unwrap();
//! feature.add_property("name", "well").unwrap();
//! feature.commit(&mut layer).unwrap();
//!
//! let mut tile = TileBuilder::new();
//! tile.add_layer(layer);
//! let data = tile.serialize();
//!
//! // Decode it back; views borrow from `data`, nothing is copied
//! let tile = Tile::new(&data);
//! let layer = tile.layers().next().unwrap().unwrap();
//! assert_eq!(layer.name(), "points");
//! let feature = layer.features().next().unwrap().unwrap();
//! assert_eq!(feature.id(), 7);
//! let property = feature.properties().next().unwrap().unwrap();
//! assert_eq!(property.key, "name");
//! assert_eq!(property.value.string_value().unwrap(), "well");
//! ```
//!
//! # Modules
//!
//! - [`codec`]: wire primitives, the value and geometry codecs, and the
//!   tile/layer/feature decode views
//! - [`builder`]: tile/layer/feature builders
//! - [`index`]: pluggable dedup indexes for key and value tables
//! - [`model`]: points, geometry kinds, property values and the visitor
//! - [`error`]: error taxonomy
//! - [`limits`]: wire constants and decoder hardening limits
//!
//! # Safety with untrusted input
//!
//! The decoder never allocates proportionally to claimed lengths before
//! checking them against the remaining buffer, varints are capped at 10
//! bytes, and every table lookup is bounds-checked. Malformed input is
//! rejected with a descriptive error; nothing is auto-corrected.
//!
//! # Ownership
//!
//! Decode views borrow the input buffer, so the borrow checker enforces
//! the format's central lifetime contract: no view outlives the buffer
//! it was decoded from. Builders form a single-writer tree; layer
//! builders can be filled on separate threads and moved into the tile
//! builder before [`TileBuilder::serialize`].

pub mod builder;
pub mod codec;
pub mod error;
pub mod index;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use builder::{FeatureBuilder, LayerBuilder, TileBuilder};
pub use codec::geometry::{
    decode_linestring_geometry, decode_point_geometry, decode_polygon_geometry, GeometryHandler,
};
pub use codec::tile::{Feature, Features, Layer, Layers, Properties, Property, Tile};
pub use codec::value::{decode_value, encode_value};
pub use error::{BuilderError, GeometryError, ProtocolError, TypeError};
pub use index::{IndexMap, KeyIndex, ValueIndex};
pub use model::geometry::{GeomType, IntoPoint, Point};
pub use model::value::{apply_visitor, PropertyValue, ValueKind, ValueView, ValueVisitor};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vector tile specification version this crate implements.
pub const TILE_SPEC_VERSION: &str = "2.1";
