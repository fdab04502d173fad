//! Wire-level encoding and decoding for the vector tile format.

pub mod geometry;
pub mod primitives;
pub mod tile;
pub mod value;

pub use geometry::{
    decode_linestring_geometry, decode_point_geometry, decode_polygon_geometry, GeometryHandler,
};
pub use primitives::{
    zigzag_decode, zigzag_decode32, zigzag_encode, zigzag_encode32, Reader, WireType, Writer,
};
pub use tile::{Feature, Features, Layer, Layers, Properties, Property, Tile};
pub use value::{decode_value, encode_value};
