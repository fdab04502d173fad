//! Data model types: points, geometry kinds, and property values.

pub mod geometry;
pub mod value;

pub use geometry::{GeomType, IntoPoint, Point};
pub use value::{apply_visitor, PropertyValue, ValueKind, ValueView, ValueVisitor};
