//! Rig exporter binary formats
//!
//! POD (Plain Old Data) formats with no magic bytes: the file kind is determined by
//! context (extension or the caller). Every integer is a little-endian `i32` and every
//! float a little-endian `f32`, with no padding anywhere.
//!
//! Joint IDs are stored with a +1 offset so that 0 always denotes the Root node.
//!
//! All fixed-size headers implement the [`BinarySerializable`] trait for consistent
//! serialization/deserialization.

pub mod animation;
mod error;
pub mod mesh;
mod reader;
mod serialization;

pub use animation::*;
pub use error::FormatError;
pub use mesh::*;
pub use serialization::BinarySerializable;

/// Mesh file extension (without dot)
pub const MESH_EXT: &str = "mof";

/// Animation file extension (without dot)
pub const ANIMATION_EXT: &str = "maf";
