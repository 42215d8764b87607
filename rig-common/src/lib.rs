//! Shared file formats for the rig exporter
//!
//! This crate holds the byte layouts shared between:
//! - `rig-export` (writer side, asset pipeline)
//! - engines and tools that read `.mof` / `.maf` files back
//!
//! # Modules
//!
//! - [`formats`] - mesh and animation headers, records and read-back parsers

pub mod formats;

// Re-export commonly used format items
pub use formats::{
    // Constants
    ANIMATION_EXT,
    // Animation types
    AnimationFile,
    AnimationFileHeader,
    BinarySerializable,
    // Errors
    FormatError,
    JointRecord,
    MESH_EXT,
    // Mesh types
    MeshFile,
    MeshFileHeader,
    MeshType,
    STRIDE_ANIMATED,
    STRIDE_STATIC,
    TRANSFORM_RECORD_SIZE,
    TransformRecord,
    VertexRecord,
    parse_animation_file,
    parse_mesh_file,
};
