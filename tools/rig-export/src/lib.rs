//! rig-export library
//!
//! Exports a skinned mesh and its joint animation from a scene into `.mof` / `.maf`
//! files. Scenes are reached through [`scene::SceneSource`]; adapters exist for glTF
//! documents and JSON-described in-memory scenes.

pub mod animation;
pub mod error;
pub mod export;
pub mod formats;
pub mod manifest;
pub mod mesh;
pub mod scene;
pub mod skeleton;

// Re-export the pipeline entry points
pub use export::{export_animation, export_both, export_mesh, ExportStats};

pub use error::{ExportError, ExportWarning, HierarchyError, QueryError};
pub use formats::ExportFormat;

// Re-export scene adapters
pub use scene::{open_scene, GltfScene, MemoryScene, SceneOptions, SceneSource, TimeUnit};
