//! Scene sources
//!
//! The exporter never talks to an authoring host directly. Everything it needs (mesh
//! topology, face-vertex attributes, skin weights, joint topology and time-scrubbed
//! transforms) goes through the [`SceneSource`] trait.
//!
//! Hosts keep a single global playback cursor. [`SceneSource::set_current_time`] takes
//! `&mut self` and every transform query receives the frame explicitly, so an adapter over
//! a real host must serialize these calls; within this process the mutable borrow already
//! does.

mod gltf;
mod memory;
mod time;

use std::path::Path;

use glam::{EulerRot, Quat};
use rig_common::TransformRecord;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, QueryError};

pub use self::gltf::GltfScene;
pub use memory::{MemoryFace, MemoryJoint, MemoryMesh, MemoryScene, MemorySkin, Timeline};
pub use time::TimeUnit;

/// Opaque handle to a mesh object in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Opaque, stable handle to a joint in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub u32);

/// One polygon of the source mesh together with its triangulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub id: u32,
    /// Polygon corners in winding order (geometry point ids)
    pub polygon_vertices: Vec<u32>,
    /// Triangulated corners, three per triangle (geometry point ids)
    pub triangle_vertices: Vec<u32>,
}

impl Face {
    /// Position of `vertex` among the polygon corners
    pub fn local_index(&self, vertex: u32) -> Option<usize> {
        self.polygon_vertices.iter().position(|&v| v == vertex)
    }
}

/// Local transform of a joint at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointTransform {
    pub position: [f32; 3],
    /// Euler angles in radians (XYZ order)
    pub euler: [f32; 3],
    /// Quaternion `[x, y, z, w]`; this is the serialized rotation
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub shear: [f32; 3],
}

impl Default for JointTransform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            euler: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            shear: [0.0; 3],
        }
    }
}

impl JointTransform {
    /// Build from translation / rotation / scale, deriving the Euler angles
    pub fn from_trs(position: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let (x, y, z) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);
        Self {
            position,
            euler: [x, y, z],
            rotation,
            scale,
            shear: [0.0; 3],
        }
    }

    pub fn to_record(&self) -> TransformRecord {
        TransformRecord {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            shear: self.shear,
        }
    }
}

/// Query interface onto an authoring scene
pub trait SceneSource {
    /// The single selected mesh object
    ///
    /// Fails with [`ExportError::Selection`] when the selection size is not 1 and with
    /// [`ExportError::MeshAccess`] when the selected object is not a mesh.
    fn selected_mesh(&self) -> Result<MeshHandle, ExportError>;

    /// Polygons of the mesh with their triangulation
    fn faces(&self, mesh: MeshHandle) -> Result<Vec<Face>, ExportError>;

    /// Number of geometry points (skin weights are stored per point)
    fn point_count(&self, mesh: MeshHandle) -> u32;

    /// Object-space position of a geometry point
    fn position(&self, mesh: MeshHandle, vertex: u32) -> Result<[f32; 3], QueryError>;

    /// Normal of a face corner
    fn normal(&self, mesh: MeshHandle, face: &Face, local: usize)
        -> Result<[f32; 3], QueryError>;

    /// UV of a face corner, `None` when the mesh has no UV set
    fn uv(&self, mesh: MeshHandle, face: &Face, local: usize)
        -> Result<Option<[f32; 2]>, QueryError>;

    /// Color of a face corner, `None` when the mesh has no color set
    fn color(
        &self,
        mesh: MeshHandle,
        face: &Face,
        local: usize,
    ) -> Result<Option<[f32; 3]>, QueryError>;

    /// Ordered influence list of the mesh's skin; empty when the mesh is not skinned
    fn skin_influences(&self, mesh: MeshHandle) -> Vec<JointHandle>;

    /// Non-zero skin weights of one geometry point
    fn skin_weights(
        &self,
        mesh: MeshHandle,
        point: u32,
    ) -> Result<Vec<(JointHandle, f32)>, QueryError>;

    fn joint_name(&self, joint: JointHandle) -> String;

    fn joint_parent(&self, joint: JointHandle) -> Option<JointHandle>;

    /// Native children in scene order
    fn joint_children(&self, joint: JointHandle) -> Vec<JointHandle>;

    /// Move the host's playback cursor
    fn set_current_time(&mut self, frame: i32);

    fn timeline_start_frame(&self) -> i32 {
        0
    }

    fn timeline_end_frame(&self) -> i32;

    fn timeline_unit(&self) -> TimeUnit;

    fn timeline_fps(&self) -> f32 {
        self.timeline_unit().fps()
    }

    /// Local transform of `joint` at `frame`, which must be the frame last passed to
    /// [`SceneSource::set_current_time`]
    fn local_transform(&self, joint: JointHandle, frame: i32)
        -> Result<JointTransform, QueryError>;
}

/// How to open a scene file
#[derive(Debug, Clone, Default)]
pub struct SceneOptions {
    /// Name of the object to select (glTF node name)
    pub node: Option<String>,
    /// Animation clip index for glTF scenes
    pub animation: Option<usize>,
    /// Override the scene's time unit
    pub time_unit: Option<TimeUnit>,
}

/// Open a scene file, choosing the adapter by extension
pub fn open_scene(path: &Path, options: &SceneOptions) -> Result<Box<dyn SceneSource>, ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "gltf" | "glb" => Ok(Box::new(GltfScene::open(path, options)?)),
        "json" => {
            let mut scene = MemoryScene::load(path)?;
            if let Some(node) = &options.node {
                scene.selection = vec![node.clone()];
            }
            if let Some(unit) = options.time_unit {
                scene.timeline.unit = unit;
            }
            Ok(Box::new(scene))
        }
        _ => Err(ExportError::Scene {
            path: path.to_path_buf(),
            message: "unsupported scene format (use .gltf, .glb or .json)".to_string(),
        }),
    }
}
