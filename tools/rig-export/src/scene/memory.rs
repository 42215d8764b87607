//! In-memory scene
//!
//! A self-contained [`SceneSource`] loaded from JSON. It behaves like an authoring host:
//! transforms are only available for the frame the playback cursor sits on, and every
//! cursor move is recorded so callers can check the order frames were visited in.
//!
//! ```json
//! {
//!   "selection": ["Body"],
//!   "meshes": [{
//!     "name": "Body",
//!     "points": [[0,0,0], [1,0,0], [1,1,0], [0,1,0]],
//!     "faces": [{ "vertices": [0,1,2,3], "normals": [[0,0,1],[0,0,1],[0,0,1],[0,0,1]] }],
//!     "skin": { "influences": [1, 2], "weights": [[[1, 1.0]], [[2, 1.0]], [[2, 1.0]], [[1, 1.0]]] }
//!   }],
//!   "joints": [
//!     { "name": "Armature" },
//!     { "name": "Hips", "parent": 0, "frames": [{ "position": [0, 1, 0] }] },
//!     { "name": "Spine", "parent": 1 }
//!   ],
//!   "timeline": { "start": 0, "end": 0, "unit": "ntsc" }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Face, JointHandle, JointTransform, MeshHandle, SceneSource, TimeUnit};
use crate::error::{ExportError, QueryError};

/// Playback range and unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeline {
    pub start: i32,
    pub end: i32,
    pub unit: TimeUnit,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            unit: TimeUnit::Ntsc,
        }
    }
}

/// A polygon with face-vertex attributes, one entry per corner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFace {
    /// Corner point ids in winding order
    pub vertices: Vec<u32>,
    /// Triangulated point ids; fan triangulation when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triangles: Option<Vec<u32>>,
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<[f32; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<[f32; 3]>>,
}

impl MemoryFace {
    fn triangulate(&self) -> Vec<u32> {
        if let Some(triangles) = &self.triangles {
            return triangles.clone();
        }
        let mut out = Vec::with_capacity(self.vertices.len().saturating_sub(2) * 3);
        for i in 1..self.vertices.len().saturating_sub(1) {
            out.extend_from_slice(&[self.vertices[0], self.vertices[i], self.vertices[i + 1]]);
        }
        out
    }
}

/// Skin cluster: influence joints and per-point `(joint index, weight)` lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySkin {
    pub influences: Vec<u32>,
    #[serde(default)]
    pub weights: Vec<Vec<(u32, f32)>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMesh {
    pub name: String,
    pub points: Vec<[f32; 3]>,
    pub faces: Vec<MemoryFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<MemorySkin>,
}

/// A transform node; its handle is its index in [`MemoryScene::joints`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryJoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    /// Explicit child order; derived from `parent` links when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<u32>>,
    /// Transform used when `frames` is empty
    #[serde(default)]
    pub rest: JointTransform,
    /// Keyed by `frame - timeline.start`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<JointTransform>,
}

impl MemoryJoint {
    pub fn new(name: impl Into<String>, parent: Option<u32>) -> Self {
        Self {
            name: name.into(),
            parent,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryScene {
    /// Names of selected objects
    #[serde(default)]
    pub selection: Vec<String>,
    #[serde(default)]
    pub meshes: Vec<MemoryMesh>,
    #[serde(default)]
    pub joints: Vec<MemoryJoint>,
    #[serde(default)]
    pub timeline: Timeline,
    #[serde(skip)]
    cursor: Option<i32>,
    #[serde(skip)]
    history: Vec<i32>,
}

impl MemoryScene {
    /// Scene holding a single selected mesh
    pub fn with_mesh(mesh: MemoryMesh) -> Self {
        Self {
            selection: vec![mesh.name.clone()],
            meshes: vec![mesh],
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let scene_error = |message: String| ExportError::Scene {
            path: path.to_path_buf(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| scene_error(e.to_string()))?;
        Self::from_json(&text).map_err(|e| scene_error(e.to_string()))
    }

    /// Append a joint and return its handle
    pub fn add_joint(&mut self, joint: MemoryJoint) -> JointHandle {
        self.joints.push(joint);
        JointHandle(self.joints.len() as u32 - 1)
    }

    /// Current playback frame
    pub fn current_frame(&self) -> i32 {
        self.cursor.unwrap_or(self.timeline.start)
    }

    /// Every frame passed to `set_current_time`, in call order
    pub fn time_history(&self) -> &[i32] {
        &self.history
    }

    fn mesh(&self, mesh: MeshHandle) -> Option<&MemoryMesh> {
        self.meshes.get(mesh.0 as usize)
    }

    fn joint(&self, joint: JointHandle) -> Option<&MemoryJoint> {
        self.joints.get(joint.0 as usize)
    }

    fn face_source(&self, mesh: MeshHandle, face: &Face) -> Option<&MemoryFace> {
        self.mesh(mesh)?.faces.get(face.id as usize)
    }

    fn corner_vertex(face: &Face, local: usize) -> u32 {
        face.polygon_vertices.get(local).copied().unwrap_or(u32::MAX)
    }
}

impl SceneSource for MemoryScene {
    fn selected_mesh(&self) -> Result<MeshHandle, ExportError> {
        let [name] = self.selection.as_slice() else {
            return Err(ExportError::Selection(self.selection.len()));
        };
        self.meshes
            .iter()
            .position(|m| &m.name == name)
            .map(|i| MeshHandle(i as u32))
            .ok_or_else(|| ExportError::MeshAccess(name.clone()))
    }

    fn faces(&self, mesh: MeshHandle) -> Result<Vec<Face>, ExportError> {
        let source = self
            .mesh(mesh)
            .ok_or_else(|| ExportError::MeshAccess(format!("mesh #{}", mesh.0)))?;
        Ok(source
            .faces
            .iter()
            .enumerate()
            .map(|(id, f)| Face {
                id: id as u32,
                polygon_vertices: f.vertices.clone(),
                triangle_vertices: f.triangulate(),
            })
            .collect())
    }

    fn point_count(&self, mesh: MeshHandle) -> u32 {
        self.mesh(mesh).map_or(0, |m| m.points.len() as u32)
    }

    fn position(&self, mesh: MeshHandle, vertex: u32) -> Result<[f32; 3], QueryError> {
        self.mesh(mesh)
            .and_then(|m| m.points.get(vertex as usize))
            .copied()
            .ok_or(QueryError::Vertex {
                attribute: "position",
                vertex,
            })
    }

    fn normal(&self, mesh: MeshHandle, face: &Face, local: usize) -> Result<[f32; 3], QueryError> {
        self.face_source(mesh, face)
            .and_then(|f| f.normals.get(local))
            .copied()
            .ok_or(QueryError::Vertex {
                attribute: "normal",
                vertex: Self::corner_vertex(face, local),
            })
    }

    fn uv(
        &self,
        mesh: MeshHandle,
        face: &Face,
        local: usize,
    ) -> Result<Option<[f32; 2]>, QueryError> {
        match self.face_source(mesh, face).and_then(|f| f.uvs.as_ref()) {
            None => Ok(None),
            Some(uvs) => uvs.get(local).copied().map(Some).ok_or(QueryError::Vertex {
                attribute: "uv",
                vertex: Self::corner_vertex(face, local),
            }),
        }
    }

    fn color(
        &self,
        mesh: MeshHandle,
        face: &Face,
        local: usize,
    ) -> Result<Option<[f32; 3]>, QueryError> {
        match self.face_source(mesh, face).and_then(|f| f.colors.as_ref()) {
            None => Ok(None),
            Some(colors) => colors.get(local).copied().map(Some).ok_or(QueryError::Vertex {
                attribute: "color",
                vertex: Self::corner_vertex(face, local),
            }),
        }
    }

    fn skin_influences(&self, mesh: MeshHandle) -> Vec<JointHandle> {
        self.mesh(mesh)
            .and_then(|m| m.skin.as_ref())
            .map(|skin| skin.influences.iter().map(|&j| JointHandle(j)).collect())
            .unwrap_or_default()
    }

    fn skin_weights(
        &self,
        mesh: MeshHandle,
        point: u32,
    ) -> Result<Vec<(JointHandle, f32)>, QueryError> {
        let skin = self.mesh(mesh).and_then(|m| m.skin.as_ref());
        let Some(skin) = skin else {
            return Ok(Vec::new());
        };
        skin.weights
            .get(point as usize)
            .map(|w| {
                w.iter()
                    .filter(|(_, weight)| *weight != 0.0)
                    .map(|&(j, weight)| (JointHandle(j), weight))
                    .collect()
            })
            .ok_or(QueryError::Weights(point))
    }

    fn joint_name(&self, joint: JointHandle) -> String {
        self.joint(joint)
            .map(|j| j.name.clone())
            .unwrap_or_else(|| format!("joint{}", joint.0))
    }

    fn joint_parent(&self, joint: JointHandle) -> Option<JointHandle> {
        self.joint(joint)?.parent.map(JointHandle)
    }

    fn joint_children(&self, joint: JointHandle) -> Vec<JointHandle> {
        let Some(node) = self.joint(joint) else {
            return Vec::new();
        };
        match &node.children {
            Some(children) => children.iter().map(|&c| JointHandle(c)).collect(),
            None => self
                .joints
                .iter()
                .enumerate()
                .filter(|(_, j)| j.parent == Some(joint.0))
                .map(|(i, _)| JointHandle(i as u32))
                .collect(),
        }
    }

    fn set_current_time(&mut self, frame: i32) {
        self.cursor = Some(frame);
        self.history.push(frame);
    }

    fn timeline_start_frame(&self) -> i32 {
        self.timeline.start
    }

    fn timeline_end_frame(&self) -> i32 {
        self.timeline.end
    }

    fn timeline_unit(&self) -> TimeUnit {
        self.timeline.unit
    }

    fn local_transform(&self, joint: JointHandle, frame: i32) -> Result<JointTransform, QueryError> {
        let current = self.current_frame();
        if frame != current {
            return Err(QueryError::TimeMismatch {
                requested: frame,
                current,
            });
        }
        let node = self.joint(joint).ok_or(QueryError::UnknownJoint(joint.0))?;
        if node.frames.is_empty() {
            return Ok(node.rest);
        }
        usize::try_from(frame - self.timeline.start)
            .ok()
            .and_then(|i| node.frames.get(i))
            .copied()
            .ok_or_else(|| QueryError::Transform {
                joint: node.name.clone(),
                frame,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "selection": ["Body"],
        "meshes": [{
            "name": "Body",
            "points": [[0,0,0], [1,0,0], [1,1,0], [0,1,0]],
            "faces": [{
                "vertices": [0, 1, 2, 3],
                "normals": [[0,0,1], [0,0,1], [0,0,1], [0,0,1]],
                "uvs": [[0,0], [1,0], [1,1], [0,1]]
            }],
            "skin": { "influences": [1, 2], "weights": [[[1, 1.0]], [[2, 1.0]], [[2, 0.5], [1, 0.5]], [[1, 1.0]]] }
        }],
        "joints": [
            { "name": "Armature" },
            { "name": "Hips", "parent": 0, "frames": [{ "position": [0, 1, 0] }, { "position": [0, 2, 0] }] },
            { "name": "Spine", "parent": 1 }
        ],
        "timeline": { "start": 0, "end": 1, "unit": "film" }
    }"#;

    #[test]
    fn test_load_from_json() {
        let scene = MemoryScene::from_json(SCENE).unwrap();
        let mesh = scene.selected_mesh().unwrap();
        assert_eq!(scene.point_count(mesh), 4);
        assert_eq!(scene.timeline_fps(), 24.0);

        let faces = scene.faces(mesh).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].triangle_vertices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(scene.uv(mesh, &faces[0], 2).unwrap(), Some([1.0, 1.0]));
        assert_eq!(scene.color(mesh, &faces[0], 2).unwrap(), None);
    }

    #[test]
    fn test_topology() {
        let scene = MemoryScene::from_json(SCENE).unwrap();
        assert_eq!(scene.joint_parent(JointHandle(2)), Some(JointHandle(1)));
        assert_eq!(scene.joint_parent(JointHandle(0)), None);
        assert_eq!(scene.joint_children(JointHandle(0)), vec![JointHandle(1)]);
        assert_eq!(scene.joint_name(JointHandle(2)), "Spine");
    }

    #[test]
    fn test_selection_errors() {
        let mut scene = MemoryScene::from_json(SCENE).unwrap();
        scene.selection.clear();
        assert!(matches!(scene.selected_mesh(), Err(ExportError::Selection(0))));

        scene.selection = vec!["Hips".to_string()];
        assert!(matches!(scene.selected_mesh(), Err(ExportError::MeshAccess(_))));
    }

    #[test]
    fn test_transform_follows_cursor() {
        let mut scene = MemoryScene::from_json(SCENE).unwrap();
        let hips = JointHandle(1);

        scene.set_current_time(1);
        assert_eq!(scene.local_transform(hips, 1).unwrap().position, [0.0, 2.0, 0.0]);
        assert_eq!(
            scene.local_transform(hips, 0),
            Err(QueryError::TimeMismatch {
                requested: 0,
                current: 1
            })
        );
        // joints without keys report their rest pose
        assert_eq!(scene.local_transform(JointHandle(2), 1).unwrap(), JointTransform::default());
        assert_eq!(scene.time_history(), &[1]);
    }

    #[test]
    fn test_missing_weights_entry() {
        let mut scene = MemoryScene::from_json(SCENE).unwrap();
        scene.meshes[0].skin.as_mut().unwrap().weights.truncate(2);
        let mesh = scene.selected_mesh().unwrap();
        assert_eq!(scene.skin_weights(mesh, 3), Err(QueryError::Weights(3)));
        assert_eq!(scene.skin_weights(mesh, 1).unwrap(), vec![(JointHandle(2), 1.0)]);
    }
}
