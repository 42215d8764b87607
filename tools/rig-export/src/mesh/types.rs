//! Mesh data types shared by the deduplication and weighting stages

use rig_common::{MeshType, VertexRecord};

use super::spatial::approx_eq;

/// Skin slots per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Weights at or below this are treated as zero
pub const WEIGHT_EPSILON: f32 = 1e-6;

/// Joint id of an unused skin slot
pub const UNUSED_JOINT: i32 = -1;

/// Vertex color when the mesh has no color set
pub const DEFAULT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// A face-corner vertex with optional skinning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Influence-list indices, [`UNUSED_JOINT`] for empty slots
    pub joints: [i32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            color: DEFAULT_COLOR,
            normal: [0.0; 3],
            uv: [0.0; 2],
            joints: [UNUSED_JOINT; MAX_INFLUENCES],
            weights: [0.0; MAX_INFLUENCES],
        }
    }
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], color: [f32; 3]) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
            ..Default::default()
        }
    }

    /// Tolerance equality over position, normal, uv and color. Skin data is ignored.
    pub fn same_attributes(&self, other: &Vertex) -> bool {
        approx_eq(&self.position, &other.position)
            && approx_eq(&self.normal, &other.normal)
            && approx_eq(&self.uv, &other.uv)
            && approx_eq(&self.color, &other.color)
    }

    pub fn is_weighted(&self) -> bool {
        self.joints.iter().any(|&j| j != UNUSED_JOINT)
    }

    /// On-disk form: joint ids shifted by one so 0 means unused
    pub fn to_record(&self) -> VertexRecord {
        VertexRecord {
            position: self.position,
            color: self.color,
            normal: self.normal,
            uv: self.uv,
            joint_ids: self.joints.map(|j| if j < 0 { 0 } else { j + 1 }),
            weights: self.weights,
        }
    }
}

/// Skin weights of one geometry point, keyed by position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinPoint {
    pub position: [f32; 3],
    pub joints: [i32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

/// Deduplicated mesh ready for writing
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub mesh_type: MeshType,
    pub vertices: Vec<Vertex>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vertex_is_white_and_unweighted() {
        let v = Vertex::default();
        assert_eq!(v.color, [1.0, 1.0, 1.0]);
        assert_eq!(v.joints, [-1; 4]);
        assert!(!v.is_weighted());
    }

    #[test]
    fn test_record_offsets_joint_ids() {
        let mut v = Vertex::default();
        v.joints = [0, 3, UNUSED_JOINT, UNUSED_JOINT];
        v.weights = [0.75, 0.25, 0.0, 0.0];
        let record = v.to_record();
        assert_eq!(record.joint_ids, [1, 4, 0, 0]);
        assert_eq!(record.weights, v.weights);
    }

    #[test]
    fn test_same_attributes_ignores_skin() {
        let a = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5], DEFAULT_COLOR);
        let mut b = a;
        b.joints[0] = 2;
        b.weights[0] = 1.0;
        assert!(a.same_attributes(&b));

        b.uv[1] += 1e-5;
        assert!(!a.same_attributes(&b));
    }
}
