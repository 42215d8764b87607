//! Mesh file format (.mof)
//!
//! Deduplicated vertices, a triangle index list and, for skinned meshes, the skeleton
//! with its bind pose.
//!
//! # Layout
//! ```text
//! 0x00: vertex_count i32
//! 0x04: stride i32                 (11 static, 19 animated; floats per vertex)
//! 0x08: vertex records             (vertex_count × stride × 4 bytes)
//! var:  index_count i32
//! var:  indices                    (index_count × i32)
//! if animated:
//!       skeleton_count i32         (joints + 1)
//!       JointRecord root
//!       JointRecord joints[skeleton_count - 1]
//! ```
//!
//! Vertex record: position xyz, color rgb, normal xyz, uv, then for animated meshes
//! `joint_id[4]` (i32, source id + 1, 0 = unused) and `weight[4]` (f32).
//!
//! Joint record: `name_len i32, name bytes, self_id i32, parent_id i32, child_count i32,
//! child_ids[child_count] i32`, followed by a [`TransformRecord`] (bind pose).

use std::io::{self, Write};

use super::reader::ByteReader;
use super::animation::TRANSFORM_RECORD_SIZE;
use super::{FormatError, TransformRecord};

/// Floats per vertex for meshes without skinning
pub const STRIDE_STATIC: i32 = 11;

/// Floats per vertex for skinned meshes (adds 4 joint ids + 4 weights)
pub const STRIDE_ANIMATED: i32 = 19;

/// Smallest joint record: empty name, no children, transform
const MIN_JOINT_RECORD_SIZE: usize = 16 + TRANSFORM_RECORD_SIZE;

/// Whether a mesh carries skinning data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshType {
    Static,
    Animated,
}

impl MeshType {
    /// Vertex record stride in 4-byte fields
    pub const fn stride(self) -> i32 {
        match self {
            MeshType::Static => STRIDE_STATIC,
            MeshType::Animated => STRIDE_ANIMATED,
        }
    }

    pub const fn from_stride(stride: i32) -> Option<Self> {
        match stride {
            STRIDE_STATIC => Some(MeshType::Static),
            STRIDE_ANIMATED => Some(MeshType::Animated),
            _ => None,
        }
    }

    pub const fn is_animated(self) -> bool {
        matches!(self, MeshType::Animated)
    }
}

/// Mesh file header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct MeshFileHeader {
    pub vertex_count: i32,
    pub stride: i32,
}

impl MeshFileHeader {
    pub const SIZE: usize = 8;

    pub fn new(vertex_count: i32, mesh_type: MeshType) -> Self {
        Self {
            vertex_count,
            stride: mesh_type.stride(),
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.stride.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            vertex_count: i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            stride: i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }

    pub fn mesh_type(&self) -> Option<MeshType> {
        MeshType::from_stride(self.stride)
    }

    /// Size in bytes of the vertex block following the header
    pub fn vertex_data_size(&self) -> usize {
        self.vertex_count.max(0) as usize * self.stride.max(0) as usize * 4
    }
}

/// One vertex as stored on disk (joint ids already offset by +1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joint_ids: [i32; 4],
    pub weights: [f32; 4],
}

impl VertexRecord {
    /// Write the record; skinning fields are only emitted for animated meshes
    pub fn write<W: Write>(&self, w: &mut W, mesh_type: MeshType) -> io::Result<()> {
        for f in self
            .position
            .iter()
            .chain(&self.color)
            .chain(&self.normal)
            .chain(&self.uv)
        {
            w.write_all(&f.to_le_bytes())?;
        }
        if mesh_type.is_animated() {
            for id in &self.joint_ids {
                w.write_all(&id.to_le_bytes())?;
            }
            for weight in &self.weights {
                w.write_all(&weight.to_le_bytes())?;
            }
        }
        Ok(())
    }

    fn read(reader: &mut ByteReader<'_>, mesh_type: MeshType) -> Result<Self, FormatError> {
        let position = reader.read_f32_array()?;
        let color = reader.read_f32_array()?;
        let normal = reader.read_f32_array()?;
        let uv = reader.read_f32_array()?;
        let (joint_ids, weights) = if mesh_type.is_animated() {
            (reader.read_i32_array()?, reader.read_f32_array()?)
        } else {
            ([0; 4], [0.0; 4])
        };
        Ok(Self {
            position,
            color,
            normal,
            uv,
            joint_ids,
            weights,
        })
    }
}

/// One skeleton node as stored on disk (ids offset by +1, Root is 0)
#[derive(Debug, Clone, PartialEq)]
pub struct JointRecord {
    pub name: String,
    pub self_id: i32,
    pub parent_id: i32,
    pub child_ids: Vec<i32>,
    pub transform: TransformRecord,
}

impl JointRecord {
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let name = self.name.as_bytes();
        w.write_all(&(name.len() as i32).to_le_bytes())?;
        w.write_all(name)?;
        w.write_all(&self.self_id.to_le_bytes())?;
        w.write_all(&self.parent_id.to_le_bytes())?;
        w.write_all(&(self.child_ids.len() as i32).to_le_bytes())?;
        for id in &self.child_ids {
            w.write_all(&id.to_le_bytes())?;
        }
        w.write_all(&self.transform.to_bytes())
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let name_len = reader.read_count("name")?;
        let name_offset = reader.offset();
        let name = std::str::from_utf8(reader.take(name_len)?)
            .map_err(|_| FormatError::InvalidName(name_offset))?
            .to_owned();
        let self_id = reader.read_i32()?;
        let parent_id = reader.read_i32()?;
        let child_count = reader.read_count("child")?;
        let mut child_ids = Vec::with_capacity(reader.capacity_for(child_count, 4));
        for _ in 0..child_count {
            child_ids.push(reader.read_i32()?);
        }
        let transform = TransformRecord::read(reader)?;
        Ok(Self {
            name,
            self_id,
            parent_id,
            child_ids,
            transform,
        })
    }
}

/// Decoded contents of a mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFile {
    pub header: MeshFileHeader,
    pub mesh_type: MeshType,
    pub vertices: Vec<VertexRecord>,
    pub indices: Vec<i32>,
    /// Root first, then joints in influence order. Empty for static meshes.
    pub skeleton: Vec<JointRecord>,
}

/// Parse a complete binary mesh file
pub fn parse_mesh_file(bytes: &[u8]) -> Result<MeshFile, FormatError> {
    let mut reader = ByteReader::new(bytes);

    let vertex_count = reader.read_count("vertex")?;
    let stride = reader.read_i32()?;
    let mesh_type = MeshType::from_stride(stride).ok_or(FormatError::InvalidStride(stride))?;

    let record_size = stride as usize * 4;
    let mut vertices = Vec::with_capacity(reader.capacity_for(vertex_count, record_size));
    for _ in 0..vertex_count {
        vertices.push(VertexRecord::read(&mut reader, mesh_type)?);
    }

    let index_count = reader.read_count("index")?;
    let mut indices = Vec::with_capacity(reader.capacity_for(index_count, 4));
    for _ in 0..index_count {
        indices.push(reader.read_i32()?);
    }

    let mut skeleton = Vec::new();
    if mesh_type.is_animated() {
        let skeleton_count = reader.read_count("skeleton")?;
        skeleton.reserve(reader.capacity_for(skeleton_count, MIN_JOINT_RECORD_SIZE));
        for _ in 0..skeleton_count {
            skeleton.push(JointRecord::read(&mut reader)?);
        }
    }
    reader.finish()?;

    Ok(MeshFile {
        header: MeshFileHeader {
            vertex_count: vertex_count as i32,
            stride,
        },
        mesh_type,
        vertices,
        indices,
        skeleton,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_vertex(x: f32) -> VertexRecord {
        VertexRecord {
            position: [x, 0.0, 0.0],
            color: [1.0, 1.0, 1.0],
            normal: [0.0, 1.0, 0.0],
            uv: [0.0, 0.0],
            joint_ids: [1, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_mesh_header_roundtrip() {
        let header = MeshFileHeader::new(24, MeshType::Animated);
        assert_eq!(header.stride, 19);

        let parsed = MeshFileHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.mesh_type(), Some(MeshType::Animated));
    }

    #[test]
    fn test_mesh_header_from_short_bytes() {
        assert!(MeshFileHeader::from_bytes(&[0u8; 4]).is_none());
    }

    #[test]
    fn test_vertex_record_size_per_type() {
        let v = white_vertex(1.0);

        let mut static_bytes = Vec::new();
        v.write(&mut static_bytes, MeshType::Static).unwrap();
        assert_eq!(static_bytes.len(), STRIDE_STATIC as usize * 4);

        let mut skinned_bytes = Vec::new();
        v.write(&mut skinned_bytes, MeshType::Animated).unwrap();
        assert_eq!(skinned_bytes.len(), STRIDE_ANIMATED as usize * 4);
        // first joint id directly after the 11 attribute floats
        assert_eq!(&skinned_bytes[44..48], &1i32.to_le_bytes());
    }

    #[test]
    fn test_joint_record_layout() {
        let record = JointRecord {
            name: "Hips".to_string(),
            self_id: 1,
            parent_id: 0,
            child_ids: vec![2, 3],
            transform: TransformRecord::default(),
        };
        let mut bytes = Vec::new();
        record.write(&mut bytes).unwrap();

        // 4 + 4 (name) + 4 + 4 + 4 + 8 (children) + 52 (transform)
        assert_eq!(bytes.len(), 80);
        assert_eq!(&bytes[0..4], &4i32.to_le_bytes());
        assert_eq!(&bytes[4..8], b"Hips");

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(JointRecord::read(&mut reader).unwrap(), record);
    }

    #[test]
    fn test_parse_static_mesh() {
        let mut bytes = MeshFileHeader::new(2, MeshType::Static).to_bytes().to_vec();
        white_vertex(0.0).write(&mut bytes, MeshType::Static).unwrap();
        white_vertex(1.0).write(&mut bytes, MeshType::Static).unwrap();
        bytes.extend_from_slice(&3i32.to_le_bytes());
        for i in [0i32, 1, 1] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }

        let mesh = parse_mesh_file(&bytes).unwrap();
        assert_eq!(mesh.mesh_type, MeshType::Static);
        assert_eq!(mesh.vertices.len(), 2);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.indices, vec![0, 1, 1]);
        assert!(mesh.skeleton.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_stride() {
        let header = MeshFileHeader {
            vertex_count: 0,
            stride: 12,
        };
        assert_eq!(
            parse_mesh_file(&header.to_bytes()),
            Err(FormatError::InvalidStride(12))
        );
    }

    #[test]
    fn test_parse_huge_counts_without_data() {
        let header = MeshFileHeader {
            vertex_count: i32::MAX,
            stride: STRIDE_ANIMATED,
        };
        assert!(matches!(
            parse_mesh_file(&header.to_bytes()),
            Err(FormatError::UnexpectedEof { .. })
        ));

        // empty vertex block, then an index count far beyond the file
        let mut bytes = MeshFileHeader::new(0, MeshType::Animated).to_bytes().to_vec();
        bytes.extend_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(parse_mesh_file(&bytes), Err(FormatError::UnexpectedEof { .. })));

        // no indices, then a skeleton count far beyond the file
        let mut bytes = MeshFileHeader::new(0, MeshType::Animated).to_bytes().to_vec();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(parse_mesh_file(&bytes), Err(FormatError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_joint_record_huge_child_count() {
        let mut bytes = Vec::new();
        for value in [0i32, 1, 0, i32::MAX] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            JointRecord::read(&mut reader),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_trailing_bytes() {
        let mut bytes = MeshFileHeader::new(0, MeshType::Static).to_bytes().to_vec();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.push(0xFF);
        assert_eq!(parse_mesh_file(&bytes), Err(FormatError::TrailingBytes(1)));
    }
}
