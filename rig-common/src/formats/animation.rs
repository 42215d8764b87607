//! Animation file format (.maf)
//!
//! Sampled local joint transforms, one record per node per frame.
//!
//! # Layout
//! ```text
//! Header (12 bytes):
//! 0x00: joint_count i32   - skeleton size + 1 (Root)
//! 0x04: frame_count i32   - end frame + 1
//! 0x08: frame_rate f32    - frames per second
//!
//! Frame data (frame_count × joint_count × 52 bytes):
//! [frame0_root, frame0_joint0, ..., frame1_root, ...]
//! ```
//!
//! Names and hierarchy are not repeated here. Joint order is the contract linking an
//! animation file to its companion mesh file.

use super::reader::ByteReader;
use super::FormatError;

/// Size of one [`TransformRecord`] in bytes (13 floats)
pub const TRANSFORM_RECORD_SIZE: usize = 52;

/// Animation file header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct AnimationFileHeader {
    /// Number of nodes per frame, Root included
    pub joint_count: i32,
    /// Number of sampled frames
    pub frame_count: i32,
    /// Playback rate in frames per second
    pub frame_rate: f32,
}

impl AnimationFileHeader {
    pub const SIZE: usize = 12;

    pub fn new(joint_count: i32, frame_count: i32, frame_rate: f32) -> Self {
        Self {
            joint_count,
            frame_count,
            frame_rate,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.joint_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.frame_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.frame_rate.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            joint_count: i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            frame_count: i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            frame_rate: f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    /// Both counts must be positive (Root is always present)
    pub fn validate(&self) -> bool {
        self.joint_count > 0 && self.frame_count > 0 && self.frame_rate > 0.0
    }

    /// Size of the frame data following the header
    pub fn data_size(&self) -> usize {
        self.frame_count.max(0) as usize * self.joint_count.max(0) as usize * TRANSFORM_RECORD_SIZE
    }

    /// Header plus frame data
    pub fn file_size(&self) -> usize {
        Self::SIZE + self.data_size()
    }
}

/// One local transform: position, quaternion rotation `[x, y, z, w]`, scale, shear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformRecord {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub shear: [f32; 3],
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
            shear: [0.0, 0.0, 0.0],
        }
    }
}

impl TransformRecord {
    /// Write to raw bytes (52 bytes)
    pub fn to_bytes(&self) -> [u8; TRANSFORM_RECORD_SIZE] {
        let mut bytes = [0u8; TRANSFORM_RECORD_SIZE];
        let floats = self
            .position
            .iter()
            .chain(&self.rotation)
            .chain(&self.scale)
            .chain(&self.shear);
        for (chunk, f) in bytes.chunks_exact_mut(4).zip(floats) {
            chunk.copy_from_slice(&f.to_le_bytes());
        }
        bytes
    }

    /// Parse from raw bytes (52 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut reader = ByteReader::new(bytes);
        Self::read(&mut reader).ok()
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            position: reader.read_f32_array()?,
            rotation: reader.read_f32_array()?,
            scale: reader.read_f32_array()?,
            shear: reader.read_f32_array()?,
        })
    }
}

/// Decoded contents of an animation file
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFile {
    pub header: AnimationFileHeader,
    /// `frames[f][0]` is Root, `frames[f][i + 1]` is influence joint `i`
    pub frames: Vec<Vec<TransformRecord>>,
}

impl AnimationFile {
    /// Transform history of one node across all frames
    pub fn track(&self, node: usize) -> impl Iterator<Item = &TransformRecord> {
        self.frames.iter().filter_map(move |frame| frame.get(node))
    }
}

/// Parse a complete binary animation file
pub fn parse_animation_file(bytes: &[u8]) -> Result<AnimationFile, FormatError> {
    let mut reader = ByteReader::new(bytes);

    let joint_count = reader.read_count("joint")?;
    let frame_count = reader.read_count("frame")?;
    let frame_rate = reader.read_f32()?;
    if joint_count == 0 && frame_count > 0 {
        return Err(FormatError::EmptyFrames { frame_count });
    }

    let frame_size = joint_count.saturating_mul(TRANSFORM_RECORD_SIZE);
    let mut frames = Vec::with_capacity(reader.capacity_for(frame_count, frame_size));
    for _ in 0..frame_count {
        let mut frame = Vec::with_capacity(reader.capacity_for(joint_count, TRANSFORM_RECORD_SIZE));
        for _ in 0..joint_count {
            frame.push(TransformRecord::read(&mut reader)?);
        }
        frames.push(frame);
    }
    reader.finish()?;

    Ok(AnimationFile {
        header: AnimationFileHeader::new(joint_count as i32, frame_count as i32, frame_rate),
        frames,
    })
}
