//! Binary serialization trait for format headers.
//!
//! Both rig file headers implement `BinarySerializable` so generic code (the CLI
//! `inspect` command, tests) can sniff a header without knowing its concrete type.
//! Each header keeps its own `to_bytes()` returning a fixed-size array.

/// Trait for binary-serializable format headers.
///
/// The trait returns `Vec<u8>` because associated const generics in return types
/// (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use rig_common::formats::{AnimationFileHeader, BinarySerializable};
///
/// let header = AnimationFileHeader::new(3, 31, 30.0);
/// let bytes = header.serialize();
/// let parsed = AnimationFileHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.frame_count, 31);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::MeshFileHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::AnimationFileHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{AnimationFileHeader, MeshFileHeader, MeshType};

    fn roundtrip<T: BinarySerializable>(header: &T) -> T {
        let bytes = header.serialize();
        assert_eq!(bytes.len(), T::SIZE);
        T::deserialize(&bytes).expect("deserialize failed")
    }

    #[test]
    fn test_trait_roundtrip() {
        let mesh = MeshFileHeader::new(7, MeshType::Static);
        assert_eq!(roundtrip(&mesh), mesh);

        let anim = AnimationFileHeader::new(2, 5, 59.94);
        assert_eq!(roundtrip(&anim), anim);
    }
}
