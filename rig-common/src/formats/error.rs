use thiserror::Error;

/// Errors produced while reading a mesh or animation file back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The buffer ended before a field could be read
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A count field was negative
    #[error("negative {field} count: {value}")]
    NegativeCount { field: &'static str, value: i32 },

    /// Frames are present but the joint count is zero (Root is always written)
    #[error("{frame_count} frames with no joints")]
    EmptyFrames { frame_count: usize },

    /// Stride is neither the static nor the animated value
    #[error("invalid vertex stride {0} (expected 11 or 19)")]
    InvalidStride(i32),

    /// A joint name was not valid UTF-8
    #[error("joint name at offset {0} is not valid UTF-8")]
    InvalidName(usize),

    /// Bytes left over after the last record
    #[error("{0} trailing bytes after end of file data")]
    TrailingBytes(usize),
}
