//! Output writers for mesh and animation files
//!
//! Binary layouts come from `rig-common`; this module turns the exporter's in-memory
//! mesh and skeleton into those records, renders the debug text variants, and commits
//! files atomically.

mod animation;
mod mesh;

pub use animation::{write_animation, write_animation_ascii};
pub use mesh::{skeleton_records, write_mesh, write_mesh_ascii};
pub use rig_common::{
    parse_animation_file, parse_mesh_file, AnimationFile, AnimationFileHeader, BinarySerializable,
    FormatError, JointRecord, MeshFile, MeshFileHeader, MeshType, TransformRecord, ANIMATION_EXT,
    MESH_EXT,
};

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::error::ExportError;

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Deserialize)]
#[serde(try_from = "String")]
pub enum ExportFormat {
    /// Little-endian binary
    #[default]
    Binary,
    /// Human-readable text for debugging
    Ascii,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(ExportFormat::Binary),
            "ascii" => Ok(ExportFormat::Ascii),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for ExportFormat {
    type Error = ExportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Binary => f.write_str("binary"),
            ExportFormat::Ascii => f.write_str("ascii"),
        }
    }
}

/// Convert a count to the `i32` the file formats store
pub fn format_count(what: &'static str, count: usize) -> Result<i32, ExportError> {
    i32::try_from(count).map_err(|_| ExportError::TooLarge { what, count })
}

/// Write `path` through a temporary file in the same directory
///
/// The target is only replaced once `write` and the flush succeed; on failure the
/// temporary file is removed and any previous file is left untouched.
pub fn write_file<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
{
    let io_error = |source: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer).map_err(io_error)?;
        writer.flush().map_err(io_error)?;
    }

    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
