//! Error and warning types for the export pipeline
//!
//! Fatal conditions abort an export through [`ExportError`]. Per-component query failures
//! are recovered with default values and surface as [`ExportWarning`]s aggregated into
//! the export statistics.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single per-vertex or per-joint scene query
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("{attribute} unavailable for vertex {vertex}")]
    Vertex {
        attribute: &'static str,
        vertex: u32,
    },

    #[error("skin weights unavailable for point {0}")]
    Weights(u32),

    #[error("transform of joint '{joint}' unavailable at frame {frame}")]
    Transform { joint: String, frame: i32 },

    #[error("transform requested for frame {requested} while the scene is at frame {current}")]
    TimeMismatch { requested: i32, current: i32 },

    #[error("unknown joint handle {0}")]
    UnknownJoint(u32),
}

/// Structural problems in the reconstructed joint hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("joint '{name}' appears twice in the influence list (indices {first} and {second})")]
    DuplicateInfluence {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("joint {joint} has out-of-range parent {parent} (joint count {count})")]
    ParentOutOfRange {
        joint: usize,
        parent: i32,
        count: usize,
    },

    #[error("'{parent}' lists child '{child}' whose parent index is {actual}")]
    InconsistentChild {
        parent: String,
        child: String,
        actual: i32,
    },

    #[error("cycle in joint hierarchy through joint {0}")]
    Cycle(usize),
}

/// Errors that abort an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("select exactly one object (selection has {0})")]
    Selection(usize),

    #[error("selected object '{0}' has no accessible mesh")]
    MeshAccess(String),

    #[error("mesh has no skin influences")]
    NoInfluences,

    #[error("invalid joint hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("invalid timeline: end frame {end} (start {start})")]
    InvalidTimeline { start: i32, end: i32 },

    #[error("{what} count {count} does not fit the file format")]
    TooLarge { what: &'static str, count: usize },

    #[error("failed to load scene {path:?}: {message}")]
    Scene { path: PathBuf, message: String },

    #[error("unknown export format '{0}' (expected binary or ascii)")]
    UnknownFormat(String),

    #[error("I/O error writing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal anomaly recorded during an export
#[derive(Debug, Clone, PartialEq)]
pub enum ExportWarning {
    /// The mesh has no skin cluster; it is exported as static
    NoInfluences,
    /// A query failed and a default value was used
    ComponentQuery(QueryError),
    /// Several skin points share a position; the first one wins
    DuplicateSkinPoints(usize),
    /// Animated mesh vertices with no matching skin point
    UnweightedVertices(usize),
    /// A point had more than four influences; extras were dropped
    TruncatedInfluences { point: u32, count: usize },
    /// A skin weight referenced a joint outside the influence list
    UnknownInfluence { point: u32 },
    /// A joint whose parent is Root but which Root does not list as a child
    DetachedJoint(String),
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::NoInfluences => {
                write!(f, "no skin influences found, exporting static mesh")
            }
            ExportWarning::ComponentQuery(err) => write!(f, "{err}, using default"),
            ExportWarning::DuplicateSkinPoints(n) => {
                write!(f, "{n} skin points share a position with an earlier point")
            }
            ExportWarning::UnweightedVertices(n) => {
                write!(f, "{n} vertices have no matching skin weights")
            }
            ExportWarning::TruncatedInfluences { point, count } => {
                write!(f, "point {point} has {count} influences, kept the first 4")
            }
            ExportWarning::UnknownInfluence { point } => {
                write!(f, "point {point} is weighted to a joint outside the influence list")
            }
            ExportWarning::DetachedJoint(name) => {
                write!(f, "joint '{name}' has no influence parent and is not a child of Root")
            }
        }
    }
}

/// Collects warnings and mirrors each one to the log as it is recorded
#[derive(Debug, Default)]
pub struct Warnings(Vec<ExportWarning>);

impl Warnings {
    pub fn push(&mut self, warning: ExportWarning) {
        tracing::warn!("{}", warning);
        self.0.push(warning);
    }

    /// Record a failed query and fall back to `default`
    pub fn recover<T>(&mut self, result: Result<T, QueryError>, default: T) -> T {
        result.unwrap_or_else(|err| {
            self.push(ExportWarning::ComponentQuery(err));
            default
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ExportWarning> {
        self.0
    }
}
