//! Vertex deduplication
//!
//! Collapses the per-corner vertex stream into unique vertices plus an index buffer.
//! Vertices are equal when position, normal, uv and color all match within
//! [`TOLERANCE`](super::spatial::TOLERANCE); skin data is not compared. When several
//! stored vertices match, the one inserted first is reused.

use super::spatial::PositionGrid;
use super::types::Vertex;

/// Output of a deduplication pass
#[derive(Debug, Clone, PartialEq)]
pub struct DedupResult {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Number of equivalence classes seen
    pub unique: usize,
    /// Corners that matched an earlier class
    pub duplicates: usize,
}

/// Streaming deduplicator fed one face corner at a time
#[derive(Debug)]
pub struct VertexDeduplicator {
    deduplicate: bool,
    grid: PositionGrid,
    /// First vertex of every equivalence class
    classes: Vec<Vertex>,
    /// Emitted vertices when not deduplicating
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl VertexDeduplicator {
    /// With `deduplicate == false` every corner is emitted and the index buffer is
    /// `0..n`, but classes are still tracked so the counts match the deduplicated case.
    pub fn new(deduplicate: bool) -> Self {
        Self {
            deduplicate,
            grid: PositionGrid::new(),
            classes: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Add one corner and return the index it was assigned
    pub fn push(&mut self, vertex: Vertex) -> u32 {
        let classes = &self.classes;
        let found = self
            .grid
            .find(vertex.position, |id| classes[id].same_attributes(&vertex));
        let class = match found {
            Some(class) => class,
            None => {
                let id = self.classes.len();
                self.classes.push(vertex);
                self.grid.insert(vertex.position, id);
                id
            }
        };

        let index = if self.deduplicate {
            class
        } else {
            self.vertices.push(vertex);
            self.vertices.len() - 1
        };
        self.indices.push(index as u32);
        index as u32
    }

    pub fn finish(self) -> DedupResult {
        let unique = self.classes.len();
        let duplicates = self.indices.len() - unique;
        let vertices = if self.deduplicate {
            self.classes
        } else {
            self.vertices
        };
        DedupResult {
            vertices,
            indices: self.indices,
            unique,
            duplicates,
        }
    }
}

/// Deduplicate a complete corner stream
pub fn deduplicate_vertices(corners: impl IntoIterator<Item = Vertex>, deduplicate: bool) -> DedupResult {
    let mut dedup = VertexDeduplicator::new(deduplicate);
    for vertex in corners {
        dedup.push(vertex);
    }
    dedup.finish()
}
