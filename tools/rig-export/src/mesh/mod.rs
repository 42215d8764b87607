//! Mesh extraction (scene -> deduplicated, optionally skinned vertices)

mod dedup;
mod spatial;
mod types;
mod weights;

pub use dedup::{deduplicate_vertices, DedupResult, VertexDeduplicator};
pub use spatial::{approx_eq, PositionGrid, TOLERANCE};
pub use types::{Mesh, SkinPoint, Vertex, DEFAULT_COLOR, MAX_INFLUENCES, UNUSED_JOINT, WEIGHT_EPSILON};
pub use weights::{assign_weights, collect_skin_points, WeightSummary};

use rig_common::MeshType;

use crate::error::{ExportError, ExportWarning, QueryError, Warnings};
use crate::scene::{MeshHandle, SceneSource};
use crate::skeleton::JointRegistry;

/// Mesh plus the statistics gathered while building it
#[derive(Debug, Clone)]
pub struct BuiltMesh {
    pub mesh: Mesh,
    pub unique: usize,
    pub duplicates: usize,
    /// `None` when the mesh has no skin
    pub weights: Option<WeightSummary>,
}

/// Resolve every triangulated face corner against its face
///
/// Failed attribute queries fall back to zero (white for color) and are recorded.
pub fn gather_corners<S: SceneSource + ?Sized>(
    scene: &S,
    mesh: MeshHandle,
    warnings: &mut Warnings,
) -> Result<Vec<Vertex>, ExportError> {
    let faces = scene.faces(mesh)?;
    let mut corners = Vec::with_capacity(faces.iter().map(|f| f.triangle_vertices.len()).sum());

    for face in &faces {
        for &point in &face.triangle_vertices {
            let Some(local) = face.local_index(point) else {
                warnings.push(ExportWarning::ComponentQuery(QueryError::Vertex {
                    attribute: "face corner",
                    vertex: point,
                }));
                corners.push(Vertex::default());
                continue;
            };
            let position = warnings.recover(scene.position(mesh, point), [0.0; 3]);
            let normal = warnings.recover(scene.normal(mesh, face, local), [0.0; 3]);
            let uv = warnings
                .recover(scene.uv(mesh, face, local), None)
                .unwrap_or([0.0; 2]);
            let color = warnings
                .recover(scene.color(mesh, face, local), None)
                .unwrap_or(DEFAULT_COLOR);
            corners.push(Vertex::new(position, normal, uv, color));
        }
    }

    Ok(corners)
}

/// Build the exported mesh
///
/// With a joint registry the skin weights are merged in and the mesh is
/// [`MeshType::Animated`] as soon as any vertex carries a weight.
pub fn build_mesh<S: SceneSource + ?Sized>(
    scene: &S,
    mesh: MeshHandle,
    registry: Option<&JointRegistry>,
    deduplicate: bool,
    warnings: &mut Warnings,
) -> Result<BuiltMesh, ExportError> {
    let corners = gather_corners(scene, mesh, warnings)?;
    let corner_count = corners.len();
    let DedupResult {
        mut vertices,
        indices,
        unique,
        duplicates,
    } = deduplicate_vertices(corners, deduplicate);

    tracing::debug!(
        "{} corners -> {} vertices ({} unique, {} duplicates)",
        corner_count,
        vertices.len(),
        unique,
        duplicates
    );

    let mut weights = None;
    let mut mesh_type = MeshType::Static;
    if let Some(registry) = registry {
        let points = collect_skin_points(scene, mesh, registry, warnings);
        weights = Some(assign_weights(&mut vertices, &points, warnings));
        if vertices.iter().any(Vertex::is_weighted) {
            mesh_type = MeshType::Animated;
        }
    }

    Ok(BuiltMesh {
        mesh: Mesh {
            mesh_type,
            vertices,
            indices,
        },
        unique,
        duplicates,
        weights,
    })
}
