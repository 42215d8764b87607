//! Skin weight assignment
//!
//! Skin weights live on geometry points while deduplicated vertices come from face
//! corners, so the two are joined by position. Each vertex takes the joints and weights of
//! the first skin point within tolerance of it.

use super::spatial::{approx_eq, PositionGrid};
use super::types::{SkinPoint, Vertex, MAX_INFLUENCES, UNUSED_JOINT, WEIGHT_EPSILON};
use crate::error::{ExportWarning, Warnings};
use crate::scene::{MeshHandle, SceneSource};
use crate::skeleton::JointRegistry;

/// Outcome of [`assign_weights`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightSummary {
    /// Vertices that found a skin point
    pub matched: usize,
    /// Vertices left without any joint
    pub unweighted: usize,
    /// Skin points shadowed by an earlier point at the same position with different weights
    pub conflicting_points: usize,
}

/// Read the skin weights of every geometry point
///
/// Weights at or below [`WEIGHT_EPSILON`] are dropped and the remaining ones are kept in
/// influence-list order, at most [`MAX_INFLUENCES`] per point. Weights are not
/// renormalized.
pub fn collect_skin_points<S: SceneSource + ?Sized>(
    scene: &S,
    mesh: MeshHandle,
    registry: &JointRegistry,
    warnings: &mut Warnings,
) -> Vec<SkinPoint> {
    let count = scene.point_count(mesh);
    let mut points = Vec::with_capacity(count as usize);

    for point in 0..count {
        let position = warnings.recover(scene.position(mesh, point), [0.0; 3]);
        let raw = warnings.recover(scene.skin_weights(mesh, point), Vec::new());

        let mut influences: Vec<(usize, f32)> = Vec::with_capacity(raw.len());
        let mut unknown = false;
        for (joint, weight) in raw {
            if weight <= WEIGHT_EPSILON {
                continue;
            }
            match registry.index_of(joint) {
                Some(index) => influences.push((index, weight)),
                None => unknown = true,
            }
        }
        if unknown {
            warnings.push(ExportWarning::UnknownInfluence { point });
        }
        influences.sort_by_key(|&(index, _)| index);
        if influences.len() > MAX_INFLUENCES {
            warnings.push(ExportWarning::TruncatedInfluences {
                point,
                count: influences.len(),
            });
        }

        let mut skin = SkinPoint {
            position,
            joints: [UNUSED_JOINT; MAX_INFLUENCES],
            weights: [0.0; MAX_INFLUENCES],
        };
        for (slot, (index, weight)) in influences.into_iter().take(MAX_INFLUENCES).enumerate() {
            skin.joints[slot] = index as i32;
            skin.weights[slot] = weight;
        }
        points.push(skin);
    }

    points
}

/// Copy joints and weights onto `vertices` from the first matching skin point
pub fn assign_weights(
    vertices: &mut [Vertex],
    points: &[SkinPoint],
    warnings: &mut Warnings,
) -> WeightSummary {
    let mut summary = WeightSummary::default();

    // Index only the first point at each position
    let mut grid = PositionGrid::new();
    let mut kept: Vec<usize> = Vec::new();
    for (i, point) in points.iter().enumerate() {
        let earlier = grid.find(point.position, |id| {
            approx_eq(&points[kept[id]].position, &point.position)
        });
        match earlier {
            Some(id) => {
                let first = &points[kept[id]];
                if first.joints != point.joints || first.weights != point.weights {
                    summary.conflicting_points += 1;
                }
            }
            None => {
                grid.insert(point.position, kept.len());
                kept.push(i);
            }
        }
    }

    for vertex in vertices.iter_mut() {
        let found = grid.find(vertex.position, |id| {
            approx_eq(&points[kept[id]].position, &vertex.position)
        });
        if let Some(id) = found {
            let point = &points[kept[id]];
            vertex.joints = point.joints;
            vertex.weights = point.weights;
            summary.matched += 1;
        }
        if !vertex.is_weighted() {
            summary.unweighted += 1;
        }
    }

    if summary.conflicting_points > 0 {
        warnings.push(ExportWarning::DuplicateSkinPoints(summary.conflicting_points));
    }
    if summary.unweighted > 0 {
        warnings.push(ExportWarning::UnweightedVertices(summary.unweighted));
    }

    tracing::debug!(
        "Assigned weights to {}/{} vertices from {} skin points",
        summary.matched,
        vertices.len(),
        points.len()
    );
    summary
}
