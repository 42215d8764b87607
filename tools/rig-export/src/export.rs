//! Export pipeline
//!
//! Ties the stages together for one selected mesh: skeleton reconstruction, mesh
//! extraction and weighting, bind pose and keyframe sampling, then the writers. Every
//! structure is built per call and dropped once the files are written.

use std::path::Path;
use std::time::{Duration, Instant};

use rig_common::MeshType;

use crate::animation::{sample_bind_pose, sample_keyframes};
use crate::error::{ExportError, ExportWarning, Warnings};
use crate::formats::{
    format_count, skeleton_records, write_animation, write_animation_ascii, write_file,
    write_mesh, write_mesh_ascii, ExportFormat,
};
use crate::mesh::{build_mesh, BuiltMesh};
use crate::scene::{MeshHandle, SceneSource};
use crate::skeleton::{build_skeleton, JointRegistry, Skeleton};

/// Summary of a finished export
#[derive(Debug, Clone)]
pub struct ExportStats {
    pub mesh_type: MeshType,
    pub vertex_count: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub index_count: usize,
    /// Influence joints, Root excluded
    pub joint_count: usize,
    pub frame_count: usize,
    pub frame_rate: f32,
    pub elapsed: Duration,
    pub warnings: Vec<ExportWarning>,
}

impl Default for ExportStats {
    fn default() -> Self {
        Self {
            mesh_type: MeshType::Static,
            vertex_count: 0,
            unique: 0,
            duplicates: 0,
            index_count: 0,
            joint_count: 0,
            frame_count: 0,
            frame_rate: 0.0,
            elapsed: Duration::ZERO,
            warnings: Vec::new(),
        }
    }
}

impl ExportStats {
    fn record_mesh(&mut self, built: &BuiltMesh) {
        self.mesh_type = built.mesh.mesh_type;
        self.vertex_count = built.mesh.vertices.len();
        self.unique = built.unique;
        self.duplicates = built.duplicates;
        self.index_count = built.mesh.indices.len();
    }

    fn finish(mut self, started: Instant, warnings: Warnings) -> Self {
        self.elapsed = started.elapsed();
        self.warnings = warnings.into_vec();
        self
    }
}

/// Registry plus hierarchy for a skinned mesh
struct Rig {
    registry: JointRegistry,
    skeleton: Skeleton,
}

/// `None` when the mesh has no skin influences
fn build_rig<S: SceneSource + ?Sized>(
    scene: &S,
    mesh: MeshHandle,
    warnings: &mut Warnings,
) -> Result<Option<Rig>, ExportError> {
    let influences = scene.skin_influences(mesh);
    if influences.is_empty() {
        return Ok(None);
    }
    let registry = JointRegistry::build(scene, &influences)?;
    let skeleton = build_skeleton(scene, &registry, warnings)?;
    Ok(Some(Rig { registry, skeleton }))
}

fn write_mesh_file<S: SceneSource + ?Sized>(
    scene: &mut S,
    path: &Path,
    format: ExportFormat,
    built: &BuiltMesh,
    skeleton: Option<&Skeleton>,
    warnings: &mut Warnings,
) -> Result<(), ExportError> {
    format_count("vertex", built.mesh.vertices.len())?;
    format_count("index", built.mesh.indices.len())?;

    let records = match skeleton {
        Some(skeleton) if built.mesh.mesh_type.is_animated() => {
            format_count("joint", skeleton.node_count())?;
            let bind_pose = sample_bind_pose(scene, skeleton, warnings);
            Some(skeleton_records(skeleton, &bind_pose))
        }
        _ => None,
    };

    write_file(path, |w| match format {
        ExportFormat::Binary => write_mesh(w, &built.mesh, records.as_deref()),
        ExportFormat::Ascii => write_mesh_ascii(w, &built.mesh, records.as_deref()),
    })
}

fn write_animation_file<S: SceneSource + ?Sized>(
    scene: &mut S,
    path: &Path,
    format: ExportFormat,
    skeleton: &mut Skeleton,
    stats: &mut ExportStats,
    warnings: &mut Warnings,
) -> Result<(), ExportError> {
    let clip = sample_keyframes(scene, skeleton, warnings)?;
    format_count("joint", skeleton.node_count())?;
    format_count("frame", clip.frame_count)?;

    stats.joint_count = skeleton.joint_count();
    stats.frame_count = clip.frame_count;
    stats.frame_rate = clip.frame_rate;

    write_file(path, |w| match format {
        ExportFormat::Binary => write_animation(w, skeleton, clip.frame_rate),
        ExportFormat::Ascii => write_animation_ascii(w, skeleton, clip.frame_rate),
    })
}

/// Export the selected mesh
///
/// A mesh without skin influences is not an error here: it is exported as
/// [`MeshType::Static`] and [`ExportWarning::NoInfluences`] is recorded.
pub fn export_mesh<S: SceneSource + ?Sized>(
    scene: &mut S,
    path: &Path,
    format: ExportFormat,
    deduplicate: bool,
) -> Result<ExportStats, ExportError> {
    let started = Instant::now();
    let mut warnings = Warnings::default();
    let mut stats = ExportStats::default();

    let mesh = scene.selected_mesh()?;
    let rig = build_rig(&*scene, mesh, &mut warnings)?;
    if rig.is_none() {
        warnings.push(ExportWarning::NoInfluences);
    }

    let built = build_mesh(
        &*scene,
        mesh,
        rig.as_ref().map(|r| &r.registry),
        deduplicate,
        &mut warnings,
    )?;
    let skeleton = rig.as_ref().map(|r| &r.skeleton);
    write_mesh_file(scene, path, format, &built, skeleton, &mut warnings)?;

    stats.record_mesh(&built);
    if built.mesh.mesh_type.is_animated() {
        stats.joint_count = skeleton.map_or(0, Skeleton::joint_count);
    }
    let stats = stats.finish(started, warnings);

    tracing::info!(
        "Exported {:?} mesh: {} vertices ({} unique, {} duplicates), {} triangles, {} joints -> {:?}",
        stats.mesh_type,
        stats.vertex_count,
        stats.unique,
        stats.duplicates,
        stats.index_count / 3,
        stats.joint_count,
        path
    );

    Ok(stats)
}

/// Export the keyframes of every influence joint of the selected mesh
///
/// `deduplicate` is accepted for symmetry with [`export_mesh`] but does not change the
/// output. The file layout stores one record per node for every frame in `0..=end`,
/// so there is no way to drop a repeated keyframe.
pub fn export_animation<S: SceneSource + ?Sized>(
    scene: &mut S,
    path: &Path,
    format: ExportFormat,
    deduplicate: bool,
) -> Result<ExportStats, ExportError> {
    let started = Instant::now();
    let mut warnings = Warnings::default();
    let mut stats = ExportStats::default();

    let mesh = scene.selected_mesh()?;
    let Some(mut rig) = build_rig(&*scene, mesh, &mut warnings)? else {
        return Err(ExportError::NoInfluences);
    };

    if deduplicate {
        tracing::debug!("Keyframes are not deduplicated, writing every frame");
    }

    stats.mesh_type = MeshType::Animated;
    write_animation_file(scene, path, format, &mut rig.skeleton, &mut stats, &mut warnings)?;
    let stats = stats.finish(started, warnings);

    tracing::info!(
        "Exported animation: {} joints + root, {} frames at {} fps -> {:?}",
        stats.joint_count,
        stats.frame_count,
        stats.frame_rate,
        path
    );

    Ok(stats)
}

/// Export the mesh and its animation in one pass
///
/// The hierarchy is built once and shared by both writers. The selected mesh must be
/// skinned.
pub fn export_both<S: SceneSource + ?Sized>(
    scene: &mut S,
    mesh_path: &Path,
    animation_path: &Path,
    format: ExportFormat,
    deduplicate: bool,
) -> Result<ExportStats, ExportError> {
    let started = Instant::now();
    let mut warnings = Warnings::default();
    let mut stats = ExportStats::default();

    let mesh = scene.selected_mesh()?;
    let Some(mut rig) = build_rig(&*scene, mesh, &mut warnings)? else {
        return Err(ExportError::NoInfluences);
    };

    let built = build_mesh(&*scene, mesh, Some(&rig.registry), deduplicate, &mut warnings)?;
    write_mesh_file(scene, mesh_path, format, &built, Some(&rig.skeleton), &mut warnings)?;
    stats.record_mesh(&built);

    write_animation_file(
        scene,
        animation_path,
        format,
        &mut rig.skeleton,
        &mut stats,
        &mut warnings,
    )?;
    let stats = stats.finish(started, warnings);

    tracing::info!(
        "Exported {:?} mesh ({} vertices, {} indices) -> {:?}",
        stats.mesh_type,
        stats.vertex_count,
        stats.index_count,
        mesh_path
    );
    tracing::info!(
        "Exported animation ({} joints, {} frames at {} fps) -> {:?}",
        stats.joint_count,
        stats.frame_count,
        stats.frame_rate,
        animation_path
    );

    Ok(stats)
}
