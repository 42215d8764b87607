//! Keyframe sampling
//!
//! Walks the host timeline one frame at a time and records the local transform of Root
//! and every joint. Frames are visited in ascending order and the playback cursor is put
//! back on the timeline start afterwards.

use crate::error::{ExportError, Warnings};
use crate::scene::{JointHandle, JointTransform, SceneSource};
use crate::skeleton::Skeleton;

/// Sampled range summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledClip {
    /// Frames `0..=end_frame`
    pub end_frame: i32,
    pub frame_count: usize,
    pub frame_rate: f32,
}

/// Transforms of every node at a single instant (the bind pose)
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub root: JointTransform,
    /// In influence order
    pub joints: Vec<JointTransform>,
}

fn query<S: SceneSource + ?Sized>(
    scene: &S,
    handle: Option<JointHandle>,
    frame: i32,
    warnings: &mut Warnings,
) -> JointTransform {
    match handle {
        Some(handle) => warnings.recover(scene.local_transform(handle, frame), JointTransform::default()),
        None => JointTransform::default(),
    }
}

/// Sample every frame of `[0, end_frame]` into the skeleton's transform histories
///
/// Existing histories are replaced. Failed queries record the identity transform.
pub fn sample_keyframes<S: SceneSource + ?Sized>(
    scene: &mut S,
    skeleton: &mut Skeleton,
    warnings: &mut Warnings,
) -> Result<SampledClip, ExportError> {
    let start = scene.timeline_start_frame();
    let end_frame = scene.timeline_end_frame();
    if end_frame < 0 {
        return Err(ExportError::InvalidTimeline {
            start,
            end: end_frame,
        });
    }
    let frame_count = end_frame as usize + 1;

    skeleton.root.transforms = Vec::with_capacity(frame_count);
    for joint in &mut skeleton.joints {
        joint.transforms = Vec::with_capacity(frame_count);
    }

    for frame in 0..=end_frame {
        scene.set_current_time(frame);

        let root = query(&*scene, skeleton.root.handle, frame, warnings);
        skeleton.root.transforms.push(root);
        for joint in &mut skeleton.joints {
            let transform = query(&*scene, Some(joint.handle), frame, warnings);
            joint.transforms.push(transform);
        }
    }

    scene.set_current_time(start);

    let frame_rate = scene.timeline_fps();
    tracing::debug!(
        "Sampled {} frames x {} nodes at {} fps",
        frame_count,
        skeleton.node_count(),
        frame_rate
    );

    Ok(SampledClip {
        end_frame,
        frame_count,
        frame_rate,
    })
}

/// Sample Root and every joint once at the timeline start
pub fn sample_bind_pose<S: SceneSource + ?Sized>(
    scene: &mut S,
    skeleton: &Skeleton,
    warnings: &mut Warnings,
) -> Pose {
    let start = scene.timeline_start_frame();
    scene.set_current_time(start);

    let root = query(&*scene, skeleton.root.handle, start, warnings);
    let joints = skeleton
        .joints
        .iter()
        .map(|joint| query(&*scene, Some(joint.handle), start, warnings))
        .collect();

    Pose { root, joints }
}
