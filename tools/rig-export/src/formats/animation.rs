//! Animation file writers (.maf)

use std::io::{self, Write};

use rig_common::{AnimationFileHeader, TransformRecord};

use crate::scene::JointTransform;
use crate::skeleton::Skeleton;

/// Write a binary animation file from the skeleton's sampled histories
///
/// Each frame holds Root followed by every joint in influence order. A joint whose
/// history is shorter than Root's is padded with the identity transform.
pub fn write_animation<W: Write>(w: &mut W, skeleton: &Skeleton, frame_rate: f32) -> io::Result<()> {
    let frame_count = skeleton.frame_count();
    let header = AnimationFileHeader::new(
        skeleton.node_count() as i32,
        frame_count as i32,
        frame_rate,
    );
    w.write_all(&header.to_bytes())?;

    for frame in 0..frame_count {
        w.write_all(&skeleton.root.transforms[frame].to_record().to_bytes())?;
        for joint in &skeleton.joints {
            let record = joint
                .transforms
                .get(frame)
                .map(JointTransform::to_record)
                .unwrap_or_default();
            w.write_all(&record.to_bytes())?;
        }
    }

    Ok(())
}

fn write_frame_block<W: Write>(w: &mut W, frame: usize, t: &TransformRecord) -> io::Result<()> {
    let join = |values: &[f32]| {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    writeln!(w, "\tFrame {frame}")?;
    writeln!(w, "\t{{")?;
    writeln!(w, "\t\tPosition [ {} ]", join(&t.position))?;
    writeln!(w, "\t\tRotation [ {} ]", join(&t.rotation))?;
    writeln!(w, "\t\tScale    [ {} ]", join(&t.scale))?;
    writeln!(w, "\t\tShear    [ {} ]", join(&t.shear))?;
    writeln!(w, "\t}}")
}

/// Write the text rendering of an animation file
pub fn write_animation_ascii<W: Write>(
    w: &mut W,
    skeleton: &Skeleton,
    frame_rate: f32,
) -> io::Result<()> {
    writeln!(w, "Joint Count [ {} ]", skeleton.node_count())?;
    writeln!(w, "Frame Count [ {} ]", skeleton.frame_count())?;
    writeln!(w, "Frame Rate  [ {} ]", frame_rate)?;

    writeln!(w, "Root: {} [ -1 ] --- PARENT IDX [ -1 ]", skeleton.root.name)?;
    writeln!(w, "{{")?;
    for (frame, transform) in skeleton.root.transforms.iter().enumerate() {
        write_frame_block(w, frame, &transform.to_record())?;
    }
    writeln!(w, "}}")?;

    for (i, joint) in skeleton.joints.iter().enumerate() {
        writeln!(
            w,
            "Joint: {} [ {} ] --- PARENT IDX [ {} ]",
            joint.name, i, joint.parent
        )?;
        writeln!(w, "{{")?;
        for frame in 0..skeleton.frame_count() {
            let record = joint
                .transforms
                .get(frame)
                .map(JointTransform::to_record)
                .unwrap_or_default();
            write_frame_block(w, frame, &record)?;
        }
        writeln!(w, "}}")?;
    }

    Ok(())
}
