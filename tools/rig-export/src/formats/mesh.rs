//! Mesh file writers (.mof)

use std::io::{self, Write};

use rig_common::{JointRecord, MeshFileHeader, TransformRecord};

use crate::animation::Pose;
use crate::mesh::Mesh;
use crate::skeleton::Skeleton;

/// Skeleton records as stored on disk: Root first (self 0, parent 0), then the joints
/// with every id shifted by one
pub fn skeleton_records(skeleton: &Skeleton, bind_pose: &Pose) -> Vec<JointRecord> {
    let shift = |ids: &[usize]| ids.iter().map(|&c| c as i32 + 1).collect::<Vec<_>>();

    let mut records = Vec::with_capacity(skeleton.node_count());
    records.push(JointRecord {
        name: skeleton.root.name.clone(),
        self_id: 0,
        parent_id: 0,
        child_ids: shift(&skeleton.root.children),
        transform: bind_pose.root.to_record(),
    });
    for (i, joint) in skeleton.joints.iter().enumerate() {
        records.push(JointRecord {
            name: joint.name.clone(),
            self_id: i as i32 + 1,
            parent_id: joint.parent + 1,
            child_ids: shift(&joint.children),
            transform: bind_pose
                .joints
                .get(i)
                .map(|t| t.to_record())
                .unwrap_or_default(),
        });
    }
    records
}

/// Skeleton section for `mesh`: `None` for static meshes, the records (Root first) for
/// animated ones. An animated mesh without a Root record is rejected before anything
/// is written.
fn skeleton_section<'a>(
    mesh: &Mesh,
    skeleton: Option<&'a [JointRecord]>,
) -> io::Result<Option<&'a [JointRecord]>> {
    if !mesh.mesh_type.is_animated() {
        return Ok(None);
    }
    match skeleton {
        Some(records) if !records.is_empty() => Ok(Some(records)),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "animated mesh written without a skeleton",
        )),
    }
}

/// Write a binary mesh file
///
/// The skeleton section is only written for animated meshes; `skeleton` is ignored for
/// static ones and required for animated ones.
pub fn write_mesh<W: Write>(w: &mut W, mesh: &Mesh, skeleton: Option<&[JointRecord]>) -> io::Result<()> {
    let skeleton = skeleton_section(mesh, skeleton)?;
    let header = MeshFileHeader::new(mesh.vertices.len() as i32, mesh.mesh_type);
    w.write_all(&header.to_bytes())?;

    for vertex in &mesh.vertices {
        vertex.to_record().write(w, mesh.mesh_type)?;
    }

    w.write_all(&(mesh.indices.len() as i32).to_le_bytes())?;
    for &index in &mesh.indices {
        w.write_all(&(index as i32).to_le_bytes())?;
    }

    if let Some(records) = skeleton {
        w.write_all(&(records.len() as i32).to_le_bytes())?;
        for record in records {
            record.write(w)?;
        }
    }

    Ok(())
}

fn join(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_transform_lines<W: Write>(w: &mut W, t: &TransformRecord) -> io::Result<()> {
    writeln!(w, "Position [ {} ]", join(&t.position))?;
    writeln!(w, "Rotation [ {} ]", join(&t.rotation))?;
    writeln!(w, "Scale    [ {} ]", join(&t.scale))?;
    writeln!(w, "Shear    [ {} ]", join(&t.shear))
}

/// Write the text rendering of a mesh file
pub fn write_mesh_ascii<W: Write>(
    w: &mut W,
    mesh: &Mesh,
    skeleton: Option<&[JointRecord]>,
) -> io::Result<()> {
    let skeleton = skeleton_section(mesh, skeleton)?;
    let animated = mesh.mesh_type.is_animated();
    writeln!(w, "{}", mesh.vertices.len())?;
    writeln!(w, "{}", mesh.mesh_type.stride())?;

    for vertex in &mesh.vertices {
        let record = vertex.to_record();
        let mut fields: Vec<String> = record
            .position
            .iter()
            .chain(&record.color)
            .chain(&record.normal)
            .chain(&record.uv)
            .map(|f| f.to_string())
            .collect();
        if animated {
            fields.extend(record.joint_ids.iter().map(|j| j.to_string()));
            fields.extend(record.weights.iter().map(|f| f.to_string()));
        }
        writeln!(w, "{}", fields.join(", "))?;
    }

    writeln!(w, "{}", mesh.indices.len())?;
    for triangle in mesh.indices.chunks(3) {
        let line: Vec<String> = triangle.iter().map(|i| i.to_string()).collect();
        writeln!(w, "{}", line.join(", "))?;
    }

    if let Some(records) = skeleton {
        writeln!(w, "{}", records.len())?;
        for record in records {
            let children: Vec<String> = record.child_ids.iter().map(|c| c.to_string()).collect();
            writeln!(
                w,
                "{} --- Idx [ {} ] | Parent Idx [ {} ] --- Children [ {} ] | {}",
                record.name,
                record.self_id,
                record.parent_id,
                record.child_ids.len(),
                children.join(" ")
            )?;
            write_transform_lines(w, &record.transform)?;
            writeln!(w)?;
        }
    }

    Ok(())
}
