//! glTF / GLB scene adapter
//!
//! The document is decoded once on open. Every triangle becomes a [`Face`]; the geometry
//! points are the vertices of all triangle primitives of the selected mesh, concatenated in
//! primitive order. Joint handles are node indices.

use std::path::Path;

use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;
use gltf::mesh::Mode;

use super::{Face, JointHandle, JointTransform, MeshHandle, SceneOptions, SceneSource, TimeUnit};
use crate::error::{ExportError, QueryError};

/// Skin data of one geometry point: joint slots (skin-local) and weights
type PointSkin = ([u16; 4], [f32; 4]);

#[derive(Debug, Default)]
struct Geometry {
    positions: Vec<[f32; 3]>,
    normals: Vec<Option<[f32; 3]>>,
    uvs: Vec<Option<[f32; 2]>>,
    colors: Vec<Option<[f32; 3]>>,
    skin: Vec<Option<PointSkin>>,
    triangles: Vec<[u32; 3]>,
}

#[derive(Debug)]
enum ChannelValues {
    Translation(Vec<[f32; 3]>),
    Rotation(Vec<[f32; 4]>),
    Scale(Vec<[f32; 3]>),
}

#[derive(Debug)]
struct Channel {
    node: usize,
    interpolation: Interpolation,
    times: Vec<f32>,
    values: ChannelValues,
}

#[derive(Debug)]
pub struct GltfScene {
    names: Vec<String>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    rest: Vec<JointTransform>,
    has_mesh: Vec<bool>,
    selection: Vec<usize>,
    geometry: Geometry,
    /// Skin joints as node indices, in skin order
    skin_joints: Vec<usize>,
    channels: Vec<Channel>,
    unit: TimeUnit,
    end_frame: i32,
    cursor: i32,
}

impl GltfScene {
    pub fn open(path: &Path, options: &SceneOptions) -> Result<Self, ExportError> {
        let scene_error = |message: String| ExportError::Scene {
            path: path.to_path_buf(),
            message,
        };

        let (document, buffers, _images) =
            gltf::import(path).map_err(|e| scene_error(e.to_string()))?;

        let node_count = document.nodes().len();
        let mut names = Vec::with_capacity(node_count);
        let mut parents = vec![None; node_count];
        let mut children = Vec::with_capacity(node_count);
        let mut rest = Vec::with_capacity(node_count);
        let mut has_mesh = Vec::with_capacity(node_count);

        for node in document.nodes() {
            names.push(
                node.name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node{}", node.index())),
            );
            let kids: Vec<usize> = node.children().map(|c| c.index()).collect();
            for &kid in &kids {
                parents[kid] = Some(node.index());
            }
            children.push(kids);
            let (t, r, s) = node.transform().decomposed();
            rest.push(JointTransform::from_trs(t, r, s));
            has_mesh.push(node.mesh().is_some());
        }

        let selection: Vec<usize> = match &options.node {
            Some(name) => names
                .iter()
                .position(|n| n == name)
                .into_iter()
                .collect(),
            None => (0..node_count).filter(|&i| has_mesh[i]).collect(),
        };

        let mut geometry = Geometry::default();
        let mut skin_joints = Vec::new();
        if let [selected] = selection.as_slice() {
            if let Some(node) = document.nodes().nth(*selected) {
                if let Some(mesh) = node.mesh() {
                    geometry = read_geometry(&mesh, &buffers);
                }
                if let Some(skin) = node.skin() {
                    skin_joints = skin.joints().map(|j| j.index()).collect();
                }
            }
        }

        let animation = match options.animation {
            Some(index) => Some(
                document
                    .animations()
                    .nth(index)
                    .ok_or_else(|| scene_error(format!("animation index {index} not found")))?,
            ),
            None => document.animations().next(),
        };
        let channels = match &animation {
            Some(animation) => read_channels(animation, &buffers),
            None => Vec::new(),
        };

        let unit = options.time_unit.unwrap_or(TimeUnit::Ntsc);
        let duration = channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0f32, f32::max);
        let end_frame = (duration * unit.fps()).ceil() as i32;

        tracing::debug!(
            "Loaded {:?}: {} nodes, {} points, {} triangles, {} channels, {} frames",
            path,
            node_count,
            geometry.positions.len(),
            geometry.triangles.len(),
            channels.len(),
            end_frame + 1
        );

        Ok(Self {
            names,
            parents,
            children,
            rest,
            has_mesh,
            selection,
            geometry,
            skin_joints,
            channels,
            unit,
            end_frame,
            cursor: 0,
        })
    }

    fn is_selected(&self, mesh: MeshHandle) -> bool {
        self.selection.as_slice() == [mesh.0 as usize]
    }

    fn corner(&self, face: &Face, local: usize) -> Option<usize> {
        face.polygon_vertices.get(local).map(|&v| v as usize)
    }
}

fn read_geometry(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Geometry {
    let mut geometry = Geometry::default();

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            tracing::warn!(
                "Skipping primitive {} of mesh '{}' (mode {:?})",
                primitive.index(),
                mesh.name().unwrap_or("unnamed"),
                primitive.mode()
            );
            continue;
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let base = geometry.positions.len() as u32;
        let positions: Vec<[f32; 3]> = positions.collect();
        let count = positions.len();

        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let uvs: Option<Vec<[f32; 2]>> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect());
        let colors: Option<Vec<[f32; 3]>> = reader
            .read_colors(0)
            .map(|iter| iter.into_rgb_f32().collect());
        let joints: Option<Vec<[u16; 4]>> = reader.read_joints(0).map(|iter| iter.into_u16().collect());
        let weights: Option<Vec<[f32; 4]>> = reader
            .read_weights(0)
            .map(|iter| iter.into_f32().collect());

        for i in 0..count {
            geometry.normals.push(normals.as_ref().and_then(|n| n.get(i).copied()));
            geometry.uvs.push(uvs.as_ref().and_then(|u| u.get(i).copied()));
            geometry.colors.push(colors.as_ref().and_then(|c| c.get(i).copied()));
            let skin = match (&joints, &weights) {
                (Some(j), Some(w)) => j.get(i).copied().zip(w.get(i).copied()),
                _ => None,
            };
            geometry.skin.push(skin);
        }
        geometry.positions.extend(positions);

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count as u32).collect(),
        };
        for tri in indices.chunks_exact(3) {
            geometry
                .triangles
                .push([base + tri[0], base + tri[1], base + tri[2]]);
        }
    }

    geometry
}

fn read_channels(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> Vec<Channel> {
    let mut channels = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(times) = reader.read_inputs() else {
            continue;
        };
        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(v)) => ChannelValues::Translation(v.collect()),
            Some(ReadOutputs::Rotations(v)) => ChannelValues::Rotation(v.into_f32().collect()),
            Some(ReadOutputs::Scales(v)) => ChannelValues::Scale(v.collect()),
            // Morph target weights are not joint transforms
            _ => continue,
        };
        channels.push(Channel {
            node: channel.target().node().index(),
            interpolation: channel.sampler().interpolation(),
            times: times.collect(),
            values,
        });
    }
    channels
}

impl SceneSource for GltfScene {
    fn selected_mesh(&self) -> Result<MeshHandle, ExportError> {
        let [node] = self.selection.as_slice() else {
            return Err(ExportError::Selection(self.selection.len()));
        };
        if !self.has_mesh[*node] {
            return Err(ExportError::MeshAccess(self.names[*node].clone()));
        }
        Ok(MeshHandle(*node as u32))
    }

    fn faces(&self, mesh: MeshHandle) -> Result<Vec<Face>, ExportError> {
        if !self.is_selected(mesh) {
            return Err(ExportError::MeshAccess(format!("node {}", mesh.0)));
        }
        Ok(self
            .geometry
            .triangles
            .iter()
            .enumerate()
            .map(|(id, tri)| Face {
                id: id as u32,
                polygon_vertices: tri.to_vec(),
                triangle_vertices: tri.to_vec(),
            })
            .collect())
    }

    fn point_count(&self, mesh: MeshHandle) -> u32 {
        if self.is_selected(mesh) {
            self.geometry.positions.len() as u32
        } else {
            0
        }
    }

    fn position(&self, _mesh: MeshHandle, vertex: u32) -> Result<[f32; 3], QueryError> {
        self.geometry
            .positions
            .get(vertex as usize)
            .copied()
            .ok_or(QueryError::Vertex {
                attribute: "position",
                vertex,
            })
    }

    fn normal(&self, _mesh: MeshHandle, face: &Face, local: usize) -> Result<[f32; 3], QueryError> {
        let vertex = self.corner(face, local);
        vertex
            .and_then(|v| self.geometry.normals.get(v).copied().flatten())
            .ok_or(QueryError::Vertex {
                attribute: "normal",
                vertex: vertex.unwrap_or(usize::MAX) as u32,
            })
    }

    fn uv(
        &self,
        _mesh: MeshHandle,
        face: &Face,
        local: usize,
    ) -> Result<Option<[f32; 2]>, QueryError> {
        Ok(self
            .corner(face, local)
            .and_then(|v| self.geometry.uvs.get(v).copied().flatten()))
    }

    fn color(
        &self,
        _mesh: MeshHandle,
        face: &Face,
        local: usize,
    ) -> Result<Option<[f32; 3]>, QueryError> {
        Ok(self
            .corner(face, local)
            .and_then(|v| self.geometry.colors.get(v).copied().flatten()))
    }

    fn skin_influences(&self, mesh: MeshHandle) -> Vec<JointHandle> {
        if !self.is_selected(mesh) {
            return Vec::new();
        }
        self.skin_joints
            .iter()
            .map(|&node| JointHandle(node as u32))
            .collect()
    }

    fn skin_weights(
        &self,
        _mesh: MeshHandle,
        point: u32,
    ) -> Result<Vec<(JointHandle, f32)>, QueryError> {
        let Some(entry) = self.geometry.skin.get(point as usize) else {
            return Err(QueryError::Weights(point));
        };
        let Some((joints, weights)) = entry else {
            return Ok(Vec::new());
        };
        joints
            .iter()
            .zip(weights)
            .filter(|&(_, &w)| w != 0.0)
            .map(|(&slot, &w)| {
                self.skin_joints
                    .get(slot as usize)
                    .map(|&node| (JointHandle(node as u32), w))
                    .ok_or(QueryError::Weights(point))
            })
            .collect()
    }

    fn joint_name(&self, joint: JointHandle) -> String {
        self.names
            .get(joint.0 as usize)
            .cloned()
            .unwrap_or_else(|| format!("node{}", joint.0))
    }

    fn joint_parent(&self, joint: JointHandle) -> Option<JointHandle> {
        self.parents
            .get(joint.0 as usize)
            .copied()
            .flatten()
            .map(|p| JointHandle(p as u32))
    }

    fn joint_children(&self, joint: JointHandle) -> Vec<JointHandle> {
        self.children
            .get(joint.0 as usize)
            .map(|kids| kids.iter().map(|&c| JointHandle(c as u32)).collect())
            .unwrap_or_default()
    }

    fn set_current_time(&mut self, frame: i32) {
        self.cursor = frame;
    }

    fn timeline_end_frame(&self) -> i32 {
        self.end_frame
    }

    fn timeline_unit(&self) -> TimeUnit {
        self.unit
    }

    fn local_transform(&self, joint: JointHandle, frame: i32) -> Result<JointTransform, QueryError> {
        if frame != self.cursor {
            return Err(QueryError::TimeMismatch {
                requested: frame,
                current: self.cursor,
            });
        }
        let node = joint.0 as usize;
        let rest = self
            .rest
            .get(node)
            .ok_or(QueryError::UnknownJoint(joint.0))?;

        let t = (frame - self.timeline_start_frame()) as f32 / self.timeline_fps();
        let mut position = rest.position;
        let mut rotation = rest.rotation;
        let mut scale = rest.scale;
        for channel in self.channels.iter().filter(|c| c.node == node) {
            match &channel.values {
                ChannelValues::Translation(values) => {
                    position = interpolate_vec3(&channel.times, values, t, channel.interpolation);
                }
                ChannelValues::Rotation(values) => {
                    rotation = interpolate_quat(&channel.times, values, t, channel.interpolation);
                }
                ChannelValues::Scale(values) => {
                    scale = interpolate_vec3(&channel.times, values, t, channel.interpolation);
                }
            }
        }
        Ok(JointTransform::from_trs(position, rotation, scale))
    }
}

// ============================================================================
// Interpolation
// ============================================================================

/// Keyframe pair surrounding `t` and the blend factor between them.
///
/// Cubic-spline outputs store `[in_tangent, value, out_tangent]` per key; only the value is
/// used, so those channels play back linearly.
fn keyframe_span(times: &[f32], t: f32, interp: Interpolation) -> Option<(usize, usize, f32)> {
    if times.is_empty() {
        return None;
    }

    let mut i = 0;
    while i < times.len() - 1 && times[i + 1] < t {
        i += 1;
    }
    if i >= times.len() - 1 || t <= times[0] {
        let key = if t <= times[0] { 0 } else { times.len() - 1 };
        return Some((key, key, 0.0));
    }

    let t0 = times[i];
    let t1 = times[i + 1];
    let factor = match interp {
        Interpolation::Step => 0.0,
        _ if t1 > t0 => ((t - t0) / (t1 - t0)).clamp(0.0, 1.0),
        _ => 0.0,
    };
    Some((i, i + 1, factor))
}

fn key_value<T: Copy>(values: &[T], key: usize, interp: Interpolation) -> Option<T> {
    match interp {
        Interpolation::CubicSpline => values.get(key * 3 + 1).copied(),
        _ => values.get(key).copied(),
    }
}

fn interpolate_vec3(times: &[f32], values: &[[f32; 3]], t: f32, interp: Interpolation) -> [f32; 3] {
    let Some((a, b, factor)) = keyframe_span(times, t, interp) else {
        return [0.0, 0.0, 0.0];
    };
    let (Some(v0), Some(v1)) = (key_value(values, a, interp), key_value(values, b, interp)) else {
        return [0.0, 0.0, 0.0];
    };
    glam::Vec3::from_array(v0)
        .lerp(glam::Vec3::from_array(v1), factor)
        .to_array()
}

fn interpolate_quat(times: &[f32], values: &[[f32; 4]], t: f32, interp: Interpolation) -> [f32; 4] {
    let Some((a, b, factor)) = keyframe_span(times, t, interp) else {
        return [0.0, 0.0, 0.0, 1.0];
    };
    let (Some(q0), Some(q1)) = (key_value(values, a, interp), key_value(values, b, interp)) else {
        return [0.0, 0.0, 0.0, 1.0];
    };
    unit_quat(q0)
        .slerp(unit_quat(q1), factor)
        .normalize()
        .to_array()
}

/// Quaternion from stored `[x, y, z, w]`; degenerate values become identity
fn unit_quat(q: [f32; 4]) -> glam::Quat {
    glam::Vec4::from_array(q)
        .try_normalize()
        .map_or(glam::Quat::IDENTITY, glam::Quat::from_vec4)
}
