//! Skeleton hierarchy reconstruction
//!
//! The skin cluster only reports a flat, ordered influence list. The hierarchy is rebuilt
//! from the scene's native parent/child relations and re-expressed as indices into that
//! list, with a Root node outside the list on top:
//!
//! - `parent == -1` means the joint hangs directly under Root
//! - children that are not influences are dropped
//! - Root is the first non-influence ancestor of the first influence, or a synthetic node
//!   named `Root` when every ancestor is an influence

use hashbrown::HashMap;

use crate::error::{ExportWarning, HierarchyError, Warnings};
use crate::scene::{JointHandle, JointTransform, SceneSource};

/// Name of the synthetic root node
pub const SYNTHETIC_ROOT_NAME: &str = "Root";

/// Parent index meaning "child of Root"
pub const ROOT_PARENT: i32 = -1;

/// Maps joint handles to their position in the influence list
#[derive(Debug, Clone, Default)]
pub struct JointRegistry {
    handles: Vec<JointHandle>,
    index: HashMap<JointHandle, usize>,
}

impl JointRegistry {
    /// Fails when the same joint appears twice in the influence list
    pub fn build<S: SceneSource + ?Sized>(
        scene: &S,
        influences: &[JointHandle],
    ) -> Result<Self, HierarchyError> {
        let mut index = HashMap::with_capacity(influences.len());
        for (i, &handle) in influences.iter().enumerate() {
            if let Some(&first) = index.get(&handle) {
                return Err(HierarchyError::DuplicateInfluence {
                    name: scene.joint_name(handle),
                    first,
                    second: i,
                });
            }
            index.insert(handle, i);
        }
        Ok(Self {
            handles: influences.to_vec(),
            index,
        })
    }

    pub fn index_of(&self, handle: JointHandle) -> Option<usize> {
        self.index.get(&handle).copied()
    }

    pub fn handles(&self) -> &[JointHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// An influence joint
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub handle: JointHandle,
    /// Influence index of the parent, [`ROOT_PARENT`] when the parent is Root
    pub parent: i32,
    pub children: Vec<usize>,
    /// Sampled local transforms, indexed by frame
    pub transforms: Vec<JointTransform>,
}

/// The node above every influence
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub name: String,
    /// `None` for the synthetic root
    pub handle: Option<JointHandle>,
    pub children: Vec<usize>,
    pub transforms: Vec<JointTransform>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub root: Root,
    /// In influence order
    pub joints: Vec<Joint>,
}

impl Skeleton {
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Nodes per frame in the written files (joints plus Root)
    pub fn node_count(&self) -> usize {
        self.joints.len() + 1
    }

    /// Number of sampled frames
    pub fn frame_count(&self) -> usize {
        self.root.transforms.len()
    }

    /// Check index ranges, acyclicity and parent/child agreement
    pub fn validate(&self) -> Result<(), HierarchyError> {
        let count = self.joints.len();

        for (i, joint) in self.joints.iter().enumerate() {
            if joint.parent != ROOT_PARENT && !(0..count as i32).contains(&joint.parent) {
                return Err(HierarchyError::ParentOutOfRange {
                    joint: i,
                    parent: joint.parent,
                    count,
                });
            }
        }

        for start in 0..count {
            let mut current = self.joints[start].parent;
            let mut steps = 0;
            while current != ROOT_PARENT {
                steps += 1;
                if steps > count {
                    return Err(HierarchyError::Cycle(start));
                }
                current = self.joints[current as usize].parent;
            }
        }

        let root_children = self
            .root
            .children
            .iter()
            .map(|&c| (ROOT_PARENT, self.root.name.as_str(), c));
        let joint_children = self.joints.iter().enumerate().flat_map(|(i, j)| {
            j.children
                .iter()
                .map(move |&c| (i as i32, j.name.as_str(), c))
        });
        for (expected, owner, child) in root_children.chain(joint_children) {
            match self.joints.get(child) {
                Some(joint) if joint.parent == expected => {}
                found => {
                    return Err(HierarchyError::InconsistentChild {
                        parent: owner.to_string(),
                        child: found.map_or_else(|| format!("#{child}"), |j| j.name.clone()),
                        actual: found.map_or(i32::MIN, |j| j.parent),
                    });
                }
            }
        }

        Ok(())
    }

    /// Joints parented to Root that Root does not list as children
    pub fn detached_joints(&self) -> impl Iterator<Item = &Joint> + '_ {
        self.joints.iter().enumerate().filter_map(move |(i, joint)| {
            (joint.parent == ROOT_PARENT && !self.root.children.contains(&i)).then_some(joint)
        })
    }
}

/// First ancestor of `joint` that is not an influence
///
/// The walk is bounded so a cyclic topology ends in `None` and is reported by validation.
fn find_root_node<S: SceneSource + ?Sized>(
    scene: &S,
    registry: &JointRegistry,
    joint: JointHandle,
) -> Option<JointHandle> {
    let mut current = scene.joint_parent(joint);
    for _ in 0..=registry.len() {
        let node = current?;
        if registry.index_of(node).is_none() {
            return Some(node);
        }
        current = scene.joint_parent(node);
    }
    None
}

fn influence_children<S: SceneSource + ?Sized>(
    scene: &S,
    registry: &JointRegistry,
    node: JointHandle,
) -> Vec<usize> {
    scene
        .joint_children(node)
        .into_iter()
        .filter_map(|child| registry.index_of(child))
        .collect()
}

/// Rebuild and validate the hierarchy of the registered influences
pub fn build_skeleton<S: SceneSource + ?Sized>(
    scene: &S,
    registry: &JointRegistry,
    warnings: &mut Warnings,
) -> Result<Skeleton, HierarchyError> {
    let joints: Vec<Joint> = registry
        .handles()
        .iter()
        .map(|&handle| Joint {
            name: scene.joint_name(handle),
            handle,
            parent: scene
                .joint_parent(handle)
                .and_then(|p| registry.index_of(p))
                .map_or(ROOT_PARENT, |p| p as i32),
            children: influence_children(scene, registry, handle),
            transforms: Vec::new(),
        })
        .collect();

    let root_node = registry
        .handles()
        .first()
        .and_then(|&first| find_root_node(scene, registry, first));

    let root = match root_node {
        Some(handle) => Root {
            name: scene.joint_name(handle),
            handle: Some(handle),
            children: influence_children(scene, registry, handle),
            transforms: Vec::new(),
        },
        None => Root {
            name: SYNTHETIC_ROOT_NAME.to_string(),
            handle: None,
            children: joints
                .iter()
                .enumerate()
                .filter(|(_, j)| j.parent == ROOT_PARENT)
                .map(|(i, _)| i)
                .collect(),
            transforms: Vec::new(),
        },
    };

    let skeleton = Skeleton { root, joints };
    skeleton.validate()?;

    for joint in skeleton.detached_joints() {
        warnings.push(ExportWarning::DetachedJoint(joint.name.clone()));
    }

    tracing::debug!(
        "Skeleton: root '{}'{}, {} joints",
        skeleton.root.name,
        if skeleton.root.handle.is_none() { " (synthetic)" } else { "" },
        skeleton.joint_count()
    );

    Ok(skeleton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryJoint, MemoryScene};

    fn build(scene: &MemoryScene, influences: &[u32]) -> Result<Skeleton, HierarchyError> {
        let handles: Vec<JointHandle> = influences.iter().map(|&j| JointHandle(j)).collect();
        let registry = JointRegistry::build(scene, &handles)?;
        build_skeleton(scene, &registry, &mut Warnings::default())
    }

    /// Root -> J0 -> J1
    fn chain() -> MemoryScene {
        let mut scene = MemoryScene::default();
        scene.add_joint(MemoryJoint::new("Root", None));
        scene.add_joint(MemoryJoint::new("J0", Some(0)));
        scene.add_joint(MemoryJoint::new("J1", Some(1)));
        scene
    }

    #[test]
    fn test_chain() {
        let skeleton = build(&chain(), &[1, 2]).unwrap();

        assert_eq!(skeleton.root.name, "Root");
        assert_eq!(skeleton.root.handle, Some(JointHandle(0)));
        assert_eq!(skeleton.root.children, vec![0]);
        assert_eq!(skeleton.joints[0].parent, -1);
        assert_eq!(skeleton.joints[1].parent, 0);
        assert_eq!(skeleton.joints[0].children, vec![1]);
        assert!(skeleton.joints[1].children.is_empty());
    }

    #[test]
    fn test_synthetic_root_when_top_joint_is_influence() {
        let mut scene = chain();
        scene.add_joint(MemoryJoint::new("Loose", None));
        // every ancestor of the first influence is itself an influence
        let skeleton = build(&scene, &[1, 0, 3, 2]).unwrap();

        assert_eq!(skeleton.root.name, SYNTHETIC_ROOT_NAME);
        assert_eq!(skeleton.root.handle, None);
        // parentless influences in list order: Root (index 1) and Loose (index 2)
        assert_eq!(skeleton.root.children, vec![1, 2]);
        assert_eq!(skeleton.joints[0].parent, 1);
        assert_eq!(skeleton.joints[3].parent, 0);
    }

    #[test]
    fn test_non_influence_children_dropped() {
        let mut scene = chain();
        scene.add_joint(MemoryJoint::new("J0_helper", Some(1)));
        let skeleton = build(&scene, &[1, 2]).unwrap();
        assert_eq!(skeleton.joints[0].children, vec![1]);
    }

    #[test]
    fn test_detached_joint_warned() {
        let mut scene = chain();
        // J2 hangs under a non-influence node that is not the root
        scene.add_joint(MemoryJoint::new("Helper", Some(0)));
        scene.add_joint(MemoryJoint::new("J2", Some(3)));
        let handles = [JointHandle(1), JointHandle(2), JointHandle(4)];
        let registry = JointRegistry::build(&scene, &handles).unwrap();
        let mut warnings = Warnings::default();

        let skeleton = build_skeleton(&scene, &registry, &mut warnings).unwrap();

        assert_eq!(skeleton.joints[2].parent, -1);
        assert_eq!(skeleton.root.children, vec![0]);
        assert_eq!(
            warnings.into_vec(),
            vec![ExportWarning::DetachedJoint("J2".to_string())]
        );
    }

    #[test]
    fn test_duplicate_influence_rejected() {
        let err = build(&chain(), &[1, 2, 1]).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::DuplicateInfluence {
                name: "J0".to_string(),
                first: 0,
                second: 2
            }
        );
    }

    #[test]
    fn test_cycle_detected() {
        let mut scene = MemoryScene::default();
        scene.add_joint(MemoryJoint::new("A", Some(1)));
        scene.add_joint(MemoryJoint::new("B", Some(0)));
        assert_eq!(build(&scene, &[0, 1]).unwrap_err(), HierarchyError::Cycle(0));
    }

    #[test]
    fn test_inconsistent_children_rejected() {
        let mut scene = chain();
        // Root claims J1 as a direct child, but J1's parent is J0
        scene.joints[0].children = Some(vec![1, 2]);
        let err = build(&scene, &[1, 2]).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::InconsistentChild {
                parent: "Root".to_string(),
                child: "J1".to_string(),
                actual: 0
            }
        );
    }

    #[test]
    fn test_validate_parent_range() {
        let mut skeleton = build(&chain(), &[1, 2]).unwrap();
        skeleton.joints[1].parent = 7;
        assert_eq!(
            skeleton.validate(),
            Err(HierarchyError::ParentOutOfRange {
                joint: 1,
                parent: 7,
                count: 2
            })
        );
    }
}
