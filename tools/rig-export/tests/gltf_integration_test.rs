//! Integration tests for the glTF scene adapter.
//!
//! Generates a skinned, animated quad on disk, exports it and reads the files back.


use tempfile::tempdir;

use rig_export::formats::{parse_animation_file, parse_mesh_file, MeshType};
use rig_export::{
    export_animation, export_both, export_mesh, ExportError, ExportFormat, GltfScene,
    SceneOptions, SceneSource, TimeUnit,
};

fn open(options: &SceneOptions) -> (tempfile::TempDir, GltfScene) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = gltf_generator::write_skinned_quad(dir.path());
    let scene = GltfScene::open(&path, options).expect("Failed to open glTF scene");
    (dir, scene)
}

#[test]
fn test_scene_topology() {
    let (_dir, scene) = open(&SceneOptions::default());

    let mesh = scene.selected_mesh().unwrap();
    let influences = scene.skin_influences(mesh);
    let names: Vec<String> = influences.iter().map(|&j| scene.joint_name(j)).collect();
    assert_eq!(names, vec!["J0", "J1"]);
    assert_eq!(scene.joint_name(scene.joint_parent(influences[0]).unwrap()), "Armature");

    // 30 fps by default, one second clip
    assert_eq!(scene.timeline_unit(), TimeUnit::Ntsc);
    assert_eq!(scene.timeline_end_frame(), 30);
    assert_eq!(scene.faces(mesh).unwrap().len(), 2);
}

#[test]
fn test_mesh_export() {
    let (dir, mut scene) = open(&SceneOptions::default());
    let out = dir.path().join("rig.mof");

    let stats = export_mesh(&mut scene, &out, ExportFormat::Binary, true).unwrap();
    assert_eq!(stats.mesh_type, MeshType::Animated);
    assert_eq!((stats.vertex_count, stats.index_count), (4, 6));
    assert!(stats.warnings.is_empty(), "{:?}", stats.warnings);

    let mesh = parse_mesh_file(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(mesh.header.stride, 19);
    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    // bottom edge on J0 (1), top edge on J1 (2)
    let joints: Vec<i32> = mesh.vertices.iter().map(|v| v.joint_ids[0]).collect();
    assert_eq!(joints, vec![1, 1, 2, 2]);

    let names: Vec<&str> = mesh.skeleton.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["Armature", "J0", "J1"]);
    assert_eq!(mesh.skeleton[0].child_ids, vec![1]);
    assert_eq!(mesh.skeleton[2].parent_id, 1);
    assert_eq!(mesh.skeleton[2].transform.position, [0.0, gltf_generator::J1_OFFSET, 0.0]);
}

#[test]
fn test_animation_export() {
    let (dir, mut scene) = open(&SceneOptions::default());
    let out = dir.path().join("rig.maf");

    let stats = export_animation(&mut scene, &out, ExportFormat::Binary, false).unwrap();
    assert_eq!(stats.frame_count, 31);
    assert_eq!(stats.frame_rate, 30.0);

    let anim = parse_animation_file(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(anim.header.joint_count, 3);
    assert_eq!(anim.header.frame_count, 31);

    let j0: Vec<f32> = anim.track(1).map(|t| t.position[0]).collect();
    assert_eq!(j0[0], 0.0);
    assert!((j0[15] - 0.5).abs() < 1e-5);
    assert!((j0[30] - 1.0).abs() < 1e-5);
    // J1 is not animated and keeps its rest pose
    assert!(anim.track(2).all(|t| t.position == [0.0, gltf_generator::J1_OFFSET, 0.0]));
}

#[test]
fn test_time_unit_override() {
    let options = SceneOptions {
        time_unit: Some(TimeUnit::Film),
        ..Default::default()
    };
    let (dir, mut scene) = open(&options);

    let stats = export_both(
        &mut scene,
        &dir.path().join("rig.mof"),
        &dir.path().join("rig.maf"),
        ExportFormat::Binary,
        true,
    )
    .unwrap();

    assert_eq!(stats.frame_rate, 24.0);
    assert_eq!(stats.frame_count, 25);
}

#[test]
fn test_unknown_node_selection() {
    let options = SceneOptions {
        node: Some("Missing".to_string()),
        ..Default::default()
    };
    let (dir, mut scene) = open(&options);

    let err = export_mesh(&mut scene, &dir.path().join("x.mof"), ExportFormat::Binary, true)
        .unwrap_err();
    assert!(matches!(err, ExportError::Selection(0)));
}

#[test]
fn test_joint_node_is_not_a_mesh() {
    let options = SceneOptions {
        node: Some("J0".to_string()),
        ..Default::default()
    };
    let (_dir, scene) = open(&options);
    assert!(matches!(scene.selected_mesh(), Err(ExportError::MeshAccess(name)) if name == "J0"));
}
