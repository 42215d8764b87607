//! Integration tests for rig-export
//!
//! Tests the full pipeline through the binary: write a JSON scene -> export -> read back

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::tempdir;

use rig_export::formats::{parse_animation_file, parse_mesh_file, MeshType};

/// Two-triangle strip skinned to `Armature -> Hips -> Spine`, four frames at 24 fps
const SCENE: &str = r#"{
  "selection": ["Body"],
  "meshes": [{
    "name": "Body",
    "points": [[0,0,0], [1,0,0], [1,1,0], [0,1,0]],
    "faces": [{ "vertices": [0,1,2,3], "normals": [[0,0,1],[0,0,1],[0,0,1],[0,0,1]],
                "uvs": [[0,0],[1,0],[1,1],[0,1]] }],
    "skin": { "influences": [1, 2], "weights": [[[1, 1.0]], [[1, 1.0]], [[2, 0.75], [1, 0.25]], [[2, 1.0]]] }
  }],
  "joints": [
    { "name": "Armature" },
    { "name": "Hips", "parent": 0, "frames": [
      { "position": [0, 0, 0] }, { "position": [0, 1, 0] }, { "position": [0, 2, 0] }, { "position": [0, 3, 0] }
    ] },
    { "name": "Spine", "parent": 1, "rest": { "position": [0, 0.5, 0] } }
  ],
  "timeline": { "start": 0, "end": 3, "unit": "film" }
}"#;

fn write_scene(dir: &Path) -> PathBuf {
    let path = dir.join("body.json");
    std::fs::write(&path, SCENE).expect("Failed to write scene");
    path
}

fn rig_export(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rig-export"))
        .args(args)
        .output()
        .expect("Failed to run rig-export")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_mesh_command() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path());
    let out = dir.path().join("body.mof");

    let output = rig_export(&["mesh", path_str(&scene), "-o", path_str(&out)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mesh = parse_mesh_file(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(mesh.mesh_type, MeshType::Animated);
    assert_eq!(mesh.header.vertex_count, 4);
    assert_eq!(mesh.indices.len(), 6);
    // influences are ordered by skin index, not by weight
    assert_eq!(mesh.vertices[2].joint_ids, [1, 2, 0, 0]);
    assert_eq!(mesh.vertices[2].weights, [0.25, 0.75, 0.0, 0.0]);
    assert_eq!(mesh.vertices[2].uv, [1.0, 1.0]);
    assert_eq!(mesh.skeleton.len(), 3);
    assert_eq!(mesh.skeleton[2].transform.position, [0.0, 0.5, 0.0]);
}

#[test]
fn test_mesh_command_without_dedup() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path());
    let out = dir.path().join("body.mof");

    let output = rig_export(&["mesh", path_str(&scene), "-o", path_str(&out), "--no-dedup"]);
    assert!(output.status.success());

    let mesh = parse_mesh_file(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(mesh.header.vertex_count, 6);
    assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_animation_command_default_output() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path());

    let output = rig_export(&["animation", path_str(&scene)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let anim = parse_animation_file(&std::fs::read(dir.path().join("body.maf")).unwrap()).unwrap();
    assert_eq!(anim.header.joint_count, 3);
    assert_eq!(anim.header.frame_count, 4);
    assert_eq!(anim.header.frame_rate, 24.0);
    let hips: Vec<f32> = anim.track(1).map(|t| t.position[1]).collect();
    assert_eq!(hips, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_animation_command_without_dedup() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path());
    let deduped = dir.path().join("deduped.maf");
    let all = dir.path().join("all.maf");

    let output = rig_export(&["animation", path_str(&scene), "-o", path_str(&deduped)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let output = rig_export(&["animation", path_str(&scene), "-o", path_str(&all), "--no-dedup"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(std::fs::read(&deduped).unwrap(), std::fs::read(&all).unwrap());
}

#[test]
fn test_both_command_ascii() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path());

    let output = rig_export(&["both", path_str(&scene), "--format", "ascii", "-t", "pal"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mesh = std::fs::read_to_string(dir.path().join("body.mof")).unwrap();
    let anim = std::fs::read_to_string(dir.path().join("body.maf")).unwrap();
    assert!(mesh.starts_with("4\n19\n"));
    assert!(mesh.contains("Armature --- Idx [ 0 ] | Parent Idx [ 0 ] --- Children [ 1 ] | 1"));
    assert!(anim.contains("Frame Rate  [ 25 ]"));
    assert!(anim.contains("Joint: Spine [ 1 ] --- PARENT IDX [ 0 ]"));
}

#[test]
fn test_unknown_format_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path());

    let output = rig_export(&["mesh", path_str(&scene), "--format", "fbx"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("body.mof").exists());
}

#[test]
fn test_build_and_check_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_scene(dir.path());
    let manifest = dir.path().join("exports.toml");
    std::fs::write(
        &manifest,
        r#"
[output]
dir = "out"

[exports.body]
scene = "body.json"
animation = true

[exports.body_static]
scene = "body.json"
deduplicate = false
"#,
    )
    .unwrap();
    let out_dir = dir.path().join("out");

    let output = rig_export(&["check", path_str(&manifest)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = rig_export(&["build", path_str(&manifest), "-o", path_str(&out_dir)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(out_dir.join("body.mof").exists());
    assert!(out_dir.join("body.maf").exists());
    let mesh = parse_mesh_file(&std::fs::read(out_dir.join("body_static.mof")).unwrap()).unwrap();
    assert_eq!(mesh.header.vertex_count, 6);
    assert!(!out_dir.join("body_static.maf").exists());
}

#[test]
fn test_inspect_command() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path());
    let out = dir.path().join("body.mof");
    assert!(rig_export(&["mesh", path_str(&scene), "-o", path_str(&out)]).status.success());

    let output = rig_export(&["inspect", path_str(&out)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Animated mesh"));
    assert!(stdout.contains("[2] Spine (parent 1, 0 children)"));
}
