//! Manifest parsing and export jobs
//!
//! Parses `exports.toml` and runs one export job per entry. Each job is the same
//! single-mesh export the `mesh`, `animation` and `both` commands perform: it opens its
//! own scene, exports one selected mesh to its own files and shares no state with the
//! other jobs. Jobs run one after another and a failing job stops the build; files
//! written by earlier jobs are kept.
//!
//! ```toml
//! [output]
//! dir = "build/"
//!
//! [defaults]
//! format = "binary"
//! deduplicate = true
//! time_unit = "film"
//!
//! [exports.hero]
//! scene = "scenes/hero.glb"
//! node = "HeroMesh"
//! mesh = true
//! animation = true
//! animation_index = 1
//! ```
//!
//! Relative scene paths are resolved against the manifest's directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::export::{export_animation, export_both, export_mesh, ExportStats};
use crate::formats::{ExportFormat, ANIMATION_EXT, MESH_EXT};
use crate::scene::{open_scene, SceneOptions, TimeUnit};

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub defaults: Defaults,
    /// Jobs by output name, built in name order
    #[serde(default)]
    pub exports: BTreeMap<String, ExportEntry>,
    /// Directory relative scene paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out/")
}

/// Settings applied to every entry that does not override them
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub format: ExportFormat,
    pub deduplicate: bool,
    pub time_unit: Option<TimeUnit>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            format: ExportFormat::Binary,
            deduplicate: true,
            time_unit: None,
        }
    }
}

/// One export job
#[derive(Debug, Deserialize)]
pub struct ExportEntry {
    pub scene: PathBuf,
    /// Object to export; the scene's own selection when omitted
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default = "default_true")]
    pub mesh: bool,
    #[serde(default)]
    pub animation: bool,
    #[serde(default)]
    pub format: Option<ExportFormat>,
    #[serde(default)]
    pub deduplicate: Option<bool>,
    #[serde(default)]
    pub animation_index: Option<usize>,
    #[serde(default)]
    pub time_unit: Option<TimeUnit>,
}

fn default_true() -> bool {
    true
}

impl ExportEntry {
    pub fn format(&self, defaults: &Defaults) -> ExportFormat {
        self.format.unwrap_or(defaults.format)
    }

    pub fn deduplicate(&self, defaults: &Defaults) -> bool {
        self.deduplicate.unwrap_or(defaults.deduplicate)
    }

    pub fn scene_options(&self, defaults: &Defaults) -> SceneOptions {
        SceneOptions {
            node: self.node.clone(),
            animation: self.animation_index,
            time_unit: self.time_unit.or(defaults.time_unit),
        }
    }
}

impl Manifest {
    /// Scene path of `entry` with relative paths anchored at the manifest
    pub fn scene_path(&self, entry: &ExportEntry) -> PathBuf {
        if entry.scene.is_absolute() {
            entry.scene.clone()
        } else {
            self.base_dir.join(&entry.scene)
        }
    }
}

/// Parse manifest text; relative paths resolve against `base_dir`
pub fn parse_manifest(content: &str, base_dir: &Path) -> Result<Manifest> {
    let mut manifest: Manifest = toml::from_str(content)?;
    manifest.base_dir = base_dir.to_path_buf();
    Ok(manifest)
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
    parse_manifest(&content, &base_dir)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))
}

/// Validate a manifest without exporting
pub fn validate(manifest: &Manifest) -> Result<()> {
    if manifest.exports.is_empty() {
        anyhow::bail!("Manifest has no [exports] entries");
    }
    for (name, entry) in &manifest.exports {
        if !entry.mesh && !entry.animation {
            anyhow::bail!("Export '{}' writes nothing (mesh and animation are both false)", name);
        }
        let scene = manifest.scene_path(entry);
        if !scene.exists() {
            anyhow::bail!("Export '{}' scene not found: {:?}", name, scene);
        }
        let ext = scene
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        if !matches!(ext.as_str(), "gltf" | "glb" | "json") {
            anyhow::bail!("Unsupported scene format for '{}': {:?}", name, scene);
        }
    }
    Ok(())
}

/// Run every export job of a manifest in name order
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<ExportStats>> {
    validate(manifest)?;

    let output_dir = output_override.unwrap_or(&manifest.output.dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut results = Vec::with_capacity(manifest.exports.len());
    for (name, entry) in &manifest.exports {
        let scene_path = manifest.scene_path(entry);
        let format = entry.format(&manifest.defaults);
        let deduplicate = entry.deduplicate(&manifest.defaults);
        let mesh_out = output_dir.join(format!("{}.{}", name, MESH_EXT));
        let anim_out = output_dir.join(format!("{}.{}", name, ANIMATION_EXT));

        tracing::info!("Exporting {}: {:?}", name, scene_path);
        let mut scene = open_scene(&scene_path, &entry.scene_options(&manifest.defaults))
            .with_context(|| format!("Failed to open scene for '{}'", name))?;

        let stats = match (entry.mesh, entry.animation) {
            (true, true) => export_both(&mut *scene, &mesh_out, &anim_out, format, deduplicate),
            (true, false) => export_mesh(&mut *scene, &mesh_out, format, deduplicate),
            _ => export_animation(&mut *scene, &anim_out, format, deduplicate),
        }
        .with_context(|| format!("Export '{}' failed", name))?;

        if !stats.warnings.is_empty() {
            tracing::warn!("{}: {} warnings", name, stats.warnings.len());
        }
        results.push(stats);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[output]
dir = "build"

[defaults]
format = "ascii"
time_unit = "film"

[exports.hero]
scene = "hero.glb"
node = "HeroMesh"
animation = true
animation_index = 2

[exports.prop]
scene = "/abs/prop.json"
format = "Binary"
deduplicate = false
time_unit = "pal"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(MANIFEST, Path::new("assets")).unwrap();
        assert_eq!(manifest.output.dir, PathBuf::from("build"));

        let hero = &manifest.exports["hero"];
        assert!(hero.mesh && hero.animation);
        assert_eq!(hero.format(&manifest.defaults), ExportFormat::Ascii);
        assert!(hero.deduplicate(&manifest.defaults));
        let options = hero.scene_options(&manifest.defaults);
        assert_eq!(options.node.as_deref(), Some("HeroMesh"));
        assert_eq!(options.animation, Some(2));
        assert_eq!(options.time_unit, Some(TimeUnit::Film));
        assert_eq!(manifest.scene_path(hero), PathBuf::from("assets/hero.glb"));

        let prop = &manifest.exports["prop"];
        assert!(prop.mesh && !prop.animation);
        assert_eq!(prop.format(&manifest.defaults), ExportFormat::Binary);
        assert!(!prop.deduplicate(&manifest.defaults));
        assert_eq!(prop.scene_options(&manifest.defaults).time_unit, Some(TimeUnit::Pal));
        assert_eq!(manifest.scene_path(prop), PathBuf::from("/abs/prop.json"));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let manifest = parse_manifest("[exports.a]\nscene = \"a.json\"\n", Path::new("")).unwrap();
        assert_eq!(manifest.output.dir, PathBuf::from("out/"));
        assert_eq!(manifest.defaults.format, ExportFormat::Binary);
        assert!(manifest.defaults.deduplicate);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = parse_manifest("[defaults]\nformat = \"fbx\"\n", Path::new("")).unwrap_err();
        assert!(format!("{:#}", err).contains("fbx"));
    }

    #[test]
    fn test_validate_reports_missing_scene() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = parse_manifest("[exports.a]\nscene = \"missing.glb\"\n", dir.path()).unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(err.to_string().contains("scene not found"));
    }

    const TWO_MESH_SCENE: &str = r#"{
  "selection": ["Tri"],
  "meshes": [
    { "name": "Tri", "points": [[0,0,0], [1,0,0], [0,1,0]],
      "faces": [{ "vertices": [0,1,2], "normals": [[0,0,1],[0,0,1],[0,0,1]] }] },
    { "name": "Quad", "points": [[0,0,0], [1,0,0], [1,1,0], [0,1,0]],
      "faces": [{ "vertices": [0,1,2,3], "normals": [[0,0,1],[0,0,1],[0,0,1],[0,0,1]] }] }
  ]
}"#;

    #[test]
    fn test_each_job_exports_one_mesh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("props.json"), TWO_MESH_SCENE).unwrap();
        let manifest = parse_manifest(
            "[exports.tri]\nscene = \"props.json\"\n\n[exports.quad]\nscene = \"props.json\"\nnode = \"Quad\"\n",
            dir.path(),
        )
        .unwrap();
        let out = dir.path().join("out");

        let stats = build_all(&manifest, Some(&out)).unwrap();

        // name order: quad before tri
        let counts: Vec<usize> = stats.iter().map(|s| s.vertex_count).collect();
        assert_eq!(counts, vec![4, 3]);
        for (name, vertices) in [("quad", 4), ("tri", 3)] {
            let bytes = std::fs::read(out.join(format!("{}.{}", name, MESH_EXT))).unwrap();
            let mesh = crate::formats::parse_mesh_file(&bytes).unwrap();
            assert_eq!(mesh.header.vertex_count, vertices);
        }
    }

    #[test]
    fn test_failing_job_keeps_earlier_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("props.json"), TWO_MESH_SCENE).unwrap();
        let manifest = parse_manifest(
            "[exports.a]\nscene = \"props.json\"\n\n[exports.b]\nscene = \"props.json\"\nnode = \"Missing\"\n",
            dir.path(),
        )
        .unwrap();
        let out = dir.path().join("out");

        let err = build_all(&manifest, Some(&out)).unwrap_err();

        assert!(format!("{:#}", err).contains("Export 'b' failed"));
        assert!(out.join("a.mof").exists());
        assert!(!out.join("b.mof").exists());
    }

    #[test]
    fn test_validate_rejects_empty_job() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        let manifest =
            parse_manifest("[exports.a]\nscene = \"a.json\"\nmesh = false\n", dir.path()).unwrap();
        assert!(validate(&manifest).unwrap_err().to_string().contains("writes nothing"));
    }
}
