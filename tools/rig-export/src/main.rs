//! rig-export - skinned mesh and animation exporter
//!
//! Converts a selected scene object (glTF/GLB or JSON scene) to `.mof` mesh and `.maf`
//! animation files

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use rig_export::formats::{
    parse_animation_file, parse_mesh_file, AnimationFileHeader, BinarySerializable, ExportFormat,
    MeshFileHeader, ANIMATION_EXT, MESH_EXT,
};
use rig_export::{export_animation, export_both, export_mesh, manifest, open_scene};
use rig_export::{ExportStats, SceneOptions, TimeUnit};

#[derive(Parser)]
#[command(name = "rig-export")]
#[command(about = "Skinned mesh and animation exporter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the single-scene commands
#[derive(Args)]
struct SceneArgs {
    /// Input scene (.gltf, .glb or .json)
    input: PathBuf,

    /// Output encoding
    #[arg(long, value_enum, default_value_t = ExportFormat::Binary)]
    format: ExportFormat,

    /// Node to export (default: the scene's selection)
    #[arg(short, long)]
    node: Option<String>,

    /// Animation index for glTF scenes (default: first animation)
    #[arg(short, long)]
    animation: Option<usize>,

    /// Time unit, by name (film, ntsc, pal, ...) or rate (24, 29.97df, 120fps)
    #[arg(short, long)]
    time_unit: Option<TimeUnit>,
}

impl SceneArgs {
    fn options(&self) -> SceneOptions {
        SceneOptions {
            node: self.node.clone(),
            animation: self.animation,
            time_unit: self.time_unit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export the selected mesh
    Mesh {
        #[command(flatten)]
        scene: SceneArgs,

        /// Output .mof file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep every face corner as its own vertex
        #[arg(long)]
        no_dedup: bool,
    },

    /// Export the keyframes of the selected mesh's skeleton
    Animation {
        #[command(flatten)]
        scene: SceneArgs,

        /// Output .maf file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Accepted for parity with `mesh`; every frame is always written
        #[arg(long)]
        no_dedup: bool,
    },

    /// Export mesh and animation in one pass
    Both {
        #[command(flatten)]
        scene: SceneArgs,

        /// Output .mof file
        #[arg(long)]
        mesh_output: Option<PathBuf>,

        /// Output .maf file
        #[arg(long)]
        animation_output: Option<PathBuf>,

        /// Keep every face corner as its own vertex
        #[arg(long)]
        no_dedup: bool,
    },

    /// Run every export of a manifest file
    Build {
        /// Path to exports.toml manifest
        #[arg(default_value = "exports.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without exporting
    Check {
        /// Path to exports.toml manifest
        #[arg(default_value = "exports.toml")]
        manifest: PathBuf,
    },

    /// Print the header and a summary of a binary .mof or .maf file
    Inspect {
        /// File to read
        file: PathBuf,
    },
}

fn report(stats: &ExportStats) {
    tracing::info!(
        "Done in {:.2?} ({} warnings)",
        stats.elapsed,
        stats.warnings.len()
    );
}

/// Decode just the header so a truncated body can still be reported
fn read_header<T: BinarySerializable>(bytes: &[u8], path: &Path) -> Result<T> {
    T::deserialize(bytes).with_context(|| {
        format!(
            "{:?} is {} bytes, shorter than a {}-byte header",
            path,
            bytes.len(),
            T::SIZE
        )
    })
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if ext == MESH_EXT {
        let header: MeshFileHeader = read_header(&bytes, path)?;
        tracing::debug!("Header: {:?}", header);
        let mesh = parse_mesh_file(&bytes).with_context(|| format!("Invalid mesh file {:?}", path))?;
        println!("{:?} mesh", mesh.mesh_type);
        println!("  vertices:  {} (stride {})", mesh.header.vertex_count, mesh.header.stride);
        println!("  triangles: {}", mesh.indices.len() / 3);
        if !mesh.skeleton.is_empty() {
            println!("  skeleton:  {} nodes", mesh.skeleton.len());
            for joint in &mesh.skeleton {
                println!(
                    "    [{}] {} (parent {}, {} children)",
                    joint.self_id,
                    joint.name,
                    joint.parent_id,
                    joint.child_ids.len()
                );
            }
        }
    } else if ext == ANIMATION_EXT {
        let header: AnimationFileHeader = read_header(&bytes, path)?;
        if !header.validate() {
            tracing::warn!("Header has a zero count or frame rate: {:?}", header);
        }
        let anim = parse_animation_file(&bytes)
            .with_context(|| format!("Invalid animation file {:?}", path))?;
        println!("Animation");
        println!("  nodes:  {} (root included)", anim.header.joint_count);
        println!("  frames: {}", anim.header.frame_count);
        println!("  rate:   {} fps", anim.header.frame_rate);
    } else {
        anyhow::bail!(
            "Unknown file type: {:?} (use .{} or .{})",
            path,
            MESH_EXT,
            ANIMATION_EXT
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mesh {
            scene,
            output,
            no_dedup,
        } => {
            let output = output.unwrap_or_else(|| scene.input.with_extension(MESH_EXT));
            tracing::info!("Exporting mesh {:?} -> {:?}", scene.input, output);
            let mut source = open_scene(&scene.input, &scene.options())?;
            let stats = export_mesh(&mut *source, &output, scene.format, !no_dedup)?;
            report(&stats);
        }

        Commands::Animation {
            scene,
            output,
            no_dedup,
        } => {
            let output = output.unwrap_or_else(|| scene.input.with_extension(ANIMATION_EXT));
            tracing::info!("Exporting animation {:?} -> {:?}", scene.input, output);
            let mut source = open_scene(&scene.input, &scene.options())?;
            let stats = export_animation(&mut *source, &output, scene.format, !no_dedup)?;
            report(&stats);
        }

        Commands::Both {
            scene,
            mesh_output,
            animation_output,
            no_dedup,
        } => {
            let mesh_output = mesh_output.unwrap_or_else(|| scene.input.with_extension(MESH_EXT));
            let animation_output =
                animation_output.unwrap_or_else(|| scene.input.with_extension(ANIMATION_EXT));
            tracing::info!(
                "Exporting {:?} -> {:?} + {:?}",
                scene.input,
                mesh_output,
                animation_output
            );
            let mut source = open_scene(&scene.input, &scene.options())?;
            let stats = export_both(
                &mut *source,
                &mesh_output,
                &animation_output,
                scene.format,
                !no_dedup,
            )?;
            report(&stats);
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building exports from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let results = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} exports", results.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { file } => inspect(&file)?,
    }

    Ok(())
}
