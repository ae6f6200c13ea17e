use anyhow::Context;
use clap::{Parser, Subcommand};
use spacekit_assets::{AppConfig, build_demo_scene, load_obj_file};
use spacekit_ecs::{VERTEX_FLOATS, VERTEX_STRIDE, World};
use spacekit_input::{InputState, Key};
use spacekit_render::{HeadlessBackend, Renderer};
use spacekit_render_wgpu::EmbeddedShaders;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spacekit-cli", about = "CLI tool for spacekit operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON application config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and renderer defaults
    Info,
    /// Render the demo scene without a GPU and report what was submitted
    Render {
        /// Number of frames to render
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Hold the forward key so the camera flies between frames
        #[arg(long)]
        fly: bool,
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report vertex and triangle counts of an OBJ file
    InspectMesh {
        /// Path to the .obj file
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("spacekit-cli v{}", env!("CARGO_PKG_VERSION"));
            let renderer = &config.renderer;
            println!("surface: {}x{}", renderer.width, renderer.height);
            println!("shader: {}", renderer.shader_name);
            println!(
                "light capacity: directional={}, point={}",
                renderer.max_directional_lights, renderer.max_point_lights
            );
            println!("vertex layout: {VERTEX_FLOATS} floats, stride {VERTEX_STRIDE} bytes");
        }
        Commands::Render { frames, fly, json } => {
            let mut world = World::new();
            let model = match &config.model {
                Some(model) => Some(model.load(&mut world)?),
                None => None,
            };
            let demo = build_demo_scene(&mut world, config.camera_for_surface(), model)?;
            let mut renderer =
                Renderer::create(HeadlessBackend::new(), &EmbeddedShaders, config.renderer.clone())?;

            let mut input = InputState::new();
            if fly {
                input.press(Key::W);
            }

            let mut all_stats = Vec::new();
            for _ in 0..frames {
                let stats = renderer.render(&world, &demo.scene)?;
                tracing::debug!(?stats, "rendered headless frame");
                if !json {
                    println!(
                        "frame {}: draws={}, vertices={}, skipped={}, lights={}/{}",
                        stats.frame,
                        stats.draw_calls,
                        stats.vertices,
                        stats.skipped_meshes,
                        stats.directional_lights,
                        stats.point_lights
                    );
                }
                all_stats.push(stats);
                if let Some(transform) = world.transform_mut(demo.camera_entity) {
                    config.controller.apply(&input, transform);
                }
            }

            let summary = renderer.backend().summary();
            if json {
                let report = serde_json::json!({ "frames": all_stats, "backend": summary });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let cache = renderer.cache_stats();
                println!(
                    "backend: buffers={}, writes={}, textures={}, bind_groups={}, passes={}, draws={}",
                    summary.buffers,
                    summary.buffer_writes,
                    summary.textures,
                    summary.bind_groups,
                    summary.passes,
                    summary.draws
                );
                println!(
                    "cache: scenes={}, meshes={}, textures={}",
                    cache.scene_entries, cache.mesh_entries, cache.texture_entries
                );
            }
        }
        Commands::InspectMesh { path } => {
            let mesh = load_obj_file(&path)?;
            println!("{}", path.display());
            println!("vertices: {}", mesh.vertex_count());
            println!("triangles: {}", mesh.triangles);
        }
    }

    Ok(())
}
