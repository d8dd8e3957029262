use clap::{Parser, Subcommand};
use glam::Vec3;
use scenecore_common::ObjectType;
use scenecore_kernel::{Entity, Scene, SceneEvent};
use scenecore_render::{DebugTextRenderer, EngineConfig, RenderView, Renderer};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scenecore-cli", about = "Headless scenecore driver")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective configuration
    Info,
    /// Step the demo scene and report trigger hits
    Simulate {
        /// Number of frames to step
        #[arg(short, long, default_value = "120")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
    },
    /// Print the frame plan for the demo scene
    Plan {
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
    },
}

/// Floor slab, a few falling bodies and a death zone under one of them.
fn demo_scene(config: &EngineConfig) -> Scene {
    let mut scene = Scene::with_config(config.sim);
    scene.add_object(
        Entity::new(ObjectType::Box)
            .with_position(Vec3::new(0.0, -0.5, 0.0))
            .with_size(Vec3::new(20.0, 1.0, 20.0))
            .with_color(Vec3::splat(0.6)),
    );
    scene.add_object(
        Entity::new(ObjectType::Box)
            .with_position(Vec3::new(-2.0, 4.0, 0.0))
            .with_rotation_y(30.0)
            .with_color(Vec3::new(0.2, 0.6, 1.0))
            .with_physics(Vec3::ZERO),
    );
    scene.add_object(
        Entity::new(ObjectType::Sphere)
            .with_position(Vec3::new(2.0, 6.0, 0.0))
            .with_color(Vec3::new(1.0, 0.8, 0.2))
            .with_physics(Vec3::ZERO),
    );
    scene.add_object(
        Entity::new(ObjectType::Triangle)
            .with_position(Vec3::new(0.0, 1.0, -3.0))
            .with_size(Vec3::splat(2.0)),
    );
    scene.add_object(Entity::new(ObjectType::PlayerSpawn).with_position(Vec3::new(0.0, 1.0, 5.0)));
    scene.add_object(
        Entity::trigger("Death")
            .with_position(Vec3::new(2.0, 0.5, 0.0))
            .with_size(Vec3::new(2.0, 1.0, 2.0)),
    );
    scene
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = EngineConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("scenecore-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "sim: gravity={} floor_y={}",
                config.sim.gravity, config.sim.floor_y
            );
            println!(
                "render: shadow={} sphere={}x{}",
                config.render.shadow_resolution,
                config.render.sphere_stacks,
                config.render.sphere_sectors
            );
            println!(
                "object types: {}",
                ObjectType::ALL.map(|t| t.label()).join(", ")
            );
        }
        Commands::Simulate { frames, dt } => {
            let mut scene = demo_scene(&config);
            let hits = Rc::new(Cell::new(0u32));
            let triggers: Vec<_> = scene
                .entities()
                .iter()
                .filter(|e| e.is_trigger())
                .map(|e| e.id)
                .collect();
            for trigger in triggers {
                let hits = Rc::clone(&hits);
                scene.on_enter_trigger(trigger, move |t: &Entity, other: &Entity| {
                    hits.set(hits.get() + 1);
                    tracing::debug!("{} entered {} zone", other.id, t.trigger_type);
                });
            }

            println!("Simulating {frames} frames at dt={dt}");
            for _ in 0..frames {
                scene.update(dt);
            }

            let entered = scene
                .drain_events()
                .iter()
                .filter(|e| matches!(e, SceneEvent::TriggerEntered { .. }))
                .count();
            println!("tick={} trigger_hits={} events={entered}", scene.tick(), hits.get());
            for entity in scene.entities() {
                println!(
                    "  {:<11} {} pos=({:.2}, {:.2}, {:.2}) vel_y={:.2} color=({:.2}, {:.2}, {:.2})",
                    entity.object_type,
                    entity.id,
                    entity.position.x,
                    entity.position.y,
                    entity.position.z,
                    entity.velocity.y,
                    entity.color.x,
                    entity.color.y,
                    entity.color.z
                );
            }
        }
        Commands::Plan { width, height } => {
            let scene = demo_scene(&config);
            let view = RenderView {
                camera: config.render.camera,
                light: config.render.light,
                width,
                height,
            };
            let mut renderer = DebugTextRenderer::new();
            print!("{}", renderer.render(&scene, &view));
        }
    }

    Ok(())
}
