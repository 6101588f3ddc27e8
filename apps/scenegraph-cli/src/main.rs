use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use scenegraph_common::Containment;
use scenegraph_dispatch::{BUILTIN_NAMES, Command};
use scenegraph_host::{HostConfig, HostContext, InputEvent};
use scenegraph_kernel::{NodeDescription, SceneGraph};
use scenegraph_render::{DebugTextRenderer, RecordingRenderer};
use scenegraph_tools::GraphInspector;
use tracing_subscriber::EnvFilter;

mod demo;

#[derive(Parser)]
#[command(name = "scenegraph-cli", about = "CLI tool for scene graph operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Check that a scene description loads and builds
    Validate {
        /// Scene description (.json, .yaml or .yml)
        scene: PathBuf,
    },
    /// Print a summary and outline of a scene, or details of one node
    Inspect {
        scene: PathBuf,
        /// Show only the node with this id
        #[arg(short, long)]
        node: Option<String>,
        /// JSON array of commands to apply first
        #[arg(short, long)]
        commands: Option<PathBuf>,
    },
    /// Apply commands to a scene and print rendered frames as text
    Render {
        scene: PathBuf,
        /// JSON array of commands to apply before the first frame
        #[arg(short, long)]
        commands: Option<PathBuf>,
        /// Number of idle frames to render
        #[arg(short, long, default_value = "1")]
        frames: u64,
        /// Host config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Ignore clip boxes entirely
        #[arg(long)]
        no_clipping: bool,
    },
    /// Run the built-in clip-box demo: create, drag, update, spin
    Demo {
        /// Number of idle frames after the scripted input
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Host config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("scenegraph-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: empty scene nodes={}", SceneGraph::empty().node_count());
            println!("dispatch: {}", scenegraph_dispatch::crate_info());
            println!("  builtins: {}", BUILTIN_NAMES.join(", "));
            println!("render: {}", scenegraph_render::crate_info());
            println!("host: {}", scenegraph_host::crate_info());
            println!("tools: {}", scenegraph_tools::crate_info());
        }
        Commands::Validate { scene } => {
            let description = load_scene(&scene)?;
            let graph = SceneGraph::from_description(&description)
                .with_context(|| format!("building {}", scene.display()))?;
            println!("{}: OK", scene.display());
            println!("{}", GraphInspector::summary(&graph));
        }
        Commands::Inspect {
            scene,
            node,
            commands,
        } => {
            let mut host = load_host(&scene, HostConfig::default())?;
            if let Some(path) = commands {
                apply_commands(&mut host, &path)?;
            }
            match node {
                Some(id) => println!("{}", GraphInspector::inspect_node(host.graph(), &id)?),
                None => {
                    println!("{}", GraphInspector::summary(host.graph()));
                    print!("{}", GraphInspector::outline(host.graph()));
                }
            }
        }
        Commands::Render {
            scene,
            commands,
            frames,
            config,
            no_clipping,
        } => {
            let mut config = load_config(config.as_deref())?;
            if no_clipping {
                config.render.clipping_enabled = false;
            }
            let mut host = load_host(&scene, config)?;
            if let Some(path) = commands {
                apply_commands(&mut host, &path)?;
            }
            let mut renderer = DebugTextRenderer::new();
            print!("{}", host.render_once(&mut renderer));
            for _ in 1..frames {
                print!("{}", host.tick(&mut renderer)?);
            }
        }
        Commands::Demo { frames, config } => {
            let config = load_config(config.as_deref())?;
            let mut host = HostContext::from_description(&demo::scene()?, config)?;
            let mut recorder = RecordingRenderer::new();

            let commands = demo::commands()?;
            let (setup, update) = commands.split_at(commands.len().saturating_sub(1));
            host.dispatch_all(setup)?;
            host.render_once(&mut recorder);
            println!("After create: {}", frame_line(&recorder));

            host.handle_input(InputEvent::MouseDown { x: 200.0, y: 150.0 })?;
            host.handle_input(InputEvent::MouseMove { x: 230.0, y: 140.0 })?;
            host.handle_input(InputEvent::MouseUp)?;
            host.dispatch_all(update)?;
            host.render_once(&mut recorder);
            println!("After drag + update: {}", frame_line(&recorder));

            for _ in 0..frames {
                host.tick(&mut recorder)?;
            }
            println!("After {frames} idle frames: {}", frame_line(&recorder));
            println!("{}", GraphInspector::inspect_node(host.graph(), "yaw")?);
            println!("{}", GraphInspector::summary(host.graph()));
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> anyhow::Result<NodeDescription> {
    NodeDescription::load(path).with_context(|| format!("loading scene {}", path.display()))
}

fn load_host(path: &Path, config: HostConfig) -> anyhow::Result<HostContext> {
    HostContext::load(path, config).with_context(|| format!("loading scene {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HostConfig> {
    match path {
        Some(p) => HostConfig::load(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(HostConfig::default()),
    }
}

fn apply_commands(host: &mut HostContext, path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading commands {}", path.display()))?;
    let commands = Command::list_from_json(&text)
        .with_context(|| format!("parsing commands {}", path.display()))?;
    let applied = host.dispatch_all(&commands)?;
    tracing::info!(applied, "commands applied");
    Ok(())
}

fn frame_line(recorder: &RecordingRenderer) -> String {
    let Some(frame) = recorder.last() else {
        return "no frame".into();
    };
    let partial = frame
        .draws
        .iter()
        .filter(|d| d.containment == Containment::Partial)
        .count();
    format!(
        "frame={} draws={} partial={} culled={}",
        frame.frame,
        frame.draws.len(),
        partial,
        frame.culled
    )
}
