use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use modelview_core::normalize;
use modelview_engine::http_adapter::ReqwestTransport;
use modelview_engine::loader::FileModelLoader;
use modelview_engine::session::SessionStatus;
use modelview_engine::{
    parse_model, ActionGateway, CustomizeOptions, FrameState, MemoryScene, MemoryStore, ModelFile,
    SceneGraph, TracingStatus, Viewer, ViewerConfig,
};

#[derive(Parser)]
#[command(name = "modelview")]
#[command(about = "Model Viewer Pipeline")]
struct Cli {
    /// Viewer configuration (JSON). Missing fields take their defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a glTF/GLB file and print its bounds and display fit as JSON
    Inspect {
        file: PathBuf,
    },

    /// Load a model by name through the viewer and report the resulting frame
    View {
        /// File name inside the model directory (e.g. "sofa.glb")
        name: String,
        /// Local directory backing the model directory
        #[arg(short, long, default_value = "static/models")]
        assets: PathBuf,
        /// Zoom steps to apply afterwards; negative zooms out
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        zoom: i32,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
    },

    /// List the models the server knows about
    Models {
        #[arg(short, long, default_value = "http://localhost:5000")]
        server: String,
    },

    /// Upload a model and display the stored copy
    Upload {
        file: PathBuf,
        #[arg(short, long, default_value = "http://localhost:5000")]
        server: String,
        #[arg(short, long, default_value = "static/models")]
        assets: PathBuf,
    },

    /// Request a customized model and display the result
    Customize {
        #[arg(short, long, default_value = "http://localhost:5000")]
        server: String,
        #[arg(short, long, default_value = "static/models")]
        assets: PathBuf,
        /// Model to customize; defaults to the configured default model
        #[arg(short, long)]
        model: Option<String>,
        #[arg(long, default_value = "#ffffff")]
        color: String,
        #[arg(long, default_value = "1.0")]
        scale: String,
        /// Texture description passed to the server
        #[arg(long, default_value = "")]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    match cli.command {
        Commands::Inspect { file } => inspect(&file)?,

        Commands::View {
            name,
            assets,
            zoom,
            width,
            height,
        } => {
            let viewer = build_viewer(&config, assets);
            let gateway = ActionGateway::new(ReqwestTransport::new(), &config);
            viewer.borrow_mut().resize(width, height);

            gateway.select_existing(&viewer, &name);
            settle(&viewer)?;

            for _ in 0..zoom.unsigned_abs() {
                if zoom > 0 {
                    viewer.borrow_mut().zoom_in();
                } else {
                    viewer.borrow_mut().zoom_out();
                }
            }
            let frame = viewer.borrow_mut().frame();
            print_frame(&viewer.borrow(), &frame);
        }

        Commands::Models { server } => {
            config.api.base_url = server;
            let viewer = build_viewer(&config, PathBuf::from("."));
            let gateway = ActionGateway::new(ReqwestTransport::new(), &config);

            let models = gateway.list_models(&viewer).await?;
            println!("{} model(s):", models.len());
            for entry in models {
                println!("  {:<32} {}", entry.name, entry.url);
            }
        }

        Commands::Upload {
            file,
            server,
            assets,
        } => {
            config.api.base_url = server;
            let viewer = build_viewer(&config, assets);
            let gateway = ActionGateway::new(ReqwestTransport::new(), &config);

            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            gateway.upload(&viewer, ModelFile::new(name, bytes)).await?;
            let frame = settle(&viewer)?;
            print_frame(&viewer.borrow(), &frame);
        }

        Commands::Customize {
            server,
            assets,
            model,
            color,
            scale,
            prompt,
        } => {
            config.api.base_url = server;
            let viewer = build_viewer(&config, assets);
            let gateway = ActionGateway::new(ReqwestTransport::new(), &config);

            let options = CustomizeOptions {
                color,
                scale,
                texture_prompt: prompt,
                model_filename: model,
            };
            gateway.customize(&viewer, options).await?;
            let frame = settle(&viewer)?;
            print_frame(&viewer.borrow(), &frame);
        }
    }

    Ok(())
}

fn build_viewer(config: &ViewerConfig, assets: PathBuf) -> RefCell<Viewer> {
    info!("Serving {} from {}", config.model_dir, assets.display());
    let loader = FileModelLoader::new(assets, config.model_dir.clone());

    RefCell::new(Viewer::new(
        config.clone(),
        Box::new(MemoryScene::new()),
        Box::new(MemoryStore::new()),
        Box::new(loader),
        Box::new(TracingStatus),
    ))
}

/// Run a single frame. Disk loads queue all their events synchronously, so
/// one tick resolves the current session.
fn settle(viewer: &RefCell<Viewer>) -> Result<FrameState> {
    let frame = viewer.borrow_mut().frame();

    let viewer = viewer.borrow();
    if let Some(session) = viewer.sessions().current() {
        if let SessionStatus::Failed(err) = session.status() {
            anyhow::bail!("{}: {}", session.resource(), err);
        }
    }
    Ok(frame)
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let scene = parse_model(&bytes)?;

    let bounds = scene.local_bounds();
    let fit = normalize(&bounds);
    let extent = (!bounds.is_empty()).then(|| {
        json!({
            "min": bounds.min,
            "max": bounds.max,
            "size": bounds.size(),
            "center": bounds.center(),
        })
    });

    let report = json!({
        "file": path.display().to_string(),
        "root": scene.name.as_deref(),
        "nodes": scene.node_count(),
        "meshes": scene.mesh_count(),
        "bounds": extent,
        "fit": fit,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_frame(viewer: &Viewer, frame: &FrameState) {
    let camera = viewer.camera();
    let eye = camera.eye();

    match &frame.displayed {
        Some(resource) => println!("Displayed: {}", resource),
        None => println!("Displayed: <none>"),
    }
    println!("Loading:   {}", frame.loading);
    println!("Surface:   {}x{} (aspect {:.3})", frame.surface.width, frame.surface.height, frame.aspect);
    println!("Camera:    distance {:.2}, eye ({:.2}, {:.2}, {:.2})", camera.distance(), eye.x, eye.y, eye.z);
    println!("Scene:     {} node(s)", viewer.viewport().scene().node_count());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_zoom_parses() {
        let cli = Cli::try_parse_from(["modelview", "view", "sofa.glb", "--zoom", "-3"]).unwrap();
        match cli.command {
            Commands::View { zoom, name, .. } => {
                assert_eq!(zoom, -3);
                assert_eq!(name, "sofa.glb");
            }
            _ => panic!("expected view"),
        }
    }
}
