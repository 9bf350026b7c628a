//! Prism - FBX import demo
//!
//! Imports one FBX model, resolves its textures, and drives a spinning
//! model component through the lifecycle for a fixed number of frames.

mod cli;
mod settings;
mod spinner;

use std::env;

use anyhow::{Context, Result};
use clap::Parser;
use prism_assets::{AssetServer, ModelAsset};
use prism_core::{FrameTime, TimeConfig};
use prism_ecs::{Lifecycle, World};
use prism_render::{ShaderSources, Shape};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::Args;
use crate::settings::DemoSettings;
use crate::spinner::ModelSpinner;

const FRAME_DELTA: f32 = 1.0 / 60.0;
const ASPECT: f32 = 16.0 / 9.0;

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut settings, notes) = DemoSettings::load();
    settings.apply(&args);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;
    settings::report(&notes);

    info!("Starting Prism...");

    let model_path = settings
        .model_path
        .clone()
        .context("No model given: pass a path or set model_path in settings.toml")?;
    let base = env::current_dir().context("Failed to read working directory")?;
    let mut server = AssetServer::new(base).with_import_settings(settings.import);

    let handle = server
        .load_model(&model_path)
        .with_context(|| format!("Failed to import {}", model_path.display()))?;
    let textures = server.load_model_textures(handle);

    let model = server
        .get_model(handle)
        .context("Imported model vanished from the asset server")?;
    summarize(model, textures.len());

    let sources = match (&settings.vertex_shader, &settings.fragment_shader) {
        (Some(vertex), Some(fragment)) => ShaderSources::read(vertex, fragment)?,
        (None, None) => ShaderSources::builtin(),
        _ => {
            warn!("Only one shader configured, using the built-in pair");
            ShaderSources::builtin()
        }
    };
    let shape = Shape::from(model.clone());
    info!(
        "Shape ready: {} vertex bytes, {} index bytes, shaders {}+{} bytes, drawable: {}",
        shape.vertex_bytes().len(),
        shape.index_bytes().len(),
        sources.vertex.len(),
        sources.fragment.len(),
        shape.is_drawable()
    );

    let mut world = World::new();
    world.insert_resource(server);

    let mut lifecycle = Lifecycle::new();
    let spinner = lifecycle.spawn(&mut world, ModelSpinner::new(handle, ASPECT), true, None);

    let mut time = FrameTime::new(TimeConfig::default());
    for _ in 0..settings.frames {
        time.update(FRAME_DELTA);
        lifecycle.tick(&mut world, &mut time);
        lifecycle.draw(&mut world, &time);
    }

    // Disable, then finalize
    lifecycle.destroy(spinner);
    lifecycle.tick(&mut world, &mut time);
    lifecycle.tick(&mut world, &mut time);

    info!(
        "Simulated {} frames ({:.2}s), {} entities left",
        time.frame_count,
        time.total_time,
        world.entity_count()
    );
    Ok(())
}

fn summarize(model: &ModelAsset, textures_loaded: usize) {
    info!(
        "Imported '{}': {} vertices, {} triangles, {} UV points on '{}', vertex colors: {}",
        model.name,
        model.vertices.len(),
        model.triangle_count(),
        model.uv_points.len(),
        model.uv_set_name(),
        model.has_vertex_colors()
    );
    for texture in &model.textures {
        info!("  {:?} texture {} (UV set '{}')", texture.slot, texture.path, texture.uv_set);
    }
    info!("Loaded {}/{} textures", textures_loaded, model.textures.len());

    if model.report.is_clean() {
        info!("Import report: clean");
    } else {
        info!("Import report: {} warnings", model.report.warnings.len());
    }
}
