//! Headless stand-in for a drawn model: spins it and logs what a renderer
//! would upload.

use prism_assets::{AssetHandle, AssetServer, ModelAsset};
use prism_core::{Quat, Transform};
use prism_ecs::{Behaviour, Context};
use prism_render::{FrameUniforms, RenderState};
use tracing::{debug, info, trace, warn};

pub struct ModelSpinner {
    model: AssetHandle<ModelAsset>,
    state: RenderState,
    aspect: f32,
    triangles: usize,
    draws: u64,
}

impl ModelSpinner {
    pub fn new(model: AssetHandle<ModelAsset>, aspect: f32) -> Self {
        Self {
            model,
            state: RenderState::default(),
            aspect,
            triangles: 0,
            draws: 0,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Behaviour for ModelSpinner {
    fn initialize(&mut self, ctx: &mut Context<'_>) {
        let model = ctx
            .world
            .resource::<AssetServer>()
            .and_then(|server| server.get_model(self.model));
        match model {
            Some(model) => {
                self.triangles = model.triangle_count();
                info!(
                    "Spinning '{}' ({} triangles) on {}",
                    model.name, self.triangles, ctx.entity
                );
            }
            None => warn!("{:?} is not loaded, nothing to spin", self.model),
        }
        if let Err(e) = ctx.world.insert(ctx.entity, Transform::default()) {
            warn!("Spinner has no transform: {}", e);
        }
    }

    fn update(&mut self, ctx: &mut Context<'_>) {
        trace!("Frame {} dt={:.4}", ctx.time.frame_count, ctx.time.delta_time);
    }

    fn draw(&mut self, ctx: &mut Context<'_>) {
        if self.triangles == 0 {
            return;
        }
        let angle = self.state.advance();
        self.draws += 1;
        if let Some(transform) = ctx.world.get_mut::<Transform>(ctx.entity) {
            transform.rotation = Quat::from_rotation_y(angle);
        }
        let uniforms = FrameUniforms::new(&self.state, prism_render::projection(self.aspect));
        trace!("model_view = {:?}", uniforms.model_view);
    }

    fn finalize(&mut self, _ctx: &mut Context<'_>) {
        debug!("Spinner drew {} frames, final angle {:.3}", self.draws, self.state.angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::FrameTime;
    use prism_ecs::{Lifecycle, World};
    use std::fs;
    use std::path::Path;

    const TRIANGLE: &str = r#"
Objects:  {
	Geometry: 1, "Geometry::Tri", "Mesh" {
		Vertices: *9 {
			a: 0,0,0,1,0,0,0,1,0
		}
		PolygonVertexIndex: *3 {
			a: 0,1,-3
		}
	}
}
"#;

    fn run(world: &mut World, handle: AssetHandle<ModelAsset>, frames: usize) -> (u64, f32) {
        // Drive the behaviour directly so its counters stay observable.
        let mut spinner = ModelSpinner::new(handle, 1.0);
        let time = FrameTime::default();
        let entity = world.spawn();
        let mut ctx = Context {
            world,
            entity,
            parent: None,
            time: &time,
        };
        spinner.initialize(&mut ctx);
        for _ in 0..frames {
            spinner.update(&mut ctx);
            spinner.draw(&mut ctx);
        }
        (spinner.draws(), spinner.state().angle)
    }

    fn load_triangle(name: &str) -> (AssetServer, AssetHandle<ModelAsset>, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("prism-spinner-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("tri.fbx"), TRIANGLE).unwrap();
        let mut server = AssetServer::new(&dir);
        let handle = server.load_model(Path::new("tri.fbx")).unwrap();
        (server, handle, dir)
    }

    #[test]
    fn loaded_models_spin_once_per_draw() {
        let (server, handle, dir) = load_triangle("loaded");
        let mut world = World::new();
        world.insert_resource(server);

        let (draws, angle) = run(&mut world, handle, 3);
        assert_eq!(draws, 3);
        assert!((angle - 3.0 * prism_render::scene::DEFAULT_SPEED).abs() < 1e-6);

        let spinning = world.entities_with::<Transform>();
        assert_eq!(spinning.len(), 1);
        let rotation = world.get::<Transform>(spinning[0]).unwrap().rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(angle), 1e-6));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn models_missing_from_the_server_are_not_drawn() {
        let (_other, handle, dir) = load_triangle("missing");
        let mut world = World::new();
        world.insert_resource(AssetServer::new("/nonexistent"));
        assert_eq!(run(&mut world, handle, 2), (0, 0.0));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn lifecycle_drives_the_spinner_to_completion() {
        let (server, handle, dir) = load_triangle("lifecycle");
        let mut world = World::new();
        world.insert_resource(server);
        let mut lifecycle = Lifecycle::new();
        let entity = lifecycle.spawn(&mut world, ModelSpinner::new(handle, 1.0), true, None);
        let mut time = FrameTime::default();
        for _ in 0..5 {
            time.update(1.0 / 60.0);
            lifecycle.tick(&mut world, &mut time);
            lifecycle.draw(&mut world, &time);
        }
        assert_eq!(lifecycle.state(entity), Some(prism_ecs::ComponentState::Update));
        lifecycle.destroy(entity);
        lifecycle.tick(&mut world, &mut time);
        lifecycle.tick(&mut world, &mut time);
        assert!(lifecycle.is_empty());
        assert!(!world.is_alive(entity));
        let _ = fs::remove_dir_all(&dir);
    }
}
