use anyhow::{Context, Result};
use clap::Parser;
use spacekit_assets::{AppConfig, DemoScene, FileShaderSource, build_demo_scene};
use spacekit_ecs::{CameraComponent, World};
use spacekit_input::{FlyController, InputState, Key};
use spacekit_render::{Renderer, ShaderSource};
use spacekit_render_wgpu::{EmbeddedShaders, GpuContext, WgpuBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "spacekit-desktop", about = "Spacekit demo viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON application config
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Scene state driven by the window.
struct Viewer {
    world: World,
    demo: DemoScene,
    input: InputState,
    controller: FlyController,
}

impl Viewer {
    fn new(config: &AppConfig, width: u32, height: u32) -> Result<Self> {
        let mut world = World::new();
        let model = match &config.model {
            Some(model) => Some(
                model
                    .load(&mut world)
                    .with_context(|| format!("loading model `{}`", model.name))?,
            ),
            None => None,
        };
        let mut camera = config.camera;
        camera.screen_width = width;
        camera.screen_height = height;
        let demo = build_demo_scene(&mut world, camera, model)?;
        Ok(Self {
            world,
            demo,
            input: InputState::new(),
            controller: config.controller,
        })
    }

    fn step_camera(&mut self) {
        if let Some(transform) = self.world.transform_mut(self.demo.camera_entity) {
            self.controller.apply(&self.input, transform);
        }
    }

    fn resize_camera(&mut self, width: u32, height: u32) {
        if let Some(camera) = self.world.component_mut::<CameraComponent>(self.demo.camera) {
            camera.set_screen_sizes(width, height);
        }
    }
}

struct GpuApp {
    config: AppConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<WgpuBackend>>,
    viewer: Option<Viewer>,
    /// First fatal error; returned from `main` after the loop exits.
    failure: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            viewer: None,
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Spacekit")
            .with_inner_size(PhysicalSize::new(
                self.config.renderer.width,
                self.config.renderer.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();

        let context = pollster::block_on(GpuContext::new(window.clone(), size.width, size.height))?;
        let backend = WgpuBackend::new(context);

        let mut renderer_config = self.config.renderer.clone();
        renderer_config.width = size.width;
        renderer_config.height = size.height;
        let shaders: Box<dyn ShaderSource> = match &self.config.shader_dir {
            Some(dir) => Box::new(FileShaderSource::new(dir)),
            None => Box::new(EmbeddedShaders),
        };
        let renderer = Renderer::create(backend, shaders.as_ref(), renderer_config)?;
        let viewer = Viewer::new(&self.config, size.width, size.height)?;

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.viewer = Some(viewer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failure.get_or_insert(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let result = match (&mut self.renderer, &self.viewer) {
            (Some(renderer), Some(viewer)) => renderer.render(&viewer.world, &viewer.demo.scene),
            _ => return,
        };
        match result {
            Ok(stats) => tracing::trace!(?stats, "frame"),
            Err(e) if e.is_fatal() => {
                self.fail(event_loop, e.into());
                return;
            }
            Err(e) => tracing::warn!("frame skipped: {e}"),
        }
        if let Some(viewer) = &mut self.viewer {
            viewer.step_camera();
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::ShiftLeft => Some(Key::Modifier),
        _ => None,
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e.context("initializing viewer"));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Focused(false) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.input.clear();
                }
            }
            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(renderer) = &mut self.renderer {
                    renderer.backend().resize_surface(size.width, size.height);
                    renderer.on_screen_resized(size.width, size.height);
                }
                if let Some(viewer) = &mut self.viewer {
                    viewer.resize_camera(size.width, size.height);
                }
                tracing::debug!(width = size.width, height = size.height, "window resized");
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let (Some(key), Some(viewer)) = (map_key(code), &mut self.viewer) {
                    viewer.input.set(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
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

    tracing::info!("spacekit-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
