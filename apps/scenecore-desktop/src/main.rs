use anyhow::Result;
use clap::Parser;
use glam::Vec3;
use scenecore_assets::DecodedImage;
use scenecore_author::Editor;
use scenecore_common::{EntityId, ObjectType, TextureHandle};
use scenecore_kernel::{Entity, SceneEvent};
use scenecore_render::EngineConfig;
use scenecore_render_wgpu::{Engine, GpuContext};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Cubemap face files looked up in `--skybox-dir`, in upload order.
const SKYBOX_FACES: [&str; 6] = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];

#[derive(Parser)]
#[command(name = "scenecore-desktop", about = "Scenecore desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding px/nx/py/ny/pz/nz.png skybox faces
    #[arg(long)]
    skybox_dir: Option<PathBuf>,

    /// Image applied to the spawned boxes (a checkerboard when omitted)
    #[arg(long)]
    texture: Option<PathBuf>,
}

/// Orbit of the camera around the scene origin.
struct Orbit {
    yaw: f32,
    pitch: f32,
    distance: f32,
}

impl Orbit {
    fn from_position(position: Vec3) -> Self {
        let distance = position.length().max(2.0);
        Self {
            yaw: position.x.atan2(position.z).to_degrees(),
            pitch: (position.y / distance).clamp(-1.0, 1.0).asin().to_degrees(),
            distance,
        }
    }

    fn position(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.distance * Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos())
    }
}

/// Editor-side state: history, selection, input.
struct AppState {
    editor: Editor,
    selected: Option<EntityId>,
    keys_held: HashSet<KeyCode>,
    orbit: Orbit,
    spawned: u32,
    box_texture: Option<TextureHandle>,
    last_frame: Instant,
}

impl AppState {
    fn new(camera_position: Vec3) -> Self {
        Self {
            editor: Editor::new(),
            selected: None,
            keys_held: HashSet::new(),
            orbit: Orbit::from_position(camera_position),
            spawned: 0,
            box_texture: None,
            last_frame: Instant::now(),
        }
    }

    fn populate(&mut self, engine: &mut Engine) {
        let scene = engine.scene_mut();
        self.editor.add(
            scene,
            Entity::new(ObjectType::Box)
                .with_position(Vec3::new(0.0, -0.5, 0.0))
                .with_size(Vec3::new(20.0, 1.0, 20.0))
                .with_color(Vec3::splat(0.7)),
        );
        let mut crate_box = Entity::new(ObjectType::Box)
            .with_position(Vec3::new(-2.5, 3.0, 0.0))
            .with_rotation_y(30.0)
            .with_physics(Vec3::ZERO);
        if let Some(texture) = self.box_texture {
            crate_box = crate_box.with_texture(texture);
        }
        self.editor.add(scene, crate_box);
        self.editor.add(
            scene,
            Entity::new(ObjectType::Sphere)
                .with_position(Vec3::new(2.5, 5.0, 0.0))
                .with_size(Vec3::splat(1.5))
                .with_color(Vec3::new(1.0, 0.8, 0.2))
                .with_physics(Vec3::ZERO),
        );
        self.editor.add(
            scene,
            Entity::new(ObjectType::Triangle)
                .with_position(Vec3::new(0.0, 1.0, -4.0))
                .with_size(Vec3::splat(2.0))
                .with_color(Vec3::new(0.3, 0.9, 0.4)),
        );
        let death = self.editor.add(
            scene,
            Entity::trigger("Death")
                .with_position(Vec3::new(2.5, 0.5, 0.0))
                .with_size(Vec3::new(2.0, 1.0, 2.0)),
        );
        engine.on_enter_trigger(death, |trigger: &Entity, other: &Entity| {
            tracing::trace!("{} touched {}", other.id, trigger.trigger_type);
        });
    }

    fn spawn(&mut self, engine: &mut Engine) {
        self.spawned += 1;
        let x = ((self.spawned % 5) as f32 - 2.0) * 1.5;
        let entity = if self.spawned % 2 == 0 {
            Entity::new(ObjectType::Sphere).with_color(Vec3::new(0.9, 0.4, 0.9))
        } else {
            let mut entity = Entity::new(ObjectType::Box).with_color(Vec3::new(0.4, 0.7, 1.0));
            if let Some(texture) = self.box_texture {
                entity = entity.with_texture(texture);
            }
            entity
        };
        let id = self.editor.add(
            engine.scene_mut(),
            entity
                .with_position(Vec3::new(x, 8.0, 1.0))
                .with_rotation_y(self.spawned as f32 * 17.0)
                .with_physics(Vec3::ZERO),
        );
        self.select(engine, Some(id));
        tracing::info!("spawned entity {id}");
    }

    fn select(&mut self, engine: &mut Engine, id: Option<EntityId>) {
        self.selected = id;
        self.editor.select(engine.scene_mut(), id);
    }

    fn cycle_selection(&mut self, engine: &mut Engine) {
        let entities = engine.entities();
        if entities.is_empty() {
            return;
        }
        let next = match self.selected.and_then(|id| engine.scene().index_of(id)) {
            Some(i) => (i + 1) % entities.len(),
            None => 0,
        };
        let id = entities[next].id;
        self.select(engine, Some(id));
        tracing::info!("selected {id}");
    }

    fn handle_key(&mut self, engine: &mut Engine, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
            return;
        }
        let ctrl = self.keys_held.contains(&KeyCode::ControlLeft)
            || self.keys_held.contains(&KeyCode::ControlRight);

        match key {
            KeyCode::Space => self.spawn(engine),
            KeyCode::Tab => self.cycle_selection(engine),
            KeyCode::Escape => self.select(engine, None),
            KeyCode::Delete | KeyCode::Backspace => {
                if let Some(id) = self.selected.take() {
                    match self.editor.remove(engine.scene_mut(), id) {
                        Ok(entity) => tracing::info!("deleted {} {id}", entity.object_type),
                        Err(e) => tracing::warn!("delete failed: {e}"),
                    }
                }
            }
            KeyCode::KeyZ if ctrl => {
                if self.editor.undo(engine.scene_mut()) {
                    tracing::info!("undo ({} left)", self.editor.undo_count());
                }
            }
            KeyCode::KeyY if ctrl => {
                if self.editor.redo(engine.scene_mut()) {
                    tracing::info!("redo ({} left)", self.editor.redo_count());
                }
            }
            KeyCode::KeyL => {
                let light = engine.light().position;
                let rotated = glam::Quat::from_rotation_y(15f32.to_radians()) * light;
                engine.set_light_pos(rotated);
                tracing::info!("light at ({:.1}, {:.1}, {:.1})", rotated.x, rotated.y, rotated.z);
            }
            _ => {}
        }
    }

    /// Apply held orbit keys and step the simulation.
    fn update(&mut self, engine: &mut Engine) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        let rate = 60.0 * dt;
        if self.keys_held.contains(&KeyCode::ArrowLeft) {
            self.orbit.yaw -= rate;
        }
        if self.keys_held.contains(&KeyCode::ArrowRight) {
            self.orbit.yaw += rate;
        }
        if self.keys_held.contains(&KeyCode::ArrowUp) {
            self.orbit.pitch = (self.orbit.pitch + rate).min(85.0);
        }
        if self.keys_held.contains(&KeyCode::ArrowDown) {
            self.orbit.pitch = (self.orbit.pitch - rate).max(-10.0);
        }
        if self.keys_held.contains(&KeyCode::PageUp) {
            self.orbit.distance = (self.orbit.distance - 10.0 * dt).max(2.0);
        }
        if self.keys_held.contains(&KeyCode::PageDown) {
            self.orbit.distance = (self.orbit.distance + 10.0 * dt).min(80.0);
        }
        engine.set_camera_pos(self.orbit.position());

        engine.update(dt);
        for event in engine.scene_mut().drain_events() {
            if let SceneEvent::TriggerEntered {
                trigger,
                other,
                trigger_type,
            } = event
            {
                tracing::debug!("{other} inside {trigger_type} trigger {trigger}");
            }
        }
    }
}

/// 8x8 two-tone checkerboard used when no texture file is given.
fn checkerboard() -> DecodedImage {
    let size = 64u32;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / 8) + (y / 8)) % 2 == 0;
            let v = if light { 235 } else { 90 };
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
    }
    DecodedImage {
        width: size,
        height: size,
        rgba,
    }
}

struct GpuApp {
    cli: Cli,
    config: EngineConfig,
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    gpu: Option<GpuContext>,
    surface_config: Option<wgpu::SurfaceConfiguration>,
    engine: Option<Engine>,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(cli: Cli, config: EngineConfig) -> Self {
        Self {
            cli,
            config,
            state: AppState::new(config.render.camera.position),
            window: None,
            surface: None,
            gpu: None,
            surface_config: None,
            engine: None,
            fatal: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Scenecore")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow::anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("scenecore_device"),
                required_features: GpuContext::optional_features(&adapter),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;
        device.on_uncaptured_error(Box::new(|err| {
            tracing::error!("uncaptured GPU error: {err}");
        }));
        let gpu = GpuContext::new(device, queue);

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &surface_config);

        let mut engine = Engine::initialize(&gpu, format, &self.config)?;
        self.state.box_texture = Some(match &self.cli.texture {
            Some(path) => engine.load_texture(&gpu, path)?,
            None => engine.insert_texture(&gpu, &checkerboard())?,
        });
        if let Some(dir) = &self.cli.skybox_dir {
            let faces: Vec<PathBuf> = SKYBOX_FACES.iter().map(|f| dir.join(f)).collect();
            let cubemap = engine.load_cubemap(&gpu, &faces)?;
            engine.set_skybox(cubemap)?;
        }
        self.state.populate(&mut engine);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
        tracing::info!("Space: spawn | Tab: select | Del: delete | Ctrl+Z/Y: undo/redo | arrows: orbit | L: light");

        self.window = Some(window);
        self.surface = Some(surface);
        self.gpu = Some(gpu);
        self.surface_config = Some(surface_config);
        self.engine = Some(engine);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(surface), Some(gpu), Some(config), Some(engine)) = (
            &self.surface,
            &self.gpu,
            &self.surface_config,
            &mut self.engine,
        ) else {
            return;
        };

        self.state.update(engine);

        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(&gpu.device, config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => {
                tracing::warn!("skipping frame: {e}");
                return;
            }
        };
        let view = frame.texture.create_view(&Default::default());
        if let Err(err) = engine.render(gpu, &view, config.width, config.height) {
            tracing::error!("render failed: {err}");
            self.fatal = Some(err.into());
            event_loop.exit();
            return;
        }
        frame.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_gpu(event_loop) {
            tracing::error!("initialization failed: {err:#}");
            self.fatal = Some(err);
            event_loop.exit();
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
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(gpu), Some(config), Some(engine)) = (
                    &self.surface,
                    &self.gpu,
                    &mut self.surface_config,
                    &mut self.engine,
                ) {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(&gpu.device, config);
                    if let Err(err) = engine.resize(gpu, config.width, config.height) {
                        tracing::error!("resize failed: {err}");
                        self.fatal = Some(err.into());
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(engine) = &mut self.engine {
                    self.state
                        .handle_key(engine, key, key_state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = EngineConfig::load_or_default(cli.config.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli, config);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
