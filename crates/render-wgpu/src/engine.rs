use crate::error::RenderError;
use crate::renderer::{FrameStats, WgpuRenderer};
use crate::texture::TextureRegistry;
use glam::Vec3;
use scenecore_common::{EntityId, TextureHandle};
use scenecore_kernel::{Entity, ListenerId, Scene};
use scenecore_render::{CameraRig, EngineConfig, FramePlan, LightRig};
use std::path::Path;

/// Device and queue, owned by the windowing layer and lent to the engine.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Features the renderer uses when the adapter offers them.
    pub fn optional_features(adapter: &wgpu::Adapter) -> wgpu::Features {
        adapter.features() & wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER
    }
}

/// Scene, renderer and the resources they share, behind one handle.
pub struct Engine {
    scene: Scene,
    renderer: WgpuRenderer,
    textures: TextureRegistry,
    camera: CameraRig,
    light: LightRig,
}

impl Engine {
    /// Compile shaders, upload geometry and allocate the shadow map.
    pub fn initialize(
        gpu: &GpuContext,
        surface_format: wgpu::TextureFormat,
        config: &EngineConfig,
    ) -> Result<Self, RenderError> {
        let renderer = WgpuRenderer::new(&gpu.device, surface_format, &config.render)?;
        let textures = TextureRegistry::new(&gpu.device, &gpu.queue, &renderer.programs().layouts)?;
        tracing::info!("engine initialized");
        Ok(Self {
            scene: Scene::with_config(config.sim),
            renderer,
            textures,
            camera: config.render.camera,
            light: config.render.light,
        })
    }

    /// Advance physics and trigger detection by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> usize {
        self.scene.update(dt)
    }

    pub fn frame_plan(&self, width: u32, height: u32) -> FramePlan {
        FramePlan::build(&self.scene, &self.camera, &self.light, width, height)
    }

    /// Shadow pass, camera pass and skybox into `target`.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        target: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Result<FrameStats, RenderError> {
        let plan = self.frame_plan(width, height);
        self.renderer.render(gpu, target, &self.textures, &plan)
    }

    /// Resize the camera-pass depth buffer ahead of the next frame.
    pub fn resize(
        &mut self,
        gpu: &GpuContext,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        self.renderer.resize(&gpu.device, width, height)
    }

    pub fn add_object(&mut self, entity: Entity) -> EntityId {
        self.scene.add_object(entity)
    }

    pub fn remove_object(&mut self, id: EntityId) -> Option<Entity> {
        self.scene.remove_object(id)
    }

    pub fn entities(&self) -> &[Entity] {
        self.scene.entities()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn on_enter_trigger(
        &mut self,
        trigger: EntityId,
        callback: impl FnMut(&Entity, &Entity) + 'static,
    ) -> ListenerId {
        self.scene.on_enter_trigger(trigger, callback)
    }

    pub fn load_texture(
        &mut self,
        gpu: &GpuContext,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle, RenderError> {
        self.textures.load_texture(
            &gpu.device,
            &gpu.queue,
            &self.renderer.programs().layouts,
            path,
        )
    }

    pub fn load_cubemap<P: AsRef<Path>>(
        &mut self,
        gpu: &GpuContext,
        paths: &[P],
    ) -> Result<TextureHandle, RenderError> {
        self.textures.load_cubemap(
            &gpu.device,
            &gpu.queue,
            &self.renderer.programs().layouts,
            paths,
        )
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Upload decoded pixels directly, bypassing the file decoder.
    pub fn insert_texture(
        &mut self,
        gpu: &GpuContext,
        image: &scenecore_assets::DecodedImage,
    ) -> Result<TextureHandle, RenderError> {
        self.textures.insert_image(
            &gpu.device,
            &gpu.queue,
            &self.renderer.programs().layouts,
            image,
        )
    }

    pub fn set_skybox(&mut self, handle: TextureHandle) -> Result<(), RenderError> {
        self.renderer.set_skybox(&self.textures, handle)
    }

    pub fn clear_skybox(&mut self) {
        self.renderer.clear_skybox();
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn light(&self) -> &LightRig {
        &self.light
    }

    pub fn set_camera_pos(&mut self, position: Vec3) {
        self.camera.position = position;
    }

    pub fn set_light_pos(&mut self, position: Vec3) {
        self.light.position = position;
    }

    pub fn renderer(&self) -> &WgpuRenderer {
        &self.renderer
    }
}
