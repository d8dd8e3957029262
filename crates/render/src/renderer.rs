use crate::camera::{CameraRig, LightRig};
use crate::frame::FramePlan;
use scenecore_kernel::Scene;

/// Camera, light and output size for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderView {
    pub camera: CameraRig,
    pub light: LightRig,
    pub width: u32,
    pub height: u32,
}

impl RenderView {
    pub fn plan(&self, scene: &Scene) -> FramePlan {
        FramePlan::build(scene, &self.camera, &self.light, self.width, self.height)
    }
}

/// Renderer-agnostic interface for backends that need nothing beyond the
/// scene and a view.
///
/// The renderer reads scene state and produces output. It never mutates
/// the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&mut self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Text dump of a frame plan, for the CLI and for logs.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, view: &RenderView) -> String {
        self.frames += 1;
        let plan = view.plan(scene);

        let mut out = String::new();
        let c = plan.camera_position;
        let l = plan.light_position;
        out.push_str(&format!(
            "=== Scene (tick={}, frame={}) {}x{} ===\n",
            scene.tick(),
            self.frames,
            plan.width,
            plan.height
        ));
        out.push_str(&format!(
            "Entities: {} drawn={} skipped={}\n",
            scene.entity_count(),
            plan.draws.len(),
            plan.skipped.len()
        ));
        out.push_str(&format!("Camera: ({:.1}, {:.1}, {:.1})\n", c.x, c.y, c.z));
        out.push_str(&format!("Light: ({:.1}, {:.1}, {:.1})\n", l.x, l.y, l.z));

        for entity in scene.entities() {
            let p = entity.position;
            let status = if plan.skipped.contains(&entity.id) {
                "skip"
            } else {
                "draw"
            };
            out.push_str(&format!(
                "  [{}] {} {:<11} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2})",
                entity.id,
                status,
                entity.object_type,
                p.x,
                p.y,
                p.z,
                entity.color.x,
                entity.color.y,
                entity.color.z
            ));
            if entity.is_trigger() {
                out.push_str(&format!(" trigger={}", entity.trigger_type));
            }
            out.push('\n');
        }

        out
    }
}
