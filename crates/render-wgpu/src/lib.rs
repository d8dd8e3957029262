//! wgpu render backend for scenecore.
//!
//! Draws a [`scenecore_render::FramePlan`] in two passes: a depth-only pass
//! from the light into the shadow map, then a lit camera pass that samples
//! it, followed by an optional cubemap skybox.
//!
//! # Invariants
//! - Rendering never mutates the scene.
//! - GPU resources are created once at initialization; only the camera depth
//!   buffer follows the output size.
//! - Shader and render target failures surface as [`RenderError`], never a panic.

mod engine;
mod error;
mod geometry;
mod programs;
mod renderer;
mod shaders;
mod shadow;
mod texture;
mod uniforms;

pub use engine::{Engine, GpuContext};
pub use error::RenderError;
pub use geometry::{GeometryCache, GpuMesh};
pub use programs::{BindLayouts, ShaderPrograms};
pub use renderer::{FramePhase, FrameStats, MAX_OBJECTS, WgpuRenderer};
pub use shaders::{DEPTH_SHADER, LIT_SHADER, SKYBOX_SHADER};
pub use shadow::ShadowTarget;
pub use texture::{TextureKind, TextureRegistry};
