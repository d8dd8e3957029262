//! Rendering adapter: renderer-agnostic geometry and frame math.
//!
//! Builds the procedural meshes, camera and light matrices, and the
//! per-frame [`FramePlan`] that GPU and text backends both consume.
//!
//! # Invariants
//! - Rendering cannot mutate the scene; plans borrow it immutably.
//! - Entities whose type has no mesh are skipped, never an error.
//! - The shadow pass and the camera pass draw the same items with the same model matrices.

pub mod camera;
pub mod config;
pub mod frame;
pub mod mesh;
mod renderer;

pub use camera::{CameraRig, LightRig};
pub use config::{ConfigError, EngineConfig, RenderConfig};
pub use frame::{DrawItem, FramePlan, model_matrix, normal_matrix, skybox_view};
pub use mesh::{MAX_SPHERE_DETAIL, MeshData, MeshKind, Vertex, build_mesh, mesh_kind_for};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
