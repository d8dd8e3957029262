//! Shared types used across the scene kernel, renderers, and editor.

mod types;

pub use types::{EntityId, ObjectType, TextureHandle};
