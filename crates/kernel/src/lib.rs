//! Scene kernel: the entity list, per-frame physics, and trigger detection.
//!
//! # Invariants
//! - The scene exclusively owns its entities; only the editor adds or removes them.
//! - Physics entities never rest below `floor_y + size.y / 2` after a step.
//! - Triggers re-fire every frame an overlap persists.
//! - Renderers borrow the scene immutably.

pub mod entity;
pub mod physics;
pub mod scene;
pub mod trigger;

pub use entity::{DEATH_COLOR, DEATH_TRIGGER, Entity};
pub use physics::{Aabb, SimConfig, integrate, is_colliding};
pub use scene::{Scene, SceneEvent};
pub use trigger::{ListenerId, TriggerCallback, TriggerListeners};
