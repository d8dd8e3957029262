use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an entity placed in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines and debug dumps.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Handle to a GPU texture owned by the render backend's texture registry.
///
/// Handles are dense indices in load order. An entity without a handle
/// renders untextured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Kind of placed object. Decides which cached mesh, if any, draws it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Box,
    Sphere,
    Triangle,
    PlayerSpawn,
    Trigger,
    Circle,
}

impl ObjectType {
    pub const ALL: [ObjectType; 6] = [
        ObjectType::Box,
        ObjectType::Sphere,
        ObjectType::Triangle,
        ObjectType::PlayerSpawn,
        ObjectType::Trigger,
        ObjectType::Circle,
    ];

    pub fn is_trigger(self) -> bool {
        matches!(self, ObjectType::Trigger)
    }

    pub fn label(self) -> &'static str {
        match self {
            ObjectType::Box => "Box",
            ObjectType::Sphere => "Sphere",
            ObjectType::Triangle => "Triangle",
            ObjectType::PlayerSpawn => "PlayerSpawn",
            ObjectType::Trigger => "Trigger",
            ObjectType::Circle => "Circle",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}
