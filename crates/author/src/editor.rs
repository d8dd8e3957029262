use glam::Vec3;
use scenecore_common::EntityId;
use scenecore_kernel::{Entity, Scene};

/// Where an entity sits: the fields the editor's transform gizmo edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub size: Vec3,
    /// Degrees about +Y.
    pub rotation_y: f32,
}

impl Placement {
    pub fn of(entity: &Entity) -> Self {
        Self {
            position: entity.position,
            size: entity.size,
            rotation_y: entity.rotation_y,
        }
    }

    fn apply(&self, entity: &mut Entity) {
        entity.position = self.position;
        entity.size = self.size.max(Vec3::ZERO);
        entity.rotation_y = self.rotation_y;
    }
}

/// An editing command that can be applied to the scene and reversed.
///
/// Each command carries enough context to undo itself.
#[derive(Debug, Clone)]
pub enum EditCommand {
    /// Insert an entity at `index`. Undo = remove it.
    Add { index: usize, entity: Entity },
    /// Remove the entity that sat at `index`. Undo = re-insert it there.
    Remove { index: usize, entity: Entity },
    /// Move, resize or rotate an entity. Undo = restore the old placement.
    SetPlacement {
        id: EntityId,
        old: Placement,
        new: Placement,
    },
}

impl EditCommand {
    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::Add { index, entity } => Self::Remove {
                index: *index,
                entity: entity.clone(),
            },
            Self::Remove { index, entity } => Self::Add {
                index: *index,
                entity: entity.clone(),
            },
            Self::SetPlacement { id, old, new } => Self::SetPlacement {
                id: *id,
                old: *new,
                new: *old,
            },
        }
    }
}

/// Errors from edit operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}

/// Undo/redo history over a [`Scene`].
///
/// Edits made through the editor are recorded; edits made directly on the
/// scene are not, and undoing across them is the caller's concern.
#[derive(Debug, Default)]
pub struct Editor {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity to the scene.
    pub fn add(&mut self, scene: &mut Scene, entity: Entity) -> EntityId {
        let index = scene.entity_count();
        let id = scene.add_object(entity.clone());
        self.record(EditCommand::Add { index, entity });
        id
    }

    /// Remove an entity, remembering its position in the scene.
    pub fn remove(&mut self, scene: &mut Scene, id: EntityId) -> Result<Entity, EditError> {
        let index = scene.index_of(id).ok_or(EditError::EntityNotFound(id))?;
        let entity = scene
            .remove_object(id)
            .ok_or(EditError::EntityNotFound(id))?;
        self.record(EditCommand::Remove {
            index,
            entity: entity.clone(),
        });
        Ok(entity)
    }

    /// Set position, size and rotation in one undoable step.
    pub fn set_placement(
        &mut self,
        scene: &mut Scene,
        id: EntityId,
        new: Placement,
    ) -> Result<(), EditError> {
        let entity = scene.get_mut(id).ok_or(EditError::EntityNotFound(id))?;
        let old = Placement::of(entity);
        new.apply(entity);
        self.record(EditCommand::SetPlacement { id, old, new });
        Ok(())
    }

    /// Mark one entity as selected and clear the flag on the rest.
    /// Selection is view state and is not recorded.
    pub fn select(&self, scene: &mut Scene, id: Option<EntityId>) {
        let ids: Vec<EntityId> = scene.entities().iter().map(|e| e.id).collect();
        for other in ids {
            if let Some(entity) = scene.get_mut(other) {
                entity.selected = Some(other) == id;
            }
        }
    }

    /// Undo the last edit. Returns true if an operation was undone.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(cmd) = self.undo_stack.pop() else {
            return false;
        };
        apply_command(scene, &cmd.inverse());
        self.redo_stack.push(cmd);
        true
    }

    /// Redo the last undone edit. Returns true if an operation was redone.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(cmd) = self.redo_stack.pop() else {
            return false;
        };
        apply_command(scene, &cmd);
        self.undo_stack.push(cmd);
        true
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn record(&mut self, cmd: EditCommand) {
        tracing::debug!("edit: {}", describe(&cmd));
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
    }
}

fn describe(cmd: &EditCommand) -> String {
    match cmd {
        EditCommand::Add { index, entity } => {
            format!("add {} {} at {index}", entity.object_type, entity.id)
        }
        EditCommand::Remove { index, entity } => {
            format!("remove {} {} from {index}", entity.object_type, entity.id)
        }
        EditCommand::SetPlacement { id, .. } => format!("place {id}"),
    }
}

fn apply_command(scene: &mut Scene, cmd: &EditCommand) {
    match cmd {
        EditCommand::Add { index, entity } => {
            scene.insert_object_at(*index, entity.clone());
        }
        EditCommand::Remove { entity, .. } => {
            scene.remove_object(entity.id);
        }
        EditCommand::SetPlacement { id, new, .. } => {
            if let Some(entity) = scene.get_mut(*id) {
                new.apply(entity);
            }
        }
    }
}
