//! Scene authoring: reversible edits for the editor layer.
//!
//! # Invariants
//! - Every edit made through [`Editor`] can be undone and redone.
//! - Undoing a removal restores the entity at its original index, so draw
//!   order survives the round trip. Trigger listeners are not restored.

mod editor;

pub use editor::{EditCommand, EditError, Editor, Placement};
