//! The live scene model.
//!
//! A scene is a tree of typed entities whose shape is described declaratively
//! by a [`Registry`]: each kind lists the fields it serializes and the child
//! slots it owns. Client code mutates entities through [`SceneTree`], which
//! records what changed since the last synchronization so that the
//! synchronizer only has to look at the changed region of the tree.

mod catalog;
mod entity;
mod field;
mod registry;
mod tree;
mod value;

pub use catalog::{ALTITUDE_MODES, COLOR_MODES, FLY_TO_MODES};
pub use entity::{EntityId, EntityRef, SyncState};
pub use field::*;
pub use registry::*;
pub use tree::*;
pub use value::*;

pub(crate) use entity::SlotContents;
