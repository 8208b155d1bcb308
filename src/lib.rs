//! Incremental synchronization of live KML scene trees.
//!
//! Client code builds a [`SceneTree`] and mutates it freely. Each call to
//! [`synchronize`] produces either the complete document, the first time, or
//! an update document holding only the delete, create and change instructions
//! needed to bring a viewer's copy up to date.

#[cfg(test)]
mod tree_view;

mod config;
mod error;
mod live_session;
mod message_queue;
mod session_id;

pub mod markup;
pub mod scene;
pub mod serialize;
pub mod sync;

pub use crate::config::{ControlSettings, SyncSettings, DEFAULT_UPDATE_LIMIT};
pub use crate::error::{ConfigError, ErrorDisplay, RegistryError, Result, SyncError};
pub use crate::live_session::{LiveSession, Polled};
pub use crate::message_queue::MessageQueue;
pub use crate::scene::{EntityId, EntityRef, FieldValue, Registry, SceneTree, SyncState, TreeOptions};
pub use crate::session_id::SessionId;
pub use crate::sync::{synchronize, SyncOptions, SyncOutput, SyncReport, UpdateDocument};
