use std::{error::Error, fmt, io, path::PathBuf};

use thiserror::Error;

use crate::scene::EntityId;

/// Errors raised while mutating a scene tree or synchronizing it.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("entity {id} is no longer live")]
    NotLive { id: EntityId },

    #[error("entity {id} already has an owner")]
    AlreadyOwned { id: EntityId },

    #[error("entity {id} is not owned by {parent}")]
    NotOwned { id: EntityId, parent: EntityId },

    #[error("inserting {id} under {parent} would create a cycle")]
    WouldCycle { id: EntityId, parent: EntityId },

    #[error("the root entity {id} cannot be removed")]
    CannotRemoveRoot { id: EntityId },

    #[error("unknown entity kind {name:?}")]
    UnknownKind { name: String },

    #[error("entity kind {name} is abstract and cannot be instantiated")]
    AbstractKind { name: &'static str },

    #[error("{kind} has no child slot named {slot:?}")]
    UnknownSlot { kind: &'static str, slot: String },

    #[error("child slot {kind}.{slot} {reason}")]
    SlotMismatch {
        kind: &'static str,
        slot: &'static str,
        reason: &'static str,
    },

    #[error("child slot {kind}.{slot} does not accept {child}")]
    ChildKindRejected {
        kind: &'static str,
        slot: &'static str,
        child: &'static str,
    },

    #[error("index {index} is out of range for {kind}.{slot} (length {len})")]
    IndexOutOfRange {
        kind: &'static str,
        slot: &'static str,
        index: usize,
        len: usize,
    },

    #[error("field {kind}.{field} is fixed after the entity has been synchronized")]
    FixedField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("{value:?} is not a valid value for {kind}.{field} (expected one of {allowed:?})")]
    InvalidSymbol {
        kind: &'static str,
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("field {kind}.{field} requires a finite numeric value")]
    InvalidValue {
        kind: &'static str,
        field: &'static str,
    },

    #[error("failed to write markup")]
    Markup {
        #[from]
        source: xml::writer::Error,
    },
}

/// Errors raised while building a [`Registry`](crate::scene::Registry).
///
/// These are programmer errors in a kind catalog and are reported when the
/// registry is built, never during synchronization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("entity kind {name} was registered twice")]
    DuplicateKind { name: &'static str },

    #[error("entity kind {name} extends {base}, which has not been registered before it")]
    UnknownBase {
        name: &'static str,
        base: &'static str,
    },

    #[error("entity kind {kind} declares field {field} more than once")]
    DuplicateField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("entity kind {kind} declares child slot {slot} more than once, or over a field")]
    DuplicateSlot {
        kind: &'static str,
        slot: &'static str,
    },

    #[error("child slot {kind}.{slot} accepts {accepts}, which is not a registered kind")]
    UnknownAcceptedKind {
        kind: &'static str,
        slot: &'static str,
        accepts: &'static str,
    },

    #[error("field {kind}.{field} is enumerated but declares no symbols")]
    EmptySymbolSet {
        kind: &'static str,
        field: &'static str,
    },
}

/// Errors raised while loading [`SyncSettings`](crate::SyncSettings).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings file {}", .path.display())]
    Io { source: io::Error, path: PathBuf },

    #[error("malformed settings file {}", .path.display())]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

/// Wrapper type to print errors with source-chasing.
pub struct ErrorDisplay<E>(pub E);

impl<E: Error> fmt::Display for ErrorDisplay<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        writeln!(formatter, "{}", self.0)?;

        let mut current_err: &dyn Error = &self.0;
        while let Some(source) = current_err.source() {
            writeln!(formatter, "  caused by {}", source)?;
            current_err = source;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_chases_sources() {
        let err = ConfigError::Io {
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            path: PathBuf::from("/tmp/livekml.json"),
        };

        let rendered = ErrorDisplay(err).to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "could not read settings file /tmp/livekml.json");
        assert_eq!(lines[1], "  caused by no such file");
    }
}
