use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

use super::{FieldValue, KindId, KindInfo, SceneTree};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an entity. Identities are never reused, so a
/// stale id always fails lookup instead of resolving to a newer entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub(crate) fn new() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "e{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncState {
    /// Exists locally but has never been part of a synchronization output.
    Created,

    /// Rendered at least once. Mutations now produce change instructions.
    Active,

    /// Removed by the client. Emitted once as a delete, then pruned.
    Deleted,
}

/// Non-owning link from a child to the entity holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParentLink {
    pub id: EntityId,
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SlotContents {
    Single(Option<EntityId>),
    Many {
        members: Vec<EntityId>,

        /// Set when a structural collection changed after it was synchronized;
        /// the whole collection is deleted and recreated next cycle.
        reemit: bool,
    },
}

impl SlotContents {
    pub fn ids(&self) -> &[EntityId] {
        match self {
            SlotContents::Single(Some(id)) => std::slice::from_ref(id),
            SlotContents::Single(None) => &[],
            SlotContents::Many { members, .. } => members,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Entity {
    pub id: EntityId,
    pub kind: KindId,
    pub state: SyncState,
    pub parent: Option<ParentLink>,

    /// Values indexed by the kind's field list.
    pub values: Vec<Option<FieldValue>>,

    /// Attributes with no field descriptor. They are stored for client code
    /// but never serialized or tracked.
    pub helpers: HashMap<String, FieldValue>,

    /// Indices of fields mutated since the last synchronization.
    pub dirty: BTreeSet<usize>,

    /// Something strictly below this entity needs synchronizing: a dirty or
    /// created descendant, a pending delete, or a flagged slot.
    pub dirty_descendants: bool,

    /// Contents indexed by the kind's slot list.
    pub slots: Vec<SlotContents>,

    /// Removed children awaiting their delete instruction.
    pub pending_deletes: Vec<EntityId>,

    /// Moved within a non-structural collection after synchronization.
    pub repositioned: bool,
}

impl Entity {
    pub fn new(kind: &KindInfo) -> Self {
        Entity {
            id: EntityId::new(),
            kind: kind.id(),
            state: SyncState::Created,
            parent: None,
            values: vec![None; kind.fields().len()],
            helpers: HashMap::new(),
            dirty: BTreeSet::new(),
            dirty_descendants: false,
            slots: kind
                .slots()
                .iter()
                .map(|slot| {
                    if slot.is_collection() {
                        SlotContents::Many {
                            members: Vec::new(),
                            reemit: false,
                        }
                    } else {
                        SlotContents::Single(None)
                    }
                })
                .collect(),
            pending_deletes: Vec::new(),
            repositioned: false,
        }
    }

    /// Whether the synchronizer has to look at this entity at all.
    pub fn needs_visit(&self) -> bool {
        self.state != SyncState::Active
            || !self.dirty.is_empty()
            || self.dirty_descendants
            || self.repositioned
    }

    pub fn children(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().flat_map(|slot| slot.ids().iter().copied())
    }

    /// Forgets everything that has been synchronized about this entity.
    pub fn reset_sync_state(&mut self) {
        self.state = SyncState::Created;
        self.dirty.clear();
        self.dirty_descendants = false;
        self.repositioned = false;

        for slot in &mut self.slots {
            if let SlotContents::Many { reemit, .. } = slot {
                *reemit = false;
            }
        }
    }
}

/// Read-only view of an entity in a [`SceneTree`].
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'a> {
    pub(crate) tree: &'a SceneTree,
    pub(crate) entity: &'a Entity,
    pub(crate) kind: &'a KindInfo,
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn kind(&self) -> &'a KindInfo {
        self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn state(&self) -> SyncState {
        self.entity.state
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.entity.parent.map(|link| link.id)
    }

    /// The value of a registered field, or `None` if the field is unset or
    /// not registered on this kind.
    pub fn value(&self, name: &str) -> Option<&'a FieldValue> {
        let index = self.kind.field_index(name)?;
        self.entity.values[index].as_ref()
    }

    pub fn helper(&self, name: &str) -> Option<&'a FieldValue> {
        self.entity.helpers.get(name)
    }

    /// Names of the fields that will appear in this entity's next change
    /// instruction, in registry order.
    pub fn dirty_field_names(&self) -> Vec<&'static str> {
        let fields = self.kind.fields();
        self.entity
            .dirty
            .iter()
            .map(|&index| fields[index].name)
            .collect()
    }

    pub fn has_dirty_descendant(&self) -> bool {
        self.entity.dirty_descendants
    }

    /// The children held in the named slot. Empty if the slot does not exist.
    pub fn slot(&self, name: &str) -> &'a [EntityId] {
        match self.kind.slot_index(name) {
            Some(index) => self.entity.slots[index].ids(),
            None => &[],
        }
    }

    /// All children in slot declaration order, then collection order.
    pub fn children(&self) -> impl Iterator<Item = EntityRef<'a>> + 'a {
        let tree = self.tree;
        self.entity
            .children()
            .filter_map(move |id| tree.get(id).ok())
    }
}
