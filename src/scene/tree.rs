use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

use super::{
    entity::{Entity, ParentLink, SlotContents},
    EntityId, EntityRef, FieldDescriptor, FieldRule, FieldValue, KindInfo, Registry, SyncState,
};

/// Behavior switches for a [`SceneTree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeOptions {
    /// Ignore assignments that leave a field's value unchanged. When false,
    /// every assignment to a tracked field of a synchronized entity produces a
    /// change instruction.
    pub suppress_equal_writes: bool,
}

/// A live tree of scene entities plus the bookkeeping needed to synchronize
/// it incrementally.
///
/// Entities live in an arena keyed by [`EntityId`]. Ownership flows from
/// parent slots to children; the link from a child back to its parent is a
/// plain id.
#[derive(Debug)]
pub struct SceneTree {
    registry: Arc<Registry>,
    entities: HashMap<EntityId, Entity>,
    root: EntityId,
    options: TreeOptions,
}

impl SceneTree {
    pub fn new(registry: Arc<Registry>, root_kind: &str) -> Result<Self> {
        SceneTree::with_options(registry, root_kind, TreeOptions::default())
    }

    pub fn with_options(
        registry: Arc<Registry>,
        root_kind: &str,
        options: TreeOptions,
    ) -> Result<Self> {
        let root = new_entity(&registry, root_kind)?;
        let root_id = root.id;

        let mut entities = HashMap::new();
        entities.insert(root_id, root);

        log::trace!("Created scene tree rooted at {} ({})", root_id, root_kind);

        Ok(SceneTree {
            registry,
            entities,
            root: root_id,
            options,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> TreeOptions {
        self.options
    }

    /// Replaces the behavior switches. Takes effect from the next mutation.
    pub fn set_options(&mut self, options: TreeOptions) {
        self.options = options;
    }

    pub fn root_id(&self) -> EntityId {
        self.root
    }

    /// Whether the tree still holds the entity, in any state.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Result<EntityRef<'_>> {
        let entity = self.entity(id)?;

        Ok(EntityRef {
            tree: self,
            entity,
            kind: self.registry.get(entity.kind),
        })
    }

    pub fn value(&self, id: EntityId, name: &str) -> Result<Option<&FieldValue>> {
        Ok(self.get(id)?.value(name))
    }

    /// Creates a detached entity. It joins the synchronized tree once it is
    /// inserted under a parent.
    ///
    /// Detached entities are owned by the tree until they are attached or
    /// passed to [`SceneTree::remove`]. Nothing else reclaims them.
    pub fn create(&mut self, kind: &str) -> Result<EntityId> {
        let entity = new_entity(&self.registry, kind)?;
        let id = entity.id;

        log::trace!("Created {} ({})", id, kind);
        self.entities.insert(id, entity);

        Ok(id)
    }

    /// Assigns a field. Names without a field descriptor are kept as helper
    /// attributes and have no synchronization effect.
    pub fn set(&mut self, id: EntityId, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        self.assign(id, name, Some(value.into()))
    }

    /// Clears a field. A change instruction for a cleared field carries an
    /// empty element.
    pub fn unset(&mut self, id: EntityId, name: &str) -> Result<()> {
        self.assign(id, name, None)
    }

    fn assign(&mut self, id: EntityId, name: &str, value: Option<FieldValue>) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let suppress_equal_writes = self.options.suppress_equal_writes;

        let entity = self.live_mut(id)?;
        let kind = registry.get(entity.kind);

        let index = match kind.field_index(name) {
            Some(index) => index,
            None => {
                log::trace!("{} has no field {:?}, storing it as a helper", kind, name);

                match value {
                    Some(value) => entity.helpers.insert(name.to_owned(), value),
                    None => entity.helpers.remove(name),
                };

                return Ok(());
            }
        };

        let field = &kind.fields()[index];

        if !field.tracked && entity.state == SyncState::Active {
            return Err(SyncError::FixedField {
                kind: kind.name(),
                field: field.name,
            });
        }

        let value = match value {
            Some(value) => Some(validate(kind, field, value)?),
            None => None,
        };

        if suppress_equal_writes && entity.values[index] == value {
            return Ok(());
        }

        entity.values[index] = value;

        if entity.state != SyncState::Active {
            return Ok(());
        }

        log::trace!("Marked {}.{} dirty on {}", kind, field.name, id);
        entity.dirty.insert(index);
        self.mark_dirty_path(id);

        Ok(())
    }

    /// Appends `child` to a collection slot.
    pub fn insert_child(&mut self, parent: EntityId, slot: &str, child: EntityId) -> Result<()> {
        let len = self.collection_len(parent, slot)?;
        self.insert_child_at(parent, slot, len, child)
    }

    /// Inserts `child` into a collection slot at `index`, shifting later
    /// members back.
    pub fn insert_child_at(
        &mut self,
        parent: EntityId,
        slot: &str,
        index: usize,
        child: EntityId,
    ) -> Result<()> {
        let slot_index = self.adoption_slot(parent, slot, child, true)?;
        let registry = Arc::clone(&self.registry);

        let parent_entity = self.live_mut(parent)?;
        let kind = registry.get(parent_entity.kind);
        let descriptor = &kind.slots()[slot_index];
        let parent_active = parent_entity.state == SyncState::Active;

        if let SlotContents::Many { members, reemit } = &mut parent_entity.slots[slot_index] {
            if index > members.len() {
                return Err(SyncError::IndexOutOfRange {
                    kind: kind.name(),
                    slot: descriptor.name,
                    index,
                    len: members.len(),
                });
            }

            members.insert(index, child);

            if parent_active && descriptor.is_structural() {
                *reemit = true;
            }
        }

        self.attach(
            child,
            ParentLink {
                id: parent,
                slot: slot_index,
            },
        );

        Ok(())
    }

    /// Puts `child` into a single-child slot. A previous occupant is removed
    /// first and returned.
    pub fn set_child(
        &mut self,
        parent: EntityId,
        slot: &str,
        child: EntityId,
    ) -> Result<Option<EntityId>> {
        let slot_index = self.adoption_slot(parent, slot, child, false)?;

        let previous = match self.live(parent)?.slots[slot_index] {
            SlotContents::Single(occupant) => occupant,
            SlotContents::Many { .. } => None,
        };

        if let Some(previous) = previous {
            self.remove_child(parent, previous)?;
        }

        if let SlotContents::Single(occupant) = &mut self.live_mut(parent)?.slots[slot_index] {
            *occupant = Some(child);
        }

        self.attach(
            child,
            ParentLink {
                id: parent,
                slot: slot_index,
            },
        );

        Ok(previous)
    }

    /// Empties a single-child slot, returning the removed occupant.
    pub fn take_child(&mut self, parent: EntityId, slot: &str) -> Result<Option<EntityId>> {
        let entity = self.live(parent)?;
        let kind = self.registry.get(entity.kind);
        let slot_index = resolve_slot(kind, slot)?;

        let occupant = match entity.slots[slot_index] {
            SlotContents::Single(occupant) => occupant,
            SlotContents::Many { .. } => {
                return Err(SyncError::SlotMismatch {
                    kind: kind.name(),
                    slot: kind.slots()[slot_index].name,
                    reason: "is a collection",
                })
            }
        };

        if let Some(occupant) = occupant {
            self.remove_child(parent, occupant)?;
        }

        Ok(occupant)
    }

    /// Detaches `child` from `parent`.
    ///
    /// A child that was never synchronized is discarded on the spot. A
    /// synchronized child is marked deleted and kept until its delete
    /// instruction has been emitted.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        self.live(parent)?;
        let child_entity = self.live(child)?;

        let link = match child_entity.parent {
            Some(link) if link.id == parent => link,
            _ => return Err(SyncError::NotOwned { id: child, parent }),
        };
        let child_state = child_entity.state;

        let registry = Arc::clone(&self.registry);
        let parent_entity = self.live_mut(parent)?;
        let structural = registry.get(parent_entity.kind).slots()[link.slot].is_structural();
        let parent_active = parent_entity.state == SyncState::Active;

        let mut flag_parent = false;

        match &mut parent_entity.slots[link.slot] {
            SlotContents::Single(occupant) => *occupant = None,
            SlotContents::Many { members, reemit } => {
                members.retain(|&member| member != child);

                if parent_active && structural {
                    *reemit = true;
                    flag_parent = true;
                }
            }
        }

        if child_state == SyncState::Created {
            log::trace!("Discarded unsynchronized entity {}", child);

            if flag_parent {
                self.flag_descendant_work(parent);
            }
            self.discard_subtree(child);

            return Ok(());
        }

        log::trace!("Marked {} deleted", child);

        self.mark_subtree_deleted(child);
        self.live_mut(parent)?.pending_deletes.push(child);
        self.flag_descendant_work(parent);

        Ok(())
    }

    /// Removes an entity from wherever it is held.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        if id == self.root {
            return Err(SyncError::CannotRemoveRoot { id });
        }

        match self.live(id)?.parent {
            Some(link) => self.remove_child(link.id, id),
            None => {
                self.discard_subtree(id);
                Ok(())
            }
        }
    }

    /// Moves a member of a collection slot from one position to another.
    pub fn move_child(&mut self, parent: EntityId, slot: &str, from: usize, to: usize) -> Result<()> {
        let registry = Arc::clone(&self.registry);

        let parent_entity = self.live_mut(parent)?;
        let kind = registry.get(parent_entity.kind);
        let slot_index = resolve_slot(kind, slot)?;
        let descriptor = &kind.slots()[slot_index];
        let parent_active = parent_entity.state == SyncState::Active;

        let moved = match &mut parent_entity.slots[slot_index] {
            SlotContents::Many { members, reemit } => {
                let len = members.len();
                if from >= len || to >= len {
                    return Err(SyncError::IndexOutOfRange {
                        kind: kind.name(),
                        slot: descriptor.name,
                        index: from.max(to),
                        len,
                    });
                }

                if from == to {
                    return Ok(());
                }

                let moved = members.remove(from);
                members.insert(to, moved);

                if parent_active && descriptor.is_structural() {
                    *reemit = true;
                }

                moved
            }
            SlotContents::Single(_) => {
                return Err(SyncError::SlotMismatch {
                    kind: kind.name(),
                    slot: descriptor.name,
                    reason: "holds a single child",
                })
            }
        };

        if !parent_active {
            return Ok(());
        }

        if descriptor.is_structural() {
            self.flag_descendant_work(parent);
        } else if let Some(entity) = self.entities.get_mut(&moved) {
            if entity.state == SyncState::Active {
                entity.repositioned = true;
                self.mark_dirty_path(moved);
            }
        }

        Ok(())
    }

    /// Iterates over the descendants of `id` in pre-order, not including `id`.
    pub fn descendants(&self, id: EntityId) -> Descendants<'_> {
        let mut stack: Vec<EntityId> = match self.entities.get(&id) {
            Some(entity) => entity.children().collect(),
            None => Vec::new(),
        };
        stack.reverse();

        Descendants { tree: self, stack }
    }

    /// Forgets what the remote copy has seen. The next synchronization renders
    /// the full document again.
    pub fn force_full_resync(&mut self) {
        let mut deleted = Vec::new();
        for entity in self.entities.values_mut() {
            deleted.append(&mut entity.pending_deletes);
        }

        for id in deleted {
            self.discard_subtree(id);
        }

        for entity in self.entities.values_mut() {
            entity.reset_sync_state();
        }

        log::debug!("Forced full resync of {} entities", self.entities.len());
    }

    pub(crate) fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or(SyncError::NotLive { id })
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities.get_mut(&id).ok_or(SyncError::NotLive { id })
    }

    pub(crate) fn kind_of(&self, entity: &Entity) -> &KindInfo {
        self.registry.get(entity.kind)
    }

    /// Marks `id` and everything below it as rendered, dropping any deletes
    /// that were pending inside it.
    pub(crate) fn activate_subtree(&mut self, id: EntityId) {
        let mut stack = vec![id];
        let mut discarded = Vec::new();

        while let Some(id) = stack.pop() {
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.reset_sync_state();
                entity.state = SyncState::Active;
                discarded.append(&mut entity.pending_deletes);
                stack.extend(entity.children());
            }
        }

        for id in discarded {
            self.discard_subtree(id);
        }
    }

    /// Drops a deleted entity after its delete instruction was emitted.
    pub(crate) fn prune(&mut self, owner: EntityId, id: EntityId) {
        if let Some(owner) = self.entities.get_mut(&owner) {
            owner.pending_deletes.retain(|&pending| pending != id);
        }

        self.discard_subtree(id);
    }

    pub(crate) fn discard_subtree(&mut self, id: EntityId) {
        let mut to_discard = vec![id];

        while let Some(id) = to_discard.pop() {
            if let Some(entity) = self.entities.remove(&id) {
                to_discard.extend(entity.children());
                to_discard.extend(entity.pending_deletes.iter().copied());
            }
        }
    }

    fn live(&self, id: EntityId) -> Result<&Entity> {
        match self.entities.get(&id) {
            Some(entity) if entity.state != SyncState::Deleted => Ok(entity),
            _ => Err(SyncError::NotLive { id }),
        }
    }

    fn live_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        match self.entities.get_mut(&id) {
            Some(entity) if entity.state != SyncState::Deleted => Ok(entity),
            _ => Err(SyncError::NotLive { id }),
        }
    }

    fn collection_len(&self, parent: EntityId, slot: &str) -> Result<usize> {
        let entity = self.live(parent)?;
        let kind = self.registry.get(entity.kind);
        let slot_index = resolve_slot(kind, slot)?;

        match &entity.slots[slot_index] {
            SlotContents::Many { members, .. } => Ok(members.len()),
            SlotContents::Single(_) => Err(SyncError::SlotMismatch {
                kind: kind.name(),
                slot: kind.slots()[slot_index].name,
                reason: "holds a single child",
            }),
        }
    }

    /// Checks that `child` may be placed into `slot` of `parent`, returning
    /// the slot's index.
    fn adoption_slot(
        &self,
        parent: EntityId,
        slot: &str,
        child: EntityId,
        collection: bool,
    ) -> Result<usize> {
        let parent_entity = self.live(parent)?;
        let child_entity = self.live(child)?;

        let kind = self.registry.get(parent_entity.kind);
        let slot_index = resolve_slot(kind, slot)?;
        let descriptor = &kind.slots()[slot_index];

        if descriptor.is_collection() != collection {
            return Err(SyncError::SlotMismatch {
                kind: kind.name(),
                slot: descriptor.name,
                reason: if collection {
                    "holds a single child"
                } else {
                    "is a collection"
                },
            });
        }

        if child_entity.parent.is_some() || child == self.root {
            return Err(SyncError::AlreadyOwned { id: child });
        }

        if self.is_ancestor_or_self(child, parent) {
            return Err(SyncError::WouldCycle { id: child, parent });
        }

        let child_kind = self.registry.get(child_entity.kind);
        if !child_kind.is_a(kind.slot_accepts(slot_index)) {
            return Err(SyncError::ChildKindRejected {
                kind: kind.name(),
                slot: descriptor.name,
                child: child_kind.name(),
            });
        }

        Ok(slot_index)
    }

    fn is_ancestor_or_self(&self, candidate: EntityId, id: EntityId) -> bool {
        let mut current = Some(id);

        while let Some(id) = current {
            if id == candidate {
                return true;
            }

            current = self
                .entities
                .get(&id)
                .and_then(|entity| entity.parent)
                .map(|link| link.id);
        }

        false
    }

    fn attach(&mut self, child: EntityId, link: ParentLink) {
        if let Some(entity) = self.entities.get_mut(&child) {
            entity.parent = Some(link);
        }

        log::trace!("Attached {} to {}", child, link.id);
        self.mark_dirty_path(child);
    }

    fn mark_subtree_deleted(&mut self, id: EntityId) {
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.state = SyncState::Deleted;
                stack.extend(entity.children());
            }
        }
    }

    /// Flags the strict ancestors of `id` as having work below them.
    fn mark_dirty_path(&mut self, id: EntityId) {
        let parent = self
            .entities
            .get(&id)
            .and_then(|entity| entity.parent)
            .map(|link| link.id);

        if let Some(parent) = parent {
            self.flag_descendant_work(parent);
        }
    }

    /// Flags `id` and its ancestors. Stops at the first entity that is already
    /// flagged, since its ancestors are flagged too.
    fn flag_descendant_work(&mut self, id: EntityId) {
        let mut current = Some(id);

        while let Some(id) = current {
            let entity = match self.entities.get_mut(&id) {
                Some(entity) => entity,
                None => break,
            };

            if entity.dirty_descendants {
                break;
            }

            entity.dirty_descendants = true;
            current = entity.parent.map(|link| link.id);
        }
    }
}

fn new_entity(registry: &Registry, kind_name: &str) -> Result<Entity> {
    let kind = registry
        .lookup(kind_name)
        .ok_or_else(|| SyncError::UnknownKind {
            name: kind_name.to_owned(),
        })?;

    if kind.is_abstract() {
        return Err(SyncError::AbstractKind { name: kind.name() });
    }

    Ok(Entity::new(kind))
}

fn resolve_slot(kind: &KindInfo, slot: &str) -> Result<usize> {
    kind.slot_index(slot).ok_or_else(|| SyncError::UnknownSlot {
        kind: kind.name(),
        slot: slot.to_owned(),
    })
}

fn validate(kind: &KindInfo, field: &FieldDescriptor, value: FieldValue) -> Result<FieldValue> {
    let value = field
        .constraint
        .apply(value)
        .ok_or(SyncError::InvalidValue {
            kind: kind.name(),
            field: field.name,
        })?;

    if let FieldRule::Symbol(symbols) = field.rule {
        let valid = value
            .as_str()
            .map_or(false, |symbol| symbols.contains(&symbol));

        if !valid {
            return Err(SyncError::InvalidSymbol {
                kind: kind.name(),
                field: field.name,
                value: value.text().unwrap_or_default(),
                allowed: symbols,
            });
        }
    }

    Ok(value)
}

/// Pre-order iterator returned by [`SceneTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a SceneTree,
    stack: Vec<EntityId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = EntityRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;

            if let Ok(entity) = self.tree.get(id) {
                let first = self.stack.len();
                self.stack.extend(entity.entity.children());
                self.stack[first..].reverse();

                return Some(entity);
            }
        }
    }
}
