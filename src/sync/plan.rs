//! Computes which instructions a cycle has to emit.
//!
//! The walk is read-only. Nothing about the tree changes until the rendered
//! instructions exist, so a cycle that fails part way leaves every dirty bit
//! in place for the next attempt.

use crate::{
    error::Result,
    scene::{EntityId, SceneTree, SlotContents, SyncState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteReason {
    /// The client removed the entity. It is pruned once the delete is out.
    Removed { owner: EntityId },

    /// The entity is deleted and created again in the same cycle.
    Recreated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedDelete {
    pub id: EntityId,
    pub reason: DeleteReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedCreate {
    pub parent: EntityId,
    pub slot: usize,
    pub index: Option<usize>,
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedChange {
    pub id: EntityId,
    pub fields: Vec<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct SyncPlan {
    pub deletes: Vec<PlannedDelete>,
    pub creates: Vec<PlannedCreate>,
    pub changes: Vec<PlannedChange>,

    /// Entities whose whole subtree was handled. Their descendant flags can
    /// be cleared on commit.
    pub completed: Vec<EntityId>,

    /// Structural collections that were deleted and created as a whole.
    pub reemitted_slots: Vec<(EntityId, usize)>,

    pub visited: usize,
    pub truncated: bool,

    /// Work at the root addresses entities the viewer has no id for. Only a
    /// full document can bring the viewer up to date.
    pub resync: bool,
}

struct Budget {
    limit: Option<usize>,
    emitted: usize,
}

impl Budget {
    /// Admits a group of instructions that must be emitted together. A group
    /// is admitted whole while there is any room left.
    fn admit(&mut self, count: usize) -> bool {
        if count == 0 {
            return true;
        }

        match self.limit {
            Some(limit) if self.emitted >= limit => false,
            _ => {
                self.emitted += count;
                true
            }
        }
    }
}

pub(crate) fn compute_plan(tree: &SceneTree, update_limit: Option<usize>) -> Result<SyncPlan> {
    let mut plan = SyncPlan::default();
    let mut budget = Budget {
        limit: update_limit,
        emitted: 0,
    };

    let root = tree.root_id();
    if tree.entity(root)?.needs_visit() {
        if addresses_hidden(tree, root)? {
            plan.resync = true;
            return Ok(plan);
        }

        walk(tree, root, &mut budget, &mut plan)?;
    }

    Ok(plan)
}

/// Visits one synchronized entity. Returns `false` once the budget is used
/// up, which stops the whole walk.
fn walk(tree: &SceneTree, id: EntityId, budget: &mut Budget, plan: &mut SyncPlan) -> Result<bool> {
    let entity = tree.entity(id)?;
    let kind = tree.kind_of(entity);
    plan.visited += 1;

    log::trace!("Visiting {} ({})", id, kind);

    if !entity.dirty.is_empty() {
        if !budget.admit(1) {
            plan.truncated = true;
            return Ok(false);
        }

        plan.changes.push(PlannedChange {
            id,
            fields: entity.dirty.iter().copied().collect(),
        });
    }

    for &deleted in &entity.pending_deletes {
        if !budget.admit(1) {
            plan.truncated = true;
            return Ok(false);
        }

        plan.deletes.push(PlannedDelete {
            id: deleted,
            reason: DeleteReason::Removed { owner: id },
        });
    }

    for (slot, (descriptor, contents)) in kind.slots().iter().zip(&entity.slots).enumerate() {
        if let SlotContents::Many {
            members,
            reemit: true,
        } = contents
        {
            let mut synchronized = Vec::new();
            for &member in members {
                if tree.entity(member)?.state == SyncState::Active {
                    synchronized.push(member);
                }
            }

            if !budget.admit(synchronized.len() + members.len()) {
                plan.truncated = true;
                return Ok(false);
            }

            log::trace!("Re-emitting {}.{} on {}", kind, descriptor.name, id);

            plan.deletes
                .extend(synchronized.into_iter().map(|member| PlannedDelete {
                    id: member,
                    reason: DeleteReason::Recreated,
                }));
            plan.creates
                .extend(members.iter().enumerate().map(|(index, &member)| PlannedCreate {
                    parent: id,
                    slot,
                    index: Some(index),
                    id: member,
                }));
            plan.reemitted_slots.push((id, slot));

            continue;
        }

        for (position, &child_id) in contents.ids().iter().enumerate() {
            let child = tree.entity(child_id)?;
            let create = PlannedCreate {
                parent: id,
                slot,
                index: descriptor.is_collection().then(|| position),
                id: child_id,
            };

            match child.state {
                SyncState::Created => {
                    if !budget.admit(1) {
                        plan.truncated = true;
                        return Ok(false);
                    }

                    plan.creates.push(create);
                }
                SyncState::Active
                    if child.repositioned
                        || (child.needs_visit() && addresses_hidden(tree, child_id)?) =>
                {
                    if !budget.admit(2) {
                        plan.truncated = true;
                        return Ok(false);
                    }

                    plan.deletes.push(PlannedDelete {
                        id: child_id,
                        reason: DeleteReason::Recreated,
                    });
                    plan.creates.push(create);
                }
                SyncState::Active if child.needs_visit() => {
                    if !walk(tree, child_id, budget, plan)? {
                        return Ok(false);
                    }
                }
                _ => {}
            }
        }
    }

    plan.completed.push(id);
    Ok(true)
}

fn is_hidden(tree: &SceneTree, id: EntityId) -> Result<bool> {
    Ok(tree.kind_of(tree.entity(id)?).suppress_id())
}

/// Whether the pending work in the subtree of `id` would address an entity
/// that is rendered without an id, either directly or as the target of a
/// create. Such work is sent by recreating the nearest ancestor that the
/// viewer can address.
///
/// Only entities without ids are descended into. Work below an addressable
/// child with an addressable parent is resolved at that child.
fn addresses_hidden(tree: &SceneTree, id: EntityId) -> Result<bool> {
    let entity = tree.entity(id)?;
    let hidden = tree.kind_of(entity).suppress_id();

    if hidden && !entity.dirty.is_empty() {
        return Ok(true);
    }

    for &deleted in &entity.pending_deletes {
        if is_hidden(tree, deleted)? {
            return Ok(true);
        }
    }

    for contents in &entity.slots {
        if let SlotContents::Many {
            members,
            reemit: true,
        } = contents
        {
            if hidden {
                return Ok(true);
            }

            for &member in members {
                let member_entity = tree.entity(member)?;
                if member_entity.state == SyncState::Active
                    && tree.kind_of(member_entity).suppress_id()
                {
                    return Ok(true);
                }
            }

            continue;
        }

        for &child_id in contents.ids() {
            let child = tree.entity(child_id)?;
            let child_hidden = tree.kind_of(child).suppress_id();

            let addressed = match child.state {
                SyncState::Created => hidden,
                SyncState::Active if child.repositioned => hidden || child_hidden,
                SyncState::Active if child.needs_visit() && (hidden || child_hidden) => {
                    addresses_hidden(tree, child_id)?
                }
                _ => false,
            };

            if addressed {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
