//! Commits a rendered plan back into the tree.

use crate::scene::{SceneTree, SlotContents};

use super::plan::{DeleteReason, SyncPlan};

/// Resets the dirty state of everything the plan emitted. Runs only after
/// every instruction of the plan has been rendered.
pub(crate) fn apply_plan(tree: &mut SceneTree, plan: &SyncPlan) {
    for delete in &plan.deletes {
        if let DeleteReason::Removed { owner } = delete.reason {
            log::trace!("Pruning {}", delete.id);
            tree.prune(owner, delete.id);
        }
    }

    for create in &plan.creates {
        tree.activate_subtree(create.id);
    }

    for change in &plan.changes {
        if let Ok(entity) = tree.entity_mut(change.id) {
            entity.dirty.clear();
        }
    }

    for &(id, slot) in &plan.reemitted_slots {
        if let Ok(entity) = tree.entity_mut(id) {
            if let Some(SlotContents::Many { reemit, .. }) = entity.slots.get_mut(slot) {
                *reemit = false;
            }
        }
    }

    for &id in &plan.completed {
        if let Ok(entity) = tree.entity_mut(id) {
            entity.dirty_descendants = false;
        }
    }
}
