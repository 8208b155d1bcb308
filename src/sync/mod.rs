//! The synchronizer turns the changes recorded in a [`SceneTree`] into a
//! document for the viewer.
//!
//! The first cycle for a tree renders the whole thing. Every later cycle walks
//! only the entities that are flagged as changed, or that have changed
//! descendants, and emits delete, create and change instructions for them.
//! This happens in three steps, much like computing and applying a patch:
//!
//! 1. The planner walks the tree without touching it and decides what to emit.
//! 2. The plan is rendered into instructions.
//! 3. The plan is committed, clearing the dirty state of everything that was
//!    emitted.
//!
//! If rendering fails, the tree is left exactly as it was.
//!
//! Kinds that are rendered without an `id` cannot be addressed by the viewer.
//! Work that would address one is sent by recreating the nearest ancestor the
//! viewer can address. When that ancestor would be the root, the full document
//! is rendered again instead.

mod apply;
mod document;
mod plan;

#[cfg(test)]
mod tests;

pub use document::*;

use crate::{
    config::SyncSettings,
    error::Result,
    markup::Element,
    scene::{EntityId, SceneTree, SyncState},
    serialize::{field_element, serialize},
};

use self::{
    apply::apply_plan,
    plan::{compute_plan, SyncPlan},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum number of instructions per update document.
    pub update_limit: Option<usize>,
}

impl From<&SyncSettings> for SyncOptions {
    fn from(settings: &SyncSettings) -> Self {
        SyncOptions {
            update_limit: settings.update_limit,
        }
    }
}

/// Runs one synchronization cycle.
pub fn synchronize(tree: &mut SceneTree, options: &SyncOptions) -> Result<SyncOutput> {
    let root = tree.root_id();

    if tree.entity(root)?.state != SyncState::Created {
        let plan = compute_plan(tree, options.update_limit)?;
        if !plan.resync {
            return synchronize_update(tree, &plan, options);
        }

        log::warn!(
            "Changes below {} address entities that are rendered without ids, sending the full document",
            root
        );
        tree.force_full_resync();
    }

    let element = serialize(tree, root, true)?;
    let count = 1 + tree.descendants(root).count();

    tree.activate_subtree(root);

    log::debug!("Rendered full document with {} entities", count);

    Ok(SyncOutput::Full(FullDocument {
        root: element,
        report: SyncReport {
            visited: count,
            created: count,
            ..Default::default()
        },
    }))
}

fn synchronize_update(
    tree: &mut SceneTree,
    plan: &SyncPlan,
    options: &SyncOptions,
) -> Result<SyncOutput> {
    let instructions = render_plan(tree, plan)?;
    apply_plan(tree, plan);

    let report = SyncReport {
        visited: plan.visited,
        deleted: plan.deletes.len(),
        created: plan.creates.len(),
        changed: plan.changes.len(),
        truncated: plan.truncated,
    };

    if report.truncated {
        log::warn!(
            "Update limit of {:?} reached, deferring remaining changes to the next cycle",
            options.update_limit
        );
    }

    log::debug!(
        "Synchronized: {} deleted, {} created, {} changed ({} entities visited)",
        report.deleted,
        report.created,
        report.changed,
        report.visited
    );

    Ok(SyncOutput::Update(UpdateDocument {
        instructions,
        report,
    }))
}

fn render_plan(tree: &SceneTree, plan: &SyncPlan) -> Result<Vec<Instruction>> {
    let mut instructions =
        Vec::with_capacity(plan.deletes.len() + plan.creates.len() + plan.changes.len());

    for delete in &plan.deletes {
        instructions.push(Instruction::Delete {
            id: delete.id,
            element: target_element(tree, delete.id)?,
        });
    }

    for create in &plan.creates {
        let parent = tree.entity(create.parent)?;
        let descriptor = &tree.kind_of(parent).slots()[create.slot];

        let rendered = serialize(tree, create.id, true)?;
        let payload = match descriptor.wrapper {
            Some(wrapper) => Element::new(wrapper).with_child(rendered),
            None => rendered,
        };

        instructions.push(Instruction::Create {
            target: create.parent,
            id: create.id,
            slot: descriptor.name,
            index: create.index,
            element: target_element(tree, create.parent)?.with_child(payload),
        });
    }

    for change in &plan.changes {
        let entity = tree.entity(change.id)?;
        let kind = tree.kind_of(entity);

        let mut element = target_element(tree, change.id)?;
        let mut fields = Vec::with_capacity(change.fields.len());

        for &index in &change.fields {
            let field = &kind.fields()[index];
            element.push(field_element(field, entity.values[index].as_ref()));
            fields.push(field.name);
        }

        instructions.push(Instruction::Change {
            id: change.id,
            fields,
            element,
        });
    }

    Ok(instructions)
}

/// `<Tag targetId="...">`, addressing an entity the viewer already has.
fn target_element(tree: &SceneTree, id: EntityId) -> Result<Element> {
    let entity = tree.entity(id)?;
    let kind = tree.kind_of(entity);

    Ok(Element::new(kind.tag()).with_attribute("targetId", id.to_string()))
}
