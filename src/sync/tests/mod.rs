mod incremental;
mod structure;

use std::sync::Arc;

use crate::{
    scene::{EntityId, Registry, SceneTree},
    sync::{synchronize, SyncOptions, SyncOutput, UpdateDocument},
    tree_view::{view_update, Labels},
};

/// A tree rooted at a `Document` plus readable labels for its entities.
pub struct Scene {
    pub tree: SceneTree,
    pub labels: Labels,
}

impl Scene {
    pub fn new() -> Self {
        let _ = env_logger::try_init();

        let registry = Arc::new(Registry::kml().unwrap());
        let tree = SceneTree::new(registry, "Document").unwrap();

        let mut labels = Labels::new();
        labels.name(tree.root_id(), "root");

        Scene { tree, labels }
    }

    pub fn root(&self) -> EntityId {
        self.tree.root_id()
    }

    /// Creates an entity and places it into `slot` of `parent`, appending to
    /// collections.
    pub fn add(&mut self, parent: EntityId, slot: &str, kind: &str, label: &str) -> EntityId {
        let id = self.tree.create(kind).unwrap();

        let is_collection = {
            let kind = self.tree.get(parent).unwrap().kind();
            let index = kind.slot_index(slot).unwrap();
            kind.slots()[index].is_collection()
        };

        if is_collection {
            self.tree.insert_child(parent, slot, id).unwrap();
        } else {
            self.tree.set_child(parent, slot, id).unwrap();
        }

        self.labels.name(id, label);
        id
    }

    pub fn sync_with(&mut self, options: SyncOptions) -> SyncOutput {
        synchronize(&mut self.tree, &options).unwrap()
    }

    pub fn sync(&mut self) -> SyncOutput {
        self.sync_with(SyncOptions::default())
    }

    pub fn update(&mut self) -> UpdateDocument {
        match self.sync() {
            SyncOutput::Update(document) => document,
            SyncOutput::Full(_) => panic!("expected an update document"),
        }
    }

    pub fn view(&self, document: &UpdateDocument) -> Vec<String> {
        view_update(document, &self.labels)
    }

    pub fn update_view(&mut self) -> Vec<String> {
        let document = self.update();
        self.view(&document)
    }
}
