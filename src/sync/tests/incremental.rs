use std::collections::HashMap;

use insta::assert_yaml_snapshot;
use maplit::hashmap;

use crate::{
    error::SyncError,
    scene::{EntityId, SyncState},
    sync::Instruction,
};

use super::Scene;

/// root
///   folder
///     pin
///   other
fn synced_scene() -> (Scene, EntityId, EntityId, EntityId) {
    let mut scene = Scene::new();
    let root = scene.root();

    let folder = scene.add(root, "features", "Folder", "folder");
    let pin = scene.add(folder, "features", "Placemark", "pin");
    scene.tree.set(pin, "name", "Pier").unwrap();
    let other = scene.add(root, "features", "Placemark", "other");

    scene.sync();
    (scene, folder, pin, other)
}

#[test]
fn one_field_one_change() {
    let (mut scene, _folder, pin, _other) = synced_scene();

    scene.tree.set(pin, "name", "Jetty").unwrap();
    let document = scene.update();

    assert_yaml_snapshot!(scene.view(&document), @r###"
    ---
    - "change pin: name"
    "###);
    assert_eq!(document.report.changed, 1);

    let element = document.instructions[0].element();
    assert_eq!(element.tag, "Placemark");
    assert_eq!(element.attribute("targetId"), Some(pin.to_string().as_str()));
    assert_eq!(element.children.len(), 1);
    assert_eq!(element.children[0].tag, "name");
    assert_eq!(element.children[0].text.as_deref(), Some("Jetty"));
}

#[test]
fn changed_fields_follow_registry_order() {
    let (mut scene, _folder, pin, _other) = synced_scene();

    scene.tree.set(pin, "style_url", "#red").unwrap();
    scene.tree.set(pin, "description", "Moved").unwrap();
    scene.tree.set(pin, "name", "Jetty").unwrap();

    let document = scene.update();
    assert_yaml_snapshot!(scene.view(&document), @r###"
    ---
    - "change pin: name, description, style_url"
    "###);

    let tags: Vec<_> = document.instructions[0]
        .element()
        .children
        .iter()
        .map(|child| child.tag.as_str())
        .collect();
    assert_eq!(tags, vec!["name", "description", "styleUrl"]);
}

#[test]
fn cleared_fields_are_sent_empty() {
    let (mut scene, _folder, pin, _other) = synced_scene();

    scene.tree.unset(pin, "name").unwrap();
    let document = scene.update();

    let name = &document.instructions[0].element().children[0];
    assert_eq!(name.tag, "name");
    assert_eq!(name.text, None);
    assert!(name.children.is_empty());
}

#[test]
fn new_subtree_is_one_create() {
    let (mut scene, _folder, _pin, _other) = synced_scene();
    let root = scene.root();

    let added = scene.add(root, "features", "Folder", "added");
    let first = scene.add(added, "features", "Placemark", "first");
    let second = scene.add(added, "features", "Placemark", "second");
    scene.tree.set(second, "name", "Second").unwrap();

    let document = scene.update();
    assert_yaml_snapshot!(scene.view(&document), @r###"
    ---
    - create added in root.features@2
    "###);

    let target = document.instructions[0].element();
    assert_eq!(target.tag, "Document");
    assert_eq!(target.attribute("targetId"), Some(root.to_string().as_str()));

    let folder = target.child("Folder").unwrap();
    assert_eq!(folder.children.len(), 2);
    assert_eq!(
        folder.children[1].child("name").unwrap().text.as_deref(),
        Some("Second")
    );

    for id in [added, first, second] {
        assert_eq!(scene.tree.get(id).unwrap().state(), SyncState::Active);
    }
    assert!(scene.update().is_empty());
}

#[test]
fn deletes_precede_creates() {
    let (mut scene, folder, _pin, other) = synced_scene();

    scene.add(folder, "features", "Placemark", "added");
    scene.tree.remove(other).unwrap();

    let document = scene.update();
    assert_yaml_snapshot!(scene.view(&document), @r###"
    ---
    - delete other
    - create added in folder.features@1
    "###);
    assert!(matches!(document.instructions[0], Instruction::Delete { .. }));
}

#[test]
fn changes_follow_creates() {
    let (mut scene, folder, pin, _other) = synced_scene();

    scene.tree.set(pin, "visibility", false).unwrap();
    scene.add(folder, "features", "Placemark", "added");

    assert_yaml_snapshot!(scene.update_view(), @r###"
    ---
    - create added in folder.features@1
    - "change pin: visibility"
    "###);
}

#[test]
fn deleted_entities_are_gone_after_the_cycle() {
    let (mut scene, _folder, _pin, other) = synced_scene();

    scene.tree.remove(other).unwrap();
    assert_yaml_snapshot!(scene.update_view(), @r###"
    ---
    - delete other
    "###);

    assert!(!scene.tree.contains(other));
    assert!(matches!(
        scene.tree.set(other, "name", "Back"),
        Err(SyncError::NotLive { .. })
    ));
    assert!(scene.update().is_empty());
}

#[test]
fn deleting_a_container_covers_its_descendants() {
    let (mut scene, folder, pin, _other) = synced_scene();

    scene.tree.set(pin, "name", "Ignored").unwrap();
    scene.tree.remove(folder).unwrap();

    assert_yaml_snapshot!(scene.update_view(), @r###"
    ---
    - delete folder
    "###);
    assert!(!scene.tree.contains(pin));
}

#[test]
fn entities_removed_before_sync_are_never_sent() {
    let (mut scene, folder, _pin, _other) = synced_scene();

    let added = scene.add(folder, "features", "Placemark", "added");
    scene.tree.remove(added).unwrap();

    assert!(scene.update().is_empty());
    assert_eq!(scene.update().report.visited, 0);
}

#[test]
fn replacing_a_single_child() {
    let (mut scene, _folder, pin, _other) = synced_scene();
    let point = scene.add(pin, "geometry", "Point", "point");
    scene.sync();

    let line = scene.tree.create("LineString").unwrap();
    scene.labels.name(line, "line");
    let previous = scene.tree.set_child(pin, "geometry", line).unwrap();

    assert_eq!(previous, Some(point));
    assert_yaml_snapshot!(scene.update_view(), @r###"
    ---
    - delete point
    - create line in pin.geometry
    "###);
}

#[test]
fn helper_attributes_are_not_synchronized() {
    let (mut scene, _folder, pin, _other) = synced_scene();

    scene.tree.set(pin, "track_index", 7).unwrap();

    assert!(scene.update().is_empty());
}

#[test]
fn unchanged_subtrees_are_skipped() {
    let mut scene = Scene::new();
    let root = scene.root();

    let mut parent = scene.add(root, "features", "Folder", "deep");
    for depth in 0..5 {
        for index in 0..4 {
            scene.add(parent, "features", "Placemark", &format!("pin {}.{}", depth, index));
        }
        parent = scene.add(parent, "features", "Folder", &format!("level {}", depth));
    }

    let shallow = scene.add(root, "features", "Folder", "shallow");
    let pin = scene.add(shallow, "features", "Placemark", "pin");
    scene.sync();

    scene.tree.set(pin, "name", "Changed").unwrap();
    let document = scene.update();

    assert_yaml_snapshot!(scene.view(&document), @r###"
    ---
    - "change pin: name"
    "###);
    assert_eq!(document.report.visited, 3);
}

#[test]
fn changes_across_the_tree_share_one_document() {
    let (mut scene, folder, pin, other) = synced_scene();

    scene.tree.set(folder, "name", "Harbour").unwrap();
    scene.tree.set(pin, "description", "Moved").unwrap();
    scene.tree.set(pin, "name", "Jetty").unwrap();
    scene.tree.set(other, "name", "Lighthouse").unwrap();

    let document = scene.update();
    let changed: HashMap<String, Vec<&str>> = document
        .instructions
        .iter()
        .map(|instruction| match instruction {
            Instruction::Change { id, fields, .. } => (scene.labels.get(*id), fields.clone()),
            other => panic!("expected only changes, got {:?}", other),
        })
        .collect();

    assert_eq!(
        changed,
        hashmap! {
            "folder".to_owned() => vec!["name"],
            "pin".to_owned() => vec!["name", "description"],
            "other".to_owned() => vec!["name"],
        }
    );
}
