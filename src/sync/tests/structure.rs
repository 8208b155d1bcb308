use insta::assert_yaml_snapshot;

use crate::scene::{EntityId, SyncState};

use super::Scene;

/// root
///   tour
///     playlist
///       fly (with a LookAt view)
///       wait
fn synced_tour() -> (Scene, EntityId, EntityId, EntityId) {
    let mut scene = Scene::new();
    let root = scene.root();

    let tour = scene.add(root, "features", "Tour", "tour");
    let playlist = scene.add(tour, "playlist", "Playlist", "playlist");

    let fly = scene.add(playlist, "steps", "FlyTo", "fly");
    scene.tree.set(fly, "duration", 4.0).unwrap();
    scene.tree.set(fly, "fly_to_mode", "smooth").unwrap();
    let view = scene.add(fly, "view", "LookAt", "view");
    scene.tree.set(view, "range", 1200.0).unwrap();

    let wait = scene.add(playlist, "steps", "Wait", "wait");
    scene.tree.set(wait, "duration", 2.0).unwrap();

    scene.sync();
    (scene, playlist, fly, wait)
}

#[test]
fn inserting_a_step_recreates_the_playlist() {
    let (mut scene, playlist, _fly, _wait) = synced_tour();

    let pause = scene.tree.create("Wait").unwrap();
    scene.labels.name(pause, "pause");
    scene.tree.insert_child_at(playlist, "steps", 1, pause).unwrap();

    let document = scene.update();
    assert_yaml_snapshot!(scene.view(&document), @r###"
    ---
    - delete fly
    - delete wait
    - create fly in playlist.steps@0
    - create pause in playlist.steps@1
    - create wait in playlist.steps@2
    "###);

    let fly_payload = document.instructions[2].element();
    assert_eq!(fly_payload.tag, "gx:Playlist");
    let fly = fly_payload.child("gx:FlyTo").unwrap();
    assert_eq!(
        fly.child("gx:flyToMode").unwrap().text.as_deref(),
        Some("smooth")
    );
    assert!(fly.child("LookAt").is_some());

    assert_eq!(scene.tree.get(pause).unwrap().state(), SyncState::Active);
    assert!(scene.update().is_empty());
}

#[test]
fn reordering_steps_recreates_the_playlist() {
    let (mut scene, playlist, _fly, _wait) = synced_tour();

    scene.tree.move_child(playlist, "steps", 1, 0).unwrap();

    assert_yaml_snapshot!(scene.update_view(), @r###"
    ---
    - delete wait
    - delete fly
    - create wait in playlist.steps@0
    - create fly in playlist.steps@1
    "###);
}

#[test]
fn removing_a_step_recreates_the_rest() {
    let (mut scene, playlist, fly, wait) = synced_tour();

    scene.tree.remove_child(playlist, wait).unwrap();

    assert_yaml_snapshot!(scene.update_view(), @r###"
    ---
    - delete wait
    - delete fly
    - create fly in playlist.steps@0
    "###);
    assert!(!scene.tree.contains(wait));
    assert_eq!(scene.tree.get(fly).unwrap().state(), SyncState::Active);
}

#[test]
fn changes_inside_a_recreated_step_are_folded_in() {
    let (mut scene, playlist, fly, _wait) = synced_tour();

    let view = scene.tree.get(fly).unwrap().slot("view")[0];
    scene.tree.set(view, "range", 300.0).unwrap();
    scene.tree.move_child(playlist, "steps", 0, 1).unwrap();

    let document = scene.update();
    assert_eq!(document.report.changed, 0);

    let recreated = document
        .instructions
        .iter()
        .find_map(|instruction| instruction.element().child("gx:FlyTo"))
        .unwrap();
    let range = recreated
        .child("LookAt")
        .and_then(|view| view.child("range"))
        .unwrap();
    assert_eq!(range.text.as_deref(), Some("300"));

    assert!(scene.tree.get(view).unwrap().dirty_field_names().is_empty());
}

#[test]
fn plain_collections_only_move_the_moved_entry() {
    let mut scene = Scene::new();
    let root = scene.root();
    for label in ["a", "b", "c"] {
        scene.add(root, "features", "Placemark", label);
    }
    scene.sync();

    scene.tree.move_child(root, "features", 2, 0).unwrap();

    assert_yaml_snapshot!(scene.update_view(), @r###"
    ---
    - delete c
    - create c in root.features@0
    "###);
    assert!(scene.update().is_empty());
}
