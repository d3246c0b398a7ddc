//! Save/restore fidelity of the I/O state

mod common;

use common::{find, received, send, test_world};
use srcio_core::{restore_level_state, save_level_state, LevelSaveState, SaveError};

const MAP: &str = r#"
{
"classname" "logic_relay"
"targetname" "r"
"OnTrigger" "door,Open,,2.0,-1"
}
{
"classname" "test_sink"
"targetname" "door"
}
"#;

#[test]
fn test_pending_events_survive_a_save_cycle() {
    let mut w = test_world();
    w.load_entities(MAP).unwrap();
    let relay = find(&w, "r");
    send(&mut w, relay, "Trigger");
    w.tick(0.5);

    let blob = save_level_state(&w).unwrap();

    // A fresh world reloads the same map, then takes over the saved I/O
    // state; entity state itself travels with the host, not this blob.
    let mut w2 = test_world();
    w2.load_entities(MAP).unwrap();
    let restored = restore_level_state(&mut w2, &blob).unwrap();
    assert!(restored >= 1);
    assert_eq!(w2.cur_time(), 0.5);

    let door = find(&w2, "door");
    w2.tick(1.0);
    assert!(received(&w2, door).is_empty());
    w2.tick(0.5);
    assert_eq!(received(&w2, door).len(), 1);
}

#[test]
fn test_elapsed_entries_deliver_on_first_pump() {
    let mut w = test_world();
    w.load_entities(MAP).unwrap();
    let relay = find(&w, "r");
    send(&mut w, relay, "Trigger");
    let blob = save_level_state(&w).unwrap();

    // Doctor the saved clock so the entry's fire time is already in the
    // past at restore; it must still deliver, on the first pump.
    let mut state: LevelSaveState = serde_json::from_slice(&blob).unwrap();
    state.cur_time = 50.0;
    let blob = serde_json::to_vec(&state).unwrap();

    let mut w2 = test_world();
    w2.load_entities(MAP).unwrap();
    restore_level_state(&mut w2, &blob).unwrap();

    let door = find(&w2, "door");
    w2.tick(0.0);
    assert_eq!(received(&w2, door).len(), 1);
}

#[test]
fn test_version_skew_is_rejected_cleanly() {
    let mut w = test_world();
    w.load_entities(MAP).unwrap();
    let relay = find(&w, "r");
    send(&mut w, relay, "Trigger");
    let blob = save_level_state(&w).unwrap();

    let mut state: LevelSaveState = serde_json::from_slice(&blob).unwrap();
    state.queue.version = 99;
    let blob = serde_json::to_vec(&state).unwrap();

    let mut w2 = test_world();
    w2.load_entities(MAP).unwrap();
    assert!(matches!(
        restore_level_state(&mut w2, &blob),
        Err(SaveError::VersionMismatch { .. })
    ));
}

#[test]
fn test_template_instance_counter_survives() {
    let mut w = test_world();
    let map = r#"
{
"classname" "test_sink"
"targetname" "gib_a"
}
{
"classname" "point_template"
"targetname" "maker"
"Template01" "gib_a"
}
"#;
    w.load_entities(map).unwrap();
    let maker = find(&w, "maker");
    send(&mut w, maker, "ForceSpawn");
    let blob = save_level_state(&w).unwrap();

    let mut w2 = test_world();
    w2.load_entities(map).unwrap();
    restore_level_state(&mut w2, &blob).unwrap();

    // The counter restored at 1, so the next instance is number two.
    let maker2 = find(&w2, "maker");
    send(&mut w2, maker2, "ForceSpawn");
    let inv = srcio_core::EHandle::invalid();
    assert!(w2
        .entities
        .find_by_name(None, "gib_a&0002", inv, inv)
        .is_some());
}
