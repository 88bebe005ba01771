//! Integration tests for snapshot encoding and the snapshot stores.

mod common;

use common::{fixture, seeded};
use subsoccer_bracket::{
    decode_snapshot, encode_snapshot, JsonFileSnapshotStore, SnapshotStore, StoreError,
    TournamentController, TournamentSnapshot, TournamentState, SNAPSHOT_VERSION,
};
use uuid::Uuid;

fn temp_store() -> JsonFileSnapshotStore {
    let path = std::env::temp_dir().join(format!("bracket-snapshot-{}.json", Uuid::new_v4()));
    JsonFileSnapshotStore::new(path)
}

fn sample_state() -> TournamentState {
    let players = ["A", "B", "C", "D", "E"].map(String::from).to_vec();
    let mut state = TournamentState::new(players, "Friday Cup");
    state.open_round();
    state.round_winners[3] = Some("D".to_string());
    state.session_gains.insert("D".to_string(), 16);
    state.session_ratings.insert("D".to_string(), 1316);
    state
}

#[test]
fn encode_decode_preserves_state() {
    let snapshot = TournamentSnapshot::new(sample_state());
    let json = encode_snapshot(&snapshot).unwrap();
    assert_eq!(decode_snapshot(&json).unwrap(), snapshot);
}

#[test]
fn other_versions_are_refused() {
    let mut snapshot = TournamentSnapshot::new(sample_state());
    snapshot.version = SNAPSHOT_VERSION + 1;
    let json = encode_snapshot(&snapshot).unwrap();
    assert_eq!(
        decode_snapshot(&json).unwrap_err(),
        StoreError::IncompatibleSnapshot {
            found: SNAPSHOT_VERSION + 1,
            expected: SNAPSHOT_VERSION
        }
    );
}

#[test]
fn garbage_is_a_serialization_error() {
    assert!(matches!(
        decode_snapshot("{\"version\": 1, \"state\": 7}"),
        Err(StoreError::Serialization(_))
    ));
    assert!(matches!(
        decode_snapshot("not json"),
        Err(StoreError::Serialization(_))
    ));
}

#[test]
fn file_store_round_trip_and_clear() {
    let store = temp_store();
    assert_eq!(store.load().unwrap(), None);
    store.clear().unwrap();

    let snapshot = TournamentSnapshot::new(sample_state());
    store.save(&snapshot).unwrap();
    assert!(store.path().exists());
    assert_eq!(store.load().unwrap(), Some(snapshot.clone()));

    let mut next = snapshot.clone();
    next.state.bronze_winner = Some("X".to_string());
    store.save(&next).unwrap();
    assert_eq!(store.load().unwrap(), Some(next));

    store.clear().unwrap();
    assert!(!store.path().exists());
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn stale_snapshot_blocks_restore() {
    let fx = fixture();
    fx.snapshots.put_raw(r#"{"version": 0, "state": {}}"#);
    assert!(matches!(
        TournamentController::restore(fx.services.clone()),
        Err(StoreError::IncompatibleSnapshot { found: 0, .. })
    ));
}

#[test]
fn every_decision_is_snapshotted() {
    let fx = fixture();
    let mut controller = seeded(&fx, &["A", "B", "C", "D"]);
    controller.record_decision(0, "B").unwrap();

    let saved = decode_snapshot(&fx.snapshots.raw().unwrap()).unwrap();
    assert_eq!(Some(&saved.state), controller.state());
    assert_eq!(saved.state.round_winners, vec![Some("B".to_string()), None]);
}

#[test]
fn controller_snapshot_resumes_elsewhere() {
    let fx = fixture();
    let mut controller = seeded(&fx, &["A", "B", "C"]);
    controller.record_decision(1, "C").unwrap();

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    let other = fixture();
    let resumed = TournamentController::resume(other.services.clone(), snapshot).unwrap();
    assert_eq!(resumed.tournament_id(), controller.tournament_id());
    assert_eq!(resumed.layout(), controller.layout());
}
