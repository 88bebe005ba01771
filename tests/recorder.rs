//! Integration tests for match recording: ratings, guests, fallback writes.

mod common;

use common::{fixture, fixture_with, registered};
use std::sync::atomic::Ordering;
use subsoccer_bracket::{
    MatchRecorder, MatchRequest, MemoryStore, PersistenceFailure, Player, Severity, StoreError,
    TournamentError,
};
use uuid::Uuid;

#[test]
fn registered_players_get_ratings_and_counters() {
    let fx = fixture_with(registered(&["alice", "bob"]));
    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("Alice", "bob", "ALICE"))
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.new_winner_rating, 1316);
    assert_eq!(outcome.rating_gain, 16);
    assert!(!outcome.winner_is_guest);

    let alice = fx.store.player("alice").unwrap();
    let bob = fx.store.player("BOB").unwrap();
    assert_eq!((alice.rating, alice.wins, alice.losses), (1316, 1, 0));
    assert_eq!((bob.rating, bob.wins, bob.losses), (1284, 0, 1));

    let matches = fx.store.matches();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].winner, "ALICE");
    assert_eq!(matches[0].player2, "BOB");
    assert_eq!(fx.notifier.loading_shown(), 1);
}

#[test]
fn guest_is_never_written_but_appears_in_match() {
    let fx = fixture_with(registered(&["alice"]));
    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("alice", "walk-in", "walk-in"))
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.winner_is_guest);
    assert_eq!(outcome.new_winner_rating, 1316);
    assert!(fx.store.player("walk-in").is_none());

    let alice = fx.store.player("alice").unwrap();
    assert_eq!((alice.rating, alice.losses), (1284, 1));

    let matches = fx.store.matches();
    assert_eq!(matches[0].player2, "WALK-IN");
    assert_eq!(matches[0].winner, "WALK-IN");
}

#[test]
fn winner_outside_pairing_is_rejected_before_any_write() {
    let fx = fixture_with(registered(&["alice", "bob"]));
    let err = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("alice", "bob", "carol"))
        .unwrap_err();
    assert_eq!(err, TournamentError::InvalidWinner { winner: "CAROL".to_string() });

    let err = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("alice", "bob", ""))
        .unwrap_err();
    assert!(matches!(err, TournamentError::InvalidWinner { .. }));

    assert!(fx.store.matches().is_empty());
    assert_eq!(fx.store.player("alice").unwrap().rating, 1300);
    assert_eq!(fx.notifier.loading_shown(), 0);
}

#[test]
fn same_player_twice_is_rejected() {
    let fx = fixture();
    let err = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("alice", " ALICE ", "alice"))
        .unwrap_err();
    assert_eq!(err, TournamentError::DuplicatePlayerName("ALICE".to_string()));
}

#[test]
fn extended_record_falls_back_to_minimal() {
    let store = registered(&["alice", "bob"]);
    store.reject_extended_matches.store(true, Ordering::SeqCst);
    let fx = fixture_with(store);

    let request = MatchRequest::new("alice", "bob", "bob")
        .with_scores(3, 5)
        .in_tournament(Uuid::new_v4(), "Friday Cup");
    let outcome = MatchRecorder::new(&fx.services).record_match(&request).unwrap();

    assert!(outcome.success);
    let matches = fx.store.matches();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].is_minimal());
    assert_eq!(matches[0].winner, "BOB");
}

#[test]
fn minimal_retry_failing_gives_one_warning() {
    let store = registered(&["alice", "bob"]);
    store.reject_extended_matches.store(true, Ordering::SeqCst);
    store.fail_matches.store(true, Ordering::SeqCst);
    let fx = fixture_with(store);

    let request = MatchRequest::new("alice", "bob", "alice").in_tournament(Uuid::new_v4(), "Cup");
    let outcome = MatchRecorder::new(&fx.services).record_match(&request).unwrap();

    assert!(!outcome.success);
    assert_eq!(fx.store.append_attempts(), 2);
    assert!(matches!(
        outcome.warnings.as_slice(),
        [PersistenceFailure::MatchAppend { .. }]
    ));
    assert!(fx.store.matches().is_empty());
    assert_eq!(fx.store.player("alice").unwrap().rating, 1316);
}

#[test]
fn minimal_record_is_not_retried() {
    let store = MemoryStore::new();
    store.fail_matches.store(true, Ordering::SeqCst);
    let fx = fixture_with(store);

    MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("a", "b", "b"))
        .unwrap();
    assert_eq!(fx.store.append_attempts(), 1);
}

#[test]
fn extended_record_kept_when_accepted() {
    let fx = fixture();
    let id = Uuid::new_v4();
    let request = MatchRequest::new("x", "y", "x")
        .with_scores(10, 4)
        .in_tournament(id, "Friday Cup");
    MatchRecorder::new(&fx.services).record_match(&request).unwrap();

    let record = &fx.store.matches()[0];
    assert_eq!(record.tournament_id, Some(id));
    assert_eq!(record.tournament_name.as_deref(), Some("Friday Cup"));
    assert_eq!((record.player1_score, record.player2_score), (Some(10), Some(4)));
}

#[test]
fn failed_rating_write_still_records_match() {
    let store = registered(&["alice", "bob"]);
    store.fail_rating_writes.store(true, Ordering::SeqCst);
    let fx = fixture_with(store);

    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("alice", "bob", "alice"))
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome
        .warnings
        .iter()
        .all(|w| matches!(w, PersistenceFailure::RatingWrite { .. })));
    assert_eq!(fx.store.matches().len(), 1);
    assert_eq!(fx.notifier.count(Severity::Warning), 2);
}

#[test]
fn match_store_down_is_a_warning() {
    let store = MemoryStore::new();
    store.fail_matches.store(true, Ordering::SeqCst);
    let fx = fixture_with(store);

    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("a", "b", "a"))
        .unwrap();
    assert!(!outcome.success);
    assert!(matches!(
        outcome.warnings.as_slice(),
        [PersistenceFailure::MatchAppend {
            error: StoreError::Unavailable(_)
        }]
    ));
}

#[test]
fn failed_lookup_treats_player_as_guest() {
    let store = registered(&["alice"]);
    store.fail_lookups.store(true, Ordering::SeqCst);
    let fx = fixture_with(store);

    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("alice", "bob", "alice"))
        .unwrap();
    assert!(outcome.winner_is_guest);
    assert_eq!(fx.store.player("alice").unwrap().rating, 1300);
    assert_eq!(fx.store.matches().len(), 1);
}

#[test]
fn level_up_reported_on_hundred_boundary() {
    let store = MemoryStore::new()
        .with_player(Player::new("riser").with_rating(1295))
        .with_player(Player::new("steady"));
    let fx = fixture_with(store);

    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("riser", "steady", "riser"))
        .unwrap();
    assert_eq!(outcome.level_up, Some(outcome.new_winner_rating));
    assert!(outcome.new_winner_rating >= 1300);

    // 1311 -> ~1326 stays within the same hundred.
    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("riser", "steady", "riser"))
        .unwrap();
    assert!(outcome.new_winner_rating < 1400);
    assert_eq!(outcome.level_up, None);
}

#[test]
fn seed_csv_keeps_one_account_per_name() {
    let csv = "username,rating,wins,losses\nalice,1400,3,1\nbob,,0,0\n Alice ,1500,4,1\n";
    let store = MemoryStore::new();
    assert_eq!(store.load_players_csv(csv.as_bytes()).unwrap(), 3);

    let fx = fixture_with(store);
    let alice = fx.store.player("alice").unwrap();
    assert_eq!((alice.rating, alice.wins), (1500, 4));
    assert_eq!(fx.store.player("bob").unwrap().rating, 1300);

    let outcome = MatchRecorder::new(&fx.services)
        .record_match(&MatchRequest::new("alice", "bob", "alice"))
        .unwrap();
    assert!(outcome.success);
    assert_eq!(fx.store.player("alice").unwrap().rating, outcome.new_winner_rating);
}

#[test]
fn registering_same_name_replaces_account() {
    let store = MemoryStore::new()
        .with_player(Player::new("carol").with_rating(900))
        .with_player(Player::new("CAROL").with_rating(1700));
    assert_eq!(store.player("carol").unwrap().rating, 1700);
}
