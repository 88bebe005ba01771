//! Integration tests for bye/pairing/completion arithmetic.

use subsoccer_bracket::bracket::{
    bye_count, is_round_complete, match_count, next_power_of_two, slot_count, slot_players,
};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{i}")).collect()
}

#[test]
fn bye_count_pads_to_power_of_two() {
    assert_eq!(bye_count(0), 0);
    assert_eq!(bye_count(1), 0);
    for n in 2..=130usize {
        let byes = bye_count(n);
        assert!(byes < n, "n={n}");
        assert!((byes + n).is_power_of_two(), "n={n}");
        assert_eq!(byes + n, next_power_of_two(n), "n={n}");
    }
}

#[test]
fn known_bye_counts() {
    assert_eq!(bye_count(2), 0);
    assert_eq!(bye_count(3), 1);
    assert_eq!(bye_count(5), 3);
    assert_eq!(bye_count(6), 2);
    assert_eq!(bye_count(8), 0);
    assert_eq!(bye_count(9), 7);
}

#[test]
fn first_round_always_leaves_a_power_of_two() {
    for n in 2..=64usize {
        assert!(slot_count(n).is_power_of_two(), "n={n}");
    }
}

#[test]
fn slot_players_skips_byes() {
    let players = names(6); // 2 byes, 2 matches
    assert_eq!(slot_players(&players, 0), None);
    assert_eq!(slot_players(&players, 1), None);
    assert_eq!(slot_players(&players, 2), Some(("P2", "P3")));
    assert_eq!(slot_players(&players, 3), Some(("P4", "P5")));
    assert_eq!(slot_players(&players, 4), None);
}

#[test]
fn slot_players_without_byes() {
    let players = names(4);
    assert_eq!(slot_players(&players, 0), Some(("P0", "P1")));
    assert_eq!(slot_players(&players, 1), Some(("P2", "P3")));
}

#[test]
fn completion_tracks_last_open_slot() {
    let players = names(5); // 3 byes, 1 match
    assert_eq!(match_count(5), 1);
    let mut winners: Vec<Option<String>> = players[..3].iter().cloned().map(Some).collect();
    winners.push(None);
    assert!(!is_round_complete(&players, &winners, false));
    winners[3] = Some("P3".to_string());
    assert!(is_round_complete(&players, &winners, false));
}

#[test]
fn completion_requires_every_match() {
    let players = names(8);
    let mut winners: Vec<Option<String>> = vec![None; 4];
    for slot in 0..4 {
        assert!(!is_round_complete(&players, &winners, false));
        winners[slot] = Some(players[slot * 2].clone());
    }
    assert!(is_round_complete(&players, &winners, false));
}

#[test]
fn single_player_round_is_never_complete() {
    let players = names(1);
    assert!(!is_round_complete(&players, &[Some("P0".to_string())], false));
}

#[test]
fn finals_stage_checks_only_the_final() {
    let players = names(4);
    assert!(!is_round_complete(&players, &[None], true));
    assert!(!is_round_complete(&players, &[], true));
    assert!(is_round_complete(&players, &[Some("P0".to_string())], true));
}
