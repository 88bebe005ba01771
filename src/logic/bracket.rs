//! Single-elimination slot arithmetic: byes, pairings, completion.
//!
//! A round of `n` players is padded up to the next power of two with byes. The
//! first `bye_count(n)` players advance without playing and occupy slots
//! `0..bye_count(n)`; the rest are paired in order, one slot per pair.

/// `2^ceil(log2(n))`, with `next_power_of_two(0) == 1`.
pub fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

/// Number of byes needed to pad `n` players to a power of two. Zero for `n <= 1`.
pub fn bye_count(n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    next_power_of_two(n) - n
}

/// Matches actually played in a round of `n`.
pub fn match_count(n: usize) -> usize {
    (n - bye_count(n)) / 2
}

/// Byes plus matches: the number of winners the round produces.
pub fn slot_count(n: usize) -> usize {
    bye_count(n) + match_count(n)
}

/// The pairing playing in `slot`, or `None` for a bye or out-of-range slot.
pub fn slot_players(round_players: &[String], slot: usize) -> Option<(&str, &str)> {
    let byes = bye_count(round_players.len());
    if slot < byes {
        return None;
    }
    let first = byes + 2 * (slot - byes);
    let player1 = round_players.get(first)?;
    let player2 = round_players.get(first + 1)?;
    Some((player1.as_str(), player2.as_str()))
}

/// Whether every slot of the round has a winner.
///
/// In the finals stage only the final (slot 0) is checked; the bronze match is
/// tracked by the controller.
pub fn is_round_complete(
    round_players: &[String],
    round_winners: &[Option<String>],
    in_finals_stage: bool,
) -> bool {
    if in_finals_stage {
        return matches!(round_winners.first(), Some(Some(_)));
    }
    let n = round_players.len();
    let matches = match_count(n);
    if matches == 0 {
        return false;
    }
    let picked = round_winners.iter().filter(|w| w.is_some()).count();
    picked == bye_count(n) + matches
}
