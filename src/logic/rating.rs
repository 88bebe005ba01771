//! Elo rating updates for a single decided match.

/// K-factor for rating updates.
pub const K_FACTOR: f64 = 32.0;

/// Expected score of a player rated `rating` against `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((f64::from(opponent) - f64::from(rating)) / 400.0))
}

/// New ratings `(a, b)` after a match between players rated `rating_a` and `rating_b`.
///
/// The winner always gains at least one point and the loser always drops at
/// least one, even when the rating gap rounds the raw change to zero. Ratings
/// never go below zero.
pub fn compute(rating_a: i32, rating_b: i32, winner_is_a: bool) -> (i32, i32) {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;
    let actual_a = if winner_is_a { 1.0 } else { 0.0 };
    let actual_b = 1.0 - actual_a;

    let raw_a = (f64::from(rating_a) + K_FACTOR * (actual_a - expected_a)).round() as i32;
    let raw_b = (f64::from(rating_b) + K_FACTOR * (actual_b - expected_b)).round() as i32;

    if winner_is_a {
        (at_least_plus_one(rating_a, raw_a), at_least_minus_one(rating_b, raw_b))
    } else {
        (at_least_minus_one(rating_a, raw_a), at_least_plus_one(rating_b, raw_b))
    }
}

fn at_least_plus_one(old: i32, new: i32) -> i32 {
    if new <= old {
        old.saturating_add(1)
    } else {
        new
    }
}

fn at_least_minus_one(old: i32, new: i32) -> i32 {
    let new = if new >= old { old.saturating_sub(1) } else { new };
    new.max(0)
}

/// True when `new` crosses into a higher hundred than `old` (level-up card).
pub fn crossed_milestone(old: i32, new: i32) -> bool {
    new.div_euclid(100) > old.div_euclid(100)
}
