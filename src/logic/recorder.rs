//! Recording a decided match: rating update, win/loss counters and the match row.

use crate::logic::rating;
use crate::models::{MatchRequest, Player, TournamentError};
use crate::store::{PersistenceFailure, Services, StoreError};

/// Result of [`MatchRecorder::record_match`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchOutcome {
    /// True when every write landed.
    pub success: bool,
    pub new_winner_rating: i32,
    pub rating_gain: i32,
    pub winner_is_guest: bool,
    /// New rating when the winner crossed into a higher hundred.
    pub level_up: Option<i32>,
    pub warnings: Vec<PersistenceFailure>,
}

/// Records matches against the player and match stores in `services`.
pub struct MatchRecorder<'a> {
    services: &'a Services,
}

impl<'a> MatchRecorder<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Resolve both players, apply the Elo update and persist it.
    ///
    /// Rejects a malformed request before touching any store. Guests (names with
    /// no account) get a default rating and are never written back, but the
    /// match row always names them. Store failures become warnings.
    pub fn record_match(&self, request: &MatchRequest) -> Result<MatchOutcome, TournamentError> {
        validate(request)?;

        self.services.notifier.loading(Some("Recording match..."));
        let outcome = self.record_validated(request);
        self.services.notifier.loading(None);

        self.services.report(&outcome.warnings);
        Ok(outcome)
    }

    fn record_validated(&self, request: &MatchRequest) -> MatchOutcome {
        let mut warnings = Vec::new();
        let player1 = self.resolve(&request.player1, &mut warnings);
        let player2 = self.resolve(&request.player2, &mut warnings);

        let p1_won = request.winner_is_player1();
        let (p1_rating, p2_rating) = rating::compute(player1.rating, player2.rating, p1_won);

        self.write_result(&player1, p1_rating, p1_won, &mut warnings);
        self.write_result(&player2, p2_rating, !p1_won, &mut warnings);
        self.append_match(request, &mut warnings);

        let (winner, new_winner_rating) = if p1_won {
            (&player1, p1_rating)
        } else {
            (&player2, p2_rating)
        };
        let level_up =
            rating::crossed_milestone(winner.rating, new_winner_rating).then_some(new_winner_rating);
        log::debug!(
            "{} beat {} ({} -> {})",
            request.winner,
            if p1_won { &player2.username } else { &player1.username },
            winner.rating,
            new_winner_rating
        );

        MatchOutcome {
            success: warnings.is_empty(),
            new_winner_rating,
            rating_gain: new_winner_rating - winner.rating,
            winner_is_guest: winner.is_guest(),
            level_up,
            warnings,
        }
    }

    /// Registered player, or a guest stand-in. A failed lookup counts as a guest.
    fn resolve(&self, username: &str, warnings: &mut Vec<PersistenceFailure>) -> Player {
        match self.services.players.find_by_username(username) {
            Ok(Some(player)) => player,
            Ok(None) => Player::guest(username),
            Err(error) => {
                warnings.push(PersistenceFailure::PlayerLookup {
                    username: username.to_string(),
                    error,
                });
                Player::guest(username)
            }
        }
    }

    fn write_result(
        &self,
        player: &Player,
        new_rating: i32,
        won: bool,
        warnings: &mut Vec<PersistenceFailure>,
    ) {
        let Some(id) = player.id else {
            return;
        };
        let write = || -> Result<(), StoreError> {
            self.services.players.update_rating(id, new_rating)?;
            self.services.players.increment_win_loss(id, won)
        };
        if let Err(error) = write() {
            warnings.push(PersistenceFailure::RatingWrite {
                username: player.username.clone(),
                error,
            });
        }
    }

    /// Full record first; on refusal, once more with only the mandatory columns.
    fn append_match(&self, request: &MatchRequest, warnings: &mut Vec<PersistenceFailure>) {
        let record = request.to_record();
        let error = match self.services.matches.append(&record) {
            Ok(()) => return,
            Err(e) => e,
        };
        if record.is_minimal() {
            warnings.push(PersistenceFailure::MatchAppend { error });
            return;
        }
        log::warn!("Match insert refused ({}), retrying with minimal record", error);
        if let Err(error) = self.services.matches.append(&record.minimal()) {
            warnings.push(PersistenceFailure::MatchAppend { error });
        }
    }
}

fn validate(request: &MatchRequest) -> Result<(), TournamentError> {
    if request.player1.is_empty() || request.player2.is_empty() {
        return Err(TournamentError::EmptyPlayerName);
    }
    if request.player1 == request.player2 {
        return Err(TournamentError::DuplicatePlayerName(request.player1.clone()));
    }
    if request.winner != request.player1 && request.winner != request.player2 {
        return Err(TournamentError::InvalidWinner {
            winner: request.winner.clone(),
        });
    }
    Ok(())
}
