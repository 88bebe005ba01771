//! Live tournament: seeding, decisions, round advancement, finals stage, finalize and resume.
//!
//! Every state-changing call snapshots the state afterwards so a reload can pick
//! up from the last decision. Store failures never undo an in-memory change;
//! they come back as warnings alongside the result.

use crate::logic::bracket;
use crate::logic::recorder::{MatchOutcome, MatchRecorder};
use crate::models::{
    default_tournament_name, normalize_username, CompletedTournament, MatchRequest, Phase,
    RoundLayout, TournamentError, TournamentId, TournamentSnapshot, TournamentState,
    TournamentSummary,
};
use crate::store::{PersistenceFailure, Services, Severity, StoreError};
use chrono::Utc;
use rand::seq::SliceRandom;

/// Result of recording one decision.
#[derive(Clone, Debug)]
pub struct DecisionReport {
    pub outcome: MatchOutcome,
    /// Whether `advance` would now succeed.
    pub round_complete: bool,
    /// Every store failure from this call, including the recorder's.
    pub warnings: Vec<PersistenceFailure>,
}

#[derive(Clone, Debug)]
pub enum Advanced {
    /// Next round (or the final and bronze match) drawn.
    Round(RoundLayout),
    /// Tournament finalized.
    Finished(TournamentSummary),
}

#[derive(Clone, Debug)]
pub struct AdvanceReport {
    pub advanced: Advanced,
    pub warnings: Vec<PersistenceFailure>,
}

/// Owns the one live tournament of a session.
pub struct TournamentController {
    services: Services,
    tournament_name: String,
    state: Option<TournamentState>,
    finalized: bool,
}

impl TournamentController {
    /// Controller in `Setup`, with no live tournament.
    pub fn new(services: Services) -> Self {
        Self {
            services,
            tournament_name: default_tournament_name(),
            state: None,
            finalized: false,
        }
    }

    /// Name stamped on the tournament and its match records.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tournament_name = name.into();
        self
    }

    /// Rebuild a controller from a snapshot. Bye slots are re-applied; nothing is recorded.
    pub fn resume(
        services: Services,
        snapshot: TournamentSnapshot,
    ) -> Result<Self, TournamentError> {
        let mut state = snapshot.state;
        if state.round_players.is_empty() {
            return Err(TournamentError::InvalidState);
        }
        state.fill_byes();
        log::info!(
            "Resumed tournament {} with {} players in round",
            state.tournament_id,
            state.round_players.len()
        );
        Ok(Self {
            services,
            tournament_name: state.tournament_name.clone(),
            state: Some(state),
            finalized: false,
        })
    }

    /// Resume from the snapshot store, if it holds a tournament.
    pub fn restore(services: Services) -> Result<Option<Self>, StoreError> {
        match services.snapshots.load()? {
            Some(snapshot) => Self::resume(services, snapshot)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.finalized {
            return Phase::Finalized;
        }
        self.state.as_ref().map_or(Phase::Setup, TournamentState::phase)
    }

    pub fn state(&self) -> Option<&TournamentState> {
        self.state.as_ref()
    }

    pub fn tournament_id(&self) -> Option<TournamentId> {
        self.state.as_ref().map(|s| s.tournament_id)
    }

    /// Current draw, derived from state.
    pub fn layout(&self) -> Option<RoundLayout> {
        self.state.as_ref().map(TournamentState::layout)
    }

    /// A full snapshot of the live state.
    pub fn snapshot(&self) -> Option<TournamentSnapshot> {
        self.state.clone().map(TournamentSnapshot::new)
    }

    /// Start with the pool in random seed order.
    pub fn start<S: AsRef<str>>(
        &mut self,
        pool: &[S],
    ) -> Result<Vec<PersistenceFailure>, TournamentError> {
        let mut players = self.validate_pool(pool)?;
        players.shuffle(&mut rand::thread_rng());
        Ok(self.begin(players))
    }

    /// Start with the pool exactly in the given seed order.
    pub fn start_seeded<S: AsRef<str>>(
        &mut self,
        pool: &[S],
    ) -> Result<Vec<PersistenceFailure>, TournamentError> {
        let players = self.validate_pool(pool)?;
        Ok(self.begin(players))
    }

    fn validate_pool<S: AsRef<str>>(&self, pool: &[S]) -> Result<Vec<String>, TournamentError> {
        if self.finalized || self.state.is_some() {
            return Err(TournamentError::InvalidState);
        }
        let mut players: Vec<String> = Vec::with_capacity(pool.len());
        for name in pool {
            let name = normalize_username(name.as_ref());
            if name.is_empty() {
                return Err(TournamentError::EmptyPlayerName);
            }
            if players.contains(&name) {
                return Err(TournamentError::DuplicatePlayerName(name));
            }
            players.push(name);
        }
        if players.len() < 2 {
            return Err(TournamentError::InvalidPool {
                found: players.len(),
            });
        }
        Ok(players)
    }

    fn begin(&mut self, players: Vec<String>) -> Vec<PersistenceFailure> {
        let mut state = TournamentState::new(players, self.tournament_name.clone());
        state.open_round();
        log::info!(
            "Started tournament {} with {} players ({} byes)",
            state.tournament_id,
            state.initial_player_count,
            state.bye_count()
        );
        self.state = Some(state);
        self.persist()
    }

    /// Record the winner of `slot` in the current round (slot 0 is the final in the finals stage).
    pub fn record_decision(
        &mut self,
        slot: usize,
        winner: &str,
    ) -> Result<DecisionReport, TournamentError> {
        let state = self.state.as_ref().ok_or(TournamentError::InvalidState)?;
        let (player1, player2) = if state.in_finals_stage() {
            if slot != 0 {
                return Err(TournamentError::UnresolvedPairing { slot });
            }
            (state.finalists[0].clone(), state.finalists[1].clone())
        } else {
            let (p1, p2) = bracket::slot_players(&state.round_players, slot)
                .ok_or(TournamentError::UnresolvedPairing { slot })?;
            (p1.to_string(), p2.to_string())
        };
        if matches!(state.round_winners.get(slot), Some(Some(_))) {
            return Err(TournamentError::SlotAlreadyDecided { slot });
        }
        let request = MatchRequest::new(&player1, &player2, winner)
            .in_tournament(state.tournament_id, state.tournament_name.clone());
        let outcome = MatchRecorder::new(&self.services).record_match(&request)?;

        let state = self.state.as_mut().ok_or(TournamentError::InvalidState)?;
        credit(state, &request.winner, &outcome);
        if state.round_winners.len() <= slot {
            state.round_winners.resize(slot + 1, None);
        }
        state.round_winners[slot] = Some(request.winner.clone());
        log::debug!("Slot {}: {} beat {}", slot, request.winner, loser_of(&request));
        Ok(self.finish_decision(outcome))
    }

    /// Record the winner of the bronze match (finals stage only).
    pub fn record_bronze_decision(
        &mut self,
        winner: &str,
    ) -> Result<DecisionReport, TournamentError> {
        let state = self.state.as_ref().ok_or(TournamentError::InvalidState)?;
        if !state.in_finals_stage() {
            return Err(TournamentError::InvalidState);
        }
        if state.bronze_contenders.len() != 2 {
            return Err(TournamentError::UnresolvedPairing { slot: 0 });
        }
        if state.bronze_winner.is_some() {
            return Err(TournamentError::SlotAlreadyDecided { slot: 0 });
        }
        let request = MatchRequest::new(
            &state.bronze_contenders[0],
            &state.bronze_contenders[1],
            winner,
        )
        .in_tournament(
            state.tournament_id,
            format!("{} (Bronze)", state.tournament_name),
        );
        let outcome = MatchRecorder::new(&self.services).record_match(&request)?;

        let state = self.state.as_mut().ok_or(TournamentError::InvalidState)?;
        credit(state, &request.winner, &outcome);
        state.bronze_winner = Some(request.winner.clone());
        log::debug!("Bronze: {} beat {}", request.winner, loser_of(&request));
        Ok(self.finish_decision(outcome))
    }

    fn finish_decision(&self, mut outcome: MatchOutcome) -> DecisionReport {
        let mut warnings = std::mem::take(&mut outcome.warnings);
        warnings.extend(self.persist());
        let round_complete = self.state.as_ref().is_some_and(TournamentState::is_complete);
        DecisionReport {
            outcome,
            round_complete,
            warnings,
        }
    }

    /// Move to the next round, into the finals stage, or finalize.
    pub fn advance(&mut self) -> Result<AdvanceReport, TournamentError> {
        let state = self.state.as_ref().ok_or(TournamentError::InvalidState)?;

        if !state.in_finals_stage() && state.round_players.len() == 1 {
            let champion = state.round_players[0].clone();
            return Ok(self.finalize(champion, None, None));
        }
        if !state.is_complete() {
            return Err(TournamentError::RoundIncomplete);
        }

        if state.in_finals_stage() {
            let champion = state.round_winners[0].clone().unwrap_or_default();
            let second = state.finalists.iter().find(|f| **f != champion).cloned();
            let third = state.bronze_winner.clone();
            return Ok(self.finalize(champion, second, third));
        }

        let state = self.state.as_mut().ok_or(TournamentError::InvalidState)?;
        if state.round_players.len() == 4 {
            state.finalists = state.decided_winners();
            state.bronze_contenders = state.round_losers();
            state.open_round();
            log::info!(
                "Final: {} vs {}; bronze: {} vs {}",
                state.finalists[0],
                state.finalists[1],
                state.bronze_contenders.first().map_or("-", String::as_str),
                state.bronze_contenders.get(1).map_or("-", String::as_str)
            );
            let layout = state.layout();
            return Ok(AdvanceReport {
                advanced: Advanced::Round(layout),
                warnings: self.persist(),
            });
        }

        let runner_up = if state.round_players.len() == 2 {
            state.round_losers().into_iter().next()
        } else {
            None
        };
        state.round_players = state.decided_winners();
        if state.round_players.len() == 1 {
            let champion = state.round_players[0].clone();
            return Ok(self.finalize(champion, runner_up, None));
        }
        state.open_round();
        log::info!(
            "Next round: {} players, {} byes",
            state.round_players.len(),
            state.bye_count()
        );
        let layout = state.layout();
        Ok(AdvanceReport {
            advanced: Advanced::Round(layout),
            warnings: self.persist(),
        })
    }

    fn finalize(
        &mut self,
        champion: String,
        second: Option<String>,
        third: Option<String>,
    ) -> AdvanceReport {
        let mut warnings = Vec::new();
        let Some(state) = self.state.take() else {
            return AdvanceReport {
                advanced: Advanced::Round(RoundLayout::Champion { name: champion }),
                warnings,
            };
        };
        self.finalized = true;

        let record = CompletedTournament {
            tournament_id: state.tournament_id,
            tournament_name: state.tournament_name.clone(),
            winner_name: champion.clone(),
            second_place_name: second,
            third_place_name: third,
            initial_player_count: state.initial_player_count,
            completed_at: Utc::now(),
        };
        if let Err(error) = self.services.history.insert_completed(&record) {
            warnings.push(PersistenceFailure::HistoryInsert { error });
        }
        if let Err(error) = self.services.snapshots.clear() {
            warnings.push(PersistenceFailure::Snapshot { error });
        }

        let winner_rating = match self.services.players.find_by_username(&champion) {
            Ok(Some(player)) => Some(player.rating),
            Ok(None) => state.session_ratings.get(&champion).copied(),
            Err(error) => {
                warnings.push(PersistenceFailure::PlayerLookup {
                    username: champion.clone(),
                    error,
                });
                state.session_ratings.get(&champion).copied()
            }
        };
        let winner_gain = state.session_gains.get(&champion).copied().unwrap_or(0);

        log::info!(
            "Tournament {} finished: 1. {} 2. {} 3. {}",
            record.tournament_id,
            record.winner_name,
            record.second_place_name.as_deref().unwrap_or("-"),
            record.third_place_name.as_deref().unwrap_or("-")
        );
        self.services.report(&warnings);
        if warnings.is_empty() {
            self.services
                .notifier
                .notify("Tournament saved successfully!", Severity::Success);
        }

        AdvanceReport {
            advanced: Advanced::Finished(TournamentSummary {
                record,
                winner_rating,
                winner_gain,
                session_gains: state.session_gains,
            }),
            warnings,
        }
    }

    /// Drop the live tournament without writing a result.
    pub fn abandon(&mut self) -> Result<Vec<PersistenceFailure>, TournamentError> {
        if self.finalized {
            return Err(TournamentError::InvalidState);
        }
        let state = self.state.take().ok_or(TournamentError::InvalidState)?;
        log::info!("Abandoned tournament {}", state.tournament_id);
        let mut warnings = Vec::new();
        if let Err(error) = self.services.snapshots.clear() {
            warnings.push(PersistenceFailure::Snapshot { error });
        }
        self.services.report(&warnings);
        Ok(warnings)
    }

    fn persist(&self) -> Vec<PersistenceFailure> {
        let Some(state) = self.state.as_ref() else {
            return Vec::new();
        };
        let warnings = match self
            .services
            .snapshots
            .save(&TournamentSnapshot::new(state.clone()))
        {
            Ok(()) => Vec::new(),
            Err(error) => vec![PersistenceFailure::Snapshot { error }],
        };
        self.services.report(&warnings);
        warnings
    }
}

/// Add the winner's rating change to the session tallies.
fn credit(state: &mut TournamentState, winner: &str, outcome: &MatchOutcome) {
    *state.session_gains.entry(winner.to_string()).or_insert(0) += outcome.rating_gain;
    state
        .session_ratings
        .insert(winner.to_string(), outcome.new_winner_rating);
}

fn loser_of(request: &MatchRequest) -> &str {
    if request.winner_is_player1() {
        &request.player2
    } else {
        &request.player1
    }
}
