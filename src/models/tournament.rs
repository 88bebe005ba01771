//! Live bracket state, its derived views, and the completed-tournament record.

use crate::logic::bracket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Errors that reject a tournament operation before any state changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Fewer than 2 entrants at start.
    InvalidPool { found: usize },
    /// Two entrants normalize to the same username.
    DuplicatePlayerName(String),
    /// An entrant name is blank after trimming.
    EmptyPlayerName,
    /// `advance` called before every slot has a winner.
    RoundIncomplete,
    /// The slot is a bye, out of range, or otherwise has no pairing.
    UnresolvedPairing { slot: usize },
    /// The slot already has a recorded winner.
    SlotAlreadyDecided { slot: usize },
    /// The named winner is not one of the two participants.
    InvalidWinner { winner: String },
    /// Operation not allowed in the current phase.
    InvalidState,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InvalidPool { found } => {
                write!(f, "Need at least 2 players for a tournament (got {})", found)
            }
            TournamentError::DuplicatePlayerName(name) => {
                write!(f, "Player {} is already in the pool", name)
            }
            TournamentError::EmptyPlayerName => write!(f, "Player name cannot be empty"),
            TournamentError::RoundIncomplete => write!(f, "Not all matches have a winner"),
            TournamentError::UnresolvedPairing { slot } => {
                write!(f, "Slot {} has no match to decide", slot)
            }
            TournamentError::SlotAlreadyDecided { slot } => {
                write!(f, "Slot {} already has a winner", slot)
            }
            TournamentError::InvalidWinner { winner } => {
                write!(f, "{} is not playing in this match", winner)
            }
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Unique identifier for a tournament; also stamped on its match records.
pub type TournamentId = Uuid;

/// Where the controller is in the tournament lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No live tournament; collecting a pool.
    #[default]
    Setup,
    /// A regular round is being played.
    RoundInProgress,
    /// The current round has exactly 4 players; advancing enters the finals stage.
    SemifinalPending,
    /// Final and bronze match are both open or partially decided.
    FinalBronzePending,
    /// Champion determined and the completed record written. Absorbing.
    Finalized,
}

/// One playable pairing in the current draw.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSlot {
    /// Index into the round's winners (0 for both finals-stage matches).
    pub slot: usize,
    pub player1: String,
    pub player2: String,
    pub winner: Option<String>,
}

/// UI-independent structure of the current round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundLayout {
    /// Byes occupy slots `0..byes.len()`; matches follow.
    Regular {
        byes: Vec<String>,
        matches: Vec<MatchSlot>,
    },
    FinalAndBronze {
        final_match: MatchSlot,
        bronze_match: MatchSlot,
    },
    /// A single survivor remains.
    Champion { name: String },
}

/// The only mutable aggregate of a live tournament. Serialized verbatim into snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentState {
    pub tournament_id: TournamentId,
    #[serde(default = "default_tournament_name")]
    pub tournament_name: String,
    /// Players entering the current round, in seed order; byes lead.
    pub round_players: Vec<String>,
    /// Winner per slot; bye slots are filled when the round is drawn.
    pub round_winners: Vec<Option<String>>,
    /// Empty, or the two semifinal winners once the finals stage is entered.
    pub finalists: Vec<String>,
    /// Empty, or the two semifinal losers.
    pub bronze_contenders: Vec<String>,
    pub bronze_winner: Option<String>,
    pub initial_player_count: usize,
    /// Cumulative rating delta per winner during this tournament (display only).
    #[serde(default)]
    pub session_gains: HashMap<String, i32>,
    /// Latest rating seen per winner during this tournament (display only).
    #[serde(default)]
    pub session_ratings: HashMap<String, i32>,
}

pub fn default_tournament_name() -> String {
    "Tournament".to_string()
}

impl TournamentState {
    /// Fresh state with `players` as the first round, in the given seed order.
    pub fn new(players: Vec<String>, tournament_name: impl Into<String>) -> Self {
        Self {
            tournament_id: Uuid::new_v4(),
            tournament_name: tournament_name.into(),
            initial_player_count: players.len(),
            round_players: players,
            round_winners: Vec::new(),
            finalists: Vec::new(),
            bronze_contenders: Vec::new(),
            bronze_winner: None,
            session_gains: HashMap::new(),
            session_ratings: HashMap::new(),
        }
    }

    pub fn in_finals_stage(&self) -> bool {
        self.finalists.len() == 2
    }

    pub fn bye_count(&self) -> usize {
        if self.in_finals_stage() {
            0
        } else {
            bracket::bye_count(self.round_players.len())
        }
    }

    /// Reset winners for a newly drawn round and pre-fill the bye slots.
    pub fn open_round(&mut self) {
        if self.in_finals_stage() {
            self.round_winners = vec![None];
            return;
        }
        self.round_winners = vec![None; bracket::slot_count(self.round_players.len())];
        self.fill_byes();
    }

    /// Re-apply bye winners. Never touches decided match slots.
    pub fn fill_byes(&mut self) {
        if self.in_finals_stage() {
            return;
        }
        let slots = bracket::slot_count(self.round_players.len());
        if self.round_winners.len() < slots {
            self.round_winners.resize(slots, None);
        }
        let byes = self.bye_count();
        for (slot, player) in self.round_players.iter().take(byes).enumerate() {
            self.round_winners[slot] = Some(player.clone());
        }
    }

    /// True once every slot of the current round (and the bronze match, in the finals stage) is decided.
    pub fn is_complete(&self) -> bool {
        let round_done = bracket::is_round_complete(
            &self.round_players,
            &self.round_winners,
            self.in_finals_stage(),
        );
        if self.in_finals_stage() {
            round_done && self.bronze_winner.is_some()
        } else {
            round_done
        }
    }

    /// Winners of the current round, compacted, in slot order.
    pub fn decided_winners(&self) -> Vec<String> {
        self.round_winners.iter().flatten().cloned().collect()
    }

    /// Current-round players with no winning slot.
    pub fn round_losers(&self) -> Vec<String> {
        self.round_players
            .iter()
            .filter(|p| !self.round_winners.iter().flatten().any(|w| w == *p))
            .cloned()
            .collect()
    }

    pub fn phase(&self) -> Phase {
        if self.in_finals_stage() {
            Phase::FinalBronzePending
        } else if self.round_players.len() == 4 {
            Phase::SemifinalPending
        } else {
            Phase::RoundInProgress
        }
    }

    /// Draw the current round from state alone. Pure; never records anything.
    pub fn layout(&self) -> RoundLayout {
        if self.in_finals_stage() {
            return RoundLayout::FinalAndBronze {
                final_match: MatchSlot {
                    slot: 0,
                    player1: self.finalists[0].clone(),
                    player2: self.finalists[1].clone(),
                    winner: self.round_winners.first().cloned().flatten(),
                },
                bronze_match: MatchSlot {
                    slot: 0,
                    player1: self.bronze_contenders.first().cloned().unwrap_or_default(),
                    player2: self.bronze_contenders.get(1).cloned().unwrap_or_default(),
                    winner: self.bronze_winner.clone(),
                },
            };
        }
        if self.round_players.len() == 1 {
            return RoundLayout::Champion {
                name: self.round_players[0].clone(),
            };
        }
        let byes = self.bye_count();
        let matches = (byes..bracket::slot_count(self.round_players.len()))
            .filter_map(|slot| {
                let (player1, player2) = bracket::slot_players(&self.round_players, slot)?;
                Some(MatchSlot {
                    slot,
                    player1: player1.to_string(),
                    player2: player2.to_string(),
                    winner: self.round_winners.get(slot).cloned().flatten(),
                })
            })
            .collect();
        RoundLayout::Regular {
            byes: self.round_players[..byes].to_vec(),
            matches,
        }
    }
}

/// Versioned envelope for persisting a live [`TournamentState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub version: u32,
    pub state: TournamentState,
}

/// Current snapshot schema. Bump when `TournamentState` changes shape.
pub const SNAPSHOT_VERSION: u32 = 1;

impl TournamentSnapshot {
    pub fn new(state: TournamentState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state,
        }
    }
}

/// Row written to the tournament-history store on finalize.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompletedTournament {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    pub winner_name: String,
    pub second_place_name: Option<String>,
    pub third_place_name: Option<String>,
    pub initial_player_count: usize,
    pub completed_at: DateTime<Utc>,
}

/// What the caller gets back when a tournament finishes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub record: CompletedTournament,
    /// Champion's rating after the tournament (store value if registered).
    pub winner_rating: Option<i32>,
    /// Champion's cumulative gain over the tournament.
    pub winner_gain: i32,
    pub session_gains: HashMap<String, i32>,
}
