//! Match records (append-only history) and the request that produces them.

use crate::models::player::normalize_username;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decided match as written to the match store. Never mutated after creation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub player1: String,
    pub player2: String,
    /// Always equal to `player1` or `player2`.
    pub winner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<TournamentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// True when only the mandatory columns are present.
    pub fn is_minimal(&self) -> bool {
        self.player1_score.is_none()
            && self.player2_score.is_none()
            && self.tournament_id.is_none()
            && self.tournament_name.is_none()
    }

    /// Copy with every optional column dropped (names, winner, timestamp only).
    pub fn minimal(&self) -> Self {
        Self {
            player1: self.player1.clone(),
            player2: self.player2.clone(),
            winner: self.winner.clone(),
            player1_score: None,
            player2_score: None,
            tournament_id: None,
            tournament_name: None,
            created_at: self.created_at,
        }
    }
}

/// Input to [`crate::MatchRecorder::record_match`]. Names are normalized on construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchRequest {
    pub player1: String,
    pub player2: String,
    pub winner: String,
    pub player1_score: Option<u32>,
    pub player2_score: Option<u32>,
    pub tournament_id: Option<TournamentId>,
    pub tournament_name: Option<String>,
}

impl MatchRequest {
    pub fn new(player1: &str, player2: &str, winner: &str) -> Self {
        Self {
            player1: normalize_username(player1),
            player2: normalize_username(player2),
            winner: normalize_username(winner),
            player1_score: None,
            player2_score: None,
            tournament_id: None,
            tournament_name: None,
        }
    }

    pub fn with_scores(mut self, player1_score: u32, player2_score: u32) -> Self {
        self.player1_score = Some(player1_score);
        self.player2_score = Some(player2_score);
        self
    }

    /// Link the match to a running tournament.
    pub fn in_tournament(mut self, id: TournamentId, name: impl Into<String>) -> Self {
        self.tournament_id = Some(id);
        self.tournament_name = Some(name.into());
        self
    }

    pub fn winner_is_player1(&self) -> bool {
        self.winner == self.player1
    }

    /// Build the record to persist, stamped now.
    pub fn to_record(&self) -> MatchRecord {
        MatchRecord {
            player1: self.player1.clone(),
            player2: self.player2.clone(),
            winner: self.winner.clone(),
            player1_score: self.player1_score,
            player2_score: self.player2_score,
            tournament_id: self.tournament_id,
            tournament_name: self.tournament_name.clone(),
            created_at: Utc::now(),
        }
    }
}
