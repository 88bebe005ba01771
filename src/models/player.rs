//! Player records as seen by the bracket (registered accounts and guests).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a registered player.
pub type PlayerId = Uuid;

/// Rating given to new and guest players.
pub const DEFAULT_RATING: i32 = 1300;

/// Trim and upper-case a username; usernames are compared in this form.
pub fn normalize_username(name: &str) -> String {
    name.trim().to_uppercase()
}

/// A tournament participant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// `None` for a guest: no persisted record, never written back.
    pub id: Option<PlayerId>,
    pub username: String,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
}

impl Player {
    /// A new registered player with default rating and no games.
    pub fn new(username: impl AsRef<str>) -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            username: normalize_username(username.as_ref()),
            rating: DEFAULT_RATING,
            wins: 0,
            losses: 0,
        }
    }

    /// Builder-style rating override (seed files, tests).
    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }

    /// Synthetic stand-in for a name with no account.
    pub fn guest(username: impl AsRef<str>) -> Self {
        Self {
            id: None,
            ..Self::new(username)
        }
    }

    pub fn is_guest(&self) -> bool {
        self.id.is_none()
    }

    /// Record a win for this player.
    pub fn add_win(&mut self) {
        self.wins += 1;
    }

    /// Record a loss for this player.
    pub fn add_loss(&mut self) {
        self.losses += 1;
    }
}
