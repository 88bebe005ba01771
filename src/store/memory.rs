//! In-process stores: players, matches and history behind mutexes.
//!
//! Used by the web binary as the stand-in record store and by tests, which flip
//! the failure switches to exercise the warning paths.

use super::{MatchStore, Notifier, PlayerStore, Severity, StoreError, TournamentHistoryStore};
use crate::models::{
    normalize_username, CompletedTournament, MatchRecord, Player, PlayerId, DEFAULT_RATING,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryStore {
    players: Mutex<HashMap<PlayerId, Player>>,
    matches: Mutex<Vec<MatchRecord>>,
    completed: Mutex<Vec<CompletedTournament>>,
    append_attempts: AtomicUsize,
    /// Refuse match records carrying optional columns.
    pub reject_extended_matches: AtomicBool,
    /// Refuse every match record.
    pub fail_matches: AtomicBool,
    pub fail_rating_writes: AtomicBool,
    pub fail_lookups: AtomicBool,
    pub fail_history: AtomicBool,
}

/// One row of a player seed CSV: `username,rating,wins,losses`.
#[derive(Debug, Deserialize)]
struct PlayerRow {
    username: String,
    #[serde(default)]
    rating: Option<i32>,
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    losses: u32,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn read<T: Clone>(m: &Mutex<T>) -> T {
    match m.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with_player(self, player: Player) -> Self {
        self.insert_player(player);
        self
    }

    /// Register `player`, replacing any account with the same username.
    /// Guests (no id) are ignored.
    pub fn insert_player(&self, player: Player) -> Option<PlayerId> {
        let id = player.id?;
        if let Ok(mut players) = self.players.lock() {
            players.retain(|_, p| p.username != player.username);
            players.insert(id, player);
        }
        Some(id)
    }

    /// Register players from CSV with a `username,rating,wins,losses` header.
    /// A repeated username keeps the later row. Returns how many rows were loaded.
    pub fn load_players_csv<R: std::io::Read>(&self, reader: R) -> Result<usize, StoreError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut loaded = 0;
        for row in rdr.deserialize::<PlayerRow>() {
            let row = row.map_err(|e| StoreError::Serialization(e.to_string()))?;
            if normalize_username(&row.username).is_empty() {
                continue;
            }
            let mut player =
                Player::new(&row.username).with_rating(row.rating.unwrap_or(DEFAULT_RATING));
            player.wins = row.wins;
            player.losses = row.losses;
            self.insert_player(player);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Registered player by (case-insensitive) name.
    pub fn player(&self, username: &str) -> Option<Player> {
        let wanted = normalize_username(username);
        read(&self.players).into_values().find(|p| p.username == wanted)
    }

    pub fn matches(&self) -> Vec<MatchRecord> {
        read(&self.matches)
    }

    pub fn completed(&self) -> Vec<CompletedTournament> {
        read(&self.completed)
    }

    /// Match appends tried so far, refused ones included.
    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }

    fn switch(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }
}

impl PlayerStore for MemoryStore {
    fn find_by_username(&self, username: &str) -> Result<Option<Player>, StoreError> {
        if Self::switch(&self.fail_lookups) {
            return Err(StoreError::Unavailable("player lookup disabled".to_string()));
        }
        let wanted = normalize_username(username);
        let players = lock(&self.players)?;
        Ok(players.values().find(|p| p.username == wanted).cloned())
    }

    fn update_rating(&self, id: PlayerId, rating: i32) -> Result<(), StoreError> {
        if Self::switch(&self.fail_rating_writes) {
            return Err(StoreError::Rejected("rating writes disabled".to_string()));
        }
        let mut players = lock(&self.players)?;
        let player = players
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("no player {}", id)))?;
        player.rating = rating;
        Ok(())
    }

    fn increment_win_loss(&self, id: PlayerId, won: bool) -> Result<(), StoreError> {
        if Self::switch(&self.fail_rating_writes) {
            return Err(StoreError::Rejected("rating writes disabled".to_string()));
        }
        let mut players = lock(&self.players)?;
        let player = players
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("no player {}", id)))?;
        if won {
            player.add_win();
        } else {
            player.add_loss();
        }
        Ok(())
    }
}

impl MatchStore for MemoryStore {
    fn append(&self, record: &MatchRecord) -> Result<(), StoreError> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if Self::switch(&self.fail_matches) {
            return Err(StoreError::Unavailable("match writes disabled".to_string()));
        }
        if Self::switch(&self.reject_extended_matches) && !record.is_minimal() {
            return Err(StoreError::SchemaMismatch("unknown column tournament_id".to_string()));
        }
        lock(&self.matches)?.push(record.clone());
        Ok(())
    }
}

impl TournamentHistoryStore for MemoryStore {
    fn insert_completed(&self, record: &CompletedTournament) -> Result<(), StoreError> {
        if Self::switch(&self.fail_history) {
            return Err(StoreError::Unavailable("history writes disabled".to_string()));
        }
        lock(&self.completed)?.push(record.clone());
        Ok(())
    }
}

/// Notifier that keeps every message, for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
    loading_shown: Mutex<u32>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        read(&self.messages)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages()
            .iter()
            .filter(|(_, s)| *s == severity)
            .count()
    }

    /// How many times a loading indicator was shown.
    pub fn loading_shown(&self) -> u32 {
        read(&self.loading_shown)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((message.to_string(), severity));
        }
    }

    fn loading(&self, message: Option<&str>) {
        if message.is_some() {
            if let Ok(mut shown) = self.loading_shown.lock() {
                *shown += 1;
            }
        }
    }
}
