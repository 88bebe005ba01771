//! Contracts for the collaborators the bracket writes to, plus concrete stores.
//!
//! Every store call is best-effort from the engine's point of view: a failure is
//! reported as a [`PersistenceFailure`] warning and never rolls back bracket
//! progression.

mod memory;
mod snapshot;

pub use memory::{MemoryStore, RecordingNotifier};
pub use snapshot::{decode_snapshot, encode_snapshot, JsonFileSnapshotStore, MemorySnapshotStore};

use crate::models::{CompletedTournament, MatchRecord, Player, PlayerId, TournamentSnapshot};
use std::sync::Arc;

/// Failure reported by a collaborator store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// Backend could not be reached.
    Unavailable(String),
    /// Backend refused the write.
    Rejected(String),
    /// Backend does not accept one of the supplied columns.
    SchemaMismatch(String),
    /// Snapshot written by a different schema version.
    IncompatibleSnapshot { found: u32, expected: u32 },
    Io(String),
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Rejected(msg) => write!(f, "write rejected: {}", msg),
            StoreError::SchemaMismatch(msg) => write!(f, "schema mismatch: {}", msg),
            StoreError::IncompatibleSnapshot { found, expected } => write!(
                f,
                "snapshot version {} is not supported (expected {})",
                found, expected
            ),
            StoreError::Io(msg) => write!(f, "io error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Non-fatal warning: a downstream write failed but the bracket kept moving.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PersistenceFailure {
    PlayerLookup { username: String, error: StoreError },
    RatingWrite { username: String, error: StoreError },
    MatchAppend { error: StoreError },
    HistoryInsert { error: StoreError },
    Snapshot { error: StoreError },
}

impl std::fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceFailure::PlayerLookup { username, error } => {
                write!(f, "Could not look up {}: {}", username, error)
            }
            PersistenceFailure::RatingWrite { username, error } => {
                write!(f, "Rating for {} not saved: {}", username, error)
            }
            PersistenceFailure::MatchAppend { error } => write!(f, "Match not saved: {}", error),
            PersistenceFailure::HistoryInsert { error } => {
                write!(f, "Tournament result not saved: {}", error)
            }
            PersistenceFailure::Snapshot { error } => {
                write!(f, "Tournament progress not saved: {}", error)
            }
        }
    }
}

/// Registered player accounts.
pub trait PlayerStore: Send + Sync {
    /// Case-insensitive lookup; `Ok(None)` when no account exists.
    fn find_by_username(&self, username: &str) -> Result<Option<Player>, StoreError>;
    fn update_rating(&self, id: PlayerId, rating: i32) -> Result<(), StoreError>;
    fn increment_win_loss(&self, id: PlayerId, won: bool) -> Result<(), StoreError>;
}

/// Append-only match history.
///
/// A store may refuse an extended record (scores, tournament linkage) with
/// [`StoreError::SchemaMismatch`] or any other error; callers retry once with
/// [`MatchRecord::minimal`]. A minimal record is never retried.
pub trait MatchStore: Send + Sync {
    fn append(&self, record: &MatchRecord) -> Result<(), StoreError>;
}

/// Completed tournaments.
pub trait TournamentHistoryStore: Send + Sync {
    fn insert_completed(&self, record: &CompletedTournament) -> Result<(), StoreError>;
}

/// Local durable slot holding at most one live tournament, for crash/reload resume.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &TournamentSnapshot) -> Result<(), StoreError>;
    /// `Ok(None)` when nothing is saved; `IncompatibleSnapshot` on a version mismatch.
    fn load(&self) -> Result<Option<TournamentSnapshot>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Fire-and-forget UI signal. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);

    /// Show (`Some`) or hide (`None`) a loading indicator.
    fn loading(&self, _message: Option<&str>) {}
}

/// Notifier that only writes to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => log::info!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
    }
}

/// The collaborators a tournament needs.
#[derive(Clone)]
pub struct Services {
    pub players: Arc<dyn PlayerStore>,
    pub matches: Arc<dyn MatchStore>,
    pub history: Arc<dyn TournamentHistoryStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    /// All record stores backed by one [`MemoryStore`].
    pub fn in_memory(
        store: Arc<MemoryStore>,
        snapshots: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            players: store.clone(),
            matches: store.clone(),
            history: store,
            snapshots,
            notifier,
        }
    }

    /// Log and surface each warning through the notifier.
    pub fn report(&self, warnings: &[PersistenceFailure]) {
        for w in warnings {
            log::warn!("{}", w);
            self.notifier.notify(&w.to_string(), Severity::Warning);
        }
    }
}
