//! Single-elimination bracket engine with Elo ratings: library with models, logic and stores.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    bracket, rating, AdvanceReport, Advanced, DecisionReport, MatchOutcome, MatchRecorder,
    TournamentController,
};
pub use models::{
    normalize_username, CompletedTournament, MatchRecord, MatchRequest, MatchSlot, Phase, Player,
    PlayerId, RoundLayout, TournamentError, TournamentId, TournamentSnapshot, TournamentState,
    TournamentSummary, DEFAULT_RATING, SNAPSHOT_VERSION,
};
pub use store::{
    decode_snapshot, encode_snapshot, JsonFileSnapshotStore, LogNotifier, MatchStore,
    MemorySnapshotStore, MemoryStore, Notifier, PersistenceFailure, PlayerStore, RecordingNotifier,
    Services, Severity, SnapshotStore, StoreError, TournamentHistoryStore,
};
