//! Data structures for the bracket: players, match records, tournament state.

mod game;
mod player;
mod tournament;

pub use game::{MatchRecord, MatchRequest};
pub use player::{normalize_username, Player, PlayerId, DEFAULT_RATING};
pub use tournament::{
    default_tournament_name, CompletedTournament, MatchSlot, Phase, RoundLayout, TournamentError,
    TournamentId, TournamentSnapshot, TournamentState, TournamentSummary, SNAPSHOT_VERSION,
};
