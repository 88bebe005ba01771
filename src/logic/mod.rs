//! Tournament business logic: rating, match recording, bracket arithmetic, live controller.

pub mod bracket;
mod controller;
pub mod rating;
mod recorder;

pub use controller::{AdvanceReport, Advanced, DecisionReport, TournamentController};
pub use recorder::{MatchOutcome, MatchRecorder};
