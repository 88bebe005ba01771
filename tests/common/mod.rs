//! Shared fixtures: in-memory services with handles kept for assertions.

#![allow(dead_code)]

use std::sync::Arc;
use subsoccer_bracket::{
    MemorySnapshotStore, MemoryStore, Player, RecordingNotifier, Services, TournamentController,
};

pub struct Fixture {
    pub services: Services,
    pub store: Arc<MemoryStore>,
    pub snapshots: Arc<MemorySnapshotStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn fixture_with(store: MemoryStore) -> Fixture {
    let store = Arc::new(store);
    let snapshots = Arc::new(MemorySnapshotStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let services = Services::in_memory(store.clone(), snapshots.clone(), notifier.clone());
    Fixture {
        services,
        store,
        snapshots,
        notifier,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(MemoryStore::new())
}

/// Registered players A, B, C, D at the default rating.
pub fn registered(names: &[&str]) -> MemoryStore {
    names
        .iter()
        .fold(MemoryStore::new(), |store, name| store.with_player(Player::new(name)))
}

pub fn seeded(fx: &Fixture, pool: &[&str]) -> TournamentController {
    let mut controller = TournamentController::new(fx.services.clone());
    let warnings = controller.start_seeded(pool).unwrap();
    assert!(warnings.is_empty());
    controller
}
