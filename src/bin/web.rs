//! Single binary web server exposing the live bracket over a REST API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! SNAPSHOT_PATH sets the resume file (default tournament-snapshot.json);
//! PLAYERS_CSV optionally seeds registered players (username,rating,wins,losses);
//! TOURNAMENT_NAME names new tournaments (default "Tournament").

use actix_web::{
    delete, get, post, put,
    web::{Data, Json},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use subsoccer_bracket::{
    AdvanceReport, Advanced, DecisionReport, JsonFileSnapshotStore, LogNotifier, MatchOutcome,
    MatchRecorder, MatchRequest, MemoryStore, PersistenceFailure, Phase, RoundLayout, Services,
    TournamentController, TournamentError, TournamentState, TournamentSummary,
};

/// The one live tournament plus the collaborators used to build fresh controllers.
struct Live {
    services: Services,
    tournament_name: String,
    controller: TournamentController,
}

impl Live {
    fn fresh_controller(&self) -> TournamentController {
        TournamentController::new(self.services.clone()).with_name(self.tournament_name.clone())
    }
}

type AppState = Data<RwLock<Live>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct TournamentView<'a> {
    phase: Phase,
    state: Option<&'a TournamentState>,
    layout: Option<RoundLayout>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct OutcomeView {
    success: bool,
    new_winner_rating: i32,
    rating_gain: i32,
    winner_is_guest: bool,
    level_up: Option<i32>,
}

impl From<&MatchOutcome> for OutcomeView {
    fn from(o: &MatchOutcome) -> Self {
        Self {
            success: o.success,
            new_winner_rating: o.new_winner_rating,
            rating_gain: o.rating_gain,
            winner_is_guest: o.winner_is_guest,
            level_up: o.level_up,
        }
    }
}

#[derive(Serialize)]
struct DecisionResponse<'a> {
    outcome: OutcomeView,
    round_complete: bool,
    #[serde(flatten)]
    tournament: TournamentView<'a>,
}

#[derive(Serialize)]
struct FinishedResponse {
    phase: Phase,
    summary: TournamentSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

#[derive(Deserialize)]
struct StartBody {
    players: Vec<String>,
    /// Keep the given order instead of shuffling.
    #[serde(default)]
    seeded: bool,
}

#[derive(Deserialize)]
struct DecisionBody {
    slot: usize,
    winner: String,
}

#[derive(Deserialize)]
struct BronzeBody {
    winner: String,
}

#[derive(Deserialize)]
struct QuickMatchBody {
    player1: String,
    player2: String,
    winner: String,
    #[serde(default)]
    player1_score: Option<u32>,
    #[serde(default)]
    player2_score: Option<u32>,
}

fn messages(warnings: &[PersistenceFailure]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}

fn view<'a>(
    controller: &'a TournamentController,
    warnings: &[PersistenceFailure],
) -> TournamentView<'a> {
    TournamentView {
        phase: controller.phase(),
        state: controller.state(),
        layout: controller.layout(),
        warnings: messages(warnings),
    }
}

fn bad_request(e: TournamentError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

fn decision_response(controller: &TournamentController, report: DecisionReport) -> HttpResponse {
    HttpResponse::Ok().json(DecisionResponse {
        outcome: OutcomeView::from(&report.outcome),
        round_complete: report.round_complete,
        tournament: view(controller, &report.warnings),
    })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "subsoccer-bracket",
    })
}

/// Current phase, state and draw.
#[get("/api/tournament")]
async fn api_get_tournament(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(view(&g.controller, &[]))
}

/// Start a tournament from a pool of names (at least 2).
#[post("/api/tournament")]
async fn api_start_tournament(state: AppState, body: Json<StartBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    if g.controller.phase() == Phase::Finalized {
        let fresh = g.fresh_controller();
        g.controller = fresh;
    }
    let result = if body.seeded {
        g.controller.start_seeded(&body.players)
    } else {
        g.controller.start(&body.players)
    };
    match result {
        Ok(warnings) => HttpResponse::Ok().json(view(&g.controller, &warnings)),
        Err(e) => bad_request(e),
    }
}

/// Decide a regular-round slot, or the final (slot 0) in the finals stage.
#[put("/api/tournament/decision")]
async fn api_record_decision(state: AppState, body: Json<DecisionBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.controller.record_decision(body.slot, &body.winner) {
        Ok(report) => decision_response(&g.controller, report),
        Err(e) => bad_request(e),
    }
}

/// Decide the bronze match.
#[put("/api/tournament/bronze")]
async fn api_record_bronze(state: AppState, body: Json<BronzeBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.controller.record_bronze_decision(&body.winner) {
        Ok(report) => decision_response(&g.controller, report),
        Err(e) => bad_request(e),
    }
}

/// Next round, finals stage, or finish.
#[post("/api/tournament/advance")]
async fn api_advance(state: AppState) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.controller.advance() {
        Ok(AdvanceReport {
            advanced: Advanced::Finished(summary),
            warnings,
        }) => HttpResponse::Ok().json(FinishedResponse {
            phase: g.controller.phase(),
            summary,
            warnings: messages(&warnings),
        }),
        Ok(AdvanceReport { warnings, .. }) => HttpResponse::Ok().json(view(&g.controller, &warnings)),
        Err(e) => bad_request(e),
    }
}

/// Abandon the live tournament without saving a result.
#[delete("/api/tournament")]
async fn api_abandon(state: AppState) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.controller.abandon() {
        Ok(warnings) => HttpResponse::Ok().json(view(&g.controller, &warnings)),
        Err(e) => bad_request(e),
    }
}

/// Record a one-off match outside any tournament.
#[post("/api/matches")]
async fn api_quick_match(state: AppState, body: Json<QuickMatchBody>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let mut request = MatchRequest::new(&body.player1, &body.player2, &body.winner);
    if let (Some(s1), Some(s2)) = (body.player1_score, body.player2_score) {
        request = request.with_scores(s1, s2);
    }
    match MatchRecorder::new(&g.services).record_match(&request) {
        Ok(outcome) => HttpResponse::Ok().json(serde_json::json!({
            "outcome": OutcomeView::from(&outcome),
            "warnings": messages(&outcome.warnings),
        })),
        Err(e) => bad_request(e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_snapshot_path() -> String {
    "tournament-snapshot.json".to_string()
}

fn build_player_store() -> MemoryStore {
    let store = MemoryStore::new();
    let Ok(path) = std::env::var("PLAYERS_CSV") else {
        return store;
    };
    match std::fs::File::open(&path) {
        Ok(file) => match store.load_players_csv(file) {
            Ok(n) => log::info!("Loaded {} registered players from {}", n, path),
            Err(e) => log::warn!("Could not read {}: {}", path, e),
        },
        Err(e) => log::warn!("Could not open {}: {}", path, e),
    }
    store
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let snapshot_path = std::env::var("SNAPSHOT_PATH").unwrap_or_else(|_| default_snapshot_path());
    let tournament_name = std::env::var("TOURNAMENT_NAME")
        .unwrap_or_else(|_| subsoccer_bracket::models::default_tournament_name());

    let services = Services::in_memory(
        Arc::new(build_player_store()),
        Arc::new(JsonFileSnapshotStore::new(&snapshot_path)),
        Arc::new(LogNotifier),
    );

    let controller = match TournamentController::restore(services.clone()) {
        Ok(Some(controller)) => {
            log::info!("Resuming tournament from {}", snapshot_path);
            controller
        }
        Ok(None) => TournamentController::new(services.clone()).with_name(tournament_name.clone()),
        Err(e) => {
            log::warn!("Ignoring snapshot {}: {}", snapshot_path, e);
            TournamentController::new(services.clone()).with_name(tournament_name.clone())
        }
    };

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(Live {
        services,
        tournament_name,
        controller,
    }));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_get_tournament)
            .service(api_start_tournament)
            .service(api_record_decision)
            .service(api_record_bronze)
            .service(api_advance)
            .service(api_abandon)
            .service(api_quick_match)
    })
    .bind(bind)?
    .run()
    .await
}
