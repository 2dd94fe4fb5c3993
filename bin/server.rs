// Group Savings - Web Server
// REST API over the savings ledger. The ledger itself is pure; this shell
// owns the current group snapshot and commits each returned value. Every
// mutating handler does its read-modify-write inside one lock acquisition,
// the single-writer critical section a multi-user deployment needs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use group_savings::{
    AuthUser, Group, GroupDocument, GroupTotals, IdentityStore, SavingsLedger, SnapshotStore, Tier,
    TierCatalog,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    ledger: Arc<SavingsLedger>,
    group: Arc<Mutex<Group>>,
    identity: Arc<Mutex<IdentityStore>>,
    store: Arc<SnapshotStore>,
    users_path: PathBuf,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn fail(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

/// Summary response: week counter plus derived totals
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    current_week: u32,
    member_count: usize,
    totals: GroupTotals,
}

/// Withdrawal response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawResponse {
    withdrawn_amount: f64,
    member_count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdmitRequest {
    name: String,
    tier_id: u32,
    /// Contribution the client claims to be making; must equal the tier's
    /// required principal exactly when present
    amount: Option<f64>,
    /// Defaults to the demo identity when the client sends none
    owner_ref: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest {
    username: String,
    email: String,
    password: String,
    tier_id: u32,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/tiers - The tier catalog
async fn get_tiers(State(state): State<AppState>) -> impl IntoResponse {
    let tiers: Vec<Tier> = state.ledger.catalog().all_tiers().to_vec();
    Json(ApiResponse::ok(tiers))
}

/// GET /api/group - Full group snapshot document
async fn get_group(State(state): State<AppState>) -> impl IntoResponse {
    let group = state.group.lock().unwrap();
    Json(ApiResponse::ok(GroupDocument::from_group(&group)))
}

/// GET /api/group/summary - Week counter plus derived totals
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let group = state.group.lock().unwrap();
    Json(ApiResponse::ok(summary_of(&state.ledger, &group)))
}

/// POST /api/group/members - Admit a member at a chosen tier
async fn admit_member(
    State(state): State<AppState>,
    Json(req): Json<AdmitRequest>,
) -> impl IntoResponse {
    // Presentation-edge validation; the ledger still guards the tier itself
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail(
                None::<group_savings::Member>,
                "Member name must not be empty",
            )),
        )
            .into_response();
    }

    if let Some(amount) = req.amount {
        if !state.ledger.catalog().is_valid_amount(amount, req.tier_id) {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::fail(
                    None::<group_savings::Member>,
                    "Contribution must equal the tier's required principal",
                )),
            )
                .into_response();
        }
    }

    let owner_ref = req.owner_ref.unwrap_or_else(|| "demo-user-001".to_string());

    let mut group = state.group.lock().unwrap();
    match state
        .ledger
        .admit(&group, &owner_ref, req.name.trim(), req.tier_id)
    {
        Ok((new_group, member)) => {
            *group = new_group;
            persist(&state, &group);
            tracing::info!(member = %member.id, tier = member.tier_id, "member admitted");
            (StatusCode::CREATED, Json(ApiResponse::ok(Some(member)))).into_response()
        }
        Err(e) => {
            tracing::warn!(tier = req.tier_id, "admission rejected: {}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::fail(None::<group_savings::Member>, e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/group/advance - One weekly compounding step
///
/// Not idempotent by design: every request is one distinct time-step.
async fn advance_week(State(state): State<AppState>) -> impl IntoResponse {
    let mut group = state.group.lock().unwrap();
    *group = state.ledger.advance_week(&group);
    persist(&state, &group);

    tracing::info!(week = group.current_week, "week advanced");
    Json(ApiResponse::ok(summary_of(&state.ledger, &group)))
}

/// POST /api/group/members/:id/withdraw - Remove a member, pay out their
/// balance. Unknown ids answer with withdrawnAmount 0 and no change.
async fn withdraw_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    let mut group = state.group.lock().unwrap();
    let (new_group, withdrawn_amount) = state.ledger.withdraw(&group, &member_id);
    let changed = new_group.member_count() != group.member_count();
    *group = new_group;

    if changed {
        persist(&state, &group);
        tracing::info!(member = %member_id, amount = withdrawn_amount, "member withdrew");
    }

    Json(ApiResponse::ok(WithdrawResponse {
        withdrawn_amount,
        member_count: group.member_count(),
    }))
}

/// POST /api/auth/signup - Register a demo account (auto-login)
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    let mut identity = state.identity.lock().unwrap();
    match identity.signup(&req.username, &req.email, &req.password, req.tier_id) {
        Ok(user) => {
            if let Err(e) = identity.save(&state.users_path) {
                tracing::error!("failed to persist user store: {}", e);
            }
            Json(ApiResponse::ok(Some(user))).into_response()
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::fail(None::<AuthUser>, e.to_string())),
        )
            .into_response(),
    }
}

/// POST /api/auth/login - Authenticate a demo account
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> impl IntoResponse {
    let mut identity = state.identity.lock().unwrap();
    match identity.login(&req.email, &req.password) {
        Ok(user) => Json(ApiResponse::ok(Some(user))).into_response(),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::fail(None::<AuthUser>, e.to_string())),
        )
            .into_response(),
    }
}

/// POST /api/auth/logout - Clear the current session
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let mut identity = state.identity.lock().unwrap();
    identity.logout();
    Json(ApiResponse::ok("OK"))
}

/// GET /api/auth/me - The current session, if any
async fn current_user(State(state): State<AppState>) -> impl IntoResponse {
    let identity = state.identity.lock().unwrap();
    Json(ApiResponse::ok(identity.current_user().cloned()))
}

/// GET / - Serve the demo page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn summary_of(ledger: &SavingsLedger, group: &Group) -> SummaryResponse {
    SummaryResponse {
        current_week: group.current_week,
        member_count: group.member_count(),
        totals: ledger.aggregate(group),
    }
}

/// Persist the snapshot after a successful mutation. A failed save is
/// logged, never surfaced as a ledger failure.
fn persist(state: &AppState, group: &Group) {
    if let Err(e) = state.store.save(group) {
        tracing::error!("failed to persist group snapshot: {}", e);
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "savings_server=info,tower_http=info".into()),
        )
        .init();

    println!("🌐 Group Savings - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Tier configuration: external file wins when present
    let tiers_path = std::path::Path::new("data/tiers.json");
    let catalog = if tiers_path.exists() {
        TierCatalog::from_json_file(tiers_path).expect("Failed to load tier catalog")
    } else {
        TierCatalog::new()
    };
    println!("✓ Tier catalog: {} tiers", catalog.count());

    // Load persisted state; malformed documents fall back to fresh ones
    let store = SnapshotStore::new("data/group.json");
    let group = store.load();
    println!(
        "✓ Snapshot loaded: week {}, {} member(s)",
        group.current_week,
        group.member_count()
    );

    let users_path = PathBuf::from("data/users.json");
    let identity = IdentityStore::load(&users_path);
    println!("✓ User store: {} account(s)", identity.user_count());

    // Create shared state
    let state = AppState {
        ledger: Arc::new(SavingsLedger::with_catalog(catalog)),
        group: Arc::new(Mutex::new(group)),
        identity: Arc::new(Mutex::new(identity)),
        store: Arc::new(store),
        users_path,
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/tiers", get(get_tiers))
        .route("/group", get(get_group))
        .route("/group/summary", get(get_summary))
        .route("/group/members", post(admit_member))
        .route("/group/advance", post(advance_week))
        .route("/group/members/:id/withdraw", post(withdraw_member))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(current_user))
        .with_state(state.clone());

    // Build main router
    let app = Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/group");
    println!("   UI:  http://localhost:3000");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
