//! Request handlers for the vault screens.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::blockchain::network::StacksNetwork;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::session::{short_address, SessionContext};
use crate::vault::service::FN_CREATE_VAULT;
use crate::views::ManageTab;

type ApiResult = Result<axum::response::Response, ApiError>;

/// Form inputs arrive as typed text; numbers are accepted too.
fn input_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkRequest {
    pub network: String,
}

#[derive(Debug, Deserialize)]
pub struct DurationsRequest {
    pub unlock_days: u32,
    pub inactivity_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct TabRequest {
    pub tab: ManageTab,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    #[serde(default)]
    pub amount: Value,
}

#[derive(Debug, Deserialize)]
pub struct HeirRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub percentage: Value,
}

/// Blank means the form default; anything that is not a whole number in
/// range becomes 0, which the form rejects.
fn heir_percentage(value: &Value) -> u32 {
    let text = input_text(value);
    let text = text.trim();
    if text.is_empty() {
        return crate::views::manage::DEFAULT_HEIR_PERCENTAGE;
    }
    text.parse().unwrap_or(0)
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct NftRequest {
    #[serde(default)]
    pub contract: String,
    #[serde(default)]
    pub token_id: Value,
}

pub async fn home(State(state): State<AppState>, Extension(ctx): Extension<SessionContext>) -> impl IntoResponse {
    let app = &state.inner.config.app;
    match ctx.address() {
        None => Json(json!({
            "screen": "landing",
            "app": app.name,
            "signed_in": false,
            "network": ctx.network,
        })),
        Some(address) => Json(json!({
            "screen": "dashboard",
            "app": app.name,
            "signed_in": true,
            "network": ctx.network,
            "address": short_address(address),
            "links": ["/create-vault", "/my-vaults", "/heir-claims"],
        })),
    }
}

pub async fn health(State(state): State<AppState>, Extension(ctx): Extension<SessionContext>) -> impl IntoResponse {
    let chain = state.inner.services.chain.current_block_height(ctx.network).await;
    let body = json!({
        "status": "ok",
        "network": ctx.network,
        "chain_api": chain.is_ok(),
        "block_height": chain.ok(),
        "tracked_actions": state.inner.services.tracker.len(),
    });
    (StatusCode::OK, Json(body))
}

pub async fn session_status(Extension(ctx): Extension<SessionContext>) -> impl IntoResponse {
    let username = ctx.identity.as_ref().and_then(|u| u.username.clone());
    Json(json!({
        "signed_in": ctx.is_signed_in(),
        "network": ctx.network,
        "address": ctx.address(),
        "short_address": ctx.address().map(short_address),
        "username": username,
    }))
}

pub async fn connect(State(state): State<AppState>) -> ApiResult {
    let session = &state.inner.session;
    let user = session.authenticate().await?;
    let address = user.address_for(session.network()).to_string();
    Ok(Json(json!({
        "signed_in": true,
        "network": session.network(),
        "address": address,
        "short_address": short_address(&address),
    }))
    .into_response())
}

pub async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    state.inner.session.log_user_out().await;
    state.inner.create_view.reset().await;
    state.inner.screens.clear();
    Json(json!({ "signed_in": false, "redirect": crate::views::routes::HOME }))
}

pub async fn switch_network(State(state): State<AppState>, Json(req): Json<NetworkRequest>) -> ApiResult {
    let network: StacksNetwork = req
        .network
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown network '{}'", req.network)))?;
    state.inner.session.switch_network(network);
    Ok(Json(json!({ "network": network })).into_response())
}

pub async fn create_flow(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.inner.create_view.snapshot().await)
}

pub async fn set_durations(State(state): State<AppState>, Json(req): Json<DurationsRequest>) -> ApiResult {
    let snapshot = state
        .inner
        .create_view
        .set_durations(&state.inner.services, req.unlock_days, req.inactivity_days)
        .await?;
    Ok(Json(snapshot).into_response())
}

pub async fn create_next(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.inner.create_view.next().await?).into_response())
}

pub async fn create_back(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.inner.create_view.back().await?).into_response())
}

pub async fn create_submit(State(state): State<AppState>, Extension(ctx): Extension<SessionContext>) -> ApiResult {
    let created = state.inner.create_view.submit(&state.inner.services, &ctx).await?;
    Ok((StatusCode::ACCEPTED, Json(created)).into_response())
}

pub async fn vault_screen(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    screen.ensure_loaded(&state.inner.services, ctx.network).await?;
    Ok(Json(screen.snapshot(&ctx).await).into_response())
}

pub async fn set_tab(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
    Json(req): Json<TabRequest>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    screen.ensure_loaded(&state.inner.services, ctx.network).await?;
    screen.set_tab(req.tab).await;
    Ok(Json(screen.snapshot(&ctx).await).into_response())
}

pub async fn deposit_stx(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
    Json(req): Json<DepositRequest>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    let submitted = screen
        .deposit_stx(&state.inner.services, &ctx, &input_text(&req.amount))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)).into_response())
}

pub async fn add_heir(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
    Json(req): Json<HeirRequest>,
) -> ApiResult {
    let percentage = heir_percentage(&req.percentage);
    let screen = state.inner.screens.open(id);
    let submitted = screen
        .add_heir(&state.inner.services, &ctx, &req.address, percentage)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)).into_response())
}

pub async fn save_notes(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
    Json(req): Json<NotesRequest>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    let submitted = screen.save_notes(&state.inner.services, &ctx, &req.notes).await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)).into_response())
}

pub async fn ping(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    let submitted = screen.ping(&state.inner.services, &ctx).await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)).into_response())
}

pub async fn claim(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    let submitted = screen.claim(&state.inner.services, &ctx).await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)).into_response())
}

pub async fn deposit_nft(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
    Json(req): Json<NftRequest>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    let submitted = screen
        .deposit_nft(&state.inner.services, &ctx, &req.contract, &input_text(&req.token_id))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)).into_response())
}

pub async fn claim_nft(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<u64>,
    Json(req): Json<NftRequest>,
) -> ApiResult {
    let screen = state.inner.screens.open(id);
    let submitted = screen
        .claim_nft(&state.inner.services, &ctx, &req.contract, &input_text(&req.token_id))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)).into_response())
}

pub async fn my_vaults(State(state): State<AppState>, Extension(ctx): Extension<SessionContext>) -> impl IntoResponse {
    let address = ctx.address().unwrap_or_default();
    let vaults = state.inner.services.tracker.by_sender(address, FN_CREATE_VAULT);
    let empty = vaults.is_empty().then(|| {
        json!({
            "title": "No Vaults Created Yet",
            "message": "You haven't created any vaults yet. Start securing your digital assets today.",
            "link": crate::views::Route::CreateVault.path(),
        })
    });
    Json(json!({ "vaults": vaults, "empty_state": empty }))
}

pub async fn heir_claims() -> impl IntoResponse {
    Json(json!({
        "claims": [],
        "empty_state": {
            "title": "No Pending Claims",
            "message": "You don't have any pending claims. Check back later or ask the vault owner to add you as an heir.",
        },
    }))
}

pub async fn action_status(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let action = state
        .inner
        .services
        .tracker
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Action {} not found", id)))?;
    Ok(Json(action).into_response())
}

pub async fn notifications(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "notifications": state.inner.services.notifier.drain() }))
}
