//! JSON API for queue state: registration, rank, admission checks, token
//! issuance, and operator-driven promotion.

use crate::{
    errors::{AppError, AppResult},
    handlers::waiting_room::token_cookie_name,
    infra::app_state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct QueueUserParams {
    #[serde(default = "super::default_queue")]
    pub queue: String,
    pub user_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct AllowParams {
    #[serde(default = "super::default_queue")]
    pub queue: String,
    pub count: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub rank: i64,
}

#[derive(Debug, Serialize)]
pub struct AllowedResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AllowResponse {
    pub requested: u64,
    pub promoted: u64,
}

/// Register the user in the queue's wait set; 409 if already waiting.
pub async fn register(
    State(state): State<AppState>,
    Query(params): Query<QueueUserParams>,
) -> AppResult<Json<RankResponse>> {
    let rank = state.engine.register(&params.queue, params.user_id).await?;
    Ok(Json(RankResponse { rank }))
}

/// The user's live 1-based wait rank (`-1` when not waiting).
pub async fn rank(
    State(state): State<AppState>,
    Query(params): Query<QueueUserParams>,
) -> AppResult<Json<RankResponse>> {
    let rank = state.engine.rank(&params.queue, params.user_id).await?;
    Ok(Json(RankResponse { rank }))
}

/// Whether the user has been promoted into the proceed set.
pub async fn allowed(
    State(state): State<AppState>,
    Query(params): Query<QueueUserParams>,
) -> AppResult<Json<AllowedResponse>> {
    let allowed = state.engine.is_allowed(&params.queue, params.user_id).await?;
    Ok(Json(AllowedResponse { allowed }))
}

/// Issue the admission token for this `(queue, user)` pair, both as the
/// response body and as the cookie the waiting-room page checks.
pub async fn touch(
    State(state): State<AppState>,
    Query(params): Query<QueueUserParams>,
) -> AppResult<(HeaderMap, Json<TokenResponse>)> {
    let token = state.engine.generate_token(&params.queue, params.user_id);

    let cookie = format!(
        "{}={}; SameSite=Lax; Path=/; Max-Age=300",
        token_cookie_name(&params.queue),
        token
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|_| AppError::bad_request("queue name is not cookie-safe"))?,
    );

    Ok((headers, Json(TokenResponse { token })))
}

/// Manually promote a batch, the same call the scheduler makes. The batch
/// ceiling defaults to the scheduler's configured maximum.
pub async fn allow(
    State(state): State<AppState>,
    Query(params): Query<AllowParams>,
) -> AppResult<Json<AllowResponse>> {
    let requested = params.count.unwrap_or(state.config.scheduler_max_batch);
    let promoted = state.engine.allow(&params.queue, requested).await?;
    Ok(Json(AllowResponse {
        requested,
        promoted,
    }))
}
