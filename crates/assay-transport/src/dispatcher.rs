use std::sync::Arc;

use assay_core::{AssignmentLedger, LedgerError, LoginRequest, UiTrials};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::reply::ApiError;
use crate::stream::csv_attachment;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<AssignmentLedger>,
}

/// Routes every endpoint onto `ledger`, with permissive CORS.
pub fn build_router(ledger: Arc<AssignmentLedger>) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/submit", post(submit))
        .route("/api/reset", post(reset))
        .route("/api/auth", post(admin_auth))
        .route("/api/results", get(download_results))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(AppState { ledger })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    #[serde(default)]
    full_name: Value,
    #[serde(default)]
    id950: Value,
    #[serde(default)]
    period: Value,
    #[serde(default)]
    password: Value,
}

#[derive(Debug, Serialize)]
struct LoginReply {
    ok: bool,
    token: String,
    metal: String,
    trials: UiTrials,
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    #[serde(default)]
    token: Value,
    #[serde(default)]
    guess: Value,
}

#[derive(Debug, Deserialize)]
struct ResetBody {
    #[serde(default)]
    password: Value,
    #[serde(default)]
    confirm: Value,
}

#[derive(Debug, Deserialize)]
struct AuthBody {
    #[serde(default)]
    password: Value,
}

#[derive(Debug, Deserialize)]
struct ResultsQuery {
    #[serde(default)]
    password: String,
}

async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body: LoginBody = decode(&body)?;
    let request = LoginRequest {
        full_name: loose_string(&body.full_name),
        id950: loose_string(&body.id950),
        period: loose_string(&body.period),
        password: strict_string(&body.password),
    };

    let admission = run_blocking(&state, move |ledger| ledger.login(&request))
        .await
        .map_err(ApiError::from_login)?;

    Ok(Json(LoginReply {
        ok: true,
        token: admission.token.into_string(),
        metal: admission.resource,
        trials: admission.trials,
    })
    .into_response())
}

async fn submit(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body: SubmitBody = decode(&body)?;
    let token = loose_string(&body.token);
    let guess = loose_string(&body.guess);

    let outcome = run_blocking(&state, move |ledger| ledger.submit(&token, &guess)).await?;
    Ok(Json(json!({ "ok": true, "result": outcome.as_str() })).into_response())
}

async fn reset(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body: ResetBody = decode(&body)?;
    let password = strict_string(&body.password);
    let confirm = body.confirm == Value::Bool(true);

    run_blocking(&state, move |ledger| ledger.reset(&password, confirm)).await?;
    Ok(Json(json!({ "ok": true })).into_response())
}

async fn admin_auth(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body: AuthBody = decode(&body)?;
    state
        .ledger
        .authorize_admin(&strict_string(&body.password))?;
    Ok(Json(json!({ "ok": true })).into_response())
}

async fn download_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Result<Response, ApiError> {
    let csv = run_blocking(&state, move |ledger| ledger.export_results(&query.password)).await?;
    Ok(csv_attachment(csv))
}

async fn health(State(state): State<AppState>) -> Result<Response, ApiError> {
    let status = run_blocking(&state, |ledger| Ok(ledger.status())).await?;
    Ok(Json(json!({
        "ok": true,
        "active": status.active,
        "used": status.used,
        "resources": status.resources,
    }))
    .into_response())
}

/// Ledger calls hold a mutex across disk writes; keep them off the async workers.
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, LedgerError>
where
    T: Send + 'static,
    F: FnOnce(&AssignmentLedger) -> Result<T, LedgerError> + Send + 'static,
{
    let ledger = Arc::clone(&state.ledger);
    match tokio::task::spawn_blocking(move || op(&ledger)).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "ledger task aborted");
            Err(LedgerError::Internal(format!("ledger task aborted: {err}")))
        }
    }
}

/// Lenient JSON body: content type is not checked, and an empty body is `{}`.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|err| {
        tracing::debug!(error = %err, "rejecting malformed request body");
        ApiError::bad_request("Invalid JSON body")
    })
}

/// Strings pass through; numbers and other scalars are stringified; null is empty.
fn loose_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Secrets must arrive as JSON strings; anything else never matches.
fn strict_string(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}
