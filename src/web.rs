use crate::bot::{Bot, InboundEvent};
use crate::config::BotConfig;
use crate::data::Entry;
use crate::format;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn};

type SharedState = Arc<AppState>;

pub struct AppState {
    pub bot: Arc<Bot>,
    pub api_token: Option<String>,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    /// Required `Authorization: Bot <token>` on `/events` when set.
    pub api_token: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

impl From<&BotConfig> for WebConfig {
    fn from(config: &BotConfig) -> Self {
        Self {
            addr: config.bind,
            api_token: config.api_token.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn serve(config: WebConfig, bot: Arc<Bot>) -> Result<(), WebError> {
    if config.api_token.is_none() {
        warn!("no api_token configured, /events accepts unauthenticated callers");
    }
    let router = build_router(bot, config.api_token.clone());
    info!(%config.addr, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "missing or invalid bot token".to_string(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "command failed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

pub fn build_router(bot: Arc<Bot>, api_token: Option<String>) -> Router {
    let state = Arc::new(AppState { bot, api_token });
    Router::new()
        .route("/events", post(events))
        .route("/api/lookup", get(api_lookup))
        .route("/api/analyse", get(api_analyse))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bot "));
    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::unauthorized()),
    }
}

/// Runs blocking command work off the async workers. A panic fails only this
/// request.
async fn isolated<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        error!(error = %err, "command task failed");
        ApiError::internal()
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct EventReply {
    messages: Vec<String>,
}

async fn events(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<InboundEvent>, JsonRejection>,
) -> Result<Json<EventReply>, ApiError> {
    authorize(&state, &headers)?;
    let Json(event) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let bot = Arc::clone(&state.bot);
    let messages = isolated(move || bot.handle(&event)).await?;
    Ok(Json(EventReply { messages }))
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    phrase: Option<String>,
    lang: Option<String>,
}

#[derive(Debug, Serialize)]
struct LookupPayload<'a> {
    phrase: String,
    language: String,
    definitions: Vec<String>,
    entries: Vec<&'a Entry>,
}

async fn api_lookup(
    State(state): State<SharedState>,
    Query(params): Query<LookupParams>,
) -> Result<Response, ApiError> {
    let phrase = required_phrase(params.phrase)?;
    let language = params
        .lang
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| state.bot.settings().default_language.clone());
    let entries = state.bot.analyzer().lexicon().lookup(&phrase);
    if entries.is_empty() {
        return Err(ApiError::not_found(format!(
            "No entry found for phrase {phrase:?}"
        )));
    }
    let definitions = entries
        .iter()
        .map(|entry| format::definition(entry, &language))
        .collect();
    let payload = LookupPayload {
        phrase,
        language,
        definitions,
        entries,
    };
    Ok(Json(payload).into_response())
}

#[derive(Debug, Deserialize)]
struct AnalyseParams {
    phrase: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnalysePayload {
    phrase: String,
    matches: Vec<String>,
}

async fn api_analyse(
    State(state): State<SharedState>,
    Query(params): Query<AnalyseParams>,
) -> Result<Json<AnalysePayload>, ApiError> {
    let phrase = required_phrase(params.phrase)?;
    let bot = Arc::clone(&state.bot);
    let input = phrase.clone();
    let matches = isolated(move || bot.analyzer().analyse(&input)).await?;
    Ok(Json(AnalysePayload { phrase, matches }))
}

fn required_phrase(phrase: Option<String>) -> Result<String, ApiError> {
    phrase
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter `phrase` is required"))
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let lexicon = state.bot.analyzer().lexicon();
    Json(json!({
        "status": "ok",
        "entries": lexicon.len(),
        "phrases": lexicon.phrase_count(),
    }))
}
