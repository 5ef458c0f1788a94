//! # Card creator web server
//!
//! | Path | Description |
//! |------|-------------|
//! | `POST /create` | Submit a batch of card lines (form or JSON) |
//! | `/result` | Generated cards page (`out/index.html`) |
//! | `/`, `/creator` | Entry pages from `site/` |
//! | `/readme`, `/license` | Project documents rendered to HTML |
//! | `/docs`, `/cards` | Static directories |
//!
//! Anything else is looked up in `out/` first and then in `site/`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use dinoqode_core::{Batch, FailureKind, PrintMode};
use dinoqode_engine::{Orchestrator, SubmissionError};
use dinoqode_logging::{dq_error, dq_info, dq_warn};
use serde::Deserialize;
use thiserror::Error;
use tower_http::services::ServeDir;

/// Shared state passed to all request handlers.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    root: PathBuf,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, root: PathBuf) -> Self {
        Self { orchestrator, root }
    }
}

pub fn router(state: AppState) -> Router {
    let root = state.root.clone();
    let static_fallback =
        ServeDir::new(root.join("out")).fallback(ServeDir::new(root.join("site")));

    Router::new()
        .route("/", get(index_page))
        .route("/creator", get(creator_page))
        .route("/result", get(result_page))
        .route("/create", post(create_cards))
        .route("/readme", get(readme_page))
        .route("/license", get(license_page))
        .nest_service("/docs", ServeDir::new(root.join("docs")))
        .nest_service("/cards", ServeDir::new(root.join("cards")))
        .fallback_service(static_fallback)
        .with_state(state)
}

/// Binds `bind` and serves until the process ends.
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    dq_info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .await
        .context("server terminated unexpectedly")
}

/// Body of `POST /create`, accepted as a form or as JSON.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub commands: String,
    #[serde(default)]
    pub printmode: Option<String>,
}

impl<S> FromRequest<S> for CreateRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<CreateRequest>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(body)
        } else {
            let Form(body) = Form::<CreateRequest>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(body)
        }
    }
}

async fn create_cards(
    State(state): State<AppState>,
    request: CreateRequest,
) -> Result<Redirect, ApiError> {
    let print_mode = PrintMode::from_form_value(request.printmode.as_deref());
    let batch = Batch::new(request.commands, print_mode);
    // Runs on its own task so a client that goes away cannot cut a generation short.
    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.submit(batch).await })
        .await
        .map_err(|err| ApiError::Internal(format!("submission task failed: {err}")))??;
    dq_info!(
        "Cards generated from {:?} in {:?}",
        outcome.input_path,
        outcome.report.elapsed
    );
    Ok(Redirect::to("/result"))
}

async fn index_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(read_asset(&state.root.join("site").join("index.html")).await?))
}

async fn creator_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(read_asset(&state.root.join("site").join("creator.html")).await?))
}

async fn result_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(read_asset(&state.root.join("out").join("index.html")).await?))
}

async fn readme_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let markdown = read_asset(&state.root.join("README.md")).await?;
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, pulldown_cmark::Parser::new(&markdown));
    Ok(Html(html))
}

async fn license_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let text = read_asset(&state.root.join("LICENSE")).await?;
    Ok(Html(format!("<pre>{}</pre>", escape_html(&text))))
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{0} not found")]
    Missing(String),
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

async fn read_asset(path: &Path) -> Result<String, AssetError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        let name = path.display().to_string();
        if source.kind() == std::io::ErrorKind::NotFound {
            AssetError::Missing(name)
        } else {
            AssetError::Unreadable { path: name, source }
        }
    })
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Failures reported to HTTP clients as `{ "error": <kind>, "message": <text> }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Submission(err) => match err.kind() {
                FailureKind::EmptyBatch => (StatusCode::BAD_REQUEST, "empty_batch"),
                FailureKind::Persistence => (StatusCode::INTERNAL_SERVER_ERROR, "persistence"),
                FailureKind::Generation => (StatusCode::BAD_GATEWAY, "generation"),
                FailureKind::GenerationTimeout => {
                    (StatusCode::GATEWAY_TIMEOUT, "generation_timeout")
                }
            },
            ApiError::Asset(AssetError::Missing(_)) => (StatusCode::NOT_FOUND, "asset_missing"),
            ApiError::Asset(AssetError::Unreadable { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "asset_unreadable")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            dq_error!("Request failed ({}): {}", status, self);
        } else {
            dq_warn!("Request rejected ({}): {}", status, self);
        }
        let body = serde_json::json!({
            "error": kind,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
