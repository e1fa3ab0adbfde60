//! HTTP surface: session pages, form posts, image bytes, health

use crate::error::{AppError, Result};
use crate::models::InputImage;
use crate::render::{self, PageContext};
use crate::runner::{BackRequest, Runner, SubmitOutcome, Submission};
use crate::session::{SessionState, SessionStore, SharedSession};
use crate::{dataset, presenter};
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

/// Application state shared across HTTP handlers.
///
/// The store lock only covers lookups; each session carries its own lock.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<Runner>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(runner: Runner) -> Self {
        let config = runner.config();
        let store = SessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
            config.shuffle_seed,
        );
        Self {
            runner: Arc::new(runner),
            sessions: Arc::new(Mutex::new(store)),
        }
    }

    async fn session(&self, id: Uuid) -> Result<SharedSession> {
        self.sessions.lock().await.get(id)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(start_session))
        .route("/health", get(health_check))
        .route("/session/:id", get(show_session))
        .route("/session/:id/user", post(set_user))
        .route("/session/:id/submit", post(submit))
        .route("/session/:id/back", post(go_back))
        .route("/session/:id/image/:sample/:slot", get(serve_image))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn session_url(id: Uuid) -> String {
    format!("/session/{id}")
}

/// GET /
///
/// Every visit to the root starts a new session
async fn start_session(State(state): State<AppState>) -> Redirect {
    let id = state.sessions.lock().await.create();
    Redirect::to(&session_url(id))
}

/// GET /session/:id
async fn show_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Html<String>> {
    let shared = state.session(id).await?;
    let mut session = shared.lock().await;
    let runner = &state.runner;

    let page = runner.page(&mut session).await?;
    let notice = session.take_notice();
    let ctx = PageContext {
        config: runner.config(),
        collector: runner.collector(),
        session_id: id,
        user_id: session.user_id(),
        notice,
    };
    Ok(Html(render::session_page(&ctx, &page)))
}

#[derive(Debug, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub user_id: String,
}

/// POST /session/:id/user
async fn set_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<UserForm>,
) -> Result<Redirect> {
    let shared = state.session(id).await?;
    state.runner.set_user_id(&mut *shared.lock().await, &form.user_id);
    Ok(Redirect::to(&session_url(id)))
}

/// POST /session/:id/submit
async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(submission): Form<Submission>,
) -> Result<Redirect> {
    let shared = state.session(id).await?;
    let outcome = state.runner.submit(&mut *shared.lock().await, &submission);
    match outcome {
        SubmitOutcome::Recorded { sample_index } => debug!("Session {}: recorded sample {}", id, sample_index),
        SubmitOutcome::Ignored => debug!("Session {}: submission ignored", id),
    }
    Ok(Redirect::to(&session_url(id)))
}

/// POST /session/:id/back
async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(back): Form<BackRequest>,
) -> Result<Redirect> {
    let shared = state.session(id).await?;
    if !state.runner.go_back(&mut *shared.lock().await, back.sample_index) {
        debug!("Session {}: back request ignored", id);
    }
    Ok(Redirect::to(&session_url(id)))
}

/// GET /session/:id/image/:sample/:slot
///
/// `slot` is `input` or a display slot; outputs are only reachable for samples
/// this session has been shown, through the session's own shuffle order
async fn serve_image(
    State(state): State<AppState>,
    Path((id, sample_index, slot)): Path<(Uuid, usize, String)>,
) -> Result<Response> {
    let path = {
        let shared = state.session(id).await?;
        let session = shared.lock().await;
        resolve_image(&state.runner, &session, sample_index, &slot)?
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::MissingImage(path));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response())
}

fn resolve_image(
    runner: &Runner,
    session: &SessionState,
    sample_index: usize,
    slot: &str,
) -> Result<PathBuf> {
    let config = runner.config();
    if !config.eval_indices.contains(&sample_index) {
        return Err(AppError::SampleNotFound(sample_index));
    }

    if slot == "input" {
        let sample = runner
            .presenter()
            .sample(sample_index)
            .ok_or(AppError::SampleNotFound(sample_index))?;
        return match dataset::input_image(sample, &config.data_root) {
            InputImage::File(path) => Ok(path),
            InputImage::Url(_) => Err(AppError::SampleNotFound(sample_index)),
        };
    }

    let order = session
        .existing_shuffle_order(sample_index)
        .ok_or(AppError::SampleNotFound(sample_index))?;
    let position = slot.parse::<usize>().unwrap_or(0);
    let model = position
        .checked_sub(1)
        .and_then(|i| order.get(i))
        .ok_or(AppError::SlotNotFound(position))?;
    Ok(presenter::output_image_path(&config.outputs_dir, model, sample_index))
}

fn content_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
