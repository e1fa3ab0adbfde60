//! Error type for the request path

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::render;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown or expired session id
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Sample index is not part of the evaluation list or has not been shown yet
    #[error("Sample not available: {0}")]
    SampleNotFound(usize),

    /// Display slot outside `1..=N`
    #[error("No output in slot {0}")]
    SlotNotFound(usize),

    /// A pre-rendered image the page depends on is absent
    #[error("Missing image: {}", .0.display())]
    MissingImage(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A blocking task (the CSV write) panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) | AppError::SampleNotFound(_) | AppError::SlotNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::MissingImage(_) | AppError::Io(_) | AppError::Csv(_) | AppError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
        (status, Html(render::error_page(status, &self.to_string()))).into_response()
    }
}
