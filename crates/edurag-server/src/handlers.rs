use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use edurag_ingest::IngestOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `/query` and `/chat`; `query` and `question` are interchangeable.
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    pub subject: Option<String>,
    pub query: Option<String>,
    pub question: Option<String>,
}

impl AskRequest {
    fn parts(&self) -> Result<(&str, &str), ApiError> {
        let subject = self.subject.as_deref().map(str::trim).unwrap_or_default();
        let question = self.query.as_deref().or(self.question.as_deref()).map(str::trim).unwrap_or_default();
        if subject.is_empty() || question.is_empty() {
            return Err(ApiError::BadRequest("Subject and query are required".into()));
        }
        Ok((subject, question))
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn subjects(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.query.subjects()?))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (subject, question) = request.parts()?;
    let answer = state.query.answer(subject, question).await?;
    Ok(Json(answer))
}

pub async fn reindex(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let Some(guard) = state.try_start_reindex() else {
        return Err(ApiError::Conflict("A reindex is already running".into()));
    };

    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        let _guard = guard;
        match task_state.ingestor.ingest_all(&task_state.corpus_dir, false).await {
            Ok(reports) => {
                let rebuilt = reports.iter().filter(|r| r.outcome == IngestOutcome::Rebuilt).count();
                info!(subjects = reports.len(), rebuilt, "reindex finished");
            }
            Err(e) => error!(error = %e, "reindex failed"),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "message": "Reindexing started in the background" }))))
}
