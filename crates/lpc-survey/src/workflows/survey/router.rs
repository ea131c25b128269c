use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::catalog::ProjectCatalog;
use super::domain::Evaluation;
use super::repository::ResponseRepository;
use super::scoring::ScoringEngine;
use super::service::{IntakeError, SubmissionRequest, SurveyIntakeService, REQUIRED_FIELDS};
use super::validation;

/// Shared state behind the survey endpoints.
pub struct SurveyApi<R> {
    pub intake: Arc<SurveyIntakeService<R>>,
    pub catalog: Arc<ProjectCatalog>,
    pub engine: Arc<ScoringEngine>,
}

impl<R> Clone for SurveyApi<R> {
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
            catalog: Arc::clone(&self.catalog),
            engine: Arc::clone(&self.engine),
        }
    }
}

/// Router builder exposing submission intake, the response listing and presentation helpers.
pub fn survey_router<R>(api: SurveyApi<R>) -> Router
where
    R: ResponseRepository + 'static,
{
    Router::new()
        .route("/api/survey/submit", post(submit_handler::<R>))
        .route("/api/survey/responses", get(responses_handler::<R>))
        .route("/api/survey/catalog", get(catalog_handler::<R>))
        .route("/api/survey/score", post(score_handler::<R>))
        .with_state(api)
}

pub(crate) async fn submit_handler<R>(
    State(api): State<SurveyApi<R>>,
    headers: HeaderMap,
    body: Result<axum::Json<SubmissionRequest>, JsonRejection>,
) -> Response
where
    R: ResponseRepository + 'static,
{
    let request = match body {
        Ok(axum::Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "survey submission body rejected");
            let payload = json!({
                "error": "Invalid submission body",
                "message": rejection.body_text(),
                "required": REQUIRED_FIELDS,
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match api.intake.accept(request, user_agent) {
        Ok(record) => {
            let payload = json!({
                "success": true,
                "message": "Survey response saved successfully",
                "id": record.id,
                "timestamp": record.received_at,
                "submissionId": record.metadata.submission_id,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(IntakeError::MissingFields(received)) => {
            let payload = json!({
                "error": IntakeError::MissingFields(received).to_string(),
                "required": REQUIRED_FIELDS,
                "received": received,
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(IntakeError::TotalOutOfRange(range)) => {
            let payload = json!({
                "error": IntakeError::TotalOutOfRange(range).to_string(),
                "received": range.total,
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(IntakeError::Repository(error)) => {
            let payload = json!({
                "error": "Internal server error",
                "message": error.to_string(),
                "type": "RepositoryError",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn responses_handler<R>(State(api): State<SurveyApi<R>>) -> Response
where
    R: ResponseRepository + 'static,
{
    match api.intake.responses() {
        Ok(responses) => {
            let payload = json!({
                "success": true,
                "count": responses.len(),
                "responses": responses,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": "Internal server error",
                "message": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn catalog_handler<R>(State(api): State<SurveyApi<R>>) -> Response
where
    R: ResponseRepository + 'static,
{
    let range = api.intake.range();
    let payload = json!({
        "variant": api.engine.variant().name,
        "maxScore": api.engine.variant().max_score(),
        "fundingRange": range,
        "projects": api.catalog.projects(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    evaluation: Evaluation,
}

pub(crate) async fn score_handler<R>(
    State(api): State<SurveyApi<R>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    R: ResponseRepository + 'static,
{
    let card = api.engine.score_card(&request.evaluation);
    let missing = validation::validation_errors(&request.evaluation, api.engine.variant());
    let payload = json!({
        "card": card,
        "complete": missing.is_empty(),
        "validationErrors": missing,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
