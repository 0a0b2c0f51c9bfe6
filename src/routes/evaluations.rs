use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::evaluation_dto::{
        AdministeredTestResponse, EvaluationHistoryResponse, EvaluationSummary,
        SubmitEvaluationRequest,
    },
    error::Result,
    middleware::auth::AuthUser,
    models::test::TestType,
    AppState,
};

#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Path(test_type): Path<String>,
) -> Result<impl IntoResponse> {
    let test_type: TestType = test_type.parse()?;
    let test = state
        .evaluation_service
        .get_test_for_administration(test_type)
        .await?;
    Ok(Json(AdministeredTestResponse::from(test)))
}

#[axum::debug_handler]
pub async fn submit_evaluation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(test_type): Path<String>,
    Json(payload): Json<SubmitEvaluationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let test_type: TestType = test_type.parse()?;
    let evaluation = state
        .evaluation_service
        .submit(user_id, test_type, payload.test_id, payload.user_answers())
        .await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let evaluations = state.evaluation_service.history(user_id).await?;
    Ok(Json(EvaluationHistoryResponse {
        evaluations: evaluations.into_iter().map(EvaluationSummary::from).collect(),
    }))
}

#[axum::debug_handler]
pub async fn detail(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let evaluation = state.evaluation_service.detail(user_id, id).await?;
    Ok(Json(evaluation))
}
