use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::recommendation_dto::RecommendationsResponse,
    error::Result,
    middleware::auth::AuthUser,
    models::recommendation::RecommendationKind,
    AppState,
};

/// Serves both GET and POST: the first call for a user generates, later calls read.
#[axum::debug_handler]
pub async fn resolve(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse> {
    let kind: RecommendationKind = kind.parse()?;
    let recommendations = state
        .recommendation_service
        .get_recommendations(user_id, kind)
        .await?;
    Ok(Json(RecommendationsResponse {
        kind,
        recommendations,
    }))
}
