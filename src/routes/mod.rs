pub mod evaluations;
pub mod health;
pub mod recommendations;

use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::middleware::auth::require_bearer_auth;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/evaluations/history", get(evaluations::history))
        .route("/evaluations/details/:id", get(evaluations::detail))
        .route(
            "/evaluations/:test_type",
            get(evaluations::get_test).post(evaluations::submit_evaluation),
        )
        .route(
            "/:kind/recommendations",
            get(recommendations::resolve).post(recommendations::resolve),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .with_state(state)
}
