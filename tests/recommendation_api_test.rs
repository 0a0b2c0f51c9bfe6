mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;
use vocational_backend::store::MemoryStore;

use common::{app, seed_catalog, send, vocational_test};

async fn user_with_vocational_result(app: &axum::Router, store: &MemoryStore) -> Uuid {
    let user = Uuid::new_v4();
    store.add_user(user).unwrap();
    let test = vocational_test();
    store.add_test(test.clone()).unwrap();
    let (status, _) = send(
        app,
        "POST",
        "/api/evaluations/vocational_interests",
        Some(user),
        Some(json!({
            "testId": test.id,
            "answers": [
                {"questionId": 1, "optionId": 11},
                {"questionId": 2, "optionId": 22},
                {"questionId": 3, "optionId": 33}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    user
}

#[tokio::test]
async fn heuristic_recommendations_are_generated_once() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(&store);
    let app = app(store.clone());
    let user = user_with_vocational_result(&app, &store).await;

    let (status, first) = send(&app, "POST", "/api/careers/recommendations", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["kind"], "careers");
    let recs = first["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 3);
    // health 60% * 0.3 = 18 on top of the base 50
    assert_eq!(recs[0]["id"], 3);
    assert_eq!(recs[0]["compatibility_percentage"], "68.00");
    assert_eq!(recs[0]["duration_semesters"], 10);

    let (status, second) = send(&app, "GET", "/api/career/recommendations", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["recommendations"], second["recommendations"]);
    assert_eq!(store.recommendation_batches(), 1);
}

#[tokio::test]
async fn concurrent_first_requests_persist_one_batch() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(&store);
    let app = app(store.clone());
    let user = user_with_vocational_result(&app, &store).await;

    let (a, b) = tokio::join!(
        send(&app, "GET", "/api/careers/recommendations", Some(user), None),
        send(&app, "GET", "/api/careers/recommendations", Some(user), None),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(a.1["recommendations"], b.1["recommendations"]);
    assert_eq!(store.recommendation_batches(), 1);
}

#[tokio::test]
async fn preconditions_and_unknown_kinds() {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(&store);
    let app = app(store.clone());
    let user = Uuid::new_v4();
    store.add_user(user).unwrap();

    let (status, body) = send(&app, "GET", "/api/careers/recommendations", Some(user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "PRECONDITION_FAILED");

    let (status, body) = send(&app, "GET", "/api/hobbies/recommendations", Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let stranger = Uuid::new_v4();
    let (status, body) = send(&app, "GET", "/api/careers/recommendations", Some(stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ENTITY_NOT_FOUND");
}
