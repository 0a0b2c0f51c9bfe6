#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;
use vocational_backend::{
    middleware::auth::Claims,
    models::{
        catalog::{Candidate, CandidateDetails},
        question::{AnswerOption, Question},
        recommendation::RecommendationKind,
        test::{Test, TestType},
    },
    routes,
    services::compatibility_service::{CompatibilityGenerator, HeuristicCompatibilityGenerator},
    store::MemoryStore,
    AppState,
};

pub const JWT_SECRET: &str = "test_secret_key";

pub fn token_for(user_id: Uuid) -> String {
    let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
    encode(
        &Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp,
            role: None,
        },
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode token")
}

pub fn app_with(store: Arc<MemoryStore>, generator: Arc<dyn CompatibilityGenerator>) -> Router {
    let state = AppState::from_parts(
        store,
        generator,
        None,
        JWT_SECRET,
        Duration::from_secs(5),
        Duration::from_secs(3600),
    );
    routes::router(state)
}

pub fn app(store: Arc<MemoryStore>) -> Router {
    app_with(store, Arc::new(HeuristicCompatibilityGenerator))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", format!("Bearer {}", token_for(user)));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

fn option(id: i64, question_id: i64, weight: Option<i32>, category: Option<&str>) -> AnswerOption {
    AnswerOption {
        id,
        question_id,
        option_text: format!("answer {}", id),
        weight,
        category: category.map(str::to_string),
    }
}

fn question(id: i64, options: Vec<AnswerOption>) -> Question {
    Question {
        id,
        question_text: format!("question {}", id),
        ordinal: id as i32,
        is_active: true,
        options,
    }
}

/// Three questions, each with one option per area: A=10, B=30, C=60 when
/// options 11, 22 and 33 are chosen.
pub fn vocational_test() -> Test {
    Test {
        id: Uuid::new_v4(),
        name: "Vocational interests".into(),
        description: None,
        test_type: TestType::VocationalInterests,
        questions_to_show: 3,
        is_active: true,
        questions: vec![
            question(1, vec![option(11, 1, Some(10), Some("engineering")), option(12, 1, Some(2), Some("arts"))]),
            question(2, vec![option(21, 2, Some(3), Some("engineering")), option(22, 2, Some(30), Some("arts"))]),
            question(3, vec![option(31, 3, Some(1), Some("arts")), option(33, 3, Some(60), Some("health"))]),
        ],
    }
}

pub fn cognitive_test() -> Test {
    Test {
        id: Uuid::new_v4(),
        name: "Cognitive skills".into(),
        description: None,
        test_type: TestType::CognitiveSkills,
        questions_to_show: 1,
        is_active: true,
        questions: vec![question(
            5,
            vec![option(51, 5, Some(7), Some("memory")), option(52, 5, Some(10), Some("memory"))],
        )],
    }
}

pub fn seed_catalog(store: &MemoryStore) {
    let careers = [
        (1, "Mechanical engineering"),
        (2, "Fine arts and design"),
        (3, "Nursing and public health"),
    ];
    for (id, description) in careers {
        store
            .add_candidate(
                RecommendationKind::Career,
                Candidate {
                    id,
                    name: format!("Career {}", id),
                    description: Some(description.to_string()),
                    details: CandidateDetails::Career {
                        duration_semesters: Some(10),
                        average_salary: None,
                    },
                },
            )
            .unwrap();
    }
}
