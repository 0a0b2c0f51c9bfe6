//! Persistence seams for evaluations, catalog entities and recommendations.
//!
//! `PgStore` is the production backend. `MemoryStore` keeps the same
//! contracts in process memory for tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::catalog::Candidate;
use crate::models::evaluation::{CompletedEvaluation, NewEvaluation};
use crate::models::recommendation::{NewRecommendation, RecommendationKind, RecommendationView};
use crate::models::test::{Test, TestType};
use crate::models::user::UserSkill;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool>;

    async fn user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>>;
}

#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Test with its full question bank (inactive questions included).
    async fn get_test(&self, test_id: Uuid) -> Result<Option<Test>>;

    async fn active_test_by_type(&self, test_type: TestType) -> Result<Option<Test>>;

    /// Persists the evaluation, its answers, result payload, area results
    /// and total score as one unit. Nothing is visible if any step fails.
    async fn record_evaluation(&self, evaluation: NewEvaluation) -> Result<CompletedEvaluation>;

    /// Newest first by completion date.
    async fn evaluations_for_user(&self, user_id: Uuid) -> Result<Vec<CompletedEvaluation>>;

    async fn get_evaluation(&self, evaluation_id: Uuid) -> Result<Option<CompletedEvaluation>>;

    /// At most one evaluation per test type: the one with the latest completion date.
    async fn latest_per_type(&self, user_id: Uuid) -> Result<Vec<CompletedEvaluation>> {
        let mut latest: Vec<CompletedEvaluation> = Vec::new();
        for evaluation in self.evaluations_for_user(user_id).await? {
            match latest.iter_mut().find(|e| e.test_type == evaluation.test_type) {
                Some(existing) if existing.completion_date >= evaluation.completion_date => {}
                Some(existing) => *existing = evaluation,
                None => latest.push(evaluation),
            }
        }
        Ok(latest)
    }
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Highest compatibility first.
    async fn list_recommendations(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
    ) -> Result<Vec<RecommendationView>>;

    /// Inserts the batch atomically, skipping candidates already recommended
    /// to this user, and returns the user's full persisted set.
    async fn insert_recommendations(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
        batch: &[NewRecommendation],
    ) -> Result<Vec<RecommendationView>>;

    async fn candidates(&self, kind: RecommendationKind) -> Result<Vec<Candidate>>;
}

/// Convenience bound for backends that serve every seam.
pub trait Store: UserDirectory + EvaluationStore + RecommendationStore {}

impl<T> Store for T where T: UserDirectory + EvaluationStore + RecommendationStore {}
