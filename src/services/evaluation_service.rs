use chrono::Utc;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::evaluation::{CompletedEvaluation, NewEvaluation, UserAnswer};
use crate::models::test::{Test, TestType};
use crate::services::grading_service::{GradedOutcome, GradingService};
use crate::services::personality_service::PersonalityAnalyzer;
use crate::services::scoring_service::{ScoredAnswers, ScoringService};
use crate::store::{EvaluationStore, UserDirectory};

#[derive(Clone)]
pub struct EvaluationService {
    users: Arc<dyn UserDirectory>,
    store: Arc<dyn EvaluationStore>,
    analyzer: Option<Arc<dyn PersonalityAnalyzer>>,
    analyzer_timeout: Duration,
}

impl EvaluationService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        store: Arc<dyn EvaluationStore>,
        analyzer: Option<Arc<dyn PersonalityAnalyzer>>,
        analyzer_timeout: Duration,
    ) -> Self {
        Self {
            users,
            store,
            analyzer,
            analyzer_timeout,
        }
    }

    /// Active test of the given type with `questions_to_show` active questions
    /// drawn at random.
    pub async fn get_test_for_administration(&self, test_type: TestType) -> Result<Test> {
        let mut test = self
            .store
            .active_test_by_type(test_type)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No active {} test", test_type)))?;

        let wanted = test.shown_question_count();
        let active: Vec<_> = test.questions.iter().filter(|q| q.is_active).cloned().collect();
        let mut sampled: Vec<_> = {
            let mut rng = rand::thread_rng();
            active.choose_multiple(&mut rng, wanted).cloned().collect()
        };
        sampled.sort_by_key(|q| (q.ordinal, q.id));
        test.questions = sampled;
        Ok(test)
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        test_type: TestType,
        test_id: Uuid,
        answers: Vec<UserAnswer>,
    ) -> Result<CompletedEvaluation> {
        if !self.users.user_exists(user_id).await? {
            return Err(Error::NotFound(format!("User {} not found", user_id)));
        }
        let test = self
            .store
            .get_test(test_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Test {} not found", test_id)))?;
        if test.test_type != test_type {
            return Err(Error::TypeMismatch(format!(
                "Test {} is a {} test, not {}",
                test.id, test.test_type, test_type
            )));
        }

        let graded = match ScoringService::score(&test, &answers)? {
            ScoredAnswers::Responses(responses) => {
                let analyzer = self.analyzer.as_ref().ok_or_else(|| {
                    Error::Generator("Personality analysis is not configured".to_string())
                })?;
                let dimensions = tokio::time::timeout(self.analyzer_timeout, analyzer.analyze(&responses))
                    .await
                    .map_err(|_| Error::Generator("Personality analyzer timed out".to_string()))?
                    .map_err(|e| match e {
                        Error::Generator(_) | Error::ContractViolation(_) => e,
                        other => {
                            tracing::error!(error = %other, %user_id, "personality analysis failed");
                            Error::Generator(other.to_string())
                        }
                    })?;
                GradingService::grade_personality(dimensions)
            }
            ScoredAnswers::Weighted(acc) => match test.test_type {
                TestType::CognitiveSkills => GradingService::grade_cognitive(&acc),
                _ => GradingService::grade_vocational(&acc),
            },
        };

        let GradedOutcome {
            total_score,
            outcome,
        } = graded;
        let recorded = self
            .store
            .record_evaluation(NewEvaluation {
                user_id,
                test_id: test.id,
                completion_date: Utc::now(),
                answers,
                total_score,
                outcome,
            })
            .await?;

        tracing::info!(
            %user_id,
            evaluation_id = %recorded.id,
            test_type = %test_type,
            %total_score,
            "evaluation recorded"
        );
        Ok(recorded)
    }

    /// Newest first.
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<CompletedEvaluation>> {
        self.store.evaluations_for_user(user_id).await
    }

    pub async fn detail(&self, user_id: Uuid, evaluation_id: Uuid) -> Result<CompletedEvaluation> {
        self.store
            .get_evaluation(evaluation_id)
            .await?
            .filter(|e| e.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("Evaluation {} not found", evaluation_id)))
    }
}
