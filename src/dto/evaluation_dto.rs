use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::evaluation::{CompletedEvaluation, UserAnswer};
use crate::models::question::Question;
use crate::models::test::{Test, TestType};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    #[validate(range(min = 1))]
    pub question_id: i64,
    #[validate(range(min = 1))]
    pub option_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvaluationRequest {
    pub test_id: Uuid,
    #[validate(nested)]
    pub answers: Vec<AnswerPayload>,
}

impl SubmitEvaluationRequest {
    pub fn user_answers(&self) -> Vec<UserAnswer> {
        self.answers
            .iter()
            .map(|a| UserAnswer {
                question_id: a.question_id,
                option_id: a.option_id,
            })
            .collect()
    }
}

/// Option as shown to the person taking the test: no weight, no category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministeredOption {
    pub id: i64,
    pub option_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministeredQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<AdministeredOption>,
}

impl From<Question> for AdministeredQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            options: q
                .options
                .into_iter()
                .map(|o| AdministeredOption {
                    id: o.id,
                    option_text: o.option_text,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministeredTestResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub test_type: TestType,
    pub questions: Vec<AdministeredQuestion>,
}

impl From<Test> for AdministeredTestResponse {
    fn from(test: Test) -> Self {
        Self {
            id: test.id,
            name: test.name,
            description: test.description,
            test_type: test.test_type,
            questions: test.questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub id: Uuid,
    pub test_id: Uuid,
    pub test_name: String,
    pub test_type: TestType,
    pub completion_date: DateTime<Utc>,
    pub total_score: Option<Decimal>,
}

impl From<CompletedEvaluation> for EvaluationSummary {
    fn from(e: CompletedEvaluation) -> Self {
        Self {
            id: e.id,
            test_id: e.test_id,
            test_name: e.test_name,
            test_type: e.test_type,
            completion_date: e.completion_date,
            total_score: e.total_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationHistoryResponse {
    pub evaluations: Vec<EvaluationSummary>,
}
