use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::test::TestType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedEvaluation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub test_name: String,
    pub test_type: TestType,
    pub completion_date: DateTime<Utc>,
    pub total_score: Option<Decimal>,
    pub result: Option<EvaluationOutcome>,
}

/// Structured result payload, one shape per test type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test_type", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Personality(PersonalityResult),
    VocationalInterests(VocationalResult),
    CognitiveSkills(CognitiveResult),
}

impl EvaluationOutcome {
    pub fn test_type(&self) -> TestType {
        match self {
            EvaluationOutcome::Personality(_) => TestType::Personality,
            EvaluationOutcome::VocationalInterests(_) => TestType::VocationalInterests,
            EvaluationOutcome::CognitiveSkills(_) => TestType::CognitiveSkills,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityResult {
    pub dimensions: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocationalResult {
    pub top_areas: Vec<AreaScore>,
    pub advice: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaScore {
    pub area: String,
    pub percentage: Decimal,
    pub ranking: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveResult {
    pub areas: Vec<CognitiveAreaScore>,
    pub overall_level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveAreaScore {
    pub category: String,
    pub score: Decimal,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Low,
    Medium,
    High,
}

impl SkillLevel {
    /// Boundary scores fall into the lower band.
    pub fn from_score(score: Decimal) -> Self {
        if score <= Decimal::from(40) {
            SkillLevel::Low
        } else if score <= Decimal::from(70) {
            SkillLevel::Medium
        } else {
            SkillLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: i64,
    pub option_id: i64,
}

/// Everything persisted for one accepted submission, written atomically.
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub completion_date: DateTime<Utc>,
    pub answers: Vec<UserAnswer>,
    pub total_score: Decimal,
    pub outcome: EvaluationOutcome,
}

impl NewEvaluation {
    pub fn area_results(&self) -> &[AreaScore] {
        match &self.outcome {
            EvaluationOutcome::VocationalInterests(v) => &v.top_areas,
            _ => &[],
        }
    }
}
