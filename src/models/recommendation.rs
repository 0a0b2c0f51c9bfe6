use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::catalog::Candidate;
use crate::models::evaluation::{CognitiveResult, PersonalityResult, VocationalResult};
use crate::models::user::UserSkill;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationKind {
    #[serde(rename = "careers", alias = "career")]
    Career,
    #[serde(rename = "specializations", alias = "specialization")]
    Specialization,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::Career => "career",
            RecommendationKind::Specialization => "specialization",
        }
    }
}

impl FromStr for RecommendationKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "career" | "careers" => Ok(RecommendationKind::Career),
            "specialization" | "specializations" => Ok(RecommendationKind::Specialization),
            _ => Err(crate::error::Error::BadRequest(format!(
                "Unknown recommendation kind: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted recommendation joined with its target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub compatibility_percentage: Decimal,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub candidate_id: i64,
    pub compatibility_percentage: Decimal,
    pub rationale: Option<String>,
}

/// Latest result per test type plus skills, as handed to a generator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationProfile {
    pub personality: Option<PersonalityResult>,
    pub vocational: Option<VocationalResult>,
    pub cognitive: Option<CognitiveResult>,
    pub skills: Vec<UserSkill>,
}

impl EvaluationProfile {
    pub fn has_evaluations(&self) -> bool {
        self.personality.is_some() || self.vocational.is_some() || self.cognitive.is_some()
    }
}
