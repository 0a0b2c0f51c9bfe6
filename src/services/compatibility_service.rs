use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::catalog::Candidate;
use crate::models::recommendation::{EvaluationProfile, RecommendationKind};
use crate::services::llm_service::LlmClient;
use crate::utils::decimal::{clamp_percentage, from_f64, mean2};

/// One scored candidate as returned by a generator, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityScore {
    pub candidate_id: i64,
    pub compatibility_percentage: Decimal,
    pub rationale: Option<String>,
}

/// Ranks catalog candidates against a user's evaluation profile.
///
/// Implementations must only return ids present in `candidates`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompatibilityGenerator: Send + Sync {
    async fn recommend(
        &self,
        kind: RecommendationKind,
        profile: &EvaluationProfile,
        candidates: &[Candidate],
    ) -> Result<Vec<CompatibilityScore>>;
}

// ----------------------------------------------------------------------------
// Heuristic
// ----------------------------------------------------------------------------

const BASE_SCORE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const AREA_FACTOR: Decimal = Decimal::from_parts(3, 0, 0, false, 1);
const PERSONALITY_FACTOR: Decimal = Decimal::from_parts(2, 0, 0, false, 1);
const SKILL_POINTS_PER_LEVEL: i64 = 6;
const SKILL_BONUS_CAP: i64 = 30;

/// Deterministic keyword scorer. No network, same input gives same ranking.
///
/// Every candidate starts at 50. Each ranked vocational area found in the
/// candidate description adds `percentage * 0.3`, the personality mean adds
/// `mean * 0.2` once, and each matching skill adds `proficiency * 6` up to
/// a +30 total. The result is clamped to 0..100.
pub struct HeuristicCompatibilityGenerator;

impl HeuristicCompatibilityGenerator {
    pub fn score_candidate(profile: &EvaluationProfile, candidate: &Candidate) -> CompatibilityScore {
        let text = candidate.description_text().to_lowercase();
        let mut score = BASE_SCORE;
        let mut reasons = Vec::new();

        if let Some(vocational) = &profile.vocational {
            for area in &vocational.top_areas {
                if mentions(&text, &area.area) {
                    score += area.percentage * AREA_FACTOR;
                    reasons.push(format!("matches your interest in {}", area.area));
                }
            }
        }

        if let Some(personality) = &profile.personality {
            let mean = mean2(personality.dimensions.values());
            score += mean * PERSONALITY_FACTOR;
        }

        let mut skill_bonus = 0i64;
        for skill in &profile.skills {
            if mentions(&text, &skill.skill_name) {
                skill_bonus += i64::from(skill.proficiency_level) * SKILL_POINTS_PER_LEVEL;
                reasons.push(format!("uses your {} skill", skill.skill_name));
            }
        }
        score += Decimal::from(skill_bonus.min(SKILL_BONUS_CAP));

        let rationale = if reasons.is_empty() {
            format!("{} is a general fit for your profile.", candidate.name)
        } else {
            format!("{} {}.", candidate.name, reasons.join(", "))
        };

        CompatibilityScore {
            candidate_id: candidate.id,
            compatibility_percentage: clamp_percentage(score),
            rationale: Some(rationale),
        }
    }
}

/// Case-insensitive containment; a blank name never matches.
fn mentions(lowered_text: &str, name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && lowered_text.contains(&name.to_lowercase())
}

#[async_trait]
impl CompatibilityGenerator for HeuristicCompatibilityGenerator {
    async fn recommend(
        &self,
        _kind: RecommendationKind,
        profile: &EvaluationProfile,
        candidates: &[Candidate],
    ) -> Result<Vec<CompatibilityScore>> {
        let mut scores: Vec<CompatibilityScore> = candidates
            .iter()
            .map(|c| Self::score_candidate(profile, c))
            .collect();
        scores.sort_by(|a, b| b.compatibility_percentage.cmp(&a.compatibility_percentage));
        Ok(scores)
    }
}

// ----------------------------------------------------------------------------
// Language model
// ----------------------------------------------------------------------------

/// Candidates returned by the language model per request.
pub const LLM_TOP_N: usize = 10;

pub struct LlmCompatibilityGenerator {
    llm: LlmClient,
}

impl LlmCompatibilityGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    fn system_prompt(kind: RecommendationKind) -> String {
        let subject = match kind {
            RecommendationKind::Career => "university careers",
            RecommendationKind::Specialization => "professional specializations",
        };
        format!(
            "You are a vocational guidance counsellor. Given a student's evaluation profile and a \
             catalog of {subject}, choose the {n} best matches from the catalog. \
             Reply with a JSON object {{\"recommendations\": [{{\"candidateId\": <id from the catalog>, \
             \"compatibilityPercentage\": <number 0-100>, \"rationale\": <one or two sentences>}}]}} \
             ordered from best to worst. Only use ids that appear in the catalog.",
            subject = subject,
            n = LLM_TOP_N,
        )
    }
}

#[async_trait]
impl CompatibilityGenerator for LlmCompatibilityGenerator {
    async fn recommend(
        &self,
        kind: RecommendationKind,
        profile: &EvaluationProfile,
        candidates: &[Candidate],
    ) -> Result<Vec<CompatibilityScore>> {
        let user_content = serde_json::to_string(&serde_json::json!({
            "profile": profile,
            "catalog": candidates,
        }))?;

        tracing::info!(
            kind = %kind,
            candidates = candidates.len(),
            model = self.llm.model(),
            "requesting compatibility scores"
        );
        let reply = self
            .llm
            .chat_json(&Self::system_prompt(kind), &user_content, 0.4)
            .await?;
        parse_recommendations(&reply)
    }
}

/// Reads `{"recommendations": [{candidateId, compatibilityPercentage, rationale}]}`.
pub fn parse_recommendations(reply: &JsonValue) -> Result<Vec<CompatibilityScore>> {
    let items = reply
        .get("recommendations")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| {
            Error::ContractViolation("generator reply has no recommendations array".to_string())
        })?;

    items
        .iter()
        .map(|item| {
            let candidate_id = item
                .get("candidateId")
                .and_then(|v| v.as_i64().or_else(|| v.as_str()?.trim().parse().ok()))
                .ok_or_else(|| {
                    Error::ContractViolation("recommendation without a valid candidateId".to_string())
                })?;
            let pct = item
                .get("compatibilityPercentage")
                .and_then(JsonValue::as_f64)
                .and_then(from_f64)
                .ok_or_else(|| {
                    Error::ContractViolation(format!(
                        "candidate {} has no numeric compatibilityPercentage",
                        candidate_id
                    ))
                })?;
            let rationale = item
                .get("rationale")
                .and_then(JsonValue::as_str)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string);

            Ok(CompatibilityScore {
                candidate_id,
                compatibility_percentage: pct,
                rationale,
            })
        })
        .collect()
}
