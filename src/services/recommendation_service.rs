use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::evaluation::EvaluationOutcome;
use crate::models::recommendation::{
    EvaluationProfile, NewRecommendation, RecommendationKind, RecommendationView,
};
use crate::services::compatibility_service::{CompatibilityGenerator, CompatibilityScore};
use crate::services::recommendation_cache::{GenerationLocks, RecommendationCache};
use crate::store::{EvaluationStore, RecommendationStore, UserDirectory};
use crate::utils::decimal::clamp_percentage;

/// Cache-aside, generate-once resolution of a user's recommendations.
#[derive(Clone)]
pub struct RecommendationService {
    users: Arc<dyn UserDirectory>,
    evaluations: Arc<dyn EvaluationStore>,
    recommendations: Arc<dyn RecommendationStore>,
    generator: Arc<dyn CompatibilityGenerator>,
    cache: Arc<RecommendationCache>,
    locks: GenerationLocks,
    generator_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        evaluations: Arc<dyn EvaluationStore>,
        recommendations: Arc<dyn RecommendationStore>,
        generator: Arc<dyn CompatibilityGenerator>,
        cache: Arc<RecommendationCache>,
        generator_timeout: Duration,
    ) -> Self {
        Self {
            users,
            evaluations,
            recommendations,
            generator,
            cache,
            locks: GenerationLocks::new(),
            generator_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<RecommendationCache> {
        &self.cache
    }

    pub async fn get_recommendations(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
    ) -> Result<Vec<RecommendationView>> {
        if let Some(views) = self.cache.get(user_id, kind) {
            tracing::debug!(%user_id, %kind, "recommendation cache hit");
            return Ok(views);
        }

        if !self.users.user_exists(user_id).await? {
            return Err(Error::NotFound(format!("User {} not found", user_id)));
        }

        if let Some(views) = self.load_persisted(user_id, kind).await? {
            return Ok(views);
        }

        let _guard = self.locks.acquire(user_id, kind).await;

        // another request may have generated while we waited
        if let Some(views) = self.load_persisted(user_id, kind).await? {
            return Ok(views);
        }

        let views = self.generate(user_id, kind).await?;
        self.cache.put(user_id, kind, views.clone());
        Ok(views)
    }

    async fn load_persisted(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
    ) -> Result<Option<Vec<RecommendationView>>> {
        let views = self.recommendations.list_recommendations(user_id, kind).await?;
        if views.is_empty() {
            return Ok(None);
        }
        self.cache.put(user_id, kind, views.clone());
        Ok(Some(views))
    }

    async fn build_profile(&self, user_id: Uuid, kind: RecommendationKind) -> Result<EvaluationProfile> {
        let mut profile = EvaluationProfile::default();
        for evaluation in self.evaluations.latest_per_type(user_id).await? {
            match evaluation.result {
                Some(EvaluationOutcome::Personality(r)) => profile.personality = Some(r),
                Some(EvaluationOutcome::VocationalInterests(r)) => profile.vocational = Some(r),
                Some(EvaluationOutcome::CognitiveSkills(r)) => profile.cognitive = Some(r),
                None => {}
            }
        }
        if !profile.has_evaluations() {
            return Err(Error::PreconditionFailed(
                "You must complete at least one evaluation before requesting recommendations"
                    .to_string(),
            ));
        }
        if kind == RecommendationKind::Specialization {
            profile.skills = self.users.user_skills(user_id).await?;
        }
        Ok(profile)
    }

    async fn generate(&self, user_id: Uuid, kind: RecommendationKind) -> Result<Vec<RecommendationView>> {
        let profile = self.build_profile(user_id, kind).await?;

        let candidates = self.recommendations.candidates(kind).await?;
        if candidates.is_empty() {
            return Err(Error::PreconditionFailed(format!(
                "No {} candidates available",
                kind
            )));
        }

        tracing::info!(%user_id, %kind, candidates = candidates.len(), "generating recommendations");
        let scores = tokio::time::timeout(
            self.generator_timeout,
            self.generator.recommend(kind, &profile, &candidates),
        )
        .await
        .map_err(|_| {
            Error::Generator(format!(
                "compatibility generator timed out after {:?}",
                self.generator_timeout
            ))
        })?
        .map_err(|e| match e {
            Error::ContractViolation(_) | Error::Generator(_) => e,
            other => {
                tracing::error!(error = %other, %user_id, %kind, "compatibility generator failed");
                Error::Generator(other.to_string())
            }
        })?;

        let known: HashSet<i64> = candidates.iter().map(|c| c.id).collect();
        let batch = to_batch(scores, &known)?;

        let views = self
            .recommendations
            .insert_recommendations(user_id, kind, &batch)
            .await?;
        tracing::info!(%user_id, %kind, persisted = views.len(), "recommendations persisted");
        Ok(views)
    }
}

/// Validates generator output against the catalog, dropping repeated ids and
/// normalizing percentages to two decimals in 0..100.
fn to_batch(scores: Vec<CompatibilityScore>, known: &HashSet<i64>) -> Result<Vec<NewRecommendation>> {
    if let Some(unknown) = scores.iter().find(|s| !known.contains(&s.candidate_id)) {
        return Err(Error::ContractViolation(format!(
            "generator returned unknown candidate {}",
            unknown.candidate_id
        )));
    }

    let mut seen = HashSet::with_capacity(scores.len());
    let mut batch = Vec::with_capacity(scores.len());
    for score in scores {
        if !seen.insert(score.candidate_id) {
            tracing::warn!(candidate_id = score.candidate_id, "generator repeated a candidate");
            continue;
        }
        batch.push(NewRecommendation {
            candidate_id: score.candidate_id,
            compatibility_percentage: clamp_percentage(score.compatibility_percentage),
            rationale: score.rationale,
        });
    }
    Ok(batch)
}
