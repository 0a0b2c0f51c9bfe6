use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::catalog::Candidate;
use crate::models::evaluation::{CompletedEvaluation, NewEvaluation, UserAnswer};
use crate::models::recommendation::{NewRecommendation, RecommendationKind, RecommendationView};
use crate::models::test::{Test, TestType};
use crate::models::user::UserSkill;
use crate::store::{EvaluationStore, RecommendationStore, UserDirectory};

#[derive(Default)]
struct Inner {
    users: HashSet<Uuid>,
    skills: HashMap<Uuid, Vec<UserSkill>>,
    tests: Vec<Test>,
    evaluations: Vec<CompletedEvaluation>,
    answers: HashMap<Uuid, Vec<UserAnswer>>,
    careers: Vec<Candidate>,
    specializations: Vec<Candidate>,
    recommendations: HashMap<(Uuid, RecommendationKind), Vec<StoredRecommendation>>,
}

#[derive(Clone)]
struct StoredRecommendation {
    seq: u64,
    candidate_id: i64,
    compatibility_percentage: Decimal,
    rationale: Option<String>,
}

/// In-process store with the same contracts as the Postgres backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    next_seq: AtomicU64,
    recommendation_batches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    pub fn add_user(&self, user_id: Uuid) -> Result<()> {
        self.write()?.users.insert(user_id);
        Ok(())
    }

    pub fn add_skill(&self, user_id: Uuid, skill_name: &str, proficiency_level: i32) -> Result<()> {
        self.write()?
            .skills
            .entry(user_id)
            .or_default()
            .push(UserSkill {
                skill_name: skill_name.to_string(),
                proficiency_level,
            });
        Ok(())
    }

    pub fn add_test(&self, test: Test) -> Result<()> {
        self.write()?.tests.push(test);
        Ok(())
    }

    pub fn add_candidate(&self, kind: RecommendationKind, candidate: Candidate) -> Result<()> {
        let mut inner = self.write()?;
        match kind {
            RecommendationKind::Career => inner.careers.push(candidate),
            RecommendationKind::Specialization => inner.specializations.push(candidate),
        }
        Ok(())
    }

    /// Stored answers for an evaluation, in submission order.
    pub fn answers_for(&self, evaluation_id: Uuid) -> Result<Vec<UserAnswer>> {
        Ok(self
            .read()?
            .answers
            .get(&evaluation_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Number of recommendation batches that actually inserted rows.
    pub fn recommendation_batches(&self) -> usize {
        self.recommendation_batches.load(Ordering::SeqCst)
    }

    fn views(inner: &Inner, user_id: Uuid, kind: RecommendationKind) -> Vec<RecommendationView> {
        let catalog = match kind {
            RecommendationKind::Career => &inner.careers,
            RecommendationKind::Specialization => &inner.specializations,
        };
        let mut stored = inner
            .recommendations
            .get(&(user_id, kind))
            .cloned()
            .unwrap_or_default();
        stored.sort_by(|a, b| {
            b.compatibility_percentage
                .cmp(&a.compatibility_percentage)
                .then(a.seq.cmp(&b.seq))
        });
        stored
            .into_iter()
            .filter_map(|rec| {
                let candidate = catalog.iter().find(|c| c.id == rec.candidate_id)?.clone();
                Some(RecommendationView {
                    candidate,
                    compatibility_percentage: rec.compatibility_percentage,
                    rationale: rec.rationale,
                })
            })
            .collect()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.read()?.users.contains(&user_id))
    }

    async fn user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>> {
        Ok(self.read()?.skills.get(&user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn get_test(&self, test_id: Uuid) -> Result<Option<Test>> {
        Ok(self.read()?.tests.iter().find(|t| t.id == test_id).cloned())
    }

    async fn active_test_by_type(&self, test_type: TestType) -> Result<Option<Test>> {
        Ok(self
            .read()?
            .tests
            .iter()
            .rev()
            .find(|t| t.is_active && t.test_type == test_type)
            .cloned())
    }

    async fn record_evaluation(&self, evaluation: NewEvaluation) -> Result<CompletedEvaluation> {
        let mut inner = self.write()?;
        let test = inner
            .tests
            .iter()
            .find(|t| t.id == evaluation.test_id)
            .ok_or_else(|| Error::NotFound(format!("Test {} not found", evaluation.test_id)))?;

        let recorded = CompletedEvaluation {
            id: Uuid::new_v4(),
            user_id: evaluation.user_id,
            test_id: test.id,
            test_name: test.name.clone(),
            test_type: test.test_type,
            completion_date: evaluation.completion_date,
            total_score: Some(evaluation.total_score),
            result: Some(evaluation.outcome),
        };
        inner.answers.insert(recorded.id, evaluation.answers);
        inner.evaluations.push(recorded.clone());
        Ok(recorded)
    }

    async fn evaluations_for_user(&self, user_id: Uuid) -> Result<Vec<CompletedEvaluation>> {
        let mut evaluations: Vec<_> = self
            .read()?
            .evaluations
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        evaluations.sort_by(|a, b| b.completion_date.cmp(&a.completion_date));
        Ok(evaluations)
    }

    async fn get_evaluation(&self, evaluation_id: Uuid) -> Result<Option<CompletedEvaluation>> {
        Ok(self
            .read()?
            .evaluations
            .iter()
            .find(|e| e.id == evaluation_id)
            .cloned())
    }
}

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn list_recommendations(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
    ) -> Result<Vec<RecommendationView>> {
        Ok(Self::views(&*self.read()?, user_id, kind))
    }

    async fn insert_recommendations(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
        batch: &[NewRecommendation],
    ) -> Result<Vec<RecommendationView>> {
        let mut inner = self.write()?;

        {
            let catalog = match kind {
                RecommendationKind::Career => &inner.careers,
                RecommendationKind::Specialization => &inner.specializations,
            };
            if let Some(missing) = batch
                .iter()
                .find(|rec| !catalog.iter().any(|c| c.id == rec.candidate_id))
            {
                return Err(Error::NotFound(format!(
                    "{} {} not found",
                    kind, missing.candidate_id
                )));
            }
        }

        let existing = inner.recommendations.entry((user_id, kind)).or_default();
        let mut inserted = 0;
        for rec in batch {
            if existing.iter().any(|s| s.candidate_id == rec.candidate_id) {
                continue;
            }
            existing.push(StoredRecommendation {
                seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
                candidate_id: rec.candidate_id,
                compatibility_percentage: rec.compatibility_percentage,
                rationale: rec.rationale.clone(),
            });
            inserted += 1;
        }
        if inserted > 0 {
            self.recommendation_batches.fetch_add(1, Ordering::SeqCst);
        }

        Ok(Self::views(&inner, user_id, kind))
    }

    async fn candidates(&self, kind: RecommendationKind) -> Result<Vec<Candidate>> {
        let inner = self.read()?;
        Ok(match kind {
            RecommendationKind::Career => inner.careers.clone(),
            RecommendationKind::Specialization => inner.specializations.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::CandidateDetails;
    use crate::models::evaluation::{EvaluationOutcome, PersonalityResult};
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;

    fn career(id: i64) -> Candidate {
        Candidate {
            id,
            name: format!("career {}", id),
            description: None,
            details: CandidateDetails::Career {
                duration_semesters: Some(8),
                average_salary: None,
            },
        }
    }

    fn rec(candidate_id: i64, pct: i64) -> NewRecommendation {
        NewRecommendation {
            candidate_id,
            compatibility_percentage: Decimal::from(pct),
            rationale: None,
        }
    }

    #[tokio::test]
    async fn insert_skips_existing_candidates() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for id in 1..=3 {
            store.add_candidate(RecommendationKind::Career, career(id)).unwrap();
        }

        let first = store
            .insert_recommendations(user, RecommendationKind::Career, &[rec(1, 40), rec(2, 90)])
            .await
            .unwrap();
        assert_eq!(first.iter().map(|v| v.candidate.id).collect::<Vec<_>>(), vec![2, 1]);

        let second = store
            .insert_recommendations(user, RecommendationKind::Career, &[rec(2, 10), rec(3, 60)])
            .await
            .unwrap();
        let pairs: Vec<_> = second
            .iter()
            .map(|v| (v.candidate.id, v.compatibility_percentage))
            .collect();
        assert_eq!(
            pairs,
            vec![(2, Decimal::from(90)), (3, Decimal::from(60)), (1, Decimal::from(40))]
        );
        assert_eq!(store.recommendation_batches(), 2);
    }

    #[tokio::test]
    async fn insert_with_unknown_candidate_persists_nothing() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.add_candidate(RecommendationKind::Career, career(1)).unwrap();

        let err = store
            .insert_recommendations(user, RecommendationKind::Career, &[rec(1, 50), rec(9, 50)])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ENTITY_NOT_FOUND");
        assert!(store
            .list_recommendations(user, RecommendationKind::Career)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn latest_per_type_prefers_newest() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let test = Test {
            id: Uuid::new_v4(),
            name: "Big Five".into(),
            description: None,
            test_type: TestType::Personality,
            questions_to_show: 0,
            is_active: true,
            questions: vec![],
        };
        store.add_test(test.clone()).unwrap();

        let now = Utc::now();
        for (offset, score) in [(2, 10), (0, 80), (1, 50)] {
            store
                .record_evaluation(NewEvaluation {
                    user_id: user,
                    test_id: test.id,
                    completion_date: now - Duration::days(offset),
                    answers: vec![],
                    total_score: Decimal::from(score),
                    outcome: EvaluationOutcome::Personality(PersonalityResult {
                        dimensions: BTreeMap::new(),
                    }),
                })
                .await
                .unwrap();
        }

        let history = store.evaluations_for_user(user).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].total_score, Some(Decimal::from(80)));

        let latest = store.latest_per_type(user).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].total_score, Some(Decimal::from(80)));
    }
}
