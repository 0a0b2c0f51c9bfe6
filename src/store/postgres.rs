use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::catalog::{Candidate, CandidateDetails};
use crate::models::evaluation::{CompletedEvaluation, EvaluationOutcome, NewEvaluation};
use crate::models::question::{AnswerOption, Question};
use crate::models::recommendation::{NewRecommendation, RecommendationKind, RecommendationView};
use crate::models::test::{Test, TestType};
use crate::models::user::UserSkill;
use crate::store::{EvaluationStore, RecommendationStore, UserDirectory};

const EVALUATION_COLUMNS: &str = r#"
    ce.id, ce.user_id, ce.test_id, t.name AS test_name, t.test_type,
    ce.completion_date, ce.total_score, er.result
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let mut questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, question_text, ordinal, is_active
            FROM questions
            WHERE test_id = $1
            ORDER BY ordinal ASC, id ASC
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        let options = sqlx::query_as::<_, AnswerOption>(
            r#"
            SELECT o.id, o.question_id, o.option_text, o.weight, o.category
            FROM answer_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.test_id = $1
            ORDER BY o.id ASC
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        for option in options {
            if let Some(q) = questions.iter_mut().find(|q| q.id == option.question_id) {
                q.options.push(option);
            }
        }
        Ok(questions)
    }
}

fn test_from_row(row: &PgRow) -> Result<Test> {
    let test_type: String = row.try_get("test_type")?;
    Ok(Test {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        test_type: test_type.parse()?,
        questions_to_show: row.try_get("questions_to_show")?,
        is_active: row.try_get("is_active")?,
        questions: Vec::new(),
    })
}

fn evaluation_from_row(row: &PgRow) -> Result<CompletedEvaluation> {
    let test_type: String = row.try_get("test_type")?;
    let result: Option<JsonValue> = row.try_get("result")?;
    let result = result
        .map(serde_json::from_value::<EvaluationOutcome>)
        .transpose()?;
    Ok(CompletedEvaluation {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        test_id: row.try_get("test_id")?,
        test_name: row.try_get("test_name")?,
        test_type: test_type.parse()?,
        completion_date: row.try_get::<DateTime<Utc>, _>("completion_date")?,
        total_score: row.try_get::<Option<Decimal>, _>("total_score")?,
        result,
    })
}

fn career_from_row(row: &PgRow) -> Result<Candidate> {
    Ok(Candidate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        details: CandidateDetails::Career {
            duration_semesters: row.try_get("duration_semesters")?,
            average_salary: row.try_get("average_salary")?,
        },
    })
}

fn specialization_from_row(row: &PgRow) -> Result<Candidate> {
    Ok(Candidate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        details: CandidateDetails::Specialization {
            career_name: row.try_get("career_name")?,
            application_fields: row.try_get("application_fields")?,
            job_projection: row.try_get("job_projection")?,
        },
    })
}

fn view_from_row(kind: RecommendationKind, row: &PgRow) -> Result<RecommendationView> {
    let candidate = match kind {
        RecommendationKind::Career => career_from_row(row)?,
        RecommendationKind::Specialization => specialization_from_row(row)?,
    };
    Ok(RecommendationView {
        candidate,
        compatibility_percentage: row.try_get("compatibility_percentage")?,
        rationale: row.try_get("rationale")?,
    })
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>> {
        let skills = sqlx::query_as::<_, UserSkill>(
            r#"SELECT skill_name, proficiency_level FROM user_skills WHERE user_id = $1 ORDER BY skill_name"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }
}

#[async_trait]
impl EvaluationStore for PgStore {
    async fn get_test(&self, test_id: Uuid) -> Result<Option<Test>> {
        let row = sqlx::query(
            r#"SELECT id, name, description, test_type, questions_to_show, is_active FROM tests WHERE id = $1"#,
        )
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else { return Ok(None) };

        let mut test = test_from_row(&row)?;
        test.questions = self.load_questions(test.id).await?;
        Ok(Some(test))
    }

    async fn active_test_by_type(&self, test_type: TestType) -> Result<Option<Test>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, test_type, questions_to_show, is_active
            FROM tests
            WHERE test_type = $1 AND is_active = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(test_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else { return Ok(None) };

        let mut test = test_from_row(&row)?;
        test.questions = self.load_questions(test.id).await?;
        Ok(Some(test))
    }

    async fn record_evaluation(&self, evaluation: NewEvaluation) -> Result<CompletedEvaluation> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO completed_evaluations (user_id, test_id, completion_date)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(evaluation.user_id)
        .bind(evaluation.test_id)
        .bind(evaluation.completion_date)
        .fetch_one(&mut *tx)
        .await?;
        let evaluation_id: Uuid = row.try_get("id")?;

        for answer in &evaluation.answers {
            sqlx::query(
                r#"INSERT INTO user_answers (evaluation_id, question_id, option_id) VALUES ($1, $2, $3)"#,
            )
            .bind(evaluation_id)
            .bind(answer.question_id)
            .bind(answer.option_id)
            .execute(&mut *tx)
            .await?;
        }

        let payload = serde_json::to_value(&evaluation.outcome)?;
        sqlx::query(r#"INSERT INTO evaluation_results (evaluation_id, result) VALUES ($1, $2)"#)
            .bind(evaluation_id)
            .bind(&payload)
            .execute(&mut *tx)
            .await?;

        for area in evaluation.area_results() {
            sqlx::query(
                r#"
                INSERT INTO area_results (evaluation_id, area, percentage, ranking)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(evaluation_id)
            .bind(&area.area)
            .bind(area.percentage)
            .bind(area.ranking)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(r#"UPDATE completed_evaluations SET total_score = $1 WHERE id = $2"#)
            .bind(evaluation.total_score)
            .bind(evaluation_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!(
            r#"
            SELECT {EVALUATION_COLUMNS}
            FROM completed_evaluations ce
            JOIN tests t ON t.id = ce.test_id
            LEFT JOIN evaluation_results er ON er.evaluation_id = ce.id
            WHERE ce.id = $1
            "#
        ))
        .bind(evaluation_id)
        .fetch_one(&mut *tx)
        .await?;
        let recorded = evaluation_from_row(&row)?;

        tx.commit().await?;
        Ok(recorded)
    }

    async fn evaluations_for_user(&self, user_id: Uuid) -> Result<Vec<CompletedEvaluation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {EVALUATION_COLUMNS}
            FROM completed_evaluations ce
            JOIN tests t ON t.id = ce.test_id
            LEFT JOIN evaluation_results er ON er.evaluation_id = ce.id
            WHERE ce.user_id = $1
            ORDER BY ce.completion_date DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(evaluation_from_row).collect()
    }

    async fn get_evaluation(&self, evaluation_id: Uuid) -> Result<Option<CompletedEvaluation>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {EVALUATION_COLUMNS}
            FROM completed_evaluations ce
            JOIN tests t ON t.id = ce.test_id
            LEFT JOIN evaluation_results er ON er.evaluation_id = ce.id
            WHERE ce.id = $1
            "#
        ))
        .bind(evaluation_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(evaluation_from_row).transpose()
    }

    async fn latest_per_type(&self, user_id: Uuid) -> Result<Vec<CompletedEvaluation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT DISTINCT ON (t.test_type) {EVALUATION_COLUMNS}
            FROM completed_evaluations ce
            JOIN tests t ON t.id = ce.test_id
            LEFT JOIN evaluation_results er ON er.evaluation_id = ce.id
            WHERE ce.user_id = $1
            ORDER BY t.test_type, ce.completion_date DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(evaluation_from_row).collect()
    }
}

#[async_trait]
impl RecommendationStore for PgStore {
    async fn list_recommendations(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
    ) -> Result<Vec<RecommendationView>> {
        let sql = match kind {
            RecommendationKind::Career => {
                r#"
                SELECT c.id, c.name, c.description, c.duration_semesters, c.average_salary,
                       r.compatibility_percentage, r.rationale
                FROM career_recommendations r
                JOIN careers c ON c.id = r.career_id
                WHERE r.user_id = $1
                ORDER BY r.compatibility_percentage DESC, r.id ASC
                "#
            }
            RecommendationKind::Specialization => {
                r#"
                SELECT s.id, s.name, s.description, c.name AS career_name,
                       s.application_fields, s.job_projection,
                       r.compatibility_percentage, r.rationale
                FROM specialization_recommendations r
                JOIN specializations s ON s.id = r.specialization_id
                LEFT JOIN careers c ON c.id = s.career_id
                WHERE r.user_id = $1
                ORDER BY r.compatibility_percentage DESC, r.id ASC
                "#
            }
        };
        let rows = sqlx::query(sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(|row| view_from_row(kind, row)).collect()
    }

    async fn insert_recommendations(
        &self,
        user_id: Uuid,
        kind: RecommendationKind,
        batch: &[NewRecommendation],
    ) -> Result<Vec<RecommendationView>> {
        let sql = match kind {
            RecommendationKind::Career => {
                r#"
                INSERT INTO career_recommendations (user_id, career_id, compatibility_percentage, rationale)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, career_id) DO NOTHING
                "#
            }
            RecommendationKind::Specialization => {
                r#"
                INSERT INTO specialization_recommendations (user_id, specialization_id, compatibility_percentage, rationale)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, specialization_id) DO NOTHING
                "#
            }
        };

        let mut tx = self.pool.begin().await?;
        for rec in batch {
            sqlx::query(sql)
                .bind(user_id)
                .bind(rec.candidate_id)
                .bind(rec.compatibility_percentage)
                .bind(&rec.rationale)
                .execute(&mut *tx)
                .await
                .map_err(|e| match e {
                    sqlx::Error::Database(db) if db.is_foreign_key_violation() => Error::NotFound(
                        format!("{} {} not found", kind, rec.candidate_id),
                    ),
                    other => Error::from(other),
                })?;
        }
        tx.commit().await?;

        self.list_recommendations(user_id, kind).await
    }

    async fn candidates(&self, kind: RecommendationKind) -> Result<Vec<Candidate>> {
        match kind {
            RecommendationKind::Career => {
                let rows = sqlx::query(
                    r#"
                    SELECT id, name, description, duration_semesters, average_salary
                    FROM careers
                    ORDER BY id ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?;
                rows.iter().map(career_from_row).collect()
            }
            RecommendationKind::Specialization => {
                let rows = sqlx::query(
                    r#"
                    SELECT s.id, s.name, s.description, c.name AS career_name,
                           s.application_fields, s.job_projection
                    FROM specializations s
                    LEFT JOIN careers c ON c.id = s.career_id
                    ORDER BY s.id ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?;
                rows.iter().map(specialization_from_row).collect()
            }
        }
    }
}
