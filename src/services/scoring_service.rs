use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::models::evaluation::UserAnswer;
use crate::models::test::{Test, TestType};

/// Per-category running totals, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreAccumulator {
    tallies: Vec<CategoryTally>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTally {
    pub category: String,
    pub earned: i64,
    /// Sum of per-question maxima for this category (cognitive tests only).
    pub ceiling: i64,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, category: &str) -> &mut CategoryTally {
        let idx = match self.tallies.iter().position(|t| t.category == category) {
            Some(idx) => idx,
            None => {
                self.tallies.push(CategoryTally {
                    category: category.to_string(),
                    earned: 0,
                    ceiling: 0,
                });
                self.tallies.len() - 1
            }
        };
        &mut self.tallies[idx]
    }

    pub fn add(&mut self, category: &str, weight: i64) {
        self.entry(category).earned += weight;
    }

    pub fn add_with_ceiling(&mut self, category: &str, weight: i64, ceiling: i64) {
        let tally = self.entry(category);
        tally.earned += weight;
        tally.ceiling += ceiling;
    }

    pub fn tallies(&self) -> &[CategoryTally] {
        &self.tallies
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    pub fn total_earned(&self) -> i64 {
        self.tallies.iter().map(|t| t.earned).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoredAnswers {
    /// Question label to chosen answer text, for the personality analyzer.
    Responses(BTreeMap<String, String>),
    Weighted(ScoreAccumulator),
}

pub struct ScoringService;

impl ScoringService {
    /// Checks completeness and resolves every answer against the test's question bank.
    pub fn validate_submission(test: &Test, answers: &[UserAnswer]) -> Result<()> {
        let expected = test.shown_question_count();
        if answers.len() != expected {
            return Err(Error::IncompleteSubmission(format!(
                "Expected {} answers, received {}",
                expected,
                answers.len()
            )));
        }

        let mut seen = HashSet::with_capacity(answers.len());
        for answer in answers {
            if !seen.insert(answer.question_id) {
                return Err(Error::IncompleteSubmission(format!(
                    "Question {} answered more than once",
                    answer.question_id
                )));
            }
            let question = test.question(answer.question_id).ok_or_else(|| {
                Error::UnknownReference(format!(
                    "Question {} does not belong to test {}",
                    answer.question_id, test.id
                ))
            })?;
            if !question.is_active {
                return Err(Error::UnknownReference(format!(
                    "Question {} is not active",
                    question.id
                )));
            }
            if question.option(answer.option_id).is_none() {
                return Err(Error::UnknownReference(format!(
                    "Option {} does not belong to question {}",
                    answer.option_id, question.id
                )));
            }
        }
        Ok(())
    }

    pub fn score(test: &Test, answers: &[UserAnswer]) -> Result<ScoredAnswers> {
        Self::validate_submission(test, answers)?;

        let resolved = answers.iter().filter_map(|a| {
            let question = test.question(a.question_id)?;
            let option = question.option(a.option_id)?;
            Some((question, option))
        });

        let scored = match test.test_type {
            TestType::Personality => ScoredAnswers::Responses(
                resolved
                    .map(|(q, o)| (format!("Q{}", q.id), o.option_text.clone()))
                    .collect(),
            ),
            TestType::VocationalInterests => {
                let mut acc = ScoreAccumulator::new();
                for (_, option) in resolved {
                    if let Some(category) = option.category.as_deref() {
                        acc.add(category, option.weight_or_zero());
                    }
                }
                ScoredAnswers::Weighted(acc)
            }
            TestType::CognitiveSkills => {
                let mut acc = ScoreAccumulator::new();
                for (question, option) in resolved {
                    let (Some(category), Some(weight)) = (option.category.as_deref(), option.weight)
                    else {
                        continue;
                    };
                    acc.add_with_ceiling(category, i64::from(weight), question.ceiling_for(category));
                }
                ScoredAnswers::Weighted(acc)
            }
        };
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerOption, Question};
    use uuid::Uuid;

    fn option(id: i64, question_id: i64, weight: Option<i32>, category: Option<&str>) -> AnswerOption {
        AnswerOption {
            id,
            question_id,
            option_text: format!("option {}", id),
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

    fn inactive(mut question: Question) -> Question {
        question.is_active = false;
        question
    }

    fn test_of(test_type: TestType, questions: Vec<Question>, to_show: i32) -> Test {
        Test {
            id: Uuid::new_v4(),
            name: "sample".into(),
            description: None,
            test_type,
            questions_to_show: to_show,
            is_active: true,
            questions,
        }
    }

    fn answer(question_id: i64, option_id: i64) -> UserAnswer {
        UserAnswer {
            question_id,
            option_id,
        }
    }

    #[test]
    fn vocational_accumulates_in_first_seen_order() {
        let test = test_of(
            TestType::VocationalInterests,
            vec![
                question(1, vec![option(11, 1, Some(3), Some("arts")), option(12, 1, Some(5), Some("science"))]),
                question(2, vec![option(21, 2, Some(4), Some("science")), option(22, 2, None, Some("arts"))]),
                question(3, vec![option(31, 3, Some(9), None)]),
            ],
            3,
        );

        let scored = ScoringService::score(&test, &[answer(1, 11), answer(2, 21), answer(3, 31)]).unwrap();
        let ScoredAnswers::Weighted(acc) = scored else {
            panic!("expected weighted scores");
        };
        let cats: Vec<_> = acc.tallies().iter().map(|t| (t.category.as_str(), t.earned)).collect();
        assert_eq!(cats, vec![("arts", 3), ("science", 4)]);
    }

    #[test]
    fn vocational_null_weight_counts_as_zero() {
        let test = test_of(
            TestType::VocationalInterests,
            vec![question(1, vec![option(11, 1, None, Some("arts"))])],
            1,
        );
        let ScoredAnswers::Weighted(acc) = ScoringService::score(&test, &[answer(1, 11)]).unwrap() else {
            panic!("expected weighted scores");
        };
        assert_eq!(acc.tallies()[0].earned, 0);
    }

    #[test]
    fn cognitive_tracks_per_question_ceiling() {
        let test = test_of(
            TestType::CognitiveSkills,
            vec![
                question(
                    1,
                    vec![
                        option(11, 1, Some(2), Some("memory")),
                        option(12, 1, Some(6), Some("memory")),
                        option(13, 1, Some(9), Some("logic")),
                    ],
                ),
                question(2, vec![option(21, 2, Some(5), Some("memory")), option(22, 2, Some(4), Some("memory"))]),
            ],
            2,
        );

        let ScoredAnswers::Weighted(acc) = ScoringService::score(&test, &[answer(1, 11), answer(2, 21)]).unwrap() else {
            panic!("expected weighted scores");
        };
        assert_eq!(acc.tallies().len(), 1);
        let memory = &acc.tallies()[0];
        assert_eq!(memory.earned, 7);
        assert_eq!(memory.ceiling, 11);
    }

    #[test]
    fn personality_maps_answers_to_texts() {
        let test = test_of(
            TestType::Personality,
            vec![question(7, vec![option(71, 7, None, None)])],
            1,
        );
        let scored = ScoringService::score(&test, &[answer(7, 71)]).unwrap();
        let ScoredAnswers::Responses(map) = scored else {
            panic!("expected responses");
        };
        assert_eq!(map.get("Q7").map(String::as_str), Some("option 71"));
    }

    #[test]
    fn wrong_answer_count_is_incomplete() {
        let test = test_of(
            TestType::VocationalInterests,
            vec![question(1, vec![option(11, 1, Some(1), Some("a"))]), question(2, vec![option(21, 2, Some(1), Some("a"))])],
            2,
        );
        let err = ScoringService::score(&test, &[answer(1, 11)]).unwrap_err();
        assert_eq!(err.code(), "INCOMPLETE_SUBMISSION");

        let err = ScoringService::score(&test, &[answer(1, 11), answer(1, 11)]).unwrap_err();
        assert_eq!(err.code(), "INCOMPLETE_SUBMISSION");
    }

    #[test]
    fn foreign_option_is_unknown_reference() {
        let test = test_of(
            TestType::VocationalInterests,
            vec![question(1, vec![option(11, 1, Some(1), Some("a"))]), question(2, vec![option(21, 2, Some(1), Some("a"))])],
            1,
        );
        let err = ScoringService::score(&test, &[answer(1, 21)]).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_REFERENCE");

        let err = ScoringService::score(&test, &[answer(99, 11)]).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_REFERENCE");
    }

    #[test]
    fn expected_count_is_capped_by_active_questions() {
        let test = test_of(
            TestType::VocationalInterests,
            vec![
                question(1, vec![option(11, 1, Some(1), Some("a"))]),
                inactive(question(2, vec![option(21, 2, Some(1), Some("a"))])),
            ],
            4,
        );
        assert_eq!(test.shown_question_count(), 1);
        assert!(ScoringService::score(&test, &[answer(1, 11)]).is_ok());
    }

    #[test]
    fn inactive_question_is_unknown_reference() {
        let test = test_of(
            TestType::VocationalInterests,
            vec![
                question(1, vec![option(11, 1, Some(1), Some("a"))]),
                question(2, vec![option(21, 2, Some(1), Some("a"))]),
                inactive(question(3, vec![option(31, 3, Some(1), Some("a"))])),
            ],
            2,
        );
        let err = ScoringService::score(&test, &[answer(1, 11), answer(3, 31)]).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_REFERENCE");
    }
}
