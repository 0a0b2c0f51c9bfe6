use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::evaluation::{
    AreaScore, CognitiveAreaScore, CognitiveResult, EvaluationOutcome, PersonalityResult,
    SkillLevel, VocationalResult,
};
use crate::services::scoring_service::ScoreAccumulator;
use crate::utils::decimal::{mean2, round2};

/// Areas kept per vocational evaluation.
pub const TOP_AREAS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct GradedOutcome {
    pub total_score: Decimal,
    pub outcome: EvaluationOutcome,
}

pub struct GradingService;

impl GradingService {
    pub fn grade_personality(dimensions: BTreeMap<String, Decimal>) -> GradedOutcome {
        let total_score = mean2(dimensions.values());
        GradedOutcome {
            total_score,
            outcome: EvaluationOutcome::Personality(PersonalityResult { dimensions }),
        }
    }

    pub fn grade_vocational(acc: &ScoreAccumulator) -> GradedOutcome {
        let total = Decimal::from(acc.total_earned());
        let mut percentages: Vec<(String, Decimal)> = acc
            .tallies()
            .iter()
            .map(|t| {
                let pct = if total > Decimal::ZERO {
                    round2(Decimal::from(t.earned) * Decimal::ONE_HUNDRED / total)
                } else {
                    round2(Decimal::ZERO)
                };
                (t.category.clone(), pct)
            })
            .collect();

        // sort_by is stable: equal percentages keep first-seen order
        percentages.sort_by(|a, b| b.1.cmp(&a.1));
        percentages.truncate(TOP_AREAS);

        let top_areas: Vec<AreaScore> = percentages
            .into_iter()
            .enumerate()
            .map(|(idx, (area, percentage))| AreaScore {
                area,
                percentage,
                ranking: idx as i32 + 1,
            })
            .collect();

        let total_score = mean2(top_areas.iter().map(|a| &a.percentage));
        let advice = top_areas.iter().map(|a| area_advice(&a.area)).collect();

        GradedOutcome {
            total_score,
            outcome: EvaluationOutcome::VocationalInterests(VocationalResult { top_areas, advice }),
        }
    }

    pub fn grade_cognitive(acc: &ScoreAccumulator) -> GradedOutcome {
        let areas: Vec<CognitiveAreaScore> = acc
            .tallies()
            .iter()
            .filter(|t| t.ceiling > 0)
            .map(|t| {
                let score = round2(
                    (Decimal::from(t.earned) * Decimal::ONE_HUNDRED / Decimal::from(t.ceiling))
                        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
                );
                CognitiveAreaScore {
                    category: t.category.clone(),
                    score,
                    level: SkillLevel::from_score(score),
                }
            })
            .collect();

        let total_score = mean2(areas.iter().map(|a| &a.score));
        GradedOutcome {
            total_score,
            outcome: EvaluationOutcome::CognitiveSkills(CognitiveResult {
                areas,
                overall_level: SkillLevel::from_score(total_score),
            }),
        }
    }
}

fn area_advice(area: &str) -> String {
    format!(
        "Consider programmes in the {} area, where your interests are strongest.",
        area
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn vocational(outcome: &EvaluationOutcome) -> &VocationalResult {
        match outcome {
            EvaluationOutcome::VocationalInterests(v) => v,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    fn cognitive(outcome: &EvaluationOutcome) -> &CognitiveResult {
        match outcome {
            EvaluationOutcome::CognitiveSkills(c) => c,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn vocational_percentages_rank_descending() {
        let mut acc = ScoreAccumulator::new();
        acc.add("A", 10);
        acc.add("B", 30);
        acc.add("C", 60);

        let graded = GradingService::grade_vocational(&acc);
        let result = vocational(&graded.outcome);
        let ranked: Vec<_> = result
            .top_areas
            .iter()
            .map(|a| (a.area.as_str(), a.percentage, a.ranking))
            .collect();
        assert_eq!(
            ranked,
            vec![("C", d("60"), 1), ("B", d("30"), 2), ("A", d("10"), 3)]
        );
        assert_eq!(graded.total_score.to_string(), "33.33");
        assert_eq!(result.advice.len(), 3);
    }

    #[test]
    fn vocational_keeps_top_five_with_stable_ties() {
        let mut acc = ScoreAccumulator::new();
        for (cat, w) in [("a", 1), ("b", 2), ("c", 2), ("d", 2), ("e", 1), ("f", 2), ("g", 2)] {
            acc.add(cat, w);
        }

        let graded = GradingService::grade_vocational(&acc);
        let result = vocational(&graded.outcome);
        let names: Vec<_> = result.top_areas.iter().map(|a| a.area.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d", "f", "g"]);
        assert!(result
            .top_areas
            .windows(2)
            .all(|w| w[0].percentage >= w[1].percentage));
        assert!(result
            .top_areas
            .iter()
            .all(|a| a.percentage >= Decimal::ZERO && a.percentage <= Decimal::ONE_HUNDRED));
    }

    #[test]
    fn vocational_zero_total_yields_zero_percentages() {
        let mut acc = ScoreAccumulator::new();
        acc.add("a", 0);
        let graded = GradingService::grade_vocational(&acc);
        assert_eq!(vocational(&graded.outcome).top_areas[0].percentage, Decimal::ZERO);
        assert_eq!(graded.total_score, Decimal::ZERO);

        let empty = GradingService::grade_vocational(&ScoreAccumulator::new());
        assert!(vocational(&empty.outcome).top_areas.is_empty());
        assert_eq!(empty.total_score, Decimal::ZERO);
    }

    #[test]
    fn cognitive_boundary_is_inclusive_low() {
        let mut acc = ScoreAccumulator::new();
        acc.add_with_ceiling("memory", 7, 10);
        acc.add_with_ceiling("logic", 4, 10);
        acc.add_with_ceiling("speed", 9, 10);
        acc.add_with_ceiling("empty", 0, 0);

        let graded = GradingService::grade_cognitive(&acc);
        let result = cognitive(&graded.outcome);
        let levels: Vec<_> = result
            .areas
            .iter()
            .map(|a| (a.category.as_str(), a.score, a.level))
            .collect();
        assert_eq!(
            levels,
            vec![
                ("memory", d("70"), SkillLevel::Medium),
                ("logic", d("40"), SkillLevel::Low),
                ("speed", d("90"), SkillLevel::High),
            ]
        );
        assert_eq!(graded.total_score.to_string(), "66.67");
        assert_eq!(result.overall_level, SkillLevel::Medium);
    }

    #[test]
    fn level_is_deterministic() {
        for raw in ["0", "40", "40.01", "70", "70.01", "100"] {
            let score = d(raw);
            assert_eq!(SkillLevel::from_score(score), SkillLevel::from_score(score));
        }
        assert_eq!(SkillLevel::from_score(d("40.01")), SkillLevel::Medium);
        assert_eq!(SkillLevel::from_score(d("70.01")), SkillLevel::High);
    }

    #[test]
    fn personality_total_is_dimension_mean() {
        let dims: BTreeMap<String, Decimal> = [
            ("openness", d("80")),
            ("conscientiousness", d("65.5")),
            ("extraversion", d("40")),
            ("agreeableness", d("70")),
            ("neuroticism", d("30.25")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let graded = GradingService::grade_personality(dims);
        assert_eq!(graded.total_score.to_string(), "57.15");

        let empty = GradingService::grade_personality(BTreeMap::new());
        assert_eq!(empty.total_score, Decimal::ZERO);
    }
}
