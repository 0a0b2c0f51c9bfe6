use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A career or specialization offered to the compatibility generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub details: CandidateDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateDetails {
    Career {
        duration_semesters: Option<i32>,
        average_salary: Option<Decimal>,
    },
    Specialization {
        career_name: Option<String>,
        application_fields: Option<String>,
        job_projection: Option<String>,
    },
}

impl Candidate {
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
