use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub option_text: String,
    pub weight: Option<i32>,
    /// Dimension, vocational area or cognitive skill this option feeds.
    pub category: Option<String>,
}

impl AnswerOption {
    pub fn weight_or_zero(&self) -> i64 {
        self.weight.map(i64::from).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub ordinal: i32,
    pub is_active: bool,
    #[sqlx(skip)]
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn option(&self, option_id: i64) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Highest weight any option of this question assigns to `category`.
    pub fn ceiling_for(&self, category: &str) -> i64 {
        self.options
            .iter()
            .filter(|o| o.category.as_deref() == Some(category))
            .map(AnswerOption::weight_or_zero)
            .max()
            .unwrap_or(0)
    }
}
