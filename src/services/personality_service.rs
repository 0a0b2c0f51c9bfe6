use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::services::llm_service::LlmClient;
use crate::utils::decimal::{clamp_percentage, from_f64};

/// Turns free-text personality responses into named dimension scores (0..100).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersonalityAnalyzer: Send + Sync {
    async fn analyze(&self, responses: &BTreeMap<String, String>) -> Result<BTreeMap<String, Decimal>>;
}

pub struct LlmPersonalityAnalyzer {
    llm: LlmClient,
}

impl LlmPersonalityAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

const SYSTEM_PROMPT: &str = r#"You are an occupational psychologist scoring a Big Five personality questionnaire.
You receive a JSON object mapping question labels to the respondent's chosen answers.
Reply with a JSON object of the form {"dimensions": {"openness": n, "conscientiousness": n, "extraversion": n, "agreeableness": n, "neuroticism": n}}
where each n is a number from 0 to 100. Do not include any other fields."#;

#[async_trait]
impl PersonalityAnalyzer for LlmPersonalityAnalyzer {
    async fn analyze(&self, responses: &BTreeMap<String, String>) -> Result<BTreeMap<String, Decimal>> {
        let user_content = serde_json::to_string(responses)?;
        let reply = self.llm.chat_json(SYSTEM_PROMPT, &user_content, 0.2).await?;
        parse_dimensions(&reply)
    }
}

/// Reads `{"dimensions": {name: number}}`, clamping each score into 0..100.
pub fn parse_dimensions(reply: &JsonValue) -> Result<BTreeMap<String, Decimal>> {
    let dims = reply
        .get("dimensions")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| Error::ContractViolation("analyzer reply has no dimensions object".to_string()))?;

    dims.iter()
        .map(|(name, value)| {
            let score = value
                .as_f64()
                .and_then(from_f64)
                .ok_or_else(|| {
                    Error::ContractViolation(format!("dimension {} is not a number", name))
                })?;
            Ok((name.to_lowercase(), clamp_percentage(score)))
        })
        .collect()
}
