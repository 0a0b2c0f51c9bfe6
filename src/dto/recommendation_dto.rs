use serde::{Deserialize, Serialize};

use crate::models::recommendation::{RecommendationKind, RecommendationView};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub kind: RecommendationKind,
    pub recommendations: Vec<RecommendationView>,
}
