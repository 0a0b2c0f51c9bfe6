use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkill {
    pub skill_name: String,
    /// 1 (novice) to 5 (expert).
    pub proficiency_level: i32,
}
