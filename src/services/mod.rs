pub mod compatibility_service;
pub mod evaluation_service;
pub mod grading_service;
pub mod llm_service;
pub mod personality_service;
pub mod recommendation_cache;
pub mod recommendation_service;
pub mod scoring_service;
