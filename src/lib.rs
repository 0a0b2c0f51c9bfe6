pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;

use crate::config::{CompatibilityBackend, Config};
use crate::error::{Error, Result};
use crate::services::{
    compatibility_service::{
        CompatibilityGenerator, HeuristicCompatibilityGenerator, LlmCompatibilityGenerator,
    },
    evaluation_service::EvaluationService,
    llm_service::LlmClient,
    personality_service::{LlmPersonalityAnalyzer, PersonalityAnalyzer},
    recommendation_cache::RecommendationCache,
    recommendation_service::RecommendationService,
};
use crate::store::{PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub evaluation_service: EvaluationService,
    pub recommendation_service: RecommendationService,
    pub recommendation_cache: Arc<RecommendationCache>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.generator_timeout_secs);
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;

        let llm = config.llm_api_key.as_ref().map(|key| {
            LlmClient::new(
                http_client,
                config.llm_api_url.clone(),
                key.clone(),
                config.llm_model.clone(),
                timeout,
            )
        });

        let analyzer: Option<Arc<dyn PersonalityAnalyzer>> = llm
            .clone()
            .map(|llm| Arc::new(LlmPersonalityAnalyzer::new(llm)) as Arc<dyn PersonalityAnalyzer>);

        let generator: Arc<dyn CompatibilityGenerator> = match (config.compatibility_backend, llm) {
            (CompatibilityBackend::Llm, Some(llm)) => Arc::new(LlmCompatibilityGenerator::new(llm)),
            _ => Arc::new(HeuristicCompatibilityGenerator),
        };
        tracing::info!(backend = ?config.compatibility_backend, "compatibility generator selected");

        Ok(Self::from_parts(
            Arc::new(PgStore::new(pool)),
            generator,
            analyzer,
            config.jwt_secret.as_str(),
            timeout,
            Duration::from_secs(config.recommendation_cache_ttl_secs),
        ))
    }

    /// Wires the services over any store backend.
    pub fn from_parts<S>(
        store: Arc<S>,
        generator: Arc<dyn CompatibilityGenerator>,
        analyzer: Option<Arc<dyn PersonalityAnalyzer>>,
        jwt_secret: &str,
        collaborator_timeout: Duration,
        cache_ttl: Duration,
    ) -> Self
    where
        S: Store + 'static,
    {
        let recommendation_cache = Arc::new(RecommendationCache::new(cache_ttl));
        let evaluation_service = EvaluationService::new(
            store.clone(),
            store.clone(),
            analyzer,
            collaborator_timeout,
        );
        let recommendation_service = RecommendationService::new(
            store.clone(),
            store.clone(),
            store,
            generator,
            recommendation_cache.clone(),
            collaborator_timeout,
        );

        Self {
            jwt_secret: Arc::from(jwt_secret),
            evaluation_service,
            recommendation_service,
            recommendation_cache,
        }
    }
}
