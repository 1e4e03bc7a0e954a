/// Shaped ranking API client
///
/// API Flow:
/// 1. Ranking: POST /models/{model_id}/rank → `{ids, scores?}`
/// 2. Status: GET /models/{model_id} → `{status}` (cached briefly)
/// 3. Interactions: POST /datasets/{dataset_id}/interactions
///
/// Every request carries the API key in the `x-api-key` header.
use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Interaction, ModelInfo, ModelStatus, RankRequest, RankResponse, ScoredId},
    services::providers::{InteractionSink, RankingProvider},
};

const STATUS_CACHE_TTL: u64 = 30;
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct ShapedClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model_id: String,
    dataset_id: String,
    /// Status cache; `None` queries the provider every time
    cache: Option<Cache>,
}

impl ShapedClient {
    /// Creates a client from configuration
    pub fn new(config: &Config, cache: Option<Cache>) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.ranking_timeout())
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.ranking_api_key.clone(),
            api_url: config.ranking_api_url.trim_end_matches('/').to_string(),
            model_id: config.ranking_model_id.clone(),
            dataset_id: config.ranking_dataset_id.clone(),
            cache,
        })
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn require_api_key(&self) -> AppResult<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(AppError::ExternalApi(
                "Ranking API key is not configured".to_string(),
            ))
        }
    }

    /// Turns a non-success response into an `ExternalApi` error
    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::ExternalApi(format!(
            "Ranking API returned status {}: {}",
            status, body
        )))
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> AppResult<reqwest::Response> {
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        Self::check_status(response).await
    }

    async fn fetch_model_status(&self) -> AppResult<ModelStatus> {
        let url = format!("{}/models/{}", self.api_url, self.model_id);

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let info: ModelInfo = Self::check_status(response).await?.json().await?;

        tracing::debug!(model_id = %self.model_id, status = ?info.status, "Fetched model info");
        Ok(ModelStatus::from(&info))
    }

    async fn cached_model_status(&self, cache: &Cache) -> AppResult<ModelStatus> {
        cached!(
            cache,
            CacheKey::ModelStatus(self.model_id.clone()),
            Some(STATUS_CACHE_TTL),
            self.fetch_model_status()
        )
    }
}

#[async_trait::async_trait]
impl RankingProvider for ShapedClient {
    async fn rank(&self, user_id: &str, limit: usize) -> AppResult<Vec<ScoredId>> {
        if user_id.trim().is_empty() {
            return Err(AppError::InvalidInput("user_id cannot be empty".to_string()));
        }
        self.require_api_key()?;

        let url = format!("{}/models/{}/rank", self.api_url, self.model_id);
        let response = self.post_json(&url, &RankRequest { user_id, limit }).await?;
        let ranking: RankResponse = response.json().await?;
        let scored = ranking.into_scored_ids();

        tracing::info!(
            user_id = %user_id,
            limit,
            result_count = scored.len(),
            "Fetched ranking from provider"
        );

        Ok(scored)
    }

    async fn model_status(&self) -> ModelStatus {
        if !self.is_configured() {
            return ModelStatus::NotSetup;
        }

        let result = match &self.cache {
            Some(cache) => self.cached_model_status(cache).await,
            None => self.fetch_model_status().await,
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, model_id = %self.model_id, "Model status check failed");
            ModelStatus::Error
        })
    }

    fn name(&self) -> &'static str {
        "shaped"
    }
}

#[async_trait::async_trait]
impl InteractionSink for ShapedClient {
    async fn send_interaction(&self, interaction: &Interaction) -> AppResult<()> {
        self.require_api_key()?;
        if self.dataset_id.trim().is_empty() {
            return Err(AppError::ExternalApi(
                "Interaction dataset is not configured".to_string(),
            ));
        }

        let url = format!("{}/datasets/{}/interactions", self.api_url, self.dataset_id);
        self.post_json(&url, interaction).await?;

        tracing::info!(
            user_id = %interaction.user_id,
            item_id = %interaction.item_id,
            rating = u8::from(interaction.rating),
            "Sent interaction to provider"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_url: &str, api_key: &str) -> Config {
        let mut config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        config.ranking_api_url = api_url.to_string();
        config.ranking_api_key = api_key.to_string();
        config.ranking_model_id = "movies".to_string();
        config.ranking_dataset_id = "interactions_ds".to_string();
        config
    }

    fn test_client(server: &MockServer) -> ShapedClient {
        ShapedClient::new(&test_config(&server.uri(), "test_key"), None).unwrap()
    }

    #[tokio::test]
    async fn test_rank_parses_ids_and_scores() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/movies/rank"))
            .and(header("x-api-key", "test_key"))
            .and(body_json(serde_json::json!({ "user_id": "u1", "limit": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ids": ["50", "181"],
                "scores": [0.91, 0.42]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let scored = test_client(&server).rank("u1", 2).await.unwrap();

        assert_eq!(
            scored,
            vec![
                ScoredId { item_id: ItemId(50), score: Some(0.91) },
                ScoredId { item_id: ItemId(181), score: Some(0.42) },
            ]
        );
    }

    #[tokio::test]
    async fn test_rank_without_scores_uses_uniform_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/movies/rank"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ids": ["3", "1"] })),
            )
            .mount(&server)
            .await;

        let scored = test_client(&server).rank("u1", 20).await.unwrap();

        assert_eq!(scored.iter().map(|s| s.item_id.0).collect::<Vec<_>>(), vec![3, 1]);
        assert!(scored.iter().all(|s| s.score == Some(1.0)));
    }

    #[tokio::test]
    async fn test_rank_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let result = test_client(&server).rank("u1", 20).await;
        assert!(matches!(result, Err(AppError::ExternalApi(msg)) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_rank_requires_api_key() {
        let client = ShapedClient::new(&test_config("http://127.0.0.1:9", ""), None).unwrap();
        assert_err!(client.rank("u1", 20).await);
        assert_err!(client.rank("  ", 20).await);
    }

    #[tokio::test]
    async fn test_model_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models/movies"))
            .and(header("x-api-key", "test_key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "TRAINING" })),
            )
            .mount(&server)
            .await;

        assert_eq!(test_client(&server).model_status().await, ModelStatus::Training);
    }

    #[tokio::test]
    async fn test_model_status_failure_reports_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert_eq!(test_client(&server).model_status().await, ModelStatus::Error);
    }

    #[tokio::test]
    async fn test_model_status_not_setup_without_key() {
        let client = ShapedClient::new(&test_config("http://127.0.0.1:9", ""), None).unwrap();
        assert_eq!(client.model_status().await, ModelStatus::NotSetup);
    }

    #[tokio::test]
    async fn test_model_status_survives_unreachable_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models/movies"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ACTIVE" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let redis_client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let (cache, _handle) = Cache::new(redis_client);
        let client =
            ShapedClient::new(&test_config(&server.uri(), "test_key"), Some(cache)).unwrap();

        assert_eq!(client.model_status().await, ModelStatus::Ready);
    }

    #[tokio::test]
    async fn test_send_interaction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/datasets/interactions_ds/interactions"))
            .and(header("x-api-key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let interaction = Interaction::new("u1", ItemId(50), true);
        assert_ok!(test_client(&server).send_interaction(&interaction).await);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["item_id"], "50");
        assert_eq!(body["rating"], 5);
    }

    #[tokio::test]
    async fn test_send_interaction_requires_dataset() {
        let server = MockServer::start().await;
        let mut config = test_config(&server.uri(), "test_key");
        config.ranking_dataset_id = String::new();
        let client = ShapedClient::new(&config, None).unwrap();

        let result = client
            .send_interaction(&Interaction::new("u1", ItemId(1), false))
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }
}
