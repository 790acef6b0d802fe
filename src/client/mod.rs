use crate::domain::OrderUid;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod approve;
pub mod rate_limit;
pub mod serde_helpers;
pub mod types;

pub use approve::ApproveApiClient;
pub use rate_limit::{Quota, RateLimiter};
pub use types::{OrderStatusResponse, Quote, QuoteParams, RelayerRequest};

pub const DEFAULT_FUSION_URL: &str = "https://api.1inch.dev/fusion";

// ==================================================
// ERRORS
// ==================================================

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

// ==================================================
// RELAY API
// ==================================================

#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, RelayError>;

    async fn submit_order(&self, order: &RelayerRequest) -> Result<(), RelayError>;

    async fn get_order_status(&self, uid: &OrderUid) -> Result<OrderStatusResponse, RelayError>;
}

// ==================================================
// SHARED HTTP PLUMBING
// ==================================================

/// Bearer-authenticated JSON client for one API host. Every request waits
/// on the rate limiter under the host's key.
#[derive(Clone)]
pub(crate) struct ApiHttp {
    client: Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
    limit_key: String,
}

impl ApiHttp {
    pub(crate) fn new(
        base_url: &str,
        api_key: &str,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, RelayError> {
        let parsed = url::Url::parse(base_url).map_err(|e| RelayError::Endpoint(e.to_string()))?;
        let limit_key = parsed
            .host_str()
            .ok_or_else(|| RelayError::Endpoint(format!("{} has no host", base_url)))?
            .to_string();

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            limiter,
            limit_key,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Send and return the body text of a 2xx response.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<String, RelayError> {
        self.limiter.acquire(&self.limit_key).await;

        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RelayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RelayError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| RelayError::Decode(format!("{}: {}", e, body)))
    }
}

// ==================================================
// FUSION CLIENT
// ==================================================

#[derive(Clone)]
pub struct FusionClient {
    http: ApiHttp,
    chain_id: u64,
}

impl FusionClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        chain_id: u64,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, RelayError> {
        Ok(Self {
            http: ApiHttp::new(base_url, api_key, limiter)?,
            chain_id,
        })
    }
}

#[async_trait]
impl RelayApi for FusionClient {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, RelayError> {
        let path = format!("/quoter/v2.0/{}/quote/receive", self.chain_id);
        let mut quote: Quote = self
            .http
            .send_json(self.http.get(&path).query(params))
            .await?;

        debug!("📈 Quote response: {:?}", quote);
        quote.params = params.clone();
        Ok(quote)
    }

    async fn submit_order(&self, order: &RelayerRequest) -> Result<(), RelayError> {
        let path = format!("/relayer/v2.0/{}/order/submit", self.chain_id);
        self.http.send(self.http.post(&path).json(order)).await?;
        info!("📤 Order submitted to relayer");
        Ok(())
    }

    async fn get_order_status(&self, uid: &OrderUid) -> Result<OrderStatusResponse, RelayError> {
        let path = format!("/orders/v2.0/{}/order/status/{}", self.chain_id, uid);
        self.http.send_json(self.http.get(&path)).await
    }
}
