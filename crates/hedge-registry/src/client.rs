//! REST client for the exchange.
//!
//! Thin `reqwest` wrapper implementing [`ExchangeApi`]. Every endpoint is
//! resolved against the configured base URL (which already carries the API
//! version prefix, e.g. `https://api.testnet.paradex.trade/v1`).

use std::time::Duration;

use hedge_core::{Bbo, Market};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::api::{
    decode_positions, AuthHeaders, AuthResponse, BalanceEntry, BboResponse, BoxFuture,
    ExchangeApi, OrderAck, OrderRequest, PositionEntry, Results, SystemConfig,
};
use crate::error::{RegistryError, RegistryResult};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the exchange REST API.
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Send a request and reject non-2xx responses.
    async fn send(&self, request: RequestBuilder) -> RegistryResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> RegistryResult<T> {
        response
            .json()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn get_public<T: DeserializeOwned>(&self, endpoint: &str) -> RegistryResult<T> {
        let response = self.send(self.client.get(self.url(endpoint))).await?;
        Self::decode(response).await
    }

    async fn get_authed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &str,
    ) -> RegistryResult<T> {
        let request = self.client.get(self.url(endpoint)).bearer_auth(token);
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}

impl ExchangeApi for RestClient {
    fn fetch_system_config(&self) -> BoxFuture<'_, RegistryResult<SystemConfig>> {
        Box::pin(async move {
            info!(url = %self.base_url, "Fetching system config");
            self.get_public("system/config").await
        })
    }

    fn authenticate(&self, headers: AuthHeaders) -> BoxFuture<'_, RegistryResult<String>> {
        Box::pin(async move {
            let mut request = self.client.post(self.url("auth"));
            for (name, value) in headers.to_pairs() {
                request = request.header(name, value);
            }
            let response = self.send(request).await?;
            let auth: AuthResponse = Self::decode(response).await?;
            Ok(auth.jwt_token)
        })
    }

    fn submit_order(
        &self,
        token: String,
        order: OrderRequest,
    ) -> BoxFuture<'_, RegistryResult<OrderAck>> {
        Box::pin(async move {
            debug!(market = %order.market, side = %order.side, size = %order.size, "POST orders");
            let request = self
                .client
                .post(self.url("orders"))
                .bearer_auth(&token)
                .json(&order);
            let response = self.send(request).await?;
            Self::decode(response).await
        })
    }

    fn cancel_all_orders(&self, token: String) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move {
            let request = self.client.delete(self.url("orders")).bearer_auth(&token);
            self.send(request).await?;
            Ok(())
        })
    }

    fn fetch_positions(&self, token: String) -> BoxFuture<'_, RegistryResult<Vec<PositionEntry>>> {
        Box::pin(async move {
            let body: Results<serde_json::Value> = self.get_authed("positions", &token).await?;
            Ok(decode_positions(body.results))
        })
    }

    fn fetch_balance(&self, token: String) -> BoxFuture<'_, RegistryResult<Vec<BalanceEntry>>> {
        Box::pin(async move {
            let body: Results<BalanceEntry> = self.get_authed("balance", &token).await?;
            Ok(body.results)
        })
    }

    fn fetch_bbo(&self, symbol: String) -> BoxFuture<'_, RegistryResult<Bbo>> {
        Box::pin(async move {
            let raw: BboResponse = self.get_public(&format!("bbo/{symbol}")).await?;
            Ok(raw.into())
        })
    }

    fn fetch_markets(&self) -> BoxFuture<'_, RegistryResult<Vec<Market>>> {
        Box::pin(async move {
            let body: Results<Market> = self.get_public("markets").await?;
            info!(count = body.results.len(), "Fetched markets");
            Ok(body.results)
        })
    }
}
