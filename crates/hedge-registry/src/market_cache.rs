//! Market metadata cache.
//!
//! Markets are fetched once per run on first use and are read-only afterwards.
//! A failed fetch leaves the cache empty so the next lookup retries.

use std::collections::HashMap;

use hedge_core::{Market, Size};
use tracing::info;

use crate::api::ExchangeApi;
use crate::error::{RegistryError, RegistryResult};

#[derive(Debug, Default)]
pub struct MarketCache {
    markets: Option<HashMap<String, Market>>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.markets.is_some()
    }

    /// Fetch the market list unless it is already cached.
    pub async fn load(&mut self, api: &dyn ExchangeApi) -> RegistryResult<()> {
        if self.markets.is_some() {
            return Ok(());
        }
        let markets = api.fetch_markets().await?;
        info!(count = markets.len(), "Market cache loaded");
        self.markets = Some(
            markets
                .into_iter()
                .map(|m| (m.symbol.clone(), m))
                .collect(),
        );
        Ok(())
    }

    /// Look up a market, loading the cache on first use.
    ///
    /// # Errors
    /// `MarketNotFound` when the exchange does not list `symbol`.
    pub async fn get(&mut self, api: &dyn ExchangeApi, symbol: &str) -> RegistryResult<&Market> {
        self.load(api).await?;
        self.markets
            .as_ref()
            .and_then(|markets| markets.get(symbol))
            .ok_or_else(|| RegistryError::MarketNotFound(symbol.to_string()))
    }

    pub async fn size_increment(
        &mut self,
        api: &dyn ExchangeApi,
        symbol: &str,
    ) -> RegistryResult<Size> {
        Ok(self.get(api, symbol).await?.order_size_increment)
    }
}
