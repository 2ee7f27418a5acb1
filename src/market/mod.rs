//! Market data gateway
//!
//! Queries the FusionX V3 subgraph over GraphQL and memoizes results in a
//! TTL cache. Live views (tokens, pools, swaps) use a short TTL; the
//! day-bucketed pool metrics use a longer one.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::TtlCache;
use crate::config::CacheConfig;
use crate::{Error, Result};

pub use types::{PoolDayData, PoolRecord, PoolToken, SwapRecord, TokenRecord};

/// Read-only market data the rest of the agent consumes.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn tokens(&self) -> Result<Vec<TokenRecord>>;
    async fn top_pools(&self, limit: u32) -> Result<Vec<PoolRecord>>;
    async fn recent_swaps(&self, limit: u32) -> Result<Vec<SwapRecord>>;
    /// Find the pool for a token pair, matching by address or symbol in
    /// either order.
    async fn find_pool(&self, token_a: &str, token_b: &str) -> Result<Option<PoolRecord>>;
    async fn pool_metrics(&self, pool_id: &str, days: u64) -> Result<Vec<PoolDayData>>;
}

#[async_trait]
impl<M: MarketData + ?Sized> MarketData for std::sync::Arc<M> {
    async fn tokens(&self) -> Result<Vec<TokenRecord>> {
        (**self).tokens().await
    }
    async fn top_pools(&self, limit: u32) -> Result<Vec<PoolRecord>> {
        (**self).top_pools(limit).await
    }
    async fn recent_swaps(&self, limit: u32) -> Result<Vec<SwapRecord>> {
        (**self).recent_swaps(limit).await
    }
    async fn find_pool(&self, token_a: &str, token_b: &str) -> Result<Option<PoolRecord>> {
        (**self).find_pool(token_a, token_b).await
    }
    async fn pool_metrics(&self, pool_id: &str, days: u64) -> Result<Vec<PoolDayData>> {
        (**self).pool_metrics(pool_id, days).await
    }
}

#[derive(Deserialize)]
struct GraphQLResponse {
    data: Option<Value>,
    errors: Option<Vec<Value>>,
}

/// Subgraph-backed implementation of [`MarketData`].
pub struct MarketDataGateway {
    client: Client,
    endpoint: String,
    cache: TtlCache<Value>,
    live_ttl: Duration,
    historical_ttl: Duration,
}

impl MarketDataGateway {
    pub fn new(endpoint: String, cache_config: &CacheConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            cache: TtlCache::new(),
            live_ttl: Duration::from_secs(cache_config.live_ttl_secs),
            historical_ttl: Duration::from_secs(cache_config.historical_ttl_secs),
        }
    }

    async fn query_subgraph(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "query": query,
                "variables": variables
            }))
            .send()
            .await?;

        let result: GraphQLResponse = response
            .json()
            .await
            .map_err(|e| Error::Subgraph(format!("Failed to parse GraphQL response: {}", e)))?;

        if let Some(errors) = result.errors {
            return Err(Error::Subgraph(format!("GraphQL errors: {:?}", errors)));
        }

        result
            .data
            .ok_or_else(|| Error::Subgraph("No data in GraphQL response".to_string()))
    }

    /// Run a query through the cache, keyed by query signature.
    async fn cached_query(
        &self,
        cache_key: &str,
        query: &str,
        variables: Value,
        ttl: Duration,
    ) -> Result<Value> {
        if let Some(cached) = self.cache.get(cache_key).await {
            tracing::debug!(key = cache_key, "subgraph cache hit");
            return Ok(cached);
        }

        let data = self.query_subgraph(query, variables).await?;
        self.cache.set(cache_key, data.clone(), ttl).await;
        Ok(data)
    }

    async fn token_pairs(&self) -> Result<Vec<PoolRecord>> {
        let query = r#"
            query TokenPairs($first: Int!) {
                pools(
                    first: $first
                    orderBy: totalValueLockedUSD
                    orderDirection: desc
                ) {
                    id
                    token0 { id symbol decimals }
                    token1 { id symbol decimals }
                    totalValueLockedUSD
                    volumeUSD
                    token0Price
                    token1Price
                }
            }
        "#;

        let data = self
            .cached_query("token_pairs", query, json!({ "first": 100 }), self.live_ttl)
            .await?;
        parse_list(&data, "pools")
    }
}

#[async_trait]
impl MarketData for MarketDataGateway {
    async fn tokens(&self) -> Result<Vec<TokenRecord>> {
        let query = r#"
            query Tokens($first: Int!) {
                tokens(
                    first: $first
                    orderBy: totalValueLockedUSD
                    orderDirection: desc
                    where: { totalValueLockedUSD_gt: "0" }
                ) {
                    id
                    symbol
                    name
                    decimals
                    volumeUSD
                    totalValueLockedUSD
                    txCount
                }
            }
        "#;

        let data = self
            .cached_query("tokens", query, json!({ "first": 10 }), self.live_ttl)
            .await?;
        parse_list(&data, "tokens")
    }

    async fn top_pools(&self, limit: u32) -> Result<Vec<PoolRecord>> {
        let query = r#"
            query TopPools($first: Int!) {
                pools(
                    first: $first
                    orderBy: totalValueLockedUSD
                    orderDirection: desc
                    where: { totalValueLockedUSD_gt: "0" }
                ) {
                    id
                    token0 { id symbol decimals }
                    token1 { id symbol decimals }
                    feeTier
                    totalValueLockedUSD
                    token0Price
                    token1Price
                }
            }
        "#;

        let cache_key = format!("top_pools:{}", limit);
        let data = self
            .cached_query(&cache_key, query, json!({ "first": limit }), self.live_ttl)
            .await?;
        parse_list(&data, "pools")
    }

    async fn recent_swaps(&self, limit: u32) -> Result<Vec<SwapRecord>> {
        let query = r#"
            query RecentSwaps($first: Int!) {
                swaps(
                    first: $first
                    orderBy: timestamp
                    orderDirection: desc
                    where: { amountUSD_gt: "0" }
                ) {
                    id
                    timestamp
                    amount0
                    amount1
                    amountUSD
                    pool {
                        token0 { id symbol }
                        token1 { id symbol }
                    }
                }
            }
        "#;

        let cache_key = format!("recent_swaps:{}", limit);
        let data = self
            .cached_query(&cache_key, query, json!({ "first": limit }), self.live_ttl)
            .await?;
        parse_list(&data, "swaps")
    }

    async fn find_pool(&self, token_a: &str, token_b: &str) -> Result<Option<PoolRecord>> {
        let pools = self.token_pairs().await?;
        Ok(pools
            .into_iter()
            .find(|pool| pool_matches(pool, token_a, token_b)))
    }

    async fn pool_metrics(&self, pool_id: &str, days: u64) -> Result<Vec<PoolDayData>> {
        let query = r#"
            query PoolMetrics($poolId: ID!, $timestamp: Int!) {
                pool(id: $poolId) {
                    poolDayData(
                        where: { date_gt: $timestamp }
                        orderBy: date
                        orderDirection: asc
                    ) {
                        date
                        tvlUSD
                        volumeUSD
                        feesUSD
                        token0Price
                        token1Price
                        high
                        low
                        close
                    }
                }
            }
        "#;

        let since = chrono::Utc::now().timestamp() - (days as i64) * 86_400;
        let cache_key = format!("pool_metrics:{}:{}", pool_id, days);
        let data = self
            .cached_query(
                &cache_key,
                query,
                json!({ "poolId": pool_id, "timestamp": since }),
                self.historical_ttl,
            )
            .await?;

        match data.get("pool").and_then(|p| p.get("poolDayData")) {
            Some(value) => serde_json::from_value(value.clone()).map_err(Error::from),
            None => Ok(Vec::new()),
        }
    }
}

fn parse_list<T: serde::de::DeserializeOwned>(data: &Value, field: &str) -> Result<Vec<T>> {
    match data.get(field) {
        Some(value) => serde_json::from_value(value.clone()).map_err(Error::from),
        None => Ok(Vec::new()),
    }
}

/// Match a pool against a token pair. Each side may be an address or a
/// symbol; order does not matter and comparison ignores case.
pub fn pool_matches(pool: &PoolRecord, token_a: &str, token_b: &str) -> bool {
    let a = token_a.to_lowercase();
    let b = token_b.to_lowercase();

    let side_matches = |token: &PoolToken, needle: &str| {
        token.id.to_lowercase() == needle || token.symbol.to_lowercase() == needle
    };

    (side_matches(&pool.token0, &a) && side_matches(&pool.token1, &b))
        || (side_matches(&pool.token0, &b) && side_matches(&pool.token1, &a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> PoolRecord {
        serde_json::from_value(serde_json::json!({
            "id": "0xpool",
            "token0": {
                "id": "0xc0eecfa24e391e4259b7ef17be54be5139da1ac7",
                "symbol": "WMNT"
            },
            "token1": {
                "id": "0xea911b76c5681fd2a46cf951b320c7e39186f3f0",
                "symbol": "MUSDC"
            }
        }))
        .unwrap()
    }

    #[test]
    fn pool_matches_by_symbol_either_order() {
        let pool = sample_pool();
        assert!(pool_matches(&pool, "WMNT", "MUSDC"));
        assert!(pool_matches(&pool, "MUSDC", "WMNT"));
    }

    #[test]
    fn pool_matches_by_address_case_insensitive() {
        let pool = sample_pool();
        assert!(pool_matches(
            &pool,
            "0xC0eeCFA24E391E4259B7EF17be54Be5139DA1AC7",
            "0xea911b76c5681fd2a46cf951b320c7e39186f3f0"
        ));
    }

    #[test]
    fn pool_matches_mixed_symbol_and_address() {
        let pool = sample_pool();
        assert!(pool_matches(
            &pool,
            "wmnt",
            "0xEA911B76C5681FD2A46CF951B320C7E39186F3F0"
        ));
    }

    #[test]
    fn pool_rejects_wrong_pair() {
        let pool = sample_pool();
        assert!(!pool_matches(&pool, "WMNT", "DAI"));
        // Both sides matching the same token is not a pair match.
        assert!(!pool_matches(&pool, "WMNT", "WMNT"));
    }
}
