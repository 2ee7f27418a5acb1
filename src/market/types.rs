//! Subgraph record types
//!
//! The subgraph returns all numeric fields as decimal strings; they are
//! kept as strings and converted only where arithmetic is needed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token contract address (lowercase hex)
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub decimals: String,
    #[serde(rename = "volumeUSD", default)]
    pub volume_usd: Option<String>,
    #[serde(rename = "totalValueLockedUSD", default)]
    pub total_value_locked_usd: Option<String>,
    #[serde(rename = "txCount", default)]
    pub tx_count: Option<String>,
}

impl TokenRecord {
    pub fn decimals_u8(&self) -> Option<u8> {
        self.decimals.parse().ok()
    }

    pub fn tvl_usd(&self) -> f64 {
        self.total_value_locked_usd
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolToken {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub decimals: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRecord {
    /// Pool contract address (lowercase hex)
    pub id: String,
    pub token0: PoolToken,
    pub token1: PoolToken,
    #[serde(rename = "feeTier", default)]
    pub fee_tier: Option<String>,
    #[serde(rename = "totalValueLockedUSD", default)]
    pub total_value_locked_usd: Option<String>,
    #[serde(rename = "volumeUSD", default)]
    pub volume_usd: Option<String>,
    #[serde(rename = "token0Price", default)]
    pub token0_price: Option<String>,
    #[serde(rename = "token1Price", default)]
    pub token1_price: Option<String>,
}

impl PoolRecord {
    pub fn tvl_usd(&self) -> f64 {
        self.total_value_locked_usd
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0)
    }

    pub fn pair_label(&self) -> String {
        format!("{}/{}", self.token0.symbol, self.token1.symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapPool {
    pub token0: PoolToken,
    pub token1: PoolToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRecord {
    pub id: String,
    pub timestamp: String,
    pub amount0: String,
    pub amount1: String,
    #[serde(rename = "amountUSD")]
    pub amount_usd: String,
    pub pool: SwapPool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDayData {
    pub date: u64,
    #[serde(rename = "tvlUSD", default)]
    pub tvl_usd: Option<String>,
    #[serde(rename = "volumeUSD", default)]
    pub volume_usd: Option<String>,
    #[serde(rename = "feesUSD", default)]
    pub fees_usd: Option<String>,
    #[serde(rename = "token0Price", default)]
    pub token0_price: Option<String>,
    #[serde(rename = "token1Price", default)]
    pub token1_price: Option<String>,
    #[serde(default)]
    pub high: Option<String>,
    #[serde(default)]
    pub low: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_record_parses_subgraph_shape() {
        let value = serde_json::json!({
            "id": "0xc0eecfa24e391e4259b7ef17be54be5139da1ac7",
            "symbol": "WMNT",
            "name": "Wrapped MNT",
            "decimals": "18",
            "volumeUSD": "1234.5",
            "totalValueLockedUSD": "100000.25",
            "txCount": "42"
        });
        let token: TokenRecord = serde_json::from_value(value).unwrap();
        assert_eq!(token.decimals_u8(), Some(18));
        assert!((token.tvl_usd() - 100_000.25).abs() < 1e-9);
    }

    #[test]
    fn swap_record_parses_nested_pool() {
        let value = serde_json::json!({
            "id": "0xabc-1",
            "timestamp": "1712345678",
            "amount0": "-1.5",
            "amount1": "3000",
            "amountUSD": "2998.5",
            "pool": {
                "token0": { "id": "0x1", "symbol": "WMNT" },
                "token1": { "id": "0x2", "symbol": "MUSDC" }
            }
        });
        let swap: SwapRecord = serde_json::from_value(value).unwrap();
        assert_eq!(swap.pool.token0.symbol, "WMNT");
        assert_eq!(swap.pool.token1.symbol, "MUSDC");
    }

    #[test]
    fn missing_optional_fields_default() {
        let value = serde_json::json!({
            "id": "0xpool",
            "token0": { "id": "0x1", "symbol": "WMNT" },
            "token1": { "id": "0x2", "symbol": "DAI" }
        });
        let pool: PoolRecord = serde_json::from_value(value).unwrap();
        assert_eq!(pool.tvl_usd(), 0.0);
        assert_eq!(pool.pair_label(), "WMNT/DAI");
    }
}
