//! Configuration for the trading agent

pub mod contracts;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Completion service API key environment variable name
pub const COMPLETION_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Signer private key environment variable name
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Target network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "mantle-sepolia".to_string(),
            chain_id: 5003,
            rpc_url: "https://rpc.sepolia.mantle.xyz".to_string(),
        }
    }
}

/// Completion service (OpenAI-compatible chat endpoint) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub model: String,
    /// Sampling temperature for intent extraction. Kept at zero so the
    /// same message maps to the same intent.
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
            max_tokens: 300,
        }
    }
}

/// Gas policy for submitted transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Fixed gas limit. When unset, limits come from `eth_estimateGas`
    /// plus `buffer_percent`.
    #[serde(default)]
    pub gas_limit_override: Option<u64>,
    /// Headroom added on top of the node's estimate
    #[serde(default = "default_gas_buffer_percent")]
    pub buffer_percent: u64,
}

fn default_gas_buffer_percent() -> u64 {
    20
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            gas_limit_override: None,
            buffer_percent: default_gas_buffer_percent(),
        }
    }
}

impl GasConfig {
    /// Apply the buffer to a node-provided estimate.
    pub fn buffered(&self, estimate: u64) -> u64 {
        estimate + estimate * self.buffer_percent / 100
    }
}

/// Subgraph cache TTLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Live data (balances, prices, recent swaps)
    pub live_ttl_secs: u64,
    /// Historical data (day-bucketed pool metrics)
    pub historical_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            live_ttl_secs: 30,
            historical_ttl_secs: 300,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    /// FusionX V3 subgraph endpoint
    #[serde(default = "contracts::default_subgraph_url")]
    pub subgraph_url: String,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub gas: GasConfig,
    /// Default slippage tolerance in basis points
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps_default: u32,
    /// Swap deadline window in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            subgraph_url: contracts::default_subgraph_url(),
            completion: CompletionConfig::default(),
            gas: GasConfig::default(),
            slippage_bps_default: default_slippage_bps(),
            deadline_secs: default_deadline_secs(),
            cache: CacheConfig::default(),
        }
    }
}

fn default_slippage_bps() -> u32 {
    50
}

fn default_deadline_secs() -> u64 {
    1800
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path, e)))?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slippage_bps_default > 10_000 {
            return Err(Error::Config(format!(
                "slippage_bps_default {} exceeds 10000",
                self.slippage_bps_default
            )));
        }
        if self.deadline_secs == 0 {
            return Err(Error::Config("deadline_secs must be positive".to_string()));
        }
        url::Url::parse(&self.network.rpc_url)
            .map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;
        url::Url::parse(&self.subgraph_url)
            .map_err(|e| Error::Config(format!("Invalid subgraph URL: {}", e)))?;
        Ok(())
    }
}
