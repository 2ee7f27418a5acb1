//! Trade orchestration
//!
//! `TradeExecutor` is the single entrypoint for a user message: it routes
//! wallet questions to the reporter, extracts a trade intent for the rest,
//! and drives the wrap/unwrap/swap backends. It never returns an error;
//! every failure becomes a `TradeResult` with `success: false`.

pub mod approval;
pub mod price;
pub mod swap;
pub mod wrap;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::intent::{IntentSource, SwapIntent, TradeIntent};
use crate::market::MarketData;
use crate::query::answer_market_query;
use crate::Result;

/// Messages containing any of these route straight to the wallet summary,
/// skipping intent extraction.
const WALLET_KEYWORDS: &[&str] = &[
    "balance",
    "wallet",
    "holdings",
    "portfolio",
    "funds",
    "assets",
];

/// Outcome of processing one user message.
#[derive(Debug, Clone, Serialize)]
pub struct TradeResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    /// True when the result came from the mock-trade path rather than a
    /// real on-chain transaction.
    pub simulated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl TradeResult {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            transaction_hash: None,
            simulated: false,
            metadata: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            transaction_hash: None,
            simulated: false,
            metadata: None,
        }
    }
}

/// Confirmed (or simulated) swap.
#[derive(Debug, Clone)]
pub struct SwapReceipt {
    pub transaction_hash: String,
    pub simulated: bool,
}

#[async_trait]
pub trait SwapBackend: Send + Sync {
    /// Execute the swap on-chain. Fails fast on revert; the orchestrator
    /// decides whether to fall back to a mock.
    async fn swap(&self, intent: &SwapIntent) -> Result<SwapReceipt>;
    /// Simulated swap used when on-chain execution is unavailable.
    async fn mock_swap(&self, intent: &SwapIntent) -> Result<SwapReceipt>;
}

#[async_trait]
pub trait WrapBackend: Send + Sync {
    async fn wrap(&self, amount: &str) -> Result<String>;
    async fn unwrap(&self, amount: &str) -> Result<String>;
}

#[async_trait]
pub trait WalletReporter: Send + Sync {
    async fn summary(&self) -> Result<String>;
}

pub struct TradeExecutor {
    intents: Arc<dyn IntentSource>,
    market: Arc<dyn MarketData>,
    swaps: Arc<dyn SwapBackend>,
    wrapper: Arc<dyn WrapBackend>,
    reporter: Arc<dyn WalletReporter>,
    /// Fall back to a simulated swap when on-chain execution reverts or
    /// the RPC is unreachable.
    mock_fallback: bool,
}

impl TradeExecutor {
    pub fn new(
        intents: Arc<dyn IntentSource>,
        market: Arc<dyn MarketData>,
        swaps: Arc<dyn SwapBackend>,
        wrapper: Arc<dyn WrapBackend>,
        reporter: Arc<dyn WalletReporter>,
        mock_fallback: bool,
    ) -> Self {
        Self {
            intents,
            market,
            swaps,
            wrapper,
            reporter,
            mock_fallback,
        }
    }

    /// Process one user message end to end.
    pub async fn execute(&self, message: &str) -> TradeResult {
        match self.dispatch(message).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "trade execution failed");
                TradeResult::failure(format!("Trade failed: {}", e))
            }
        }
    }

    async fn dispatch(&self, message: &str) -> Result<TradeResult> {
        let normalized = message.trim().to_lowercase();

        if WALLET_KEYWORDS.iter().any(|kw| normalized.contains(kw)) {
            let summary = self.reporter.summary().await?;
            return Ok(TradeResult::info(summary));
        }

        let intent = self.intents.extract(message).await?;
        tracing::debug!(?intent, "extracted trade intent");

        match intent {
            TradeIntent::Wrap {
                amount: Some(amount),
            } => {
                let hash = self.wrapper.wrap(&amount).await?;
                Ok(TradeResult {
                    success: true,
                    message: format!("Successfully wrapped {} MNT to WMNT!", amount),
                    transaction_hash: Some(hash),
                    simulated: false,
                    metadata: None,
                })
            }
            TradeIntent::Unwrap {
                amount: Some(amount),
            } => {
                let hash = self.wrapper.unwrap(&amount).await?;
                Ok(TradeResult {
                    success: true,
                    message: format!("Successfully unwrapped {} WMNT to MNT!", amount),
                    transaction_hash: Some(hash),
                    simulated: false,
                    metadata: None,
                })
            }
            TradeIntent::Wrap { amount: None } | TradeIntent::Unwrap { amount: None } => {
                Ok(TradeResult::failure(
                    "Trade failed: amount not specified. Try 'wrap 0.1 MNT' or 'unwrap 0.1 WMNT'",
                ))
            }
            TradeIntent::Buy(swap) | TradeIntent::Sell(swap) => {
                self.execute_swap_intent(swap).await
            }
            TradeIntent::None => {
                let answer = answer_market_query(self.market.as_ref(), message).await?;
                Ok(TradeResult::info(answer))
            }
        }
    }

    async fn execute_swap_intent(&self, intent: SwapIntent) -> Result<TradeResult> {
        // Pool existence gates everything; nothing is submitted without one.
        let pool = self
            .market
            .find_pool(&intent.token_in, &intent.token_out)
            .await?;
        let Some(pool) = pool else {
            return Ok(TradeResult::failure(
                "No liquidity pool exists for the provided token pair.",
            ));
        };

        let metadata = serde_json::json!({
            "pool": pool.id,
            "token0Price": pool.token0_price,
            "token1Price": pool.token1_price,
        });

        let receipt = match self.swaps.swap(&intent).await {
            Ok(receipt) => receipt,
            Err(e) if self.mock_fallback && e.is_retryable_as_mock() => {
                tracing::warn!(error = %e, "on-chain swap failed, falling back to mock trade");
                self.swaps.mock_swap(&intent).await?
            }
            Err(e) => return Err(e),
        };

        let suffix = if receipt.simulated { " (simulated)" } else { "" };
        Ok(TradeResult {
            success: true,
            message: format!(
                "Successfully swapped {} {} for {}!{}",
                intent.amount, intent.token_in, intent.token_out, suffix
            ),
            transaction_hash: Some(receipt.transaction_hash),
            simulated: receipt.simulated,
            metadata: Some(metadata),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{PoolDayData, PoolRecord, SwapRecord, TokenRecord};
    use crate::{Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedIntent {
        intent: TradeIntent,
        calls: AtomicUsize,
    }

    impl FixedIntent {
        fn new(intent: TradeIntent) -> Arc<Self> {
            Arc::new(Self {
                intent,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IntentSource for FixedIntent {
        async fn extract(&self, _message: &str) -> Result<TradeIntent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.intent.clone())
        }
    }

    #[derive(Default)]
    struct StubMarket {
        pools: Vec<PoolRecord>,
        pool_queries: AtomicUsize,
    }

    #[async_trait]
    impl MarketData for StubMarket {
        async fn tokens(&self) -> Result<Vec<TokenRecord>> {
            Ok(Vec::new())
        }
        async fn top_pools(&self, _limit: u32) -> Result<Vec<PoolRecord>> {
            Ok(self.pools.clone())
        }
        async fn recent_swaps(&self, _limit: u32) -> Result<Vec<SwapRecord>> {
            Ok(Vec::new())
        }
        async fn find_pool(&self, a: &str, b: &str) -> Result<Option<PoolRecord>> {
            self.pool_queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .pools
                .iter()
                .find(|p| crate::market::pool_matches(p, a, b))
                .cloned())
        }
        async fn pool_metrics(&self, _pool_id: &str, _days: u64) -> Result<Vec<PoolDayData>> {
            Ok(Vec::new())
        }
    }

    struct StubSwaps {
        fail_swap: bool,
        swap_calls: AtomicUsize,
        mock_calls: AtomicUsize,
    }

    impl StubSwaps {
        fn new(fail_swap: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_swap,
                swap_calls: AtomicUsize::new(0),
                mock_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SwapBackend for StubSwaps {
        async fn swap(&self, _intent: &SwapIntent) -> Result<SwapReceipt> {
            self.swap_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_swap {
                return Err(Error::ContractRevert {
                    message: "Swap execution failed".to_string(),
                    reason: Some("SPL".to_string()),
                    data: None,
                });
            }
            Ok(SwapReceipt {
                transaction_hash: "0xswap".to_string(),
                simulated: false,
            })
        }

        async fn mock_swap(&self, _intent: &SwapIntent) -> Result<SwapReceipt> {
            self.mock_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SwapReceipt {
                transaction_hash: "0xmock".to_string(),
                simulated: true,
            })
        }
    }

    struct StubWrapper {
        fail_unwrap: bool,
        wrap_calls: AtomicUsize,
    }

    impl StubWrapper {
        fn new(fail_unwrap: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_unwrap,
                wrap_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl WrapBackend for StubWrapper {
        async fn wrap(&self, _amount: &str) -> Result<String> {
            self.wrap_calls.fetch_add(1, Ordering::SeqCst);
            Ok("0xwrap".to_string())
        }

        async fn unwrap(&self, _amount: &str) -> Result<String> {
            if self.fail_unwrap {
                return Err(Error::ContractRevert {
                    message: "unwrap transaction reverted".to_string(),
                    reason: None,
                    data: None,
                });
            }
            Ok("0xunwrap".to_string())
        }
    }

    struct StubReporter {
        calls: AtomicUsize,
    }

    impl StubReporter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl WalletReporter for StubReporter {
        async fn summary(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Agent wallet: 0xf39f... | 10 MNT".to_string())
        }
    }

    fn wmnt_musdc_pool() -> PoolRecord {
        serde_json::from_value(serde_json::json!({
            "id": "0xpool",
            "token0": { "id": "0xaaa", "symbol": "WMNT" },
            "token1": { "id": "0xbbb", "symbol": "MUSDC" },
            "token0Price": "1.0",
            "token1Price": "1.0"
        }))
        .unwrap()
    }

    fn executor(
        intents: Arc<FixedIntent>,
        market: Arc<StubMarket>,
        swaps: Arc<StubSwaps>,
        wrapper: Arc<StubWrapper>,
        reporter: Arc<StubReporter>,
        mock_fallback: bool,
    ) -> TradeExecutor {
        TradeExecutor::new(intents, market, swaps, wrapper, reporter, mock_fallback)
    }

    fn swap_intent() -> SwapIntent {
        SwapIntent {
            token_in: "WMNT".to_string(),
            token_out: "MUSDC".to_string(),
            amount: "1".to_string(),
            slippage_bps: 50,
        }
    }

    #[tokio::test]
    async fn wrap_happy_path() {
        let wrapper = StubWrapper::new(false);
        let exec = executor(
            FixedIntent::new(TradeIntent::Wrap {
                amount: Some("0.1".to_string()),
            }),
            Arc::new(StubMarket::default()),
            StubSwaps::new(false),
            wrapper.clone(),
            StubReporter::new(),
            false,
        );

        let result = exec.execute("wrap 0.1 MNT").await;
        assert!(result.success);
        assert_eq!(result.message, "Successfully wrapped 0.1 MNT to WMNT!");
        assert_eq!(result.transaction_hash.as_deref(), Some("0xwrap"));
        assert!(!result.simulated);
        assert_eq!(wrapper.wrap_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unwrap_revert_surfaces_as_failure() {
        let exec = executor(
            FixedIntent::new(TradeIntent::Unwrap {
                amount: Some("1".to_string()),
            }),
            Arc::new(StubMarket::default()),
            StubSwaps::new(false),
            StubWrapper::new(true),
            StubReporter::new(),
            false,
        );

        let result = exec.execute("unwrap 1 WMNT").await;
        assert!(!result.success);
        assert!(result.message.starts_with("Trade failed:"));
        assert!(result.message.contains("unwrap transaction reverted"));
        assert!(result.transaction_hash.is_none());
    }

    #[tokio::test]
    async fn missing_amount_fails_without_submission() {
        let wrapper = StubWrapper::new(false);
        let exec = executor(
            FixedIntent::new(TradeIntent::Wrap { amount: None }),
            Arc::new(StubMarket::default()),
            StubSwaps::new(false),
            wrapper.clone(),
            StubReporter::new(),
            false,
        );

        let result = exec.execute("wrap some MNT").await;
        assert!(!result.success);
        assert!(result.message.contains("amount not specified"));
        assert_eq!(wrapper.wrap_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_pool_submits_nothing() {
        let swaps = StubSwaps::new(false);
        let exec = executor(
            FixedIntent::new(TradeIntent::Buy(SwapIntent {
                token_out: "DAI".to_string(),
                ..swap_intent()
            })),
            Arc::new(StubMarket {
                pools: vec![wmnt_musdc_pool()],
                ..Default::default()
            }),
            swaps.clone(),
            StubWrapper::new(false),
            StubReporter::new(),
            true,
        );

        let result = exec.execute("buy DAI with WMNT").await;
        assert!(!result.success);
        assert_eq!(
            result.message,
            "No liquidity pool exists for the provided token pair."
        );
        assert_eq!(swaps.swap_calls.load(Ordering::SeqCst), 0);
        assert_eq!(swaps.mock_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn info_query_bypasses_trade_paths() {
        let swaps = StubSwaps::new(false);
        let wrapper = StubWrapper::new(false);
        let exec = executor(
            FixedIntent::new(TradeIntent::None),
            Arc::new(StubMarket {
                pools: vec![wmnt_musdc_pool()],
                ..Default::default()
            }),
            swaps.clone(),
            wrapper.clone(),
            StubReporter::new(),
            false,
        );

        let result = exec.execute("show me the top pools").await;
        assert!(result.success);
        assert!(result.message.contains("WMNT/MUSDC"));
        assert_eq!(swaps.swap_calls.load(Ordering::SeqCst), 0);
        assert_eq!(wrapper.wrap_calls.load(Ordering::SeqCst), 0);
        assert!(result.transaction_hash.is_none());
    }

    #[tokio::test]
    async fn router_revert_falls_back_to_mock() {
        let swaps = StubSwaps::new(true);
        let exec = executor(
            FixedIntent::new(TradeIntent::Sell(swap_intent())),
            Arc::new(StubMarket {
                pools: vec![wmnt_musdc_pool()],
                ..Default::default()
            }),
            swaps.clone(),
            StubWrapper::new(false),
            StubReporter::new(),
            true,
        );

        let result = exec.execute("sell 1 WMNT for MUSDC").await;
        assert!(result.success);
        assert!(result.simulated);
        assert!(result.message.ends_with("(simulated)"));
        assert_eq!(result.transaction_hash.as_deref(), Some("0xmock"));
        assert_eq!(swaps.swap_calls.load(Ordering::SeqCst), 1);
        assert_eq!(swaps.mock_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn revert_without_fallback_is_a_failure() {
        let swaps = StubSwaps::new(true);
        let exec = executor(
            FixedIntent::new(TradeIntent::Sell(swap_intent())),
            Arc::new(StubMarket {
                pools: vec![wmnt_musdc_pool()],
                ..Default::default()
            }),
            swaps.clone(),
            StubWrapper::new(false),
            StubReporter::new(),
            false,
        );

        let result = exec.execute("sell 1 WMNT for MUSDC").await;
        assert!(!result.success);
        assert!(result.message.starts_with("Trade failed:"));
        assert_eq!(swaps.mock_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wallet_keywords_skip_intent_extraction() {
        let intents = FixedIntent::new(TradeIntent::None);
        let reporter = StubReporter::new();
        let exec = executor(
            intents.clone(),
            Arc::new(StubMarket::default()),
            StubSwaps::new(false),
            StubWrapper::new(false),
            reporter.clone(),
            false,
        );

        let result = exec.execute("what is my wallet balance?").await;
        assert!(result.success);
        assert!(result.message.contains("Agent wallet"));
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(intents.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn swap_result_carries_pool_metadata() {
        let exec = executor(
            FixedIntent::new(TradeIntent::Buy(swap_intent())),
            Arc::new(StubMarket {
                pools: vec![wmnt_musdc_pool()],
                ..Default::default()
            }),
            StubSwaps::new(false),
            StubWrapper::new(false),
            StubReporter::new(),
            false,
        );

        let result = exec.execute("buy MUSDC with 1 WMNT").await;
        assert!(result.success);
        let metadata = result.metadata.expect("metadata");
        assert_eq!(metadata["pool"], "0xpool");
        assert_eq!(metadata["token0Price"], "1.0");
    }
}
