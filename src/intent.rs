//! Trade intent extraction
//!
//! Turns a free-text user message into a typed [`TradeIntent`] via the
//! completion service. The completion is untrusted text: anything that
//! does not validate into a well-formed intent collapses to
//! [`TradeIntent::None`] rather than an error.

use async_trait::async_trait;
use serde::Deserialize;

use crate::llm::{ChatMessage, CompletionClient};
use crate::market::MarketData;
use crate::Result;

/// Swap details shared by buy and sell intents.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapIntent {
    pub token_in: String,
    pub token_out: String,
    pub amount: String,
    /// Slippage tolerance in basis points
    pub slippage_bps: u32,
}

/// A validated trading intent.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeIntent {
    /// Wrap native MNT into WMNT. Amount may be missing from the
    /// message; the executor reports that case.
    Wrap { amount: Option<String> },
    /// Unwrap WMNT back to native MNT.
    Unwrap { amount: Option<String> },
    Buy(SwapIntent),
    Sell(SwapIntent),
    /// Not a trade instruction.
    None,
}

/// Source of trade intents, mockable for orchestrator tests.
#[async_trait]
pub trait IntentSource: Send + Sync {
    async fn extract(&self, message: &str) -> Result<TradeIntent>;
}

const EXTRACTION_PROMPT: &str = r#"You are a DeFi trading assistant on Mantle Network. Extract the trade intent from the user's message. Return JSON only, in exactly one of these formats:
For wrap: {"kind":"wrap","amount":"X"} where X is the amount to wrap
For unwrap: {"kind":"unwrap","amount":"X"} where X is the amount to unwrap
For buy: {"kind":"buy","token_in":"TOKEN1","token_out":"TOKEN2","amount":"X","slippage_bps":50}
For sell: {"kind":"sell","token_in":"TOKEN1","token_out":"TOKEN2","amount":"X","slippage_bps":50}
For anything that is not a trade: {"kind":"none"}
Do not add commentary outside the JSON object."#;

/// Completion-backed [`IntentSource`].
pub struct LlmIntentParser<M> {
    completions: CompletionClient,
    market: M,
    /// Prepend a market snapshot system message when true. Extraction
    /// still proceeds without it if market reads fail.
    include_market_context: bool,
    default_slippage_bps: u32,
}

impl<M: MarketData> LlmIntentParser<M> {
    pub fn new(completions: CompletionClient, market: M, default_slippage_bps: u32) -> Self {
        Self {
            completions,
            market,
            include_market_context: true,
            default_slippage_bps,
        }
    }

    pub fn without_market_context(mut self) -> Self {
        self.include_market_context = false;
        self
    }

    async fn market_snapshot(&self) -> Result<String> {
        let (tokens, pools, swaps) = futures::try_join!(
            self.market.tokens(),
            self.market.top_pools(5),
            self.market.recent_swaps(5)
        )?;

        let total_tvl: f64 = pools.iter().map(|p| p.tvl_usd()).sum();
        let token_list = tokens
            .iter()
            .map(|t| format!("{} (TVL: ${:.0})", t.symbol, t.tvl_usd()))
            .collect::<Vec<_>>()
            .join(", ");
        let pool_list = pools
            .iter()
            .map(|p| format!("{} (${:.0})", p.pair_label(), p.tvl_usd()))
            .collect::<Vec<_>>()
            .join(", ");
        let swap_list = swaps
            .iter()
            .map(|s| {
                format!(
                    "{}/{} - ${}",
                    s.pool.token0.symbol, s.pool.token1.symbol, s.amount_usd
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "Current market context:\nTotal TVL: ${:.0}\nAvailable tokens: {}\nTop pools: {}\nRecent swaps: {}",
            total_tvl, token_list, pool_list, swap_list
        ))
    }
}

#[async_trait]
impl<M: MarketData> IntentSource for LlmIntentParser<M> {
    async fn extract(&self, message: &str) -> Result<TradeIntent> {
        let mut messages = Vec::with_capacity(3);

        if self.include_market_context {
            match self.market_snapshot().await {
                Ok(snapshot) => messages.push(ChatMessage::system(snapshot)),
                Err(e) => {
                    tracing::warn!(error = %e, "market snapshot unavailable, extracting without context");
                }
            }
        }

        messages.push(ChatMessage::system(EXTRACTION_PROMPT));
        messages.push(ChatMessage::user(message));

        let completion = self.completions.complete(&messages).await?;
        Ok(parse_completion_text(
            &completion,
            self.default_slippage_bps,
        ))
    }
}

#[derive(Deserialize)]
struct RawIntent {
    kind: String,
    #[serde(default)]
    token_in: Option<String>,
    #[serde(default)]
    token_out: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    slippage_bps: Option<u32>,
}

/// Parse completion text into an intent. Models wrap JSON in code fences
/// or prose often enough that the outermost braces are located first;
/// any shape that fails validation becomes [`TradeIntent::None`].
pub fn parse_completion_text(text: &str, default_slippage_bps: u32) -> TradeIntent {
    let Some(json_slice) = extract_json_object(text) else {
        return TradeIntent::None;
    };

    let Ok(raw) = serde_json::from_str::<RawIntent>(json_slice) else {
        return TradeIntent::None;
    };

    let amount = raw.amount.filter(|a| !a.trim().is_empty());

    match raw.kind.to_lowercase().as_str() {
        "wrap" => TradeIntent::Wrap { amount },
        "unwrap" => TradeIntent::Unwrap { amount },
        kind @ ("buy" | "sell") => {
            let (Some(token_in), Some(token_out), Some(amount)) =
                (raw.token_in, raw.token_out, amount)
            else {
                return TradeIntent::None;
            };
            if token_in.trim().is_empty() || token_out.trim().is_empty() {
                return TradeIntent::None;
            }
            // The completion is free to emit any number; tolerances past
            // 100% would invert the slippage arithmetic downstream.
            let slippage_bps = raw
                .slippage_bps
                .unwrap_or(default_slippage_bps)
                .min(10_000);
            let swap = SwapIntent {
                token_in,
                token_out,
                amount,
                slippage_bps,
            };
            if kind == "buy" {
                TradeIntent::Buy(swap)
            } else {
                TradeIntent::Sell(swap)
            }
        }
        _ => TradeIntent::None,
    }
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrap_with_amount() {
        let intent = parse_completion_text(r#"{"kind":"wrap","amount":"0.1"}"#, 50);
        assert_eq!(
            intent,
            TradeIntent::Wrap {
                amount: Some("0.1".to_string())
            }
        );
    }

    #[test]
    fn wrap_without_amount_is_preserved() {
        let intent = parse_completion_text(r#"{"kind":"unwrap"}"#, 50);
        assert_eq!(intent, TradeIntent::Unwrap { amount: None });
    }

    #[test]
    fn parses_buy_with_default_slippage() {
        let intent = parse_completion_text(
            r#"{"kind":"buy","token_in":"MNT","token_out":"USDC","amount":"100"}"#,
            50,
        );
        assert_eq!(
            intent,
            TradeIntent::Buy(SwapIntent {
                token_in: "MNT".to_string(),
                token_out: "USDC".to_string(),
                amount: "100".to_string(),
                slippage_bps: 50,
            })
        );
    }

    #[test]
    fn explicit_slippage_wins() {
        let intent = parse_completion_text(
            r#"{"kind":"sell","token_in":"WMNT","token_out":"DAI","amount":"2","slippage_bps":100}"#,
            50,
        );
        match intent {
            TradeIntent::Sell(swap) => assert_eq!(swap.slippage_bps, 100),
            other => panic!("expected sell, got {:?}", other),
        }
    }

    #[test]
    fn excess_slippage_is_clamped() {
        let intent = parse_completion_text(
            r#"{"kind":"buy","token_in":"MNT","token_out":"USDC","amount":"1","slippage_bps":20000}"#,
            50,
        );
        match intent {
            TradeIntent::Buy(swap) => assert_eq!(swap.slippage_bps, 10_000),
            other => panic!("expected buy, got {:?}", other),
        }
    }

    #[test]
    fn recovers_json_from_code_fence() {
        let text = "Here is the intent:\n```json\n{\"kind\":\"wrap\",\"amount\":\"1\"}\n```";
        let intent = parse_completion_text(text, 50);
        assert_eq!(
            intent,
            TradeIntent::Wrap {
                amount: Some("1".to_string())
            }
        );
    }

    #[test]
    fn malformed_payloads_become_none() {
        for text in [
            "",
            "no json here",
            "{not valid json}",
            r#"{"kind":"teleport"}"#,
            r#"{"kind":"buy","amount":"1"}"#,
            r#"{"kind":"buy","token_in":"","token_out":"USDC","amount":"1"}"#,
            r#"{"kind":"sell","token_in":"MNT","token_out":"USDC","amount":""}"#,
        ] {
            assert_eq!(parse_completion_text(text, 50), TradeIntent::None, "{text}");
        }
    }
}
