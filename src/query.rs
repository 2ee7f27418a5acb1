//! Keyword-routed market information answers
//!
//! Handles the messages that survive intent extraction as non-trades:
//! top pools, recent swaps, and the token list. Anything else gets a
//! help line.

use crate::market::MarketData;
use crate::Result;

pub async fn answer_market_query(market: &dyn MarketData, message: &str) -> Result<String> {
    let normalized = message.to_lowercase();

    if normalized.contains("top") && (normalized.contains("mover") || normalized.contains("pool")) {
        let pools = market.top_pools(5).await?;
        let lines = pools
            .iter()
            .enumerate()
            .map(|(i, pool)| format!("{}. {} - ${:.2}", i + 1, pool.pair_label(), pool.tvl_usd()))
            .collect::<Vec<_>>()
            .join("\n");
        return Ok(format!("Here are the top pools by TVL:\n{}", lines));
    }

    if normalized.contains("recent")
        && (normalized.contains("trade") || normalized.contains("swap"))
    {
        let swaps = market.recent_swaps(5).await?;
        let lines = swaps
            .iter()
            .map(|swap| {
                format!(
                    "• {}/{} - ${}",
                    swap.pool.token0.symbol, swap.pool.token1.symbol, swap.amount_usd
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        return Ok(format!("Recent swaps:\n{}", lines));
    }

    if normalized.contains("token") && normalized.contains("list") {
        let tokens = market.tokens().await?;
        let lines = tokens
            .iter()
            .map(|token| format!("• {} - TVL: ${:.2}", token.symbol, token.tvl_usd()))
            .collect::<Vec<_>>()
            .join("\n");
        return Ok(format!("Available tokens:\n{}", lines));
    }

    Ok(
        "I can help you with information about top pools, recent trades, or token listings. Try asking about those!"
            .to_string(),
    )
}
