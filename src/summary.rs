//! Wallet summary
//!
//! Builds the multi-line balance report served for wallet-keyword
//! queries: native MNT with a USD annotation from the WMNT/stablecoin
//! pool, then every subgraph-listed token the signer holds.

use std::sync::Arc;

use alloy::primitives::utils::format_units;
use async_trait::async_trait;
use futures::future::join_all;

use crate::contracts::IERC20;
use crate::market::{MarketData, PoolRecord};
use crate::session::SigningSession;
use crate::trade::WalletReporter;
use crate::Result;

pub struct WalletSummary {
    session: Arc<SigningSession>,
    market: Arc<dyn MarketData>,
}

impl WalletSummary {
    pub fn new(session: Arc<SigningSession>, market: Arc<dyn MarketData>) -> Self {
        Self { session, market }
    }
}

#[async_trait]
impl WalletReporter for WalletSummary {
    async fn summary(&self) -> Result<String> {
        let (native_balance, tokens, pools) = futures::try_join!(
            self.session.native_balance(),
            self.market.tokens(),
            self.market.top_pools(100)
        )?;

        let mnt_price = reference_mnt_price(&pools);
        let native = format_units(native_balance, 18)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        let mut lines = vec![
            format!("Agent Wallet ({})", self.session.address()),
            format!("MNT: {:.4} (${:.2})", native, native * mnt_price),
        ];

        let balance_futures = tokens.iter().map(|token| {
            let provider = self.session.provider().clone();
            let owner = self.session.address();
            async move {
                let address = token.id.parse::<alloy::primitives::Address>().ok()?;
                let erc20 = IERC20::new(address, provider);
                match erc20.balanceOf(owner).call().await {
                    Ok(balance) => {
                        let decimals = token.decimals_u8().unwrap_or(18);
                        let formatted = format_units(balance, decimals)
                            .ok()
                            .and_then(|s| s.parse::<f64>().ok())?;
                        (formatted > 0.0)
                            .then(|| format!("{}: {:.4}", token.symbol, formatted))
                    }
                    Err(e) => {
                        tracing::warn!(token = %token.symbol, error = %e, "balance query failed");
                        None
                    }
                }
            }
        });

        lines.extend(join_all(balance_futures).await.into_iter().flatten());
        Ok(lines.join("\n"))
    }
}

/// USD price of MNT from the first WMNT/stablecoin pool, zero when no
/// such pool exists.
fn reference_mnt_price(pools: &[PoolRecord]) -> f64 {
    const STABLES: &[&str] = &["MUSDC", "MUSDT", "USDC", "USDT", "DAI"];

    for pool in pools {
        let t0 = pool.token0.symbol.to_uppercase();
        let t1 = pool.token1.symbol.to_uppercase();

        let price = if (t0 == "WMNT" || t0 == "MNT") && STABLES.contains(&t1.as_str()) {
            pool.token1_price.as_deref()
        } else if (t1 == "WMNT" || t1 == "MNT") && STABLES.contains(&t0.as_str()) {
            pool.token0_price.as_deref()
        } else {
            continue;
        };

        if let Some(p) = price.and_then(|s| s.parse::<f64>().ok()) {
            return p;
        }
    }
    0.0
}
