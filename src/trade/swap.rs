//! Swap execution against FusionX V3
//!
//! The primary path goes through the swap router's `exactInputSingle`,
//! wrapped in a `multicall` with a `deposit` when the input side is
//! native MNT. If the router reverts, a direct pool `swap` is attempted
//! with a price limit derived from the pool's current sqrt price. The
//! mock path exists for demos against a dead testnet and is always
//! flagged `simulated`.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::aliases::U24;
use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, Bytes, I256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::config::{contracts as deployed, Config};
use crate::contracts::{ISwapRouter, IUniswapV3Factory, IUniswapV3Pool, IWrappedNative, IERC20};
use crate::intent::SwapIntent;
use crate::market::{MarketData, TokenRecord};
use crate::session::SigningSession;
use crate::trade::approval::ApprovalManager;
use crate::trade::price;
use crate::trade::{SwapBackend, SwapReceipt};
use crate::{Error, Result};

/// Fully resolved swap, ready for submission.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub slippage_bps: u32,
    pub deadline: u64,
}

pub struct SwapExecutor {
    session: Arc<SigningSession>,
    market: Arc<dyn MarketData>,
    approvals: ApprovalManager,
    config: Config,
}

impl SwapExecutor {
    pub fn new(session: Arc<SigningSession>, market: Arc<dyn MarketData>, config: Config) -> Self {
        let approvals = ApprovalManager::new(session.clone());
        Self {
            session,
            market,
            approvals,
            config,
        }
    }

    /// Resolve symbols and amounts into a [`SwapRequest`].
    pub async fn prepare(&self, intent: &SwapIntent) -> Result<SwapRequest> {
        // Literal addresses and aliased symbols resolve without a
        // subgraph round trip. Anything else needs the token list, and a
        // gateway failure there propagates instead of surfacing as an
        // unknown token.
        let known = if resolve_local(&intent.token_in).is_some()
            && resolve_local(&intent.token_out).is_some()
        {
            Vec::new()
        } else {
            self.market.tokens().await?
        };
        let token_in = resolve_token(&intent.token_in, &known)?;
        let token_out = resolve_token(&intent.token_out, &known)?;

        if token_in == token_out {
            return Err(Error::Validation(
                "Input and output tokens are the same".to_string(),
            ));
        }

        let decimals = self.token_decimals(token_in, &known).await;
        let amount_in = U256::try_from(parse_units(&intent.amount, decimals)?)
            .map_err(|_| Error::Validation("Amount must be positive".to_string()))?;
        if amount_in.is_zero() {
            return Err(Error::Validation("Amount must be positive".to_string()));
        }

        let deadline = chrono::Utc::now().timestamp() as u64 + self.config.deadline_secs;

        Ok(SwapRequest {
            token_in,
            token_out,
            amount_in,
            amount_out_minimum: price::minimum_output(amount_in, intent.slippage_bps),
            slippage_bps: intent.slippage_bps,
            deadline,
        })
    }

    /// On-chain decimals, falling back to the subgraph record, then 18.
    async fn token_decimals(&self, token: Address, known: &[TokenRecord]) -> u8 {
        let erc20 = IERC20::new(token, self.session.provider().clone());
        if let Ok(decimals) = erc20.decimals().call().await {
            return decimals;
        }
        let address = format!("{:#x}", token);
        known
            .iter()
            .find(|t| t.id.eq_ignore_ascii_case(&address))
            .and_then(|t| t.decimals_u8())
            .unwrap_or(18)
    }

    async fn execute_router_swap(&self, request: &SwapRequest) -> Result<SwapReceipt> {
        let recipient = self.session.address();
        let wrapping = request.token_in == deployed::WMNT;
        let zero_for_one = price::is_zero_for_one(request.token_in, request.token_out);

        if !wrapping {
            self.approvals
                .ensure_allowance(request.token_in, deployed::SWAP_ROUTER, request.amount_in)
                .await?;
        }

        let params = ISwapRouter::ExactInputSingleParams {
            tokenIn: request.token_in,
            tokenOut: request.token_out,
            fee: U24::from(deployed::POOL_FEE_MEDIUM),
            recipient,
            deadline: U256::from(request.deadline),
            amountIn: request.amount_in,
            amountOutMinimum: request.amount_out_minimum,
            sqrtPriceLimitX96: price::default_sqrt_price_limit(zero_for_one),
        };

        let router = ISwapRouter::new(deployed::SWAP_ROUTER, self.session.provider().clone());

        // When the input is native MNT the deposit and the swap ride the
        // same transaction so the router can spend its own WMNT.
        let mut calls: Vec<Bytes> = Vec::with_capacity(2);
        if wrapping {
            calls.push(IWrappedNative::depositCall {}.abi_encode().into());
        }
        calls.push(
            ISwapRouter::exactInputSingleCall { params }
                .abi_encode()
                .into(),
        );

        let value = if wrapping { request.amount_in } else { U256::ZERO };
        let call = router.multicall(calls).value(value);

        let gas_limit = match self.config.gas.gas_limit_override {
            Some(limit) => limit,
            None => {
                let estimate = call
                    .estimate_gas()
                    .await
                    .map_err(|e| Error::from_rpc_failure(&e.to_string()))?;
                self.config.gas.buffered(estimate)
            }
        };

        let _guard = self.session.lock_submission().await;
        let receipt = call
            .gas(gas_limit)
            .send()
            .await
            .map_err(|e| Error::from_rpc_failure(&e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| Error::Rpc(format!("swap confirmation failed: {}", e)))?;

        if !receipt.status() {
            return Err(Error::ContractRevert {
                message: "swap transaction reverted".to_string(),
                reason: None,
                data: None,
            });
        }

        tracing::info!(tx = %receipt.transaction_hash, "router swap confirmed");
        Ok(SwapReceipt {
            transaction_hash: receipt.transaction_hash.to_string(),
            simulated: false,
        })
    }

    /// Direct pool swap, used when the router path reverts. The price
    /// limit comes from the pool's own sqrt price offset by the slippage
    /// tolerance, so a thin pool fails fast instead of trading through.
    async fn execute_pool_swap(&self, request: &SwapRequest) -> Result<SwapReceipt> {
        let factory = IUniswapV3Factory::new(deployed::FACTORY, self.session.provider().clone());
        let pool_address = factory
            .getPool(
                request.token_in,
                request.token_out,
                U24::from(deployed::POOL_FEE_MEDIUM),
            )
            .call()
            .await
            .map_err(|e| Error::Rpc(format!("getPool failed: {}", e)))?;

        if pool_address == Address::ZERO {
            return Err(Error::Validation(
                "No liquidity pool exists for the provided token pair.".to_string(),
            ));
        }

        let pool = IUniswapV3Pool::new(pool_address, self.session.provider().clone());
        let token0 = pool
            .token0()
            .call()
            .await
            .map_err(|e| Error::Rpc(format!("token0 query failed: {}", e)))?;
        let zero_for_one = request.token_in == token0;

        self.approvals
            .ensure_allowance(request.token_in, pool_address, request.amount_in)
            .await?;

        let slot0 = pool
            .slot0()
            .call()
            .await
            .map_err(|e| Error::Rpc(format!("slot0 query failed: {}", e)))?;
        let limit = price::sqrt_price_limit_from_pool(
            slot0.sqrtPriceX96,
            zero_for_one,
            request.slippage_bps,
        );

        // Positive amountSpecified selects exact-input semantics.
        let call = pool.swap(
            self.session.address(),
            zero_for_one,
            I256::from_raw(request.amount_in),
            limit,
            Bytes::new(),
        );

        let gas_limit = match self.config.gas.gas_limit_override {
            Some(limit) => limit,
            None => {
                let estimate = call
                    .estimate_gas()
                    .await
                    .map_err(|e| Error::from_rpc_failure(&e.to_string()))?;
                self.config.gas.buffered(estimate)
            }
        };

        let _guard = self.session.lock_submission().await;
        let receipt = call
            .gas(gas_limit)
            .send()
            .await
            .map_err(|e| Error::from_rpc_failure(&e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| Error::Rpc(format!("pool swap confirmation failed: {}", e)))?;

        if !receipt.status() {
            return Err(Error::ContractRevert {
                message: "pool swap reverted".to_string(),
                reason: None,
                data: None,
            });
        }

        tracing::info!(tx = %receipt.transaction_hash, pool = %pool_address, "direct pool swap confirmed");
        Ok(SwapReceipt {
            transaction_hash: receipt.transaction_hash.to_string(),
            simulated: false,
        })
    }
}

#[async_trait]
impl SwapBackend for SwapExecutor {
    async fn swap(&self, intent: &SwapIntent) -> Result<SwapReceipt> {
        let request = self.prepare(intent).await?;

        match self.execute_router_swap(&request).await {
            Ok(receipt) => Ok(receipt),
            Err(router_err) if matches!(router_err, Error::ContractRevert { .. }) => {
                tracing::warn!(error = %router_err, "router swap reverted, trying direct pool swap");
                self.execute_pool_swap(&request)
                    .await
                    .map_err(enrich_revert)
            }
            Err(e) => Err(enrich_revert(e)),
        }
    }

    async fn mock_swap(&self, intent: &SwapIntent) -> Result<SwapReceipt> {
        tracing::info!(
            token_in = %intent.token_in,
            token_out = %intent.token_out,
            amount = %intent.amount,
            "executing mock trade"
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(SwapReceipt {
            transaction_hash: mock_transaction_hash(),
            simulated: true,
        })
    }
}

/// Resolution that needs no market data: a literal address or an entry
/// in the alias registry.
fn resolve_local(raw: &str) -> Option<Address> {
    let trimmed = raw.trim();
    if trimmed.starts_with("0x") {
        return trimmed.parse().ok();
    }
    deployed::resolve_symbol(trimmed).map(|(_, address)| address)
}

/// Resolve a user-supplied token (symbol or address) to an address.
fn resolve_token(raw: &str, known: &[TokenRecord]) -> Result<Address> {
    let trimmed = raw.trim();

    if trimmed.starts_with("0x") {
        return trimmed
            .parse::<Address>()
            .map_err(|_| Error::Validation(format!("Invalid token address: {}", trimmed)));
    }

    if let Some(address) = resolve_local(trimmed) {
        return Ok(address);
    }

    known
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(trimmed))
        .and_then(|t| t.id.parse::<Address>().ok())
        .ok_or_else(|| Error::Validation(format!("Unknown token: {}", trimmed)))
}

/// 32 bytes of UUID entropy rendered as a 0x-prefixed hash.
fn mock_transaction_hash() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    format!("0x{}", alloy::hex::encode(bytes))
}

/// Attach the usual suspects to a revert so users get something more
/// actionable than a bare reason string. The parsed reason and raw data
/// stay on the variant.
fn enrich_revert(e: Error) -> Error {
    match e {
        Error::ContractRevert {
            message,
            reason,
            data,
        } => Error::ContractRevert {
            message: format!(
                "Swap execution failed: {}\nPossible causes:\n- Insufficient balance\n- Price impact too high\n- Pool liquidity constraints",
                message
            ),
            reason,
            data,
        },
        other => other,
    }
}
