//! Wrap / unwrap execution
//!
//! Native MNT wraps into WMNT through the canonical wrapped-native
//! contract: `deposit` carries the amount as transaction value,
//! `withdraw` burns WMNT and returns native MNT.

use std::sync::Arc;

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::config::GasConfig;
use crate::contracts::{IWrappedNative, IERC20};
use crate::session::SigningSession;
use crate::trade::WrapBackend;
use crate::{Error, Result};

pub struct WrapUnwrapExecutor {
    session: Arc<SigningSession>,
    wrapped_native: Address,
    gas: GasConfig,
}

impl WrapUnwrapExecutor {
    pub fn new(session: Arc<SigningSession>, wrapped_native: Address, gas: GasConfig) -> Self {
        Self {
            session,
            wrapped_native,
            gas,
        }
    }

    fn parse_amount(&self, amount: &str) -> Result<U256> {
        let value = U256::try_from(parse_units(amount, 18)?)
            .map_err(|_| Error::Validation("Amount must be positive".to_string()))?;
        if value.is_zero() {
            return Err(Error::Validation("Amount must be positive".to_string()));
        }
        Ok(value)
    }

    async fn execute_wrap(&self, amount: &str) -> Result<String> {
        let value = self.parse_amount(amount)?;
        let contract = IWrappedNative::new(self.wrapped_native, self.session.provider().clone());

        let call = contract.deposit().value(value);

        // Cheap preflight before estimation, which itself fails when the
        // wallet cannot cover the attached value.
        let balance = self.session.native_balance().await?;
        if balance < value {
            return Err(Error::InsufficientFunds(format!(
                "wrap needs {} MNT but wallet holds {}",
                amount,
                format_units(balance, 18).unwrap_or_else(|_| balance.to_string())
            )));
        }

        let gas_limit = match self.gas.gas_limit_override {
            Some(limit) => limit,
            None => {
                let estimate = call
                    .estimate_gas()
                    .await
                    .map_err(|e| Error::from_rpc_failure(&e.to_string()))?;
                self.gas.buffered(estimate)
            }
        };

        // Full preflight: the signer must cover amount plus worst-case
        // gas, otherwise the node's error is an opaque "insufficient
        // funds for transfer".
        let gas_price = self.session.gas_price().await?;
        let required = required_native(value, gas_limit, gas_price);
        if balance < required {
            return Err(Error::InsufficientFunds(format!(
                "wrap needs {} MNT including gas but wallet holds {}",
                format_units(required, 18).unwrap_or_else(|_| required.to_string()),
                format_units(balance, 18).unwrap_or_else(|_| balance.to_string())
            )));
        }

        let _guard = self.session.lock_submission().await;
        let receipt = call
            .gas(gas_limit)
            .send()
            .await
            .map_err(|e| Error::from_rpc_failure(&e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| Error::Rpc(format!("deposit confirmation failed: {}", e)))?;

        if !receipt.status() {
            return Err(Error::ContractRevert {
                message: "wrap transaction reverted".to_string(),
                reason: None,
                data: None,
            });
        }

        tracing::info!(tx = %receipt.transaction_hash, amount, "wrapped MNT");
        Ok(receipt.transaction_hash.to_string())
    }

    async fn execute_unwrap(&self, amount: &str) -> Result<String> {
        let value = self.parse_amount(amount)?;
        let contract = IWrappedNative::new(self.wrapped_native, self.session.provider().clone());
        let erc20 = IERC20::new(self.wrapped_native, self.session.provider().clone());

        let wrapped_balance = erc20
            .balanceOf(self.session.address())
            .call()
            .await
            .map_err(|e| Error::Rpc(format!("WMNT balance query failed: {}", e)))?;
        if wrapped_balance < value {
            return Err(Error::InsufficientFunds(format!(
                "unwrap needs {} WMNT but wallet holds {}",
                amount,
                format_units(wrapped_balance, 18)
                    .unwrap_or_else(|_| wrapped_balance.to_string())
            )));
        }

        let call = contract.withdraw(value);
        let gas_limit = match self.gas.gas_limit_override {
            Some(limit) => limit,
            None => {
                let estimate = call
                    .estimate_gas()
                    .await
                    .map_err(|e| Error::from_rpc_failure(&e.to_string()))?;
                self.gas.buffered(estimate)
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
            .map_err(|e| Error::Rpc(format!("withdraw confirmation failed: {}", e)))?;

        if !receipt.status() {
            return Err(Error::ContractRevert {
                message: "unwrap transaction reverted".to_string(),
                reason: None,
                data: None,
            });
        }

        tracing::info!(tx = %receipt.transaction_hash, amount, "unwrapped WMNT");
        Ok(receipt.transaction_hash.to_string())
    }
}

/// Amount plus worst-case fee at the given gas limit and price.
fn required_native(value: U256, gas_limit: u64, gas_price: u128) -> U256 {
    value.saturating_add(U256::from(gas_limit) * U256::from(gas_price))
}

#[async_trait]
impl WrapBackend for WrapUnwrapExecutor {
    async fn wrap(&self, amount: &str) -> Result<String> {
        self.execute_wrap(amount).await
    }

    async fn unwrap(&self, amount: &str) -> Result<String> {
        self.execute_unwrap(amount).await
    }
}
