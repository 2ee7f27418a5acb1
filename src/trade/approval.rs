//! ERC-20 allowance management
//!
//! Grants the router (or pool) exactly the amount a swap needs, and
//! skips the transaction entirely when the standing allowance already
//! covers it.

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use crate::contracts::IERC20;
use crate::session::SigningSession;
use crate::{Error, Result};

/// Outcome of an allowance check.
#[derive(Debug, Clone, PartialEq)]
pub struct Approval {
    pub approved: bool,
    /// Present only when an approval transaction was actually sent.
    pub tx_hash: Option<String>,
}

pub struct ApprovalManager {
    session: Arc<SigningSession>,
}

impl ApprovalManager {
    pub fn new(session: Arc<SigningSession>) -> Self {
        Self { session }
    }

    /// Ensure `spender` may pull `amount` of `token` from the signer.
    /// No-op when the current allowance already suffices.
    pub async fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Approval> {
        let owner = self.session.address();
        let erc20 = IERC20::new(token, self.session.provider().clone());

        let current = erc20
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| Error::Allowance(format!("allowance query failed: {}", e)))?;

        if !needs_approval(current, amount) {
            tracing::debug!(%token, %spender, "allowance already sufficient");
            return Ok(Approval {
                approved: true,
                tx_hash: None,
            });
        }

        tracing::info!(%token, %spender, %amount, "submitting approval");
        let receipt = erc20
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| Error::Allowance(format!("approve submission failed: {}", e)))?
            .get_receipt()
            .await
            .map_err(|e| Error::Allowance(format!("approve confirmation failed: {}", e)))?;

        if !receipt.status() {
            return Err(Error::Allowance(format!(
                "approve reverted in tx {}",
                receipt.transaction_hash
            )));
        }

        Ok(Approval {
            approved: true,
            tx_hash: Some(receipt.transaction_hash.to_string()),
        })
    }
}

/// Whether a fresh approval transaction is required.
pub fn needs_approval(current_allowance: U256, required: U256) -> bool {
    current_allowance < required
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficient_allowance_skips_approval() {
        assert!(!needs_approval(U256::from(100), U256::from(100)));
        assert!(!needs_approval(U256::from(200), U256::from(100)));
    }

    #[test]
    fn short_allowance_requires_approval() {
        assert!(needs_approval(U256::from(99), U256::from(100)));
        assert!(needs_approval(U256::ZERO, U256::from(1)));
    }

    #[test]
    fn zero_required_never_needs_approval() {
        assert!(!needs_approval(U256::ZERO, U256::ZERO));
    }
}
