//! Signing session
//!
//! SECURITY: This is the ONLY place where the private key exists.
//! - The key lives in alloy's PrivateKeySigner, wired into the provider
//! - The key is never serialized and never logged
//! - Components receive the session by Arc and can only sign by sending
//!   transactions through the provider

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::PRIVATE_KEY_ENV;
use crate::{Error, Result};

/// Connected provider plus signer identity, shared by every component
/// that submits transactions.
///
/// Transactions from a single signer must be serialized so nonces stay
/// ordered; callers hold [`SigningSession::lock_submission`] across
/// send-and-confirm.
pub struct SigningSession {
    provider: DynProvider,
    address: Address,
    chain_id: u64,
    tx_lock: Mutex<()>,
}

impl SigningSession {
    /// Connect to an RPC endpoint with a hex-encoded private key.
    pub fn connect(rpc_url: &str, chain_id: u64, key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;
        Self::with_signer(rpc_url, chain_id, signer)
    }

    /// Connect using the `PRIVATE_KEY` environment variable, generating
    /// an ephemeral in-process signer when it is unset.
    pub fn from_env(rpc_url: &str, chain_id: u64) -> Result<Self> {
        match std::env::var(PRIVATE_KEY_ENV) {
            Ok(key_hex) => Self::connect(rpc_url, chain_id, &key_hex),
            Err(_) => {
                let signer = PrivateKeySigner::random();
                tracing::warn!(
                    address = %signer.address(),
                    "{} not set, using an ephemeral agent wallet",
                    PRIVATE_KEY_ENV
                );
                Self::with_signer(rpc_url, chain_id, signer)
            }
        }
    }

    fn with_signer(rpc_url: &str, chain_id: u64, signer: PrivateKeySigner) -> Result<Self> {
        let address = signer.address();
        let url = rpc_url
            .parse::<url::Url>()
            .map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            address,
            chain_id,
            tx_lock: Mutex::new(()),
        })
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Public signer address (safe to share)
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Native balance of the signer.
    pub async fn native_balance(&self) -> Result<alloy::primitives::U256> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(|e| Error::Rpc(e.to_string()))
    }

    /// Current gas price reported by the node.
    pub async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| Error::Rpc(e.to_string()))
    }

    /// Serialize transaction submission for this signer. Hold the guard
    /// until the receipt is confirmed.
    pub async fn lock_submission(&self) -> MutexGuard<'_, ()> {
        self.tx_lock.lock().await
    }
}

impl std::fmt::Debug for SigningSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSession")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
