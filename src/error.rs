//! Error types for the trading agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Subgraph query failed: {0}")]
    Subgraph(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Token approval failed: {0}")]
    Allowance(String),

    #[error("{message}")]
    ContractRevert {
        message: String,
        /// Decoded revert reason, if the node surfaced one.
        reason: Option<String>,
        /// Raw revert data (hex), kept for programmatic branching.
        data: Option<String>,
    },

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unit conversion error: {0}")]
    Units(#[from] alloy::primitives::utils::UnitsError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify a provider/contract error string: revert-class failures become
    /// `ContractRevert` with the reason extracted, everything else is `Rpc`.
    pub fn from_rpc_failure(raw: &str) -> Self {
        if raw.contains("execution reverted") || raw.contains("revert") {
            let reason = parse_revert_reason(raw);
            Error::ContractRevert {
                message: reason.clone(),
                reason: Some(reason),
                data: extract_revert_data(raw),
            }
        } else {
            Error::Rpc(raw.to_string())
        }
    }

    /// Whether the caller may sensibly retry this failure through the
    /// mock-trade path (revert or transport failure, not a validation bug).
    pub fn is_retryable_as_mock(&self) -> bool {
        matches!(
            self,
            Error::ContractRevert { .. } | Error::Rpc(_) | Error::Network(_)
        )
    }
}

/// Parse a human-readable revert reason from an RPC error message.
pub fn parse_revert_reason(error: &str) -> String {
    if error.contains("execution reverted") {
        if let Some(start) = error.find("revert: ") {
            let reason = &error[start + 8..];
            if let Some(end) = reason.find('"') {
                return reason[..end].to_string();
            }
            return reason.to_string();
        }
        if let Some(hex) = extract_revert_data(error) {
            // Error(string) selector is 0x08c379a0; the string payload starts
            // after the selector, offset and length words.
            if hex.starts_with("0x08c379a0") && hex.len() > 138 {
                if let Ok(decoded) = alloy::hex::decode(&hex[138..]) {
                    let filtered: Vec<u8> = decoded.into_iter().filter(|&b| b != 0).collect();
                    if let Ok(s) = String::from_utf8(filtered) {
                        return s;
                    }
                }
            }
            return format!("Reverted with data: {}", hex);
        }
        return "execution reverted".to_string();
    }

    error.to_string()
}

fn extract_revert_data(error: &str) -> Option<String> {
    let start = error.find("0x")?;
    let hex_data = &error[start..];
    let end = hex_data
        .find(|c: char| !c.is_ascii_hexdigit() && c != 'x')
        .unwrap_or(hex_data.len());
    if end > 2 {
        Some(hex_data[..end].to_string())
    } else {
        None
    }
}
