//! FusionX V3 deployment addresses and token registry for Mantle Sepolia

use alloy::primitives::{address, Address};

/// FusionX V3 factory
pub const FACTORY: Address = address!("8a74c5e686d33c5fe5f98c361f6e24e35e899ef6");

/// FusionX V3 swap router (exactInputSingle + multicall)
pub const SWAP_ROUTER: Address = address!("9425f9c882b947ef7be4abfdbd08a68837fa6307");

/// FusionX smart router (aggregation entrypoint)
pub const SMART_ROUTER: Address = address!("88279b5383e8e9eed83b69e68661ce7cdb81cb38");

/// Wrapped MNT
pub const WMNT: Address = address!("c0eecfa24e391e4259b7ef17be54be5139da1ac7");

/// Mock USDC
pub const MUSDC: Address = address!("ea911b76c5681fd2a46cf951b320c7e39186f3f0");

/// Mock USDT
pub const MUSDT: Address = address!("a9b72ccc9968afec98a96239b5aa48d828e8d827");

pub const DAI: Address = address!("c92747b1e4bd5f89bbb66bae657268a5f4c4850c");

/// 0.3% fee tier, the only tier deployed on this testnet
pub const POOL_FEE_MEDIUM: u32 = 3000;

/// Subgraph endpoint environment variable name, overriding the default.
pub const SUBGRAPH_URL_ENV: &str = "SUBGRAPH_URL";

pub fn default_subgraph_url() -> String {
    std::env::var(SUBGRAPH_URL_ENV).unwrap_or_else(|_| {
        "https://graph.testnet.fusionx.finance/subgraphs/name/fusionx/exchange-v3".to_string()
    })
}

/// Resolve a user-facing symbol to a known token address.
///
/// Native MNT maps to WMNT since every pool trades the wrapped form.
pub fn resolve_symbol(symbol: &str) -> Option<(&'static str, Address)> {
    match symbol.trim().to_uppercase().as_str() {
        "MNT" | "WMNT" => Some(("WMNT", WMNT)),
        "USDC" | "MUSDC" => Some(("MUSDC", MUSDC)),
        "USDT" | "MUSDT" => Some(("MUSDT", MUSDT)),
        "DAI" => Some(("DAI", DAI)),
        _ => None,
    }
}
