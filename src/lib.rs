//! Conversational DeFi trading agent
//!
//! Turns free-text trading instructions into on-chain actions against
//! FusionX V3 on Mantle Sepolia:
//! - Intent extraction through an OpenAI-compatible completion service
//! - Wrap/unwrap of native MNT and exact-input token swaps
//! - Market and wallet queries backed by the FusionX subgraph
//!
//! # Security Model
//!
//! - The private key lives only inside [`session::SigningSession`]
//! - Completion output is untrusted: malformed intents collapse to
//!   no-ops instead of transactions
//! - Nothing is submitted for a token pair without a known pool

pub mod cache;
pub mod config;
pub mod contracts;
pub mod intent;
pub mod llm;
pub mod market;
pub mod query;
pub mod session;
pub mod summary;
pub mod trade;

mod error;

// Re-export commonly used types
pub use config::{Config, COMPLETION_API_KEY_ENV, PRIVATE_KEY_ENV};
pub use error::{Error, Result};
pub use intent::{IntentSource, LlmIntentParser, SwapIntent, TradeIntent};
pub use session::SigningSession;
pub use trade::{TradeExecutor, TradeResult};
