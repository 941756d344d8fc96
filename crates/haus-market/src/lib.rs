//! Market data for AgentHaus agents: Mento oracle median rates, exchange swap
//! quotes, gas prices and balances, each read from chain with a deterministic
//! fallback.
//!
//! All reads go through an injected [`ChainReader`]; nothing here holds global
//! state or caches results between calls.

pub mod abi;
pub mod assets;
pub mod chain_data;
pub mod oracle;
pub mod quote;
pub mod rpc;
pub mod units;
pub mod wallet;

pub use assets::{MarketAddresses, StableAsset, NATIVE_SYMBOL};
pub use chain_data::{AddressBalance, GasInfo};
pub use oracle::{MarketData, OracleRate, RateSource};
pub use quote::{QuoteSource, SwapQuote};
pub use rpc::{ChainReader, JsonRpcClient};
pub use wallet::WalletSigner;
