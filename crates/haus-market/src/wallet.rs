//! Transaction signing seam.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use haus_core::HausResult;

/// Signs and submits transactions for an agent wallet.
///
/// Key derivation and signing live with the implementor; the engine only
/// passes the agent's derivation index and returns the submitted hash.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Sends native CELO.
    async fn send_native(&self, derivation_index: u32, to: Address, amount: U256)
        -> HausResult<String>;

    /// Sends an ERC-20 token.
    async fn send_token(
        &self,
        derivation_index: u32,
        token: Address,
        to: Address,
        amount: U256,
    ) -> HausResult<String>;

    /// Sells on a Mento exchange. `sell_gold` is true when selling CELO.
    async fn exchange(
        &self,
        derivation_index: u32,
        exchange: Address,
        sell_amount: U256,
        min_buy_amount: U256,
        sell_gold: bool,
    ) -> HausResult<String>;
}
