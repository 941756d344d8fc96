//! Gas price and balance reads.

use crate::abi::{self, AbiArg};
use crate::oracle::MarketData;
use crate::units::{self, GWEI_DECIMALS, TOKEN_DECIMALS};
use alloy_primitives::{Address, U256};
use futures_util::future::join_all;
use haus_core::{HausError, HausResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Gas used by a plain native transfer.
const TRANSFER_GAS: u64 = 21_000;

/// Gas price snapshot, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasInfo {
    /// Gwei.
    pub base_fee: String,
    /// Gwei.
    pub suggested_tip: String,
    /// CELO for a simple transfer.
    pub estimated_cost: String,
    /// Defaults were used because the node could not be read.
    pub is_fallback: bool,
}

impl GasInfo {
    fn fallback() -> Self {
        Self {
            base_fee: "5".into(),
            suggested_tip: "0.5".into(),
            estimated_cost: "0.000105".into(),
            is_fallback: true,
        }
    }
}

/// Native and stable balances of one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
    /// Address as given.
    pub address: String,
    /// Native balance in CELO.
    pub celo: String,
    /// Stable symbol to formatted balance; unreadable tokens report `0`.
    pub tokens: BTreeMap<String, String>,
}

impl MarketData {
    /// Current gas price, or fixed defaults when the node is unreachable.
    pub async fn gas_price(&self) -> GasInfo {
        match tokio::time::timeout(self.read_timeout, self.reader.gas_price()).await {
            Ok(Ok(price)) => GasInfo {
                base_fee: units::format_units(price, GWEI_DECIMALS),
                suggested_tip: "0.5".into(),
                estimated_cost: units::format_units(
                    price.saturating_mul(U256::from(TRANSFER_GAS)),
                    TOKEN_DECIMALS,
                ),
                is_fallback: false,
            },
            Ok(Err(e)) => {
                warn!(error = %e, "Gas price read failed, using defaults");
                GasInfo::fallback()
            }
            Err(_) => {
                warn!("Gas price read timed out, using defaults");
                GasInfo::fallback()
            }
        }
    }

    /// Native and stable balances of `address`. Token reads run concurrently.
    pub async fn balances(&self, address: &str) -> HausResult<AddressBalance> {
        let owner: Address = address
            .trim()
            .parse()
            .map_err(|_| HausError::Validation(format!("'{address}' is not a valid address")))?;

        let native = tokio::time::timeout(self.read_timeout, self.reader.native_balance(owner))
            .await
            .map_err(|_| HausError::Rpc("eth_getBalance timed out".into()))??;

        let reads = self.addresses.stables.iter().map(|asset| async move {
            let data = abi::encode_call(abi::BALANCE_OF, &[AbiArg::Address(owner)]);
            let read = async {
                let raw = self.reader.call(asset.token, data).await?;
                abi::decode_uint(&raw, 0)
            };
            let balance = match tokio::time::timeout(self.read_timeout, read).await {
                Ok(Ok(value)) => units::format_units(value, TOKEN_DECIMALS),
                Ok(Err(e)) => {
                    warn!(token = %asset.symbol, error = %e, "balanceOf failed");
                    "0".to_string()
                }
                Err(_) => "0".to_string(),
            };
            (asset.symbol.to_string(), balance)
        });

        Ok(AddressBalance {
            address: owner.to_string(),
            celo: units::format_units(native, TOKEN_DECIMALS),
            tokens: join_all(reads).await.into_iter().collect(),
        })
    }
}
