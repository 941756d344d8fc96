//! Chain reads over JSON-RPC.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use haus_core::{HausError, HausResult};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Read-only access to chain state.
///
/// Implementations are stateless across calls, so one instance is shared by
/// every turn without locking.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against `to` with raw calldata; returns raw return data.
    async fn call(&self, to: Address, data: Vec<u8>) -> HausResult<Vec<u8>>;

    /// Native balance in base units.
    async fn native_balance(&self, address: Address) -> HausResult<U256>;

    /// Current gas price in base units.
    async fn gas_price(&self) -> HausResult<U256>;
}

/// HTTP JSON-RPC client with a bounded per-request timeout.
#[derive(Clone)]
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcClient {
    /// Client for `url`. Fails on an empty URL.
    pub fn new(url: impl Into<String>, timeout: Duration) -> HausResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(HausError::Config("rpc url is not configured".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HausError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { url, client })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn rpc_call(&self, method: &str, params: Value) -> HausResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        debug!(method = %method, url = %self.url, "rpc request");

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| HausError::Rpc(format!("{method} transport failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HausError::Rpc(format!("{method} returned status {status}")));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| HausError::Rpc(format!("failed to parse {method} response: {e}")))?;

        if let Some(error) = value.get("error") {
            return Err(HausError::Rpc(format!("rpc returned error for {method}: {error}")));
        }

        value
            .get("result")
            .cloned()
            .ok_or_else(|| HausError::Rpc(format!("{method} result was missing")))
    }

    async fn rpc_quantity(&self, method: &str, params: Value) -> HausResult<U256> {
        let result = self.rpc_call(method, params).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| HausError::Rpc(format!("{method} result is not a string")))?;
        parse_hex_quantity(raw, method)
    }
}

#[async_trait]
impl ChainReader for JsonRpcClient {
    async fn call(&self, to: Address, data: Vec<u8>) -> HausResult<Vec<u8>> {
        let result = self
            .rpc_call(
                "eth_call",
                json!([{"to": to.to_string(), "data": format!("0x{}", hex::encode(&data))}, "latest"]),
            )
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| HausError::Rpc("eth_call result is not a string".into()))?;
        let stripped = raw
            .strip_prefix("0x")
            .ok_or_else(|| HausError::Rpc("eth_call result must be 0x-prefixed hex".into()))?;
        let bytes = hex::decode(stripped)
            .map_err(|e| HausError::Rpc(format!("eth_call result is not valid hex: {e}")))?;
        if bytes.is_empty() {
            return Err(HausError::Rpc(format!("eth_call to {to} returned no data")));
        }
        Ok(bytes)
    }

    async fn native_balance(&self, address: Address) -> HausResult<U256> {
        self.rpc_quantity("eth_getBalance", json!([address.to_string(), "latest"]))
            .await
    }

    async fn gas_price(&self) -> HausResult<U256> {
        self.rpc_quantity("eth_gasPrice", json!([])).await
    }
}

fn parse_hex_quantity(raw: &str, field: &str) -> HausResult<U256> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| HausError::Rpc(format!("{field} must be 0x-prefixed hex")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| HausError::Rpc(format!("failed to parse {field} as hex quantity: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x10", "q").unwrap(), U256::from(16u64));
        assert_eq!(parse_hex_quantity("0x", "q").unwrap(), U256::ZERO);
        assert!(parse_hex_quantity("10", "q").is_err());
        assert!(parse_hex_quantity("0xzz", "q").is_err());
    }

    #[test]
    fn test_empty_url_is_config_error() {
        let err = JsonRpcClient::new("  ", Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, HausError::Config(_)));
    }
}
