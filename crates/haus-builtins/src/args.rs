//! Parameter parsing shared by the built-in skills.

use alloy_primitives::Address;
use haus_core::{HausError, HausResult};
use haus_market::{RateSource, WalletSigner};
use haus_skills::ExecutionContext;
use std::sync::Arc;

pub(crate) fn parse_address(raw: &str) -> HausResult<Address> {
    raw.trim()
        .parse()
        .map_err(|_| HausError::Validation(format!("'{raw}' is not a valid address")))
}

/// Optional param at `idx`, treating an empty field as absent.
pub(crate) fn optional(params: &[String], idx: usize) -> Option<&str> {
    params.get(idx).map(String::as_str).filter(|p| !p.is_empty())
}

pub(crate) fn derivation_index(ctx: &ExecutionContext) -> HausResult<u32> {
    ctx.wallet_derivation_index
        .ok_or_else(|| HausError::Config("agent wallet has no derivation index".into()))
}

pub(crate) fn signer(signer: &Option<Arc<dyn WalletSigner>>) -> HausResult<&dyn WalletSigner> {
    signer
        .as_deref()
        .ok_or_else(|| HausError::Config("no wallet signer is configured".into()))
}

/// `0x1234…abcd`
pub(crate) fn short(value: &str) -> String {
    if value.len() <= 12 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}…{}", &value[..6], &value[value.len() - 4..])
}

pub(crate) fn source_label(source: RateSource) -> &'static str {
    match source {
        RateSource::OnChain => "on-chain",
        RateSource::Fallback => "fallback",
    }
}
