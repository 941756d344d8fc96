//! Minimal static ABI encoding for the handful of view functions we call.

use alloy_primitives::{keccak256, Address, U256};
use haus_core::{HausError, HausResult};

/// SortedOracles median rate, as a numerator/denominator pair.
pub const MEDIAN_RATE: &str = "medianRate(address)";
/// SortedOracles number of live reports.
pub const NUM_RATES: &str = "numRates(address)";
/// SortedOracles timestamp of the median report.
pub const MEDIAN_TIMESTAMP: &str = "medianTimestamp(address)";
/// SortedOracles expiry flag for the oldest report.
pub const IS_OLDEST_REPORT_EXPIRED: &str = "isOldestReportExpired(address)";
/// Mento exchange quote; the bool selects selling CELO.
pub const GET_BUY_TOKEN_AMOUNT: &str = "getBuyTokenAmount(uint256,bool)";
/// ERC-20 balance.
pub const BALANCE_OF: &str = "balanceOf(address)";

const WORD: usize = 32;

/// A static argument to a contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiArg {
    /// Left-padded 20-byte address.
    Address(Address),
    /// Big-endian 256-bit integer.
    Uint(U256),
    /// 0 or 1 in a full word.
    Bool(bool),
}

impl AbiArg {
    fn word(&self) -> [u8; WORD] {
        match self {
            AbiArg::Address(addr) => {
                let mut word = [0u8; WORD];
                word[12..].copy_from_slice(addr.as_slice());
                word
            }
            AbiArg::Uint(value) => value.to_be_bytes::<WORD>(),
            AbiArg::Bool(flag) => U256::from(u8::from(*flag)).to_be_bytes::<WORD>(),
        }
    }
}

/// First four bytes of the keccak hash of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// [`selector`] as lowercase hex without a `0x` prefix.
pub fn selector_hex(signature: &str) -> String {
    hex::encode(selector(signature))
}

/// Builds calldata: selector followed by one 32-byte word per argument.
pub fn encode_call(signature: &str, args: &[AbiArg]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&arg.word());
    }
    data
}

/// Reads the `index`-th 32-byte return word as an unsigned integer.
pub fn decode_uint(data: &[u8], index: usize) -> HausResult<U256> {
    let start = index * WORD;
    let end = start + WORD;
    if data.len() < end {
        return Err(HausError::Rpc(format!(
            "return data too short: {} bytes, need {end}",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[start..end]))
}

/// Reads the `index`-th return word as a bool; anything above 1 is an error.
pub fn decode_bool(data: &[u8], index: usize) -> HausResult<bool> {
    let value = decode_uint(data, index)?;
    if value > U256::from(1u8) {
        return Err(HausError::Rpc(format!("word {index} is not a bool")));
    }
    Ok(value == U256::from(1u8))
}
