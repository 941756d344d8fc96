#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the built-in skills.
//!
//! Runs every handler against an in-process chain whose oracle is offline, so
//! rates come from the fallback table, and a signer that records submissions.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use haus_builtins::{register_builtins, TEMPLATES};
use haus_core::{HausError, HausResult, SkillCategory, SkillOutput, TransactionKind};
use haus_market::abi;
use haus_market::{ChainReader, MarketAddresses, MarketData, WalletSigner};
use haus_security::SafetyPolicy;
use haus_skills::{ExecutionContext, SkillRegistry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const WALLET: &str = "0x1111111111111111111111111111111111111111";
const FRIEND: &str = "0x2222222222222222222222222222222222222222";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Chain with no oracle data. `balanceOf` answers come from `tokens`.
#[derive(Default)]
struct OfflineChain {
    tokens: HashMap<Address, U256>,
    native: Option<U256>,
}

#[async_trait]
impl ChainReader for OfflineChain {
    async fn call(&self, to: Address, data: Vec<u8>) -> HausResult<Vec<u8>> {
        if data[..4] == abi::selector(abi::BALANCE_OF) {
            if let Some(balance) = self.tokens.get(&to) {
                return Ok(balance.to_be_bytes::<32>().to_vec());
            }
        }
        Err(HausError::Rpc("execution reverted".into()))
    }

    async fn native_balance(&self, _address: Address) -> HausResult<U256> {
        self.native
            .ok_or_else(|| HausError::Rpc("eth_getBalance failed".into()))
    }

    async fn gas_price(&self) -> HausResult<U256> {
        Err(HausError::Rpc("eth_gasPrice failed".into()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Submitted {
    Native {
        index: u32,
        to: Address,
        amount: U256,
    },
    Token {
        token: Address,
        to: Address,
        amount: U256,
    },
    Exchange {
        exchange: Address,
        sell: U256,
        min_buy: U256,
        sell_gold: bool,
    },
}

#[derive(Default)]
struct RecordingSigner {
    submitted: Mutex<Vec<Submitted>>,
}

impl RecordingSigner {
    fn push(&self, call: Submitted) -> HausResult<String> {
        let mut submitted = self.submitted.lock();
        submitted.push(call);
        Ok(format!("0x{:064x}", submitted.len()))
    }

    fn submitted(&self) -> Vec<Submitted> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl WalletSigner for RecordingSigner {
    async fn send_native(&self, index: u32, to: Address, amount: U256) -> HausResult<String> {
        self.push(Submitted::Native { index, to, amount })
    }

    async fn send_token(
        &self,
        _index: u32,
        token: Address,
        to: Address,
        amount: U256,
    ) -> HausResult<String> {
        self.push(Submitted::Token { token, to, amount })
    }

    async fn exchange(
        &self,
        _index: u32,
        exchange: Address,
        sell_amount: U256,
        min_buy_amount: U256,
        sell_gold: bool,
    ) -> HausResult<String> {
        self.push(Submitted::Exchange {
            exchange,
            sell: sell_amount,
            min_buy: min_buy_amount,
            sell_gold,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn milli_ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(15u64))
}

fn token(symbol: &str) -> Address {
    MarketAddresses::celo_mainnet().stable(symbol).unwrap().token
}

fn setup(chain: OfflineChain, signer: Option<Arc<RecordingSigner>>) -> SkillRegistry {
    let market = Arc::new(MarketData::new(
        Arc::new(chain),
        MarketAddresses::celo_mainnet(),
    ));
    let signer = signer.map(|s| s as Arc<dyn WalletSigner>);
    let mut registry = SkillRegistry::new();
    register_builtins(&mut registry, market, signer).unwrap();
    registry
}

fn ctx() -> ExecutionContext {
    ExecutionContext::new("agent-1", SafetyPolicy::default()).with_wallet(WALLET, 7)
}

async fn exec(registry: &SkillRegistry, id: &str, params: &[&str]) -> HausResult<SkillOutput> {
    let params: Vec<String> = params.iter().map(|p| (*p).to_string()).collect();
    registry
        .handler(id)
        .unwrap()
        .execute(&params, &ctx())
        .await
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn registers_every_builtin_and_template() {
    let registry = setup(OfflineChain::default(), None);

    assert_eq!(registry.skill_count(), 11);
    assert_eq!(registry.template_ids(), ["custom", "forex", "payment", "social", "trading"]);
    for (template, skills) in TEMPLATES {
        assert_eq!(registry.list_for_template(template).len(), skills.len());
    }
    assert!(registry.template_skill_ids("social").unwrap().contains("tip"));
    assert!(!registry.template_skill_ids("payment").unwrap().contains("mento_swap"));

    let mutating: Vec<&str> = registry
        .list_all()
        .into_iter()
        .filter(|d| d.mutates_state)
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(mutating, ["send_celo", "send_token", "tip", "mento_swap"]);
    assert!(registry
        .list_all()
        .iter()
        .all(|d| d.mutates_state == d.requires_wallet));
    assert_eq!(registry.list_by_category(SkillCategory::Oracle).len(), 2);
}

#[test]
fn prompt_lists_template_markers() {
    let registry = setup(OfflineChain::default(), None);
    let prompt = SkillRegistry::prompt_instructions(&registry.list_for_template("payment"));

    assert!(prompt.contains("[[SEND_CELO|to|amount]]"));
    assert!(prompt.contains("[[QUERY_RATE|currency]]"));
    assert!(!prompt.contains("MENTO_SWAP"));
}

// ---------------------------------------------------------------------------
// Read skills
// ---------------------------------------------------------------------------

#[tokio::test]
async fn query_rate_renders_fallback() {
    let registry = setup(OfflineChain::default(), None);

    let out = exec(&registry, "query_rate", &["cusd"]).await.unwrap();

    assert_eq!(
        out.display,
        "CELO/cUSD: 1 CELO = 0.5500 cUSD, 1 cUSD = 1.8182 CELO (source: fallback, may be stale)"
    );
    assert_eq!(out.data.unwrap()["source"], "fallback");
}

#[tokio::test]
async fn query_rate_rejects_native() {
    let registry = setup(OfflineChain::default(), None);

    let err = exec(&registry, "query_rate", &["CELO"]).await.unwrap_err();

    assert!(matches!(err, HausError::Validation(_)));
}

#[tokio::test]
async fn query_all_rates_lists_four_pairs() {
    let registry = setup(OfflineChain::default(), None);

    let out = exec(&registry, "query_all_rates", &[]).await.unwrap();

    assert_eq!(out.display.matches("CELO/").count(), 4);
    assert!(out.display.contains("1 CELO = 70.0000 cKES"));
}

#[tokio::test]
async fn mento_quote_cross_stable() {
    let registry = setup(OfflineChain::default(), None);

    let out = exec(&registry, "mento_quote", &["cUSD", "cEUR", "100"]).await.unwrap();

    assert!(out.display.starts_with("100 cUSD -> ~90.909091 cEUR"));
    assert!(out.display.contains("slippage 0.8%"));
}

#[tokio::test]
async fn gas_price_marks_estimate() {
    let registry = setup(OfflineChain::default(), None);

    let out = exec(&registry, "gas_price", &[]).await.unwrap();

    assert_eq!(
        out.display,
        "Gas: base fee 5 gwei, tip 0.5 gwei, transfer ~0.000105 CELO (estimated)"
    );
}

#[tokio::test]
async fn check_balance_defaults_to_agent_wallet() {
    let chain = OfflineChain {
        tokens: HashMap::from([(token("cUSD"), milli_ether(2_500))]),
        native: Some(milli_ether(1_000)),
    };
    let registry = setup(chain, None);

    let out = exec(&registry, "check_balance", &[]).await.unwrap();

    assert_eq!(
        out.display,
        "Balance of 0x1111…1111: 1 CELO, 0 cEUR, 0 cKES, 0 cREAL, 2.5 cUSD"
    );
}

#[tokio::test]
async fn check_balance_rejects_bad_address() {
    let registry = setup(OfflineChain::default(), None);

    let err = exec(&registry, "check_balance", &["bob"]).await.unwrap_err();

    assert!(matches!(err, HausError::Validation(_)));
}

#[tokio::test]
async fn forex_cross_rate_from_fallback() {
    let registry = setup(OfflineChain::default(), None);

    let out = exec(&registry, "forex_analysis", &["cUSD", "cEUR"]).await.unwrap();

    assert!(out
        .display
        .starts_with("cUSD/cEUR: 1 cUSD = 0.9091 cEUR, 1 cEUR = 1.1000 cUSD via CELO"));
    assert!(out.display.contains("Indicative only"));
    let err = exec(&registry, "forex_analysis", &["ceur", "cEUR"]).await.unwrap_err();
    assert!(matches!(err, HausError::Validation(_)));
}

#[tokio::test]
async fn portfolio_values_holdings_in_cusd() {
    let chain = OfflineChain {
        tokens: HashMap::from([
            (token("cUSD"), milli_ether(5_000)),
            (token("cEUR"), milli_ether(5_000)),
        ]),
        native: Some(milli_ether(10_000)),
    };
    let registry = setup(chain, None);

    let out = exec(&registry, "portfolio_status", &[]).await.unwrap();

    // 10 CELO * 0.55 + 5 cUSD + 5 cEUR * (1 / 0.50) * 0.55
    let total = out.data.as_ref().unwrap()["totalUsd"].as_f64().unwrap();
    assert!((total - 16.0).abs() < 1e-9);
    assert!(out.display.contains("Total ~16.00 cUSD"));
    assert!(out.display.contains("fallback estimates"));
}

// ---------------------------------------------------------------------------
// Mutating skills
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_celo_without_signer_is_config_error() {
    let registry = setup(OfflineChain::default(), None);

    let err = exec(&registry, "send_celo", &[FRIEND, "1"]).await.unwrap_err();

    assert!(matches!(err, HausError::Config(_)));
}

#[tokio::test]
async fn send_celo_submits_native_transfer() {
    let signer = Arc::new(RecordingSigner::default());
    let registry = setup(OfflineChain::default(), Some(signer.clone()));

    let out = exec(&registry, "send_celo", &[FRIEND, "1.5"]).await.unwrap();

    assert_eq!(
        signer.submitted(),
        vec![Submitted::Native {
            index: 7,
            to: FRIEND.parse().unwrap(),
            amount: milli_ether(1_500),
        }]
    );
    let tx = out.transaction.unwrap();
    assert_eq!(tx.kind, TransactionKind::Send);
    assert_eq!(tx.amount, Some(1.5));
    assert!(out.display.starts_with("Sent 1.5 CELO to 0x2222…2222. Tx: 0x"));
}

#[tokio::test]
async fn send_token_resolves_symbol() {
    let signer = Arc::new(RecordingSigner::default());
    let registry = setup(OfflineChain::default(), Some(signer.clone()));

    let out = exec(&registry, "send_token", &["CEUR", FRIEND, "10"]).await.unwrap();

    assert!(matches!(
        signer.submitted()[0],
        Submitted::Token { token: t, .. } if t == token("cEUR")
    ));
    assert_eq!(out.transaction.unwrap().currency.as_deref(), Some("cEUR"));

    let err = exec(&registry, "send_token", &["DOGE", FRIEND, "10"]).await.unwrap_err();
    assert!(matches!(err, HausError::Validation(_)));
}

#[tokio::test]
async fn send_token_declares_spend_in_token_currency() {
    let registry = setup(OfflineChain::default(), None);
    let params = vec!["creal".to_string(), FRIEND.to_string(), "3".to_string()];

    let intent = registry
        .handler("send_token")
        .unwrap()
        .spend_intent(&params, &ctx())
        .unwrap()
        .unwrap();

    assert_eq!(intent.currency, "cREAL");
    assert_eq!(intent.destination.as_deref(), Some(FRIEND));
    assert!((intent.amount - 3.0).abs() < 1e-12);
}

#[tokio::test]
async fn tip_carries_note() {
    let signer = Arc::new(RecordingSigner::default());
    let registry = setup(OfflineChain::default(), Some(signer.clone()));

    let out = exec(&registry, "tip", &[FRIEND, "0.5", "great answer"]).await.unwrap();

    let tx = out.transaction.unwrap();
    assert_eq!(tx.kind, TransactionKind::Tip);
    assert_eq!(tx.description, "Tipped 0.5 CELO to 0x2222…2222 (great answer)");
}

#[tokio::test]
async fn mento_swap_uses_quote_minus_slippage() {
    let signer = Arc::new(RecordingSigner::default());
    let registry = setup(OfflineChain::default(), Some(signer.clone()));

    // Exchange read reverts, so the quote is the 0.5% oracle estimate: 5.5 cUSD.
    let out = exec(&registry, "mento_swap", &["CELO", "cUSD", "10"]).await.unwrap();

    let exchange = MarketAddresses::celo_mainnet()
        .stable("cUSD")
        .unwrap()
        .exchange
        .unwrap();
    assert_eq!(
        signer.submitted(),
        vec![Submitted::Exchange {
            exchange,
            sell: milli_ether(10_000),
            min_buy: U256::from(5_472_500u64) * U256::from(10u64).pow(U256::from(12u64)),
            sell_gold: true,
        }]
    );
    assert_eq!(out.transaction.unwrap().kind, TransactionKind::Swap);
}

#[tokio::test]
async fn mento_swap_requires_celo_side_with_exchange() {
    let signer = Arc::new(RecordingSigner::default());
    let registry = setup(OfflineChain::default(), Some(signer.clone()));

    let cross = exec(&registry, "mento_swap", &["cUSD", "cEUR", "10"]).await.unwrap_err();
    let no_exchange = exec(&registry, "mento_swap", &["CELO", "cKES", "10"]).await.unwrap_err();

    assert!(matches!(cross, HausError::Validation(_)));
    assert!(matches!(no_exchange, HausError::Validation(_)));
    assert!(signer.submitted().is_empty());
}
