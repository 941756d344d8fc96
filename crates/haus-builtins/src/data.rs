use crate::args::{self, short};
use async_trait::async_trait;
use haus_core::{HausError, HausResult, SkillCategory, SkillDefinition, SkillOutput, SkillParam};
use haus_market::{MarketData, NATIVE_SYMBOL};
use haus_skills::{ExecutionContext, SkillHandler};
use std::sync::Arc;

/// Stable every portfolio is valued in.
const VALUATION_SYMBOL: &str = "cUSD";

/// Address to read: the explicit param, else the agent's own wallet.
fn target_address(params: &[String], ctx: &ExecutionContext) -> HausResult<String> {
    args::optional(params, 0)
        .map(str::to_string)
        .or_else(|| ctx.wallet_address.clone())
        .ok_or_else(|| {
            HausError::Config("no address given and the agent has no wallet".into())
        })
}

/// Native and stable balances of the agent wallet or a given address.
pub struct CheckBalanceSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
}

impl CheckBalanceSkill {
    /// Skill reading through `market`.
    pub fn new(market: Arc<MarketData>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "check_balance".into(),
                name: "Check Balance".into(),
                description: "Show CELO and stable token balances of an address, or of the agent wallet when none is given.".into(),
                category: SkillCategory::Data,
                command_tag: "CHECK_BALANCE".into(),
                params: vec![SkillParam::optional(
                    "address",
                    "Address to check",
                    "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
                )],
                examples: vec![],
                requires_wallet: false,
                mutates_state: false,
            },
            market,
        }
    }
}

#[async_trait]
impl SkillHandler for CheckBalanceSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, params: &[String], ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let address = target_address(params, ctx)?;
        let balance = self.market.balances(&address).await?;

        let mut parts = vec![format!("{} {NATIVE_SYMBOL}", balance.celo)];
        parts.extend(
            balance
                .tokens
                .iter()
                .map(|(symbol, amount)| format!("{amount} {symbol}")),
        );
        let display = format!("Balance of {}: {}", short(&balance.address), parts.join(", "));
        Ok(SkillOutput::text(display).with_data(serde_json::to_value(&balance)?))
    }
}

/// Current gas price and transfer cost.
pub struct GasPriceSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
}

impl GasPriceSkill {
    /// Skill reading through `market`.
    pub fn new(market: Arc<MarketData>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "gas_price".into(),
                name: "Gas Price".into(),
                description: "Current Celo gas price and the cost of a simple transfer.".into(),
                category: SkillCategory::Data,
                command_tag: "GAS_PRICE".into(),
                params: vec![],
                examples: vec![],
                requires_wallet: false,
                mutates_state: false,
            },
            market,
        }
    }
}

#[async_trait]
impl SkillHandler for GasPriceSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, _params: &[String], _ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let gas = self.market.gas_price().await;
        let mut display = format!(
            "Gas: base fee {} gwei, tip {} gwei, transfer ~{} {NATIVE_SYMBOL}",
            gas.base_fee, gas.suggested_tip, gas.estimated_cost
        );
        if gas.is_fallback {
            display.push_str(" (estimated)");
        }
        Ok(SkillOutput::text(display).with_data(serde_json::to_value(&gas)?))
    }
}

/// Values a wallet's holdings in cUSD through the oracle rates.
pub struct PortfolioStatusSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
}

impl PortfolioStatusSkill {
    /// Skill reading through `market`.
    pub fn new(market: Arc<MarketData>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "portfolio_status".into(),
                name: "Portfolio Status".into(),
                description: "Holdings of the agent wallet with their approximate value in cUSD.".into(),
                category: SkillCategory::Data,
                command_tag: "PORTFOLIO_STATUS".into(),
                params: vec![SkillParam::optional(
                    "address",
                    "Address to value",
                    "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
                )],
                examples: vec![],
                requires_wallet: false,
                mutates_state: false,
            },
            market,
        }
    }
}

#[async_trait]
impl SkillHandler for PortfolioStatusSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, params: &[String], ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let address = target_address(params, ctx)?;
        let (balance, rates) = tokio::join!(self.market.balances(&address), self.market.all_rates());
        let balance = balance?;

        // Stable units per CELO, keyed by pair label.
        let per_celo = |symbol: &str| {
            let pair = format!("{NATIVE_SYMBOL}/{symbol}");
            rates.iter().find(|r| r.pair == pair)
        };
        let Some(usd) = per_celo(VALUATION_SYMBOL) else {
            return Err(HausError::Execution("no cUSD rate available".into()));
        };
        let estimated = rates.iter().any(|r| r.is_expired);

        let celo: f64 = balance.celo.parse().unwrap_or(0.0);
        let mut holdings = vec![serde_json::json!({
            "symbol": NATIVE_SYMBOL,
            "amount": balance.celo,
            "valueUsd": celo * usd.rate,
        })];
        let mut total = celo * usd.rate;
        let mut lines = vec![format!("{} {NATIVE_SYMBOL} (~{:.2} cUSD)", balance.celo, celo * usd.rate)];

        for (symbol, amount) in &balance.tokens {
            let held: f64 = amount.parse().unwrap_or(0.0);
            let value = if symbol == VALUATION_SYMBOL {
                held
            } else {
                per_celo(symbol).map_or(0.0, |r| held * r.inverse * usd.rate)
            };
            total += value;
            lines.push(format!("{amount} {symbol} (~{value:.2} cUSD)"));
            holdings.push(serde_json::json!({
                "symbol": symbol,
                "amount": amount,
                "valueUsd": value,
            }));
        }

        let mut display = format!(
            "Portfolio of {}: {}. Total ~{total:.2} cUSD",
            short(&balance.address),
            lines.join(", ")
        );
        if estimated {
            display.push_str(" (some rates are fallback estimates)");
        }
        Ok(SkillOutput::text(display).with_data(serde_json::json!({
            "address": balance.address,
            "holdings": holdings,
            "totalUsd": total,
            "estimated": estimated,
        })))
    }
}
