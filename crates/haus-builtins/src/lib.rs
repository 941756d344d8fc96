//! Built-in skills for AgentHaus agents on Celo.
//!
//! Provides transfers, tips, balance and gas reads, Mento oracle rates, swap
//! quotes and swaps, forex cross rates and portfolio valuation. Read skills go
//! through an injected [`MarketData`]; mutating skills submit through a
//! [`WalletSigner`] supplied by the host.
//!
//! # Main entry points
//!
//! - [`register_builtins()`]: Register every built-in skill and the agent templates.
//! - [`TEMPLATES`]: The fixed skill set of each agent template.

mod args;
/// Balance, gas and portfolio reads.
pub mod data;
/// Mento quotes and swaps.
pub mod exchange;
/// Cross rates between stable assets.
pub mod forex;
/// Oracle rate queries.
pub mod oracle;
/// CELO and token transfers and tips.
pub mod transfer;

pub use data::{CheckBalanceSkill, GasPriceSkill, PortfolioStatusSkill};
pub use exchange::{MentoQuoteSkill, MentoSwapSkill};
pub use forex::ForexAnalysisSkill;
pub use oracle::{QueryAllRatesSkill, QueryRateSkill};
pub use transfer::{SendCeloSkill, SendTokenSkill, TipSkill};

use haus_core::HausResult;
use haus_market::{MarketData, WalletSigner};
use haus_skills::SkillRegistry;
use std::sync::Arc;

const TRADING_SKILLS: &[&str] = &[
    "send_celo",
    "send_token",
    "check_balance",
    "query_rate",
    "query_all_rates",
    "mento_quote",
    "mento_swap",
    "gas_price",
    "forex_analysis",
    "portfolio_status",
];

/// Agent templates and the skill ids each one enables.
pub const TEMPLATES: &[(&str, &[&str])] = &[
    (
        "payment",
        &["send_celo", "send_token", "check_balance", "query_rate", "gas_price"],
    ),
    ("trading", TRADING_SKILLS),
    ("forex", TRADING_SKILLS),
    ("social", &["send_celo", "send_token", "check_balance", "tip"]),
    (
        "custom",
        &[
            "send_celo",
            "send_token",
            "check_balance",
            "query_rate",
            "query_all_rates",
            "mento_quote",
            "gas_price",
        ],
    ),
];

/// Register all built-in skills and templates into the given registry.
///
/// Without a signer the mutating skills are still registered and fail with a
/// configuration error when invoked.
pub fn register_builtins(
    registry: &mut SkillRegistry,
    market: Arc<MarketData>,
    signer: Option<Arc<dyn WalletSigner>>,
) -> HausResult<()> {
    registry.register(Arc::new(SendCeloSkill::new(signer.clone())))?;
    registry.register(Arc::new(SendTokenSkill::new(&market, signer.clone())))?;
    registry.register(Arc::new(TipSkill::new(signer.clone())))?;
    registry.register(Arc::new(CheckBalanceSkill::new(market.clone())))?;
    registry.register(Arc::new(GasPriceSkill::new(market.clone())))?;
    registry.register(Arc::new(QueryRateSkill::new(market.clone())))?;
    registry.register(Arc::new(QueryAllRatesSkill::new(market.clone())))?;
    registry.register(Arc::new(MentoQuoteSkill::new(market.clone())))?;
    registry.register(Arc::new(MentoSwapSkill::new(market.clone(), signer)))?;
    registry.register(Arc::new(ForexAnalysisSkill::new(market.clone())))?;
    registry.register(Arc::new(PortfolioStatusSkill::new(market)))?;

    for (template, skills) in TEMPLATES {
        registry.define_template(template, skills.iter().copied())?;
    }
    Ok(())
}
