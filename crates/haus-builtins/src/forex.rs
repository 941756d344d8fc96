use crate::args::source_label;
use async_trait::async_trait;
use haus_core::{
    HausError, HausResult, SkillCategory, SkillDefinition, SkillExample, SkillOutput, SkillParam,
};
use haus_market::{MarketAddresses, MarketData, OracleRate, NATIVE_SYMBOL};
use haus_skills::{ExecutionContext, SkillHandler};
use std::sync::Arc;

/// Cross rate between two assets derived from their CELO oracle prices.
pub struct ForexAnalysisSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
}

impl ForexAnalysisSkill {
    /// Skill reading through `market`.
    pub fn new(market: Arc<MarketData>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "forex_analysis".into(),
                name: "Forex Analysis".into(),
                description: "Cross rate between two Mento assets (e.g. cUSD/cEUR) derived from the CELO oracle feeds.".into(),
                category: SkillCategory::Forex,
                command_tag: "FOREX_ANALYSIS".into(),
                params: vec![
                    SkillParam::required("base", "Base currency", "cUSD"),
                    SkillParam::required("quote", "Quote currency", "cEUR"),
                ],
                examples: vec![SkillExample {
                    input: "How is the dollar doing against the euro?".into(),
                    output: "Let me look: [[FOREX_ANALYSIS|cUSD|cEUR]]".into(),
                }],
                requires_wallet: false,
                mutates_state: false,
            },
            market,
        }
    }

    /// Units of `symbol` per CELO; `None` for CELO itself.
    async fn per_celo(&self, symbol: &str) -> Option<OracleRate> {
        if MarketAddresses::is_native(symbol) {
            None
        } else {
            Some(self.market.oracle_rate(symbol).await)
        }
    }
}

#[async_trait]
impl SkillHandler for ForexAnalysisSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, params: &[String], _ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let addresses = self.market.addresses();
        let base = addresses.canonical_symbol(&params[0]);
        let quote = addresses.canonical_symbol(&params[1]);
        if base == quote {
            return Err(HausError::Validation(format!(
                "base and quote are both {base}"
            )));
        }

        let (base_rate, quote_rate) = tokio::join!(self.per_celo(&base), self.per_celo(&quote));
        let base_per_celo = base_rate.as_ref().map_or(1.0, |r| r.rate);
        let quote_per_celo = quote_rate.as_ref().map_or(1.0, |r| r.rate);
        if base_per_celo <= 0.0 {
            return Err(HausError::Execution(format!("no usable rate for {base}")));
        }
        let cross = quote_per_celo / base_per_celo;

        let sources: Vec<String> = [&base_rate, &quote_rate]
            .into_iter()
            .flatten()
            .map(|r| format!("{} {}", r.pair, source_label(r.source)))
            .collect();
        let stale = [&base_rate, &quote_rate]
            .into_iter()
            .flatten()
            .any(|r| r.is_expired);

        let mut display = format!(
            "{base}/{quote}: 1 {base} = {cross:.4} {quote}, 1 {quote} = {:.4} {base} via {NATIVE_SYMBOL} ({})",
            if cross > 0.0 { 1.0 / cross } else { 0.0 },
            sources.join(", ")
        );
        if stale {
            display.push_str(". Indicative only: at least one feed is stale");
        }

        Ok(SkillOutput::text(display).with_data(serde_json::json!({
            "pair": format!("{base}/{quote}"),
            "rate": cross,
            "basePerCelo": base_per_celo,
            "quotePerCelo": quote_per_celo,
            "stale": stale,
        })))
    }
}
