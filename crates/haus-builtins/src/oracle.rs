use crate::args::source_label;
use async_trait::async_trait;
use haus_core::{
    HausError, HausResult, SkillCategory, SkillDefinition, SkillExample, SkillOutput, SkillParam,
};
use haus_market::{MarketAddresses, MarketData, OracleRate, NATIVE_SYMBOL};
use haus_skills::{ExecutionContext, SkillHandler};
use std::sync::Arc;

/// One-line rendering used by both rate skills.
pub(crate) fn render_rate(rate: &OracleRate) -> String {
    let symbol = rate
        .pair
        .split_once('/')
        .map_or(rate.pair.as_str(), |(_, s)| s);
    let mut line = format!(
        "{}: 1 {NATIVE_SYMBOL} = {:.4} {symbol}, 1 {symbol} = {:.4} {NATIVE_SYMBOL} (source: {}",
        rate.pair,
        rate.rate,
        rate.inverse,
        source_label(rate.source)
    );
    if rate.is_expired {
        line.push_str(", may be stale");
    }
    line.push(')');
    line
}

/// CELO price in one stable asset.
pub struct QueryRateSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
}

impl QueryRateSkill {
    /// Skill reading through `market`.
    pub fn new(market: Arc<MarketData>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "query_rate".into(),
                name: "Query Rate".into(),
                description: "Current CELO price in a Mento stable asset from the SortedOracles median.".into(),
                category: SkillCategory::Oracle,
                command_tag: "QUERY_RATE".into(),
                params: vec![SkillParam::required("currency", "Stable asset symbol", "cUSD")],
                examples: vec![SkillExample {
                    input: "What's CELO worth in euros?".into(),
                    output: "Checking the oracle: [[QUERY_RATE|cEUR]]".into(),
                }],
                requires_wallet: false,
                mutates_state: false,
            },
            market,
        }
    }
}

#[async_trait]
impl SkillHandler for QueryRateSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, params: &[String], _ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        if MarketAddresses::is_native(&params[0]) {
            return Err(HausError::Validation(
                "rates are quoted against a stable asset, e.g. cUSD".into(),
            ));
        }
        let rate = self.market.oracle_rate(&params[0]).await;
        Ok(SkillOutput::text(render_rate(&rate)).with_data(serde_json::to_value(&rate)?))
    }
}

/// CELO price in every supported stable asset.
pub struct QueryAllRatesSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
}

impl QueryAllRatesSkill {
    /// Skill reading through `market`.
    pub fn new(market: Arc<MarketData>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "query_all_rates".into(),
                name: "Query All Rates".into(),
                description: "CELO price in every supported Mento stable asset.".into(),
                category: SkillCategory::Oracle,
                command_tag: "QUERY_ALL_RATES".into(),
                params: vec![],
                examples: vec![SkillExample {
                    input: "Show me all the rates".into(),
                    output: "Here they are: [[QUERY_ALL_RATES]]".into(),
                }],
                requires_wallet: false,
                mutates_state: false,
            },
            market,
        }
    }
}

#[async_trait]
impl SkillHandler for QueryAllRatesSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, _params: &[String], _ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let rates = self.market.all_rates().await;
        let display = rates.iter().map(render_rate).collect::<Vec<_>>().join("; ");
        Ok(SkillOutput::text(display).with_data(serde_json::to_value(&rates)?))
    }
}
