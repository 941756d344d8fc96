use crate::args;
use async_trait::async_trait;
use haus_core::{
    HausError, HausResult, SkillCategory, SkillDefinition, SkillExample, SkillOutput, SkillParam,
    TransactionKind, TransactionRecord, TransactionStatus,
};
use haus_market::units::{self, TOKEN_DECIMALS};
use haus_market::{MarketAddresses, MarketData, QuoteSource, SwapQuote, WalletSigner};
use haus_security::SpendIntent;
use haus_skills::{ExecutionContext, SkillHandler};
use std::sync::Arc;
use tracing::info;

fn quote_source_label(source: QuoteSource) -> &'static str {
    match source {
        QuoteSource::DirectExchange => "Mento exchange",
        QuoteSource::Estimated => "oracle estimate",
    }
}

fn render_quote(quote: &SwapQuote) -> String {
    format!(
        "{} {} -> ~{} {} (rate {:.4}, slippage {}%, {})",
        quote.sell_amount,
        quote.sell_currency,
        quote.buy_amount,
        quote.buy_currency,
        quote.rate,
        quote.slippage,
        quote_source_label(quote.source)
    )
}

fn swap_params() -> Vec<SkillParam> {
    vec![
        SkillParam::required("sell", "Currency to sell", "CELO"),
        SkillParam::required("buy", "Currency to buy", "cUSD"),
        SkillParam::required("amount", "Amount to sell", "10"),
    ]
}

/// Quotes a swap without executing it.
pub struct MentoQuoteSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
}

impl MentoQuoteSkill {
    /// Skill quoting through `market`.
    pub fn new(market: Arc<MarketData>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "mento_quote".into(),
                name: "Mento Quote".into(),
                description: "Quote a swap between CELO and Mento stables without executing it.".into(),
                category: SkillCategory::Exchange,
                command_tag: "MENTO_QUOTE".into(),
                params: swap_params(),
                examples: vec![SkillExample {
                    input: "How much cUSD would I get for 10 CELO?".into(),
                    output: "Let me check: [[MENTO_QUOTE|CELO|cUSD|10]]".into(),
                }],
                requires_wallet: false,
                mutates_state: false,
            },
            market,
        }
    }
}

#[async_trait]
impl SkillHandler for MentoQuoteSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, params: &[String], _ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let quote = self.market.quote(&params[0], &params[1], &params[2]).await?;
        Ok(SkillOutput::text(render_quote(&quote)).with_data(serde_json::to_value(&quote)?))
    }
}

/// Executes a CELO <-> stable swap on the legacy Mento exchange.
pub struct MentoSwapSkill {
    definition: SkillDefinition,
    market: Arc<MarketData>,
    signer: Option<Arc<dyn WalletSigner>>,
}

impl MentoSwapSkill {
    /// Skill quoting through `market` and submitting through `signer`.
    pub fn new(market: Arc<MarketData>, signer: Option<Arc<dyn WalletSigner>>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "mento_swap".into(),
                name: "Mento Swap".into(),
                description: "Swap CELO for a Mento stable or back. The minimum received is the quote less its slippage.".into(),
                category: SkillCategory::Exchange,
                command_tag: "MENTO_SWAP".into(),
                params: swap_params(),
                examples: vec![SkillExample {
                    input: "Swap 5 CELO into cUSD".into(),
                    output: "Swapping: [[MENTO_SWAP|CELO|cUSD|5]]".into(),
                }],
                requires_wallet: true,
                mutates_state: true,
            },
            market,
            signer,
        }
    }
}

#[async_trait]
impl SkillHandler for MentoSwapSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    fn spend_intent(
        &self,
        params: &[String],
        _ctx: &ExecutionContext,
    ) -> HausResult<Option<SpendIntent>> {
        let amount = units::parse_amount(&params[2])?;
        let currency = self.market.addresses().canonical_symbol(&params[0]);
        Ok(Some(SpendIntent::new(amount, currency)))
    }

    async fn execute(&self, params: &[String], ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let addresses = self.market.addresses();
        let (stable, sell_gold) = if MarketAddresses::is_native(&params[0]) {
            (&params[1], true)
        } else if MarketAddresses::is_native(&params[1]) {
            (&params[0], false)
        } else {
            return Err(HausError::Validation(
                "swaps must have CELO on one side".into(),
            ));
        };
        let exchange = addresses
            .stable(stable)
            .and_then(|asset| asset.exchange)
            .ok_or_else(|| {
                HausError::Validation(format!("no Mento exchange for '{stable}'"))
            })?;
        let signer = args::signer(&self.signer)?;
        let index = args::derivation_index(ctx)?;

        let quote = self.market.quote(&params[0], &params[1], &params[2]).await?;
        let sell_wei = units::parse_units(&params[2], TOKEN_DECIMALS)?;
        let min_buy_wei = units::parse_units(&format!("{:.6}", quote.min_buy_amount()), TOKEN_DECIMALS)?;

        let hash = signer
            .exchange(index, exchange, sell_wei, min_buy_wei, sell_gold)
            .await?;
        info!(
            agent_id = %ctx.agent_id,
            tx_hash = %hash,
            sell = %quote.sell_currency,
            buy = %quote.buy_currency,
            "Swap submitted"
        );

        let description = format!(
            "Swapped {} {} for ~{} {}",
            quote.sell_amount, quote.sell_currency, quote.buy_amount, quote.buy_currency
        );
        let amount = units::parse_amount(&quote.sell_amount)?;
        Ok(SkillOutput::text(format!("{description}. Tx: {hash}"))
            .with_data(serde_json::json!({
                "txHash": hash,
                "quote": quote,
                "minBuyAmount": quote.min_buy_amount(),
            }))
            .with_transaction(TransactionRecord {
                hash,
                kind: TransactionKind::Swap,
                status: TransactionStatus::Pending,
                description,
                amount: Some(amount),
                currency: Some(quote.sell_currency.clone()),
                to: Some(exchange.to_string()),
            }))
    }
}
