use crate::args::{self, short};
use async_trait::async_trait;
use haus_core::{
    HausError, HausResult, SkillCategory, SkillDefinition, SkillExample, SkillOutput, SkillParam,
    TransactionKind, TransactionRecord, TransactionStatus,
};
use haus_market::units::{self, TOKEN_DECIMALS};
use haus_market::{MarketAddresses, MarketData, WalletSigner, NATIVE_SYMBOL};
use haus_security::SpendIntent;
use haus_skills::{ExecutionContext, SkillHandler};
use std::sync::Arc;
use tracing::info;

const EXAMPLE_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

/// Sends native CELO from the agent wallet.
pub struct SendCeloSkill {
    definition: SkillDefinition,
    signer: Option<Arc<dyn WalletSigner>>,
}

impl SendCeloSkill {
    /// Skill submitting through `signer`; without one it fails with a configuration error.
    pub fn new(signer: Option<Arc<dyn WalletSigner>>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "send_celo".into(),
                name: "Send CELO".into(),
                description: "Send native CELO from the agent wallet to an address.".into(),
                category: SkillCategory::Transfer,
                command_tag: "SEND_CELO".into(),
                params: vec![
                    SkillParam::required("to", "Recipient address", EXAMPLE_ADDRESS),
                    SkillParam::required("amount", "Amount of CELO", "1.5"),
                ],
                examples: vec![SkillExample {
                    input: "Send 2 CELO to 0x742d...f44e".into(),
                    output: format!("Sending now. [[SEND_CELO|{EXAMPLE_ADDRESS}|2]]"),
                }],
                requires_wallet: true,
                mutates_state: true,
            },
            signer,
        }
    }
}

#[async_trait]
impl SkillHandler for SendCeloSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    fn spend_intent(
        &self,
        params: &[String],
        _ctx: &ExecutionContext,
    ) -> HausResult<Option<SpendIntent>> {
        let amount = units::parse_amount(&params[1])?;
        Ok(Some(SpendIntent::new(amount, NATIVE_SYMBOL).to(params[0].trim())))
    }

    async fn execute(&self, params: &[String], ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let to = args::parse_address(&params[0])?;
        let amount = units::parse_amount(&params[1])?;
        let wei = units::parse_units(&params[1], TOKEN_DECIMALS)?;
        let signer = args::signer(&self.signer)?;
        let index = args::derivation_index(ctx)?;

        let hash = signer.send_native(index, to, wei).await?;
        info!(agent_id = %ctx.agent_id, tx_hash = %hash, amount, "CELO sent");

        let to = to.to_string();
        Ok(transfer_output(
            TransactionKind::Send,
            &hash,
            amount,
            NATIVE_SYMBOL,
            &to,
            format!("Sent {amount} {NATIVE_SYMBOL} to {}", short(&to)),
        ))
    }
}

/// Sends a Mento stable token (cUSD, cEUR, cREAL, cKES).
pub struct SendTokenSkill {
    definition: SkillDefinition,
    addresses: MarketAddresses,
    signer: Option<Arc<dyn WalletSigner>>,
}

impl SendTokenSkill {
    /// Skill resolving token contracts from `market` and submitting through `signer`.
    pub fn new(market: &MarketData, signer: Option<Arc<dyn WalletSigner>>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "send_token".into(),
                name: "Send Token".into(),
                description: "Send a Mento stable token (cUSD, cEUR, cREAL, cKES) from the agent wallet.".into(),
                category: SkillCategory::Transfer,
                command_tag: "SEND_TOKEN".into(),
                params: vec![
                    SkillParam::required("token", "Token symbol", "cUSD"),
                    SkillParam::required("to", "Recipient address", EXAMPLE_ADDRESS),
                    SkillParam::required("amount", "Token amount", "10"),
                ],
                examples: vec![SkillExample {
                    input: "Pay 10 cUSD to 0x742d...f44e".into(),
                    output: format!("Done soon. [[SEND_TOKEN|cUSD|{EXAMPLE_ADDRESS}|10]]"),
                }],
                requires_wallet: true,
                mutates_state: true,
            },
            addresses: market.addresses().clone(),
            signer,
        }
    }
}

#[async_trait]
impl SkillHandler for SendTokenSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    fn spend_intent(
        &self,
        params: &[String],
        _ctx: &ExecutionContext,
    ) -> HausResult<Option<SpendIntent>> {
        let amount = units::parse_amount(&params[2])?;
        let currency = self.addresses.canonical_symbol(&params[0]);
        Ok(Some(SpendIntent::new(amount, currency).to(params[1].trim())))
    }

    async fn execute(&self, params: &[String], ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let asset = self.addresses.stable(&params[0]).ok_or_else(|| {
            HausError::Validation(format!("unsupported token '{}'", params[0]))
        })?;
        let to = args::parse_address(&params[1])?;
        let amount = units::parse_amount(&params[2])?;
        let wei = units::parse_units(&params[2], TOKEN_DECIMALS)?;
        let signer = args::signer(&self.signer)?;
        let index = args::derivation_index(ctx)?;

        let hash = signer.send_token(index, asset.token, to, wei).await?;
        info!(agent_id = %ctx.agent_id, tx_hash = %hash, token = asset.symbol, amount, "Token sent");

        let to = to.to_string();
        Ok(transfer_output(
            TransactionKind::Send,
            &hash,
            amount,
            asset.symbol,
            &to,
            format!("Sent {amount} {} to {}", asset.symbol, short(&to)),
        ))
    }
}

/// Tips an address in CELO with an optional note.
pub struct TipSkill {
    definition: SkillDefinition,
    signer: Option<Arc<dyn WalletSigner>>,
}

impl TipSkill {
    /// Skill submitting through `signer`.
    pub fn new(signer: Option<Arc<dyn WalletSigner>>) -> Self {
        Self {
            definition: SkillDefinition {
                id: "tip".into(),
                name: "Tip".into(),
                description: "Send a small CELO tip to a community member.".into(),
                category: SkillCategory::Social,
                command_tag: "TIP".into(),
                params: vec![
                    SkillParam::required("to", "Recipient address", EXAMPLE_ADDRESS),
                    SkillParam::required("amount", "Amount of CELO", "0.5"),
                    SkillParam::optional("note", "Message for the recipient", "great answer"),
                ],
                examples: vec![SkillExample {
                    input: "Tip 0x742d...f44e half a CELO for the help".into(),
                    output: format!("Thanks for helping! [[TIP|{EXAMPLE_ADDRESS}|0.5|for the help]]"),
                }],
                requires_wallet: true,
                mutates_state: true,
            },
            signer,
        }
    }
}

#[async_trait]
impl SkillHandler for TipSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    fn spend_intent(
        &self,
        params: &[String],
        _ctx: &ExecutionContext,
    ) -> HausResult<Option<SpendIntent>> {
        let amount = units::parse_amount(&params[1])?;
        Ok(Some(SpendIntent::new(amount, NATIVE_SYMBOL).to(params[0].trim())))
    }

    async fn execute(&self, params: &[String], ctx: &ExecutionContext) -> HausResult<SkillOutput> {
        let to = args::parse_address(&params[0])?;
        let amount = units::parse_amount(&params[1])?;
        let wei = units::parse_units(&params[1], TOKEN_DECIMALS)?;
        let signer = args::signer(&self.signer)?;
        let index = args::derivation_index(ctx)?;

        let hash = signer.send_native(index, to, wei).await?;
        info!(agent_id = %ctx.agent_id, tx_hash = %hash, amount, "Tip sent");

        let to = to.to_string();
        let mut description = format!("Tipped {amount} {NATIVE_SYMBOL} to {}", short(&to));
        if let Some(note) = args::optional(params, 2) {
            description.push_str(&format!(" ({note})"));
        }
        Ok(transfer_output(
            TransactionKind::Tip,
            &hash,
            amount,
            NATIVE_SYMBOL,
            &to,
            description,
        ))
    }
}

fn transfer_output(
    kind: TransactionKind,
    hash: &str,
    amount: f64,
    currency: &str,
    to: &str,
    description: String,
) -> SkillOutput {
    let display = format!("{description}. Tx: {hash}");
    SkillOutput::text(display)
        .with_data(serde_json::json!({
            "txHash": hash,
            "amount": amount,
            "currency": currency,
            "to": to,
        }))
        .with_transaction(TransactionRecord {
            hash: hash.to_string(),
            kind,
            status: TransactionStatus::Pending,
            description,
            amount: Some(amount),
            currency: Some(currency.to_string()),
            to: Some(to.to_string()),
        })
}
