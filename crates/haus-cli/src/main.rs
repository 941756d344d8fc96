//! `haus`: command-line front end for the AgentHaus skill engine.

use clap::{Parser, Subcommand};
use haus_agent::{AgentConfig, EngineConfig, RpcConfig, StreamEvent, TurnProcessor};
use haus_core::SkillCategory;
use haus_security::SafetyPolicy;
use haus_skills::SkillRegistry;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "haus", about = "AgentHaus skill engine for Celo agents")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "haus.toml")]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered skills
    Skills {
        /// Only skills enabled by this template
        #[arg(long)]
        template: Option<String>,
        /// Only skills in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Print the system-prompt section for a template
    Prompt {
        #[arg(long)]
        template: Option<String>,
    },
    /// CELO price in one stable asset
    Rate { symbol: String },
    /// CELO price in every supported stable asset
    Rates,
    /// Quote a swap
    Quote {
        sell: String,
        buy: String,
        amount: String,
    },
    /// Current gas price
    Gas,
    /// Balances of an address
    Balance { address: String },
    /// Run one agent reply from stdin through the engine
    Turn {
        /// Print the turn summary as JSON to stderr
        #[arg(long)]
        summary: bool,
    },
}

#[derive(Deserialize, Default)]
struct HausConfig {
    #[serde(default)]
    rpc: RpcConfig,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    agent: AgentConfig,
    #[serde(default)]
    safety: SafetyPolicy,
}

async fn load_config(path: &Path) -> anyhow::Result<HausConfig> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(HausConfig::default());
    }
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
    })?;
    Ok(toml::from_str(&raw)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_skills(
    registry: &SkillRegistry,
    template: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let mut skills = match template {
        Some(t) => registry.list_for_template(t),
        None => registry.list_all(),
    };
    if let Some(c) = category {
        let category = SkillCategory::parse(c)
            .ok_or_else(|| anyhow::anyhow!("Unknown category '{c}'"))?;
        skills.retain(|d| d.category == category);
    }
    for def in skills {
        let flags = match (def.mutates_state, def.requires_wallet) {
            (true, _) => " [mutating]",
            (false, true) => " [wallet]",
            (false, false) => "",
        };
        println!(
            "{:<18} {:<10} {}{flags}",
            def.id,
            def.category.as_str(),
            def.marker_syntax()
        );
    }
    Ok(())
}

async fn run_turn(
    processor: &TurnProcessor,
    config: &HausConfig,
    print_summary: bool,
) -> anyhow::Result<()> {
    let mut ctx = config
        .agent
        .context(config.safety.clone(), processor.registry());

    let (events_tx, events_rx) = mpsc::channel(32);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => StreamEvent::text(format!("{line}\n")),
                Ok(None) => StreamEvent::Done,
                Err(e) => StreamEvent::Error {
                    message: e.to_string(),
                },
            };
            let last = !matches!(event, StreamEvent::TextDelta { .. });
            if events_tx.send(event).await.is_err() || last {
                break;
            }
        }
    });

    let (output_tx, mut output_rx) = mpsc::channel::<String>(32);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(fragment) = output_rx.recv().await {
            if stdout.write_all(fragment.as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let summary = processor.process(events_rx, output_tx, &mut ctx).await?;
    let _ = reader.await;
    let _ = writer.await;

    info!(
        commands = summary.outcomes.len(),
        pending = summary.pending.len(),
        spending_used = ctx.policy.spending_used,
        "Turn complete"
    );
    if print_summary {
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(&cli.config).await?;
    let processor = TurnProcessor::from_config(&config.rpc, &config.engine, None)?;
    let market = processor.market();

    match cli.command {
        Commands::Skills { template, category } => {
            list_skills(processor.registry(), template.as_deref(), category.as_deref())?;
        }
        Commands::Prompt { template } => {
            let registry = processor.registry();
            let template = template.or_else(|| config.agent.template.clone());
            let skills = match template.as_deref() {
                Some(t) => registry.list_for_template(t),
                None => registry.list_all(),
            };
            println!("{}", SkillRegistry::prompt_instructions(&skills));
        }
        Commands::Rate { symbol } => print_json(&market.oracle_rate(&symbol).await)?,
        Commands::Rates => print_json(&market.all_rates().await)?,
        Commands::Quote { sell, buy, amount } => {
            print_json(&market.quote(&sell, &buy, &amount).await?)?;
        }
        Commands::Gas => print_json(&market.gas_price().await)?,
        Commands::Balance { address } => print_json(&market.balances(&address).await?)?,
        Commands::Turn { summary } => run_turn(&processor, &config, summary).await?,
    }

    Ok(())
}
