use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airdrop_survey::cli::{Cli, Command};
use airdrop_survey::error::WhitelistError;
use airdrop_survey::explorer::{ExplorerClient, Network};
use airdrop_survey::interactions::scan_contracts;
use airdrop_survey::reconcile;
use airdrop_survey::report;
use airdrop_survey::snapshot::{self, TokenSpec};
use airdrop_survey::whitelist::{self, Whitelist};

use alloy_primitives::Address;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            contracts,
            network,
            api_key,
            page_size,
            page_delay_ms,
            output_dir,
        } => {
            run_scan(
                contracts,
                network,
                api_key,
                page_size,
                page_delay_ms,
                output_dir,
            )
            .await
        }
        Command::Verify {
            balances,
            contract_source,
            report,
        } => run_verify(balances, contract_source, report),
        Command::Snapshot {
            rpc_url,
            block,
            interactions,
            tokens,
            output_dir,
        } => run_snapshot(rpc_url, block, interactions, tokens, output_dir).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run_scan(
    contracts: Vec<Address>,
    network: Network,
    api_key: Option<String>,
    page_size: u32,
    page_delay_ms: u64,
    output_dir: PathBuf,
) -> Result<()> {
    let client = ExplorerClient::new(network, api_key, page_size);
    let map = scan_contracts(&client, &contracts, Duration::from_millis(page_delay_ms)).await;

    let paths = report::write_reports(&map, &contracts, &output_dir)?;

    let summary = report::build_summary(&map, &contracts);
    println!("{}", report::render_text_report(&summary, &paths));

    Ok(())
}

fn run_verify(balances: PathBuf, contract_source: PathBuf, report_path: PathBuf) -> Result<()> {
    let file_whitelist = whitelist::parse_balances_file(&balances)
        .with_context(|| format!("Failed to load balances file {:?}", balances))?;
    info!(
        "Loaded {} addresses from {}",
        file_whitelist.len(),
        balances.display()
    );

    let contract_whitelist = match whitelist::parse_contract_source(&contract_source) {
        Ok(parsed) => parsed,
        Err(WhitelistError::WhitelistSectionNotFound) => {
            warn!(
                "No _whitelist() section in {}; treating the contract whitelist as empty",
                contract_source.display()
            );
            Whitelist::new()
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to parse contract source {:?}", contract_source)
            })
        }
    };
    info!(
        "Found {} addresses in {}",
        contract_whitelist.len(),
        contract_source.display()
    );

    let outcome = reconcile::reconcile(&file_whitelist, &contract_whitelist);
    println!("{}", reconcile::render_human(&outcome));

    let json = serde_json::to_string_pretty(&outcome)
        .context("Failed to serialize verification report")?;
    fs::write(&report_path, json)
        .with_context(|| format!("Failed to write verification report {:?}", report_path))?;
    info!(
        "Detailed verification report saved to {}",
        report_path.display()
    );

    Ok(())
}

async fn run_snapshot(
    rpc_url: String,
    block: u64,
    interactions: PathBuf,
    tokens: Vec<TokenSpec>,
    output_dir: PathBuf,
) -> Result<()> {
    let accounts = snapshot::load_interaction_accounts(&interactions)?;
    info!(
        "Snapshotting {} tokens for {} addresses at block {}",
        tokens.len(),
        accounts.len(),
        block
    );

    let table = snapshot::snapshot_balances(&rpc_url, block, &accounts, &tokens).await?;
    snapshot::write_snapshot(&table, block, &output_dir)?;

    Ok(())
}
