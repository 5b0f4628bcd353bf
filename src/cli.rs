//! CLI argument parsing

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};

use crate::explorer::Network;
use crate::snapshot::TokenSpec;

#[derive(Parser, Debug)]
#[command(name = "airdrop-survey")]
#[command(about = "Operational survey tooling around the airdrop contract", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Harvest contract interactions from the block explorer and write reports
    Scan {
        /// Contract addresses to query (repeatable, or comma-separated via env)
        #[arg(
            short,
            long = "contract",
            env = "AIRDROP_CONTRACTS",
            value_delimiter = ',',
            required = true,
            num_args = 1..
        )]
        contracts: Vec<Address>,

        /// Network whose explorer API to query
        #[arg(long, value_enum, default_value = "fraxtal")]
        network: Network,

        /// Explorer API key
        #[arg(long, env = "EXPLORER_API_KEY")]
        api_key: Option<String>,

        /// Results per page (provider limit is 1000)
        #[arg(long, default_value_t = 1000)]
        page_size: u32,

        /// Delay between page requests, in milliseconds
        #[arg(long, default_value_t = 300)]
        page_delay_ms: u64,

        /// Directory for generated report artifacts
        #[arg(short, long, default_value = "contract_interaction_reports")]
        output_dir: PathBuf,
    },

    /// Reconcile the balances file against the whitelist in the contract source
    Verify {
        /// Balances file with ["0x...", "amount"] pairs
        #[arg(long, default_value = "scripts/airdrop_balances.json")]
        balances: PathBuf,

        /// Contract source containing the _whitelist() section
        #[arg(long, env = "AIRDROP_CONTRACT_SOURCE", default_value = "contracts/SquillDrop.vy")]
        contract_source: PathBuf,

        /// Where to write the JSON verification report
        #[arg(long, default_value = "scripts/verification_report.json")]
        report: PathBuf,
    },

    /// Snapshot token balances for previously harvested addresses at a block
    Snapshot {
        /// JSON-RPC endpoint
        #[arg(long, env = "RPC_URL", default_value = "https://rpc.frax.com")]
        rpc_url: String,

        /// Block height to pin balance queries to
        #[arg(long)]
        block: u64,

        /// Raw interactions JSON produced by `scan`
        #[arg(long)]
        interactions: PathBuf,

        /// Token contracts to read, as name=address pairs (repeatable)
        #[arg(long = "token", required = true, num_args = 1..)]
        tokens: Vec<TokenSpec>,

        /// Directory for the balance artifact
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}
