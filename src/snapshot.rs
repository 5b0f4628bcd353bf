use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy::eips::BlockId;
use alloy::providers::ProviderBuilder;
use alloy::sol;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use tracing::info;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

/// A token to read balances from, given on the command line as `name=0x...`.
#[derive(Debug, Clone)]
pub struct TokenSpec {
    pub name: String,
    pub address: Address,
}

impl FromStr for TokenSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, address) = s
            .split_once('=')
            .with_context(|| format!("expected name=address, got {:?}", s))?;

        Ok(Self {
            name: name.trim().to_string(),
            address: address
                .trim()
                .parse()
                .with_context(|| format!("invalid token address in {:?}", s))?,
        })
    }
}

/// Checksummed account -> token name -> balance as a decimal string.
pub type BalanceTable = BTreeMap<String, BTreeMap<String, String>>;

/// Read the account list back out of a raw interactions artifact written by
/// the scan reports (a JSON map of address -> interacted contracts).
pub fn load_interaction_accounts(path: &Path) -> Result<Vec<Address>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read interactions file {:?}", path))?;

    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse interactions file {:?}", path))?;

    raw.keys()
        .map(|key| {
            key.parse::<Address>()
                .with_context(|| format!("invalid address key {:?} in {:?}", key, path))
        })
        .collect()
}

/// Query `balanceOf` for every account on every token, pinned to `block`.
/// A failing call aborts the snapshot; a partial table would silently read
/// as "these accounts held nothing".
pub async fn snapshot_balances(
    rpc_url: &str,
    block: u64,
    accounts: &[Address],
    tokens: &[TokenSpec],
) -> Result<BalanceTable> {
    let url = rpc_url.parse().context("invalid RPC URL")?;
    let provider = ProviderBuilder::new().connect_http(url);

    let mut table = BalanceTable::new();

    for (index, account) in accounts.iter().enumerate() {
        let mut balances = BTreeMap::new();

        for token in tokens {
            let erc20 = IERC20::new(token.address, &provider);
            let balance = erc20
                .balanceOf(*account)
                .block(BlockId::number(block))
                .call()
                .await
                .with_context(|| {
                    format!(
                        "balanceOf({}) failed on token {} at block {}",
                        account, token.name, block
                    )
                })?;

            balances.insert(token.name.clone(), balance.to_string());
        }

        info!("{}/{} {}", index + 1, accounts.len(), account);
        table.insert(account.to_checksum(None), balances);
    }

    Ok(table)
}

pub fn write_snapshot(table: &BalanceTable, block: u64, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let path = output_dir.join(format!("balance_data_{}.json", block));
    let json = serde_json::to_string_pretty(table).context("Failed to serialize balance table")?;
    fs::write(&path, json).with_context(|| format!("Failed to write snapshot {:?}", path))?;

    info!("Balance data saved to {:?}", path);
    Ok(path)
}
