use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::Address;
use tracing::{error, info, warn};

use crate::explorer::{TokenTransfer, TransferSource};

/// Per-account accumulation of the contracts it has transacted with.
///
/// Both counterparties of every transfer count as interacting with the
/// queried contract, the contract's own address included when it shows up
/// as sender or receiver.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InteractionMap {
    accounts: HashMap<Address, Vec<Address>>,
}

impl InteractionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert: recording the same pair twice keeps a single entry.
    /// First-seen order of contracts per account is preserved.
    pub fn record(&mut self, account: Address, contract: Address) {
        let contracts = self.accounts.entry(account).or_default();
        if !contracts.contains(&contract) {
            contracts.push(contract);
        }
    }

    pub fn record_transfers(&mut self, contract: Address, transfers: &[TokenTransfer]) {
        for tx in transfers {
            for party in [&tx.from, &tx.to] {
                match party.parse::<Address>() {
                    Ok(account) => self.record(account, contract),
                    Err(e) => warn!("Skipping unparsable address {:?}: {}", party, e),
                }
            }
        }
    }

    pub fn contracts_for(&self, account: &Address) -> Option<&[Address]> {
        self.accounts.get(account).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Vec<Address>)> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Scan every contract to completion, sequentially. Pagination for a contract
/// stops on the first empty page; an explorer error aborts that contract's
/// scan only and the run continues with the next one.
pub async fn scan_contracts<S: TransferSource + Sync>(
    source: &S,
    contracts: &[Address],
    page_delay: Duration,
) -> InteractionMap {
    let mut map = InteractionMap::new();

    for &contract in contracts {
        info!("Fetching transactions for contract {}", contract);

        let mut page = 1u64;
        let mut transfers_seen = 0usize;

        loop {
            match source.token_transfers(contract, page).await {
                Ok(transfers) => {
                    if transfers.is_empty() {
                        break;
                    }

                    map.record_transfers(contract, &transfers);
                    transfers_seen += transfers.len();
                    page += 1;

                    // Fixed inter-page delay to stay under provider rate limits.
                    tokio::time::sleep(page_delay).await;
                }
                Err(e) => {
                    error!(
                        "Aborting scan of contract {} at page {}: {}",
                        contract, page, e
                    );
                    break;
                }
            }
        }

        info!(
            "Processed {} transfers for contract {}",
            transfers_seen, contract
        );
    }

    info!(
        "Found {} unique addresses interacting with {} contracts",
        map.len(),
        contracts.len()
    );

    map
}
