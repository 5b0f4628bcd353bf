use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{address, Address};
use async_trait::async_trait;

use airdrop_survey::error::ExplorerError;
use airdrop_survey::explorer::{TokenTransfer, TransferSource};
use airdrop_survey::interactions::scan_contracts;
use airdrop_survey::report;

/// Serves canned pages per contract and records every request. A contract
/// with no scripted pages answers like a provider error.
struct ScriptedSource {
    pages: HashMap<Address, Vec<Vec<TokenTransfer>>>,
    requests: Mutex<Vec<(Address, u64)>>,
}

impl ScriptedSource {
    fn new(pages: HashMap<Address, Vec<Vec<TokenTransfer>>>) -> Self {
        Self {
            pages,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<(Address, u64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferSource for ScriptedSource {
    async fn token_transfers(
        &self,
        contract: Address,
        page: u64,
    ) -> Result<Vec<TokenTransfer>, ExplorerError> {
        self.requests.lock().unwrap().push((contract, page));

        let pages = self
            .pages
            .get(&contract)
            .ok_or_else(|| ExplorerError::Api("No transactions found".to_string()))?;

        Ok(pages.get((page - 1) as usize).cloned().unwrap_or_default())
    }
}

fn transfer(from: Address, to: Address) -> TokenTransfer {
    TokenTransfer {
        from: from.to_checksum(None),
        to: to.to_checksum(None),
    }
}

fn account(index: u8) -> Address {
    Address::from([index; 20])
}

#[tokio::test]
async fn pagination_stops_after_first_empty_page() {
    let contract = address!("6e58089d8e8f664823d26454f49a5a0f2ff697fe");

    // Three non-empty pages; the fourth request falls off the script and
    // comes back empty.
    let pages = vec![
        vec![transfer(account(1), account(2))],
        vec![transfer(account(3), account(4))],
        vec![transfer(account(5), account(6))],
    ];
    let source = ScriptedSource::new(HashMap::from([(contract, pages)]));

    let map = scan_contracts(&source, &[contract], Duration::ZERO).await;

    assert_eq!(
        source.requests(),
        vec![(contract, 1), (contract, 2), (contract, 3), (contract, 4)]
    );
    assert_eq!(map.len(), 6);
    for index in 1..=6 {
        assert_eq!(
            map.contracts_for(&account(index)),
            Some(&[contract][..]),
            "account {} missing from aggregation",
            index
        );
    }
}

#[tokio::test]
async fn rescanning_the_same_pages_is_idempotent() {
    let contract = address!("6e58089d8e8f664823d26454f49a5a0f2ff697fe");
    let pages = vec![
        vec![
            transfer(account(1), account(2)),
            transfer(account(2), account(1)),
        ],
        vec![transfer(account(1), account(3))],
    ];
    let source = ScriptedSource::new(HashMap::from([(contract, pages)]));

    let first = scan_contracts(&source, &[contract], Duration::ZERO).await;
    let second = scan_contracts(&source, &[contract], Duration::ZERO).await;

    assert_eq!(first, second);
    assert_eq!(first.contracts_for(&account(1)), Some(&[contract][..]));
}

#[tokio::test]
async fn explorer_failure_aborts_one_contract_and_run_continues() {
    let failing = address!("29ff8f9acb27727d8a2a52d16091c12ea56e9e4d");
    let healthy = address!("6e58089d8e8f664823d26454f49a5a0f2ff697fe");

    let pages = vec![vec![transfer(account(1), account(2))]];
    let source = ScriptedSource::new(HashMap::from([(healthy, pages)]));

    let map = scan_contracts(&source, &[failing, healthy], Duration::ZERO).await;

    // The failing contract stopped after its first page; the healthy one was
    // still scanned to completion.
    assert_eq!(
        source.requests(),
        vec![(failing, 1), (healthy, 1), (healthy, 2)]
    );
    assert_eq!(map.len(), 2);
    assert_eq!(map.contracts_for(&account(1)), Some(&[healthy][..]));
}

#[tokio::test]
async fn scan_feeds_report_counts() {
    let squid = address!("6e58089d8e8f664823d26454f49a5a0f2ff697fe");
    let pool = address!("277fa53c8a53c880e0625c92c92a62a9f60f3f04");

    // account(1) touches both contracts, account(2) and account(3) one each.
    let source = ScriptedSource::new(HashMap::from([
        (squid, vec![vec![transfer(account(1), account(2))]]),
        (pool, vec![vec![transfer(account(1), account(3))]]),
    ]));

    let map = scan_contracts(&source, &[squid, pool], Duration::ZERO).await;
    let summary = report::build_summary(&map, &[squid, pool]);

    assert_eq!(summary.total_unique_addresses, 3);
    assert_eq!(summary.addresses_per_contract[&squid.to_checksum(None)], 2);
    assert_eq!(summary.addresses_per_contract[&pool.to_checksum(None)], 2);
    assert_eq!(summary.addresses_with_multiple_contracts, 1);
}
