use serde::Serialize;

use crate::whitelist::Whitelist;

#[derive(Debug, Clone, Serialize)]
pub struct AmountMismatch {
    pub address: String,
    pub file_amount: String,
    pub contract_amount: String,
}

/// Outcome of comparing the balances-file whitelist against the one embedded
/// in the contract source. Created once per run, never mutated afterwards.
#[derive(Debug, Serialize)]
pub struct ReconciliationReport {
    pub total_addresses_file: usize,
    pub total_addresses_contract: usize,
    pub addresses_in_file_not_in_contract: Vec<String>,
    pub addresses_in_contract_not_in_file: Vec<String>,
    pub amount_mismatches: Vec<AmountMismatch>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.addresses_in_file_not_in_contract.is_empty()
            && self.addresses_in_contract_not_in_file.is_empty()
            && self.amount_mismatches.is_empty()
    }
}

/// Set-difference both ways, then compare amounts for shared addresses.
/// Amounts are compared as exact strings, matching the source files; "5" and
/// "05" count as a mismatch.
pub fn reconcile(file: &Whitelist, contract: &Whitelist) -> ReconciliationReport {
    let mut only_in_file = Vec::new();
    let mut mismatches = Vec::new();

    for (address, file_amount) in file {
        match contract.get(address) {
            None => only_in_file.push(address.to_checksum(None)),
            Some(contract_amount) if contract_amount != file_amount => {
                mismatches.push(AmountMismatch {
                    address: address.to_checksum(None),
                    file_amount: file_amount.clone(),
                    contract_amount: contract_amount.clone(),
                });
            }
            Some(_) => {}
        }
    }

    let mut only_in_contract: Vec<String> = contract
        .keys()
        .filter(|address| !file.contains_key(*address))
        .map(|address| address.to_checksum(None))
        .collect();

    // Map iteration order is incidental; sort for stable artifacts.
    only_in_file.sort();
    only_in_contract.sort();
    mismatches.sort_by(|a, b| a.address.cmp(&b.address));

    ReconciliationReport {
        total_addresses_file: file.len(),
        total_addresses_contract: contract.len(),
        addresses_in_file_not_in_contract: only_in_file,
        addresses_in_contract_not_in_file: only_in_contract,
        amount_mismatches: mismatches,
    }
}

pub fn render_human(report: &ReconciliationReport) -> String {
    if report.is_clean() {
        return "✅ SUCCESS: All addresses and amounts match between the balances file and the contract!".to_string();
    }

    let mut out = String::from("❌ Verification failed! Discrepancies found:\n");

    if !report.addresses_in_file_not_in_contract.is_empty() {
        out.push_str(&format!(
            "\n{} addresses in file but not in contract:\n",
            report.addresses_in_file_not_in_contract.len()
        ));
        for address in &report.addresses_in_file_not_in_contract {
            out.push_str(&format!("  - {}\n", address));
        }
    }

    if !report.addresses_in_contract_not_in_file.is_empty() {
        out.push_str(&format!(
            "\n{} addresses in contract but not in file:\n",
            report.addresses_in_contract_not_in_file.len()
        ));
        for address in &report.addresses_in_contract_not_in_file {
            out.push_str(&format!("  - {}\n", address));
        }
    }

    if !report.amount_mismatches.is_empty() {
        out.push_str(&format!(
            "\n{} amount mismatches:\n",
            report.amount_mismatches.len()
        ));
        for mismatch in &report.amount_mismatches {
            out.push_str(&format!(
                "  - {}:\n    File: {}\n    Contract: {}\n",
                mismatch.address, mismatch.file_amount, mismatch.contract_amount
            ));
        }
    }

    out
}
