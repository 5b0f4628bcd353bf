use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::interactions::InteractionMap;

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub total_unique_addresses: usize,
    pub contracts_analyzed: usize,
    pub contracts: Vec<String>,
    pub addresses_per_contract: BTreeMap<String, usize>,
    pub addresses_with_multiple_contracts: usize,
}

/// One tabular row per observed account. `flags` is aligned with the queried
/// contract list and drives the per-contract boolean columns.
#[derive(Debug)]
pub struct ReportRow {
    pub address: String,
    pub interaction_count: usize,
    pub flags: Vec<bool>,
    pub contracts: String,
}

#[derive(Debug)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub raw_json: PathBuf,
    pub summary: PathBuf,
    pub text: PathBuf,
}

/// Column name for a contract's boolean flag, keyed by the first 8 characters
/// of the checksummed address ("0x" + 6 hex digits). Contracts sharing that
/// prefix would collide; the report format keeps this keying anyway.
pub fn flag_column(contract: &Address) -> String {
    format!("interacted_with_{}", &contract.to_checksum(None)[..8])
}

pub fn build_summary(map: &InteractionMap, contracts: &[Address]) -> ScanSummary {
    let mut addresses_per_contract = BTreeMap::new();
    for contract in contracts {
        let count = map
            .iter()
            .filter(|(_, interacted)| interacted.contains(contract))
            .count();
        addresses_per_contract.insert(contract.to_checksum(None), count);
    }

    ScanSummary {
        total_unique_addresses: map.len(),
        contracts_analyzed: contracts.len(),
        contracts: contracts.iter().map(|c| c.to_checksum(None)).collect(),
        addresses_per_contract,
        addresses_with_multiple_contracts: map
            .iter()
            .filter(|(_, interacted)| interacted.len() > 1)
            .count(),
    }
}

/// Rows sorted descending by interaction count; the sort is stable, so ties
/// keep their incidental insertion order.
pub fn build_rows(map: &InteractionMap, contracts: &[Address]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = map
        .iter()
        .map(|(account, interacted)| ReportRow {
            address: account.to_checksum(None),
            interaction_count: interacted.len(),
            flags: contracts.iter().map(|c| interacted.contains(c)).collect(),
            contracts: interacted
                .iter()
                .map(|c| c.to_checksum(None))
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();

    rows.sort_by(|a, b| b.interaction_count.cmp(&a.interaction_count));
    rows
}

pub fn write_reports(
    map: &InteractionMap,
    contracts: &[Address],
    output_dir: &Path,
) -> Result<ReportPaths> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

    let paths = ReportPaths {
        csv: output_dir.join(format!("contract_interactions_{}.csv", timestamp)),
        raw_json: output_dir.join(format!("contract_interactions_{}.json", timestamp)),
        summary: output_dir.join(format!("summary_{}.json", timestamp)),
        text: output_dir.join(format!("report_{}.txt", timestamp)),
    };

    write_csv(map, contracts, &paths.csv)?;
    write_raw_json(map, &paths.raw_json)?;

    let summary = build_summary(map, contracts);
    let summary_json =
        serde_json::to_string_pretty(&summary).context("Failed to serialize scan summary")?;
    fs::write(&paths.summary, summary_json)
        .with_context(|| format!("Failed to write summary file {:?}", paths.summary))?;

    let text = render_text_report(&summary, &paths);
    fs::write(&paths.text, &text)
        .with_context(|| format!("Failed to write text report {:?}", paths.text))?;

    info!("Reports saved in directory {:?}", output_dir);
    Ok(paths)
}

fn write_csv(map: &InteractionMap, contracts: &[Address], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV report {:?}", path))?;

    let mut header = vec!["address".to_string(), "interaction_count".to_string()];
    header.extend(contracts.iter().map(flag_column));
    header.push("contracts".to_string());
    writer.write_record(&header)?;

    for row in build_rows(map, contracts) {
        let mut record = vec![row.address, row.interaction_count.to_string()];
        record.extend(row.flags.iter().map(|flag| flag.to_string()));
        record.push(row.contracts);
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_raw_json(map: &InteractionMap, path: &Path) -> Result<()> {
    let raw: BTreeMap<String, Vec<String>> = map
        .iter()
        .map(|(account, interacted)| {
            (
                account.to_checksum(None),
                interacted.iter().map(|c| c.to_checksum(None)).collect(),
            )
        })
        .collect();

    let json = serde_json::to_string_pretty(&raw).context("Failed to serialize interaction map")?;
    fs::write(path, json).with_context(|| format!("Failed to write raw JSON {:?}", path))?;
    Ok(())
}

pub fn render_text_report(summary: &ScanSummary, paths: &ReportPaths) -> String {
    let contract_lines: Vec<String> = summary
        .contracts
        .iter()
        .map(|contract| {
            let count = summary.addresses_per_contract.get(contract).copied().unwrap_or(0);
            format!("- {}: {} addresses", contract, count)
        })
        .collect();

    format!(
        "\nCONTRACT INTERACTION REPORT\n\
         ==========================\n\
         Generated: {}\n\n\
         SUMMARY\n\
         -------\n\
         Total Unique Addresses: {}\n\
         Contracts Analyzed: {}\n\
         Addresses With Multiple Contracts: {}\n\n\
         CONTRACTS\n\
         ---------\n\
         {}\n\n\
         FILES GENERATED\n\
         --------------\n\
         - CSV Report: {}\n\
         - JSON Data: {}\n\
         - Summary: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        summary.total_unique_addresses,
        summary.contracts_analyzed,
        summary.addresses_with_multiple_contracts,
        contract_lines.join("\n"),
        paths.csv.display(),
        paths.raw_json.display(),
        paths.summary.display(),
    )
}
