use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use alloy_primitives::Address;
use regex::Regex;
use tracing::warn;

use crate::error::WhitelistError;

/// Address -> amount, with the amount kept as the integer string the source
/// carried. Duplicate addresses within one source keep the last-parsed value.
pub type Whitelist = HashMap<Address, String>;

const PAIR_PATTERN: &str = r#"\["(0x[a-fA-F0-9]+)", "(\d+)"\]"#;
const COMMENTED_PAIR_PATTERN: &str = r#"//\["(0x[a-fA-F0-9]+)", "(\d+)"\]"#;

pub fn parse_balances_file(path: &Path) -> Result<Whitelist, WhitelistError> {
    let content = fs::read_to_string(path).map_err(|source| WhitelistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_balances(&content))
}

/// Extract active `["0x...", "amount"]` pairs. A commented-out pair excludes
/// its address from the active set entirely, matched textually rather than by
/// tracking line state.
pub fn parse_balances(content: &str) -> Whitelist {
    let pair = Regex::new(PAIR_PATTERN).expect("valid pair pattern");
    let commented = Regex::new(COMMENTED_PAIR_PATTERN).expect("valid commented pattern");

    let commented_addresses: HashSet<String> = commented
        .captures_iter(content)
        .map(|caps| caps[1].to_lowercase())
        .collect();

    let mut whitelist = Whitelist::new();
    for caps in pair.captures_iter(content) {
        let raw_address = &caps[1];
        if commented_addresses.contains(&raw_address.to_lowercase()) {
            continue;
        }

        match raw_address.parse::<Address>() {
            Ok(address) => {
                whitelist.insert(address, caps[2].to_string());
            }
            Err(e) => warn!("Skipping pair with invalid address {:?}: {}", raw_address, e),
        }
    }

    whitelist
}

pub fn parse_contract_source(path: &Path) -> Result<Whitelist, WhitelistError> {
    let content = fs::read_to_string(path).map_err(|source| WhitelistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    extract_contract_whitelist(&content)
}

/// Pull address/amount assignments out of the `_whitelist()` section of the
/// contract source. The section runs from its `@internal def _whitelist():`
/// marker to the next blank line or end of file.
pub fn extract_contract_whitelist(content: &str) -> Result<Whitelist, WhitelistError> {
    let section =
        Regex::new(r"(?s)@internal\s+def\s+_whitelist\(\):\s+(.*?)(?:\n\n|\z)").expect("valid section pattern");
    let assignment = Regex::new(r"self\.eligible_addresses\[(0x[a-fA-F0-9]+)\]\s*=\s*(\d+)")
        .expect("valid assignment pattern");

    let body = section
        .captures(content)
        .and_then(|caps| caps.get(1))
        .ok_or(WhitelistError::WhitelistSectionNotFound)?
        .as_str();

    let mut whitelist = Whitelist::new();
    for caps in assignment.captures_iter(body) {
        let raw_address = &caps[1];
        match raw_address.parse::<Address>() {
            Ok(address) => {
                whitelist.insert(address, caps[2].to_string());
            }
            Err(e) => warn!(
                "Skipping assignment with invalid address {:?}: {}",
                raw_address, e
            ),
        }
    }

    Ok(whitelist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_active_pair_parsed_commented_pair_excluded() {
        let content = r#"
            ["0x1111111111111111111111111111111111111111", "50"],
            //["0x2222222222222222222222222222222222222222", "60"],
        "#;

        let whitelist = parse_balances(content);

        assert_eq!(whitelist.len(), 1);
        let active = address!("1111111111111111111111111111111111111111");
        assert_eq!(whitelist.get(&active).map(String::as_str), Some("50"));
    }

    #[test]
    fn test_commented_pair_excludes_other_casings_of_same_address() {
        // The same address active in one place and commented out in another:
        // the commented match wins, regardless of hex casing.
        let content = r#"
            ["0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "10"],
            //["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "10"],
        "#;

        let whitelist = parse_balances(content);
        assert!(whitelist.is_empty());
    }

    #[test]
    fn test_balances_keys_are_case_insensitive() {
        let content = r#"["0xABCDEFabcdefABCDEFabcdefABCDEFabcdefABCD", "7"]"#;
        let whitelist = parse_balances(content);

        let address = address!("abcdefabcdefabcdefabcdefabcdefabcdefabcd");
        assert_eq!(whitelist.get(&address).map(String::as_str), Some("7"));
    }

    #[test]
    fn test_duplicate_address_last_parsed_wins() {
        let content = r#"
            ["0x1111111111111111111111111111111111111111", "50"],
            ["0x1111111111111111111111111111111111111111", "75"],
        "#;

        let whitelist = parse_balances(content);
        let address = address!("1111111111111111111111111111111111111111");
        assert_eq!(whitelist.get(&address).map(String::as_str), Some("75"));
    }

    #[test]
    fn test_contract_whitelist_extraction() {
        let source = "\
@internal\ndef _whitelist():\n    self.eligible_addresses[0x1111111111111111111111111111111111111111] = 100\n    self.eligible_addresses[0x2222222222222222222222222222222222222222] = 250\n";

        let whitelist = extract_contract_whitelist(source).unwrap();

        assert_eq!(whitelist.len(), 2);
        let second = address!("2222222222222222222222222222222222222222");
        assert_eq!(whitelist.get(&second).map(String::as_str), Some("250"));
    }

    #[test]
    fn test_contract_whitelist_bounded_by_blank_line() {
        let source = "\
@internal\ndef _whitelist():\n    self.eligible_addresses[0x1111111111111111111111111111111111111111] = 100\n\n@external\ndef claim():\n    self.eligible_addresses[0x2222222222222222222222222222222222222222] = 999\n";

        let whitelist = extract_contract_whitelist(source).unwrap();

        assert_eq!(whitelist.len(), 1);
        let outside = address!("2222222222222222222222222222222222222222");
        assert!(!whitelist.contains_key(&outside));
    }

    #[test]
    fn test_missing_section_is_a_typed_error() {
        let source = "@external\ndef claim():\n    pass\n";

        assert!(matches!(
            extract_contract_whitelist(source),
            Err(WhitelistError::WhitelistSectionNotFound)
        ));
    }
}
