use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use tracing::debug;

use crate::error::ExplorerError;

/// Networks with a supported Etherscan-family explorer API.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Network {
    Fraxtal,
    Sonic,
}

impl Network {
    pub fn api_base(&self) -> &'static str {
        match self {
            Network::Fraxtal => "https://api.fraxscan.com/api",
            Network::Sonic => "https://api.sonicscan.org/api",
        }
    }
}

/// One token transfer row from `module=account&action=tokentx`. The explorer
/// returns many more fields per record; only the counterparties matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTransfer {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
struct TokenTxResponse {
    status: String,
    message: String,
    // On errors some providers put a plain string here instead of an array,
    // so this stays untyped until the status check has passed.
    result: serde_json::Value,
}

/// Anything that can serve token transfer pages for a contract. The explorer
/// client is the production implementation; tests substitute canned pages.
#[async_trait]
pub trait TransferSource {
    /// Fetch one page of token transfers for `contract`. Pages are 1-indexed;
    /// an empty vector means pagination is exhausted.
    async fn token_transfers(
        &self,
        contract: Address,
        page: u64,
    ) -> Result<Vec<TokenTransfer>, ExplorerError>;
}

pub struct ExplorerClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
}

impl ExplorerClient {
    pub fn new(network: Network, api_key: Option<String>, page_size: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: network.api_base().to_string(),
            api_key,
            page_size,
        }
    }
}

#[async_trait]
impl TransferSource for ExplorerClient {
    async fn token_transfers(
        &self,
        contract: Address,
        page: u64,
    ) -> Result<Vec<TokenTransfer>, ExplorerError> {
        let mut params = vec![
            ("module", "account".to_string()),
            ("action", "tokentx".to_string()),
            ("contractaddress", contract.to_checksum(None)),
            ("startblock", "0".to_string()),
            ("endblock", "999999999".to_string()),
            ("sort", "desc".to_string()),
            ("page", page.to_string()),
            ("offset", self.page_size.to_string()),
        ];

        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }

        debug!("Fetching page {} for contract {}", page, contract);

        let response = self.client.get(&self.base_url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(ExplorerError::Api(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_token_tx_body(&body)
    }
}

fn parse_token_tx_body(body: &str) -> Result<Vec<TokenTransfer>, ExplorerError> {
    let response: TokenTxResponse = serde_json::from_str(body)?;

    if response.status != "1" {
        return Err(ExplorerError::Api(response.message));
    }

    Ok(serde_json::from_value(response.result)?)
}
