//! Account roster from the indexing subgraph.

use alloy::primitives::Address;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::validation::validate_evm_address;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Subgraph request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Subgraph returned errors: {0}")]
    GraphQl(String),

    #[error("Subgraph response has no data")]
    MissingData,

    #[error("Invalid account id in roster: {0}")]
    InvalidAccount(String),

    #[error("Roster page size must be greater than zero")]
    ZeroPageSize,
}

/// One account of the roster, with the cursor value it is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    #[serde(rename = "timestamp")]
    pub cursor: String,
}

/// Paginated listing of accounts ordered by an ascending cursor.
pub trait RosterProvider {
    /// Up to `page_size` entries whose cursor is strictly greater than `after`.
    fn fetch_page(
        &self,
        after: &str,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<RosterEntry>, RosterError>> + Send;
}

/// Walks every page, stopping at the first page shorter than `page_size`.
pub async fn fetch_roster<P: RosterProvider>(
    provider: &P,
    page_size: usize,
) -> Result<Vec<RosterEntry>, RosterError> {
    if page_size == 0 {
        return Err(RosterError::ZeroPageSize);
    }

    let mut roster = Vec::new();
    let mut cursor = "0".to_string();
    let mut pages = 0;

    loop {
        let page = provider.fetch_page(&cursor, page_size).await?;
        pages += 1;
        let page_len = page.len();

        if let Some(last) = page.last() {
            cursor = last.cursor.clone();
        }
        roster.extend(page);
        debug!("Roster page {}: {} accounts", pages, page_len);

        if page_len < page_size {
            break;
        }
    }

    info!("Fetched {} accounts in {} pages", roster.len(), pages);
    Ok(roster)
}

pub fn roster_addresses(roster: &[RosterEntry]) -> Result<Vec<Address>, RosterError> {
    roster
        .iter()
        .map(|entry| {
            validate_evm_address(&entry.id).map_err(|_| RosterError::InvalidAccount(entry.id.clone()))
        })
        .collect()
}

const ACCOUNTS_QUERY: &str = r#"
query Accounts($lastTimestamp: BigInt!, $pageSize: Int!) {
  accounts(
    first: $pageSize,
    where: {timestamp_gt: $lastTimestamp},
    orderBy: timestamp,
    orderDirection: asc
  ) {
    id
    timestamp
  }
}
"#;

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<AccountsData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct AccountsData {
    accounts: Vec<RosterEntry>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

pub struct SubgraphClient {
    http: reqwest::Client,
    url: String,
}

impl SubgraphClient {
    pub fn new(config: &Config) -> Result<Self, RosterError> {
        let http = reqwest::Client::builder()
            .timeout(config.rpc_timeout())
            .build()?;

        Ok(Self {
            http,
            url: config.subgraph_url.clone(),
        })
    }
}

impl RosterProvider for SubgraphClient {
    async fn fetch_page(&self, after: &str, page_size: usize) -> Result<Vec<RosterEntry>, RosterError> {
        let body = json!({
            "query": ACCOUNTS_QUERY,
            "variables": { "lastTimestamp": after, "pageSize": page_size },
        });

        let response: GraphQlResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(RosterError::GraphQl(messages.join("; ")));
        }

        response
            .data
            .map(|data| data.accounts)
            .ok_or(RosterError::MissingData)
    }
}
