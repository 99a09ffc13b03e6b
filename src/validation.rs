use alloy::primitives::Address;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid EVM address format: {0}")]
    InvalidEvmAddress(String),

    #[error("Invalid date: {0}. Expected YYYY-MM-DD")]
    InvalidDate(String),
}

pub fn validate_evm_address(address: &str) -> Result<Address, ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    address
        .parse::<Address>()
        .map_err(|_| ValidationError::InvalidEvmAddress(address.to_string()))
}

/// Parses a comma-separated address list, skipping empty entries.
pub fn parse_address_list(list: &str) -> Result<Vec<Address>, ValidationError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(validate_evm_address)
        .collect()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}
