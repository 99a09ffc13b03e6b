use thiserror::Error;

use crate::blockchain::client::ClientError;
use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::models::BalanceKind;
use crate::subgraph::RosterError;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0:?} needs an account roster but none was provided")]
    MissingRoster(BalanceKind),

    #[error("Sum of {0:?} overflowed 256 bits")]
    Overflow(BalanceKind),

    #[error("Failed to convert units: {0}")]
    Units(#[from] alloy::primitives::utils::UnitsError),

    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl SnapshotError {
    /// Network-level failures that a later attempt may not hit. Reverts,
    /// undecodable results and missing blocks fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Client(ClientError::RpcError(_) | ClientError::Timeout { .. })
                | Self::Roster(RosterError::Http(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
