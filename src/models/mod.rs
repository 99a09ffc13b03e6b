// Balance kinds, per-day snapshot records and their display rows

use alloy::primitives::{I256, U256};
use chrono::NaiveDate;

/// One balance-like quantity that can be read at a historical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BalanceKind {
    /// Collateral token balance of the vault address
    Total,
    /// Free balance of the hedger (party B) inside the vault
    PartyBBalance,
    /// Hedger balance allocated against every account in the roster
    PartyBAllocated,
    /// Allocated balances of the liquidator accounts
    LiquidatorAllocated,
}

impl BalanceKind {
    /// Operator components in report column order.
    pub const COMPONENTS: [BalanceKind; 3] = [
        BalanceKind::PartyBBalance,
        BalanceKind::PartyBAllocated,
        BalanceKind::LiquidatorAllocated,
    ];

    /// Stable tag used in cache keys. Never change an existing tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::PartyBBalance => "hedger",
            Self::PartyBAllocated => "hedger_allocated",
            Self::LiquidatorAllocated => "liquidators",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "total" => Some(Self::Total),
            "hedger" => Some(Self::PartyBBalance),
            "hedger_allocated" => Some(Self::PartyBAllocated),
            "liquidators" => Some(Self::LiquidatorAllocated),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Total => "Total Balance",
            Self::PartyBBalance => "Hedger Balance",
            Self::PartyBAllocated => "Hedger Allocated Balance",
            Self::LiquidatorAllocated => "Liquidators Balance",
        }
    }

    /// Whether reading this kind needs the account roster.
    pub fn needs_roster(&self) -> bool {
        matches!(self, Self::PartyBAllocated)
    }
}

/// Balances of one calendar day, all in smallest units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub block_number: u64,
    pub total: U256,
    pub components: Vec<(BalanceKind, U256)>,
    pub own_balance: U256,
    pub user_balance: I256,
}

impl DailySnapshot {
    pub fn component(&self, kind: BalanceKind) -> Option<U256> {
        self.components
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, value)| *value)
    }
}

/// A snapshot rendered in display units, ready for reporting.
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub date: String,
    pub block_number: u64,
    pub components: Vec<(String, String)>,
    pub user_balance: String,
    pub own_balance: String,
    pub total: String,
}
