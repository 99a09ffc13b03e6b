//! Cache key generation and management

use std::fmt;

use crate::models::BalanceKind;

/// A structured cache key.
///
/// Resolved blocks and balances live in separate namespaces so a timestamp can
/// never collide with a balance entry, whatever their string forms look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Block nearest to a Unix timestamp
    ResolvedBlock { timestamp: u64 },
    /// Balance of one kind at one historical block
    Balance { kind: BalanceKind, block: u64 },
}

impl CacheKey {
    pub fn resolved_block(timestamp: u64) -> Self {
        Self::ResolvedBlock { timestamp }
    }

    pub fn balance(kind: BalanceKind, block: u64) -> Self {
        Self::Balance { kind, block }
    }

    /// Namespace column of the persisted entry
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::ResolvedBlock { .. } => "block",
            Self::Balance { .. } => "balance",
        }
    }

    /// Key column of the persisted entry, unique within its namespace
    pub fn key(&self) -> String {
        match self {
            Self::ResolvedBlock { timestamp } => timestamp.to_string(),
            Self::Balance { kind, block } => format!("{}:{}", kind.tag(), block),
        }
    }

    /// Rebuilds a key from its persisted columns. Unknown namespaces or
    /// malformed keys yield `None` so newer rows are simply ignored.
    pub fn parse(namespace: &str, key: &str) -> Option<Self> {
        match namespace {
            "block" => key.parse().ok().map(Self::resolved_block),
            "balance" => {
                let (tag, block) = key.split_once(':')?;
                let kind = BalanceKind::from_tag(tag)?;
                Some(Self::balance(kind, block.parse().ok()?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace(), self.key())
    }
}
