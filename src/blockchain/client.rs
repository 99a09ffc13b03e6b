use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::primitives::U256;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol_types::{SolCall, SolValue};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::contracts::{IMulticall3, IERC20, ISymmio, MULTICALL3_ADDRESS};
use super::reader::{BalanceCall, BalanceReader, BlockReader};
use crate::config::Config;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("RPC error: {0}")]
    RpcError(#[from] alloy::transports::TransportError),

    #[error("Contract call failed: {0}")]
    ContractError(#[from] alloy::contract::Error),

    #[error("Failed to decode call result: {0}")]
    DecodeError(#[from] alloy::sol_types::Error),

    #[error("Block not found: {0}")]
    BlockNotFound(u64),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("Batched call {index} reverted at block {block}")]
    BatchCallFailed { index: usize, block: u64 },

    #[error("Batch returned {got} results for {expected} calls")]
    BatchLengthMismatch { expected: usize, got: usize },

    #[error("Invalid RPC URL {0}: {1}")]
    InvalidRpcUrl(String, String),
}

/// JSON-RPC client for historical reads.
///
/// Every request is bounded by the configured timeout and, when a rate limit
/// is set, waits for a permit first.
#[derive(Clone)]
pub struct EvmClient {
    provider: DynProvider,
    timeout: Duration,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl EvmClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let rpc_url: reqwest::Url = config
            .rpc_url
            .parse()
            .map_err(|e| ClientError::InvalidRpcUrl(config.rpc_url.clone(), format!("{e}")))?;
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();

        let limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));

        info!(
            "Initializing EVM client with RPC endpoint: {}, timeout: {}s, rate limit: {:?}",
            config.rpc_url, config.rpc_timeout_secs, config.rpc_rate_limit
        );

        Ok(Self {
            provider,
            timeout: config.rpc_timeout(),
            limiter,
        })
    }

    async fn guarded<T, F>(&self, operation: &'static str, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ClientError::Timeout {
                operation,
                secs: self.timeout.as_secs(),
            })?
    }
}

impl BlockReader for EvmClient {
    async fn latest_block_number(&self) -> Result<u64, ClientError> {
        self.guarded("eth_blockNumber", async {
            Ok::<_, ClientError>(self.provider.get_block_number().await?)
        })
        .await
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64, ClientError> {
        self.guarded("eth_getBlockByNumber", async {
            let found = self
                .provider
                .get_block_by_number(BlockNumberOrTag::Number(block))
                .await?
                .ok_or(ClientError::BlockNotFound(block))?;
            Ok::<_, ClientError>(found.header.timestamp)
        })
        .await
    }
}

impl BalanceReader for EvmClient {
    async fn read(&self, call: BalanceCall, block: u64) -> Result<U256, ClientError> {
        let at = BlockId::number(block);

        self.guarded("eth_call", async {
            let balance = match call {
                BalanceCall::TokenBalance { token, owner } => {
                    IERC20::new(token, &self.provider)
                        .balanceOf(owner)
                        .block(at)
                        .call()
                        .await?
                }
                BalanceCall::PartyBBalance { vault, party_b } => {
                    ISymmio::new(vault, &self.provider)
                        .balanceOf(party_b)
                        .block(at)
                        .call()
                        .await?
                }
                BalanceCall::AllocatedPartyA { vault, party_a } => {
                    ISymmio::new(vault, &self.provider)
                        .allocatedBalanceOfPartyA(party_a)
                        .block(at)
                        .call()
                        .await?
                }
                BalanceCall::AllocatedPartyB {
                    vault,
                    party_b,
                    party_a,
                } => {
                    ISymmio::new(vault, &self.provider)
                        .allocatedBalanceOfPartyB(party_b, party_a)
                        .block(at)
                        .call()
                        .await?
                }
            };
            debug!("{:?} at block {} = {}", call, block, balance);
            Ok::<_, ClientError>(balance)
        })
        .await
    }

    async fn read_batch(&self, calls: &[BalanceCall], block: u64) -> Result<Vec<U256>, ClientError> {
        let encoded: Vec<IMulticall3::Call3> = calls.iter().map(encode_call).collect();

        self.guarded("aggregate3", async {
            let results = IMulticall3::new(MULTICALL3_ADDRESS, &self.provider)
                .aggregate3(encoded)
                .block(BlockId::number(block))
                .call()
                .await?;

            if results.len() != calls.len() {
                return Err(ClientError::BatchLengthMismatch {
                    expected: calls.len(),
                    got: results.len(),
                });
            }

            let mut balances = Vec::with_capacity(results.len());
            for (index, result) in results.iter().enumerate() {
                if !result.success {
                    return Err(ClientError::BatchCallFailed { index, block });
                }
                balances.push(U256::abi_decode(&result.returnData)?);
            }
            debug!("Multicall of {} reads at block {}", balances.len(), block);
            Ok::<_, ClientError>(balances)
        })
        .await
    }
}

fn encode_call(call: &BalanceCall) -> IMulticall3::Call3 {
    let (target, data) = match *call {
        BalanceCall::TokenBalance { token, owner } => {
            (token, IERC20::balanceOfCall { owner }.abi_encode())
        }
        BalanceCall::PartyBBalance { vault, party_b } => {
            (vault, ISymmio::balanceOfCall { user: party_b }.abi_encode())
        }
        BalanceCall::AllocatedPartyA { vault, party_a } => (
            vault,
            ISymmio::allocatedBalanceOfPartyACall { partyA: party_a }.abi_encode(),
        ),
        BalanceCall::AllocatedPartyB {
            vault,
            party_b,
            party_a,
        } => (
            vault,
            ISymmio::allocatedBalanceOfPartyBCall {
                partyB: party_b,
                partyA: party_a,
            }
            .abi_encode(),
        ),
    };

    IMulticall3::Call3 {
        target,
        allowFailure: false,
        callData: data.into(),
    }
}
