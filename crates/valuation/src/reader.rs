// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! The read-only chain capability consumed by the valuation services.
//!
//! A concrete binding (an RPC client, an indexer, a fork) is supplied by the embedding
//! application. Retries and transport concerns belong to that binding.

use std::fmt::Debug;

use alloy_primitives::{Address, U256};
use lpscope_model::{fee_tier::FeeTier, pool::PoolSlot, position::Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents errors a [`ChainReader`] reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainReaderError {
    /// Occurs when the chain cannot be reached or the read timed out.
    #[error("Chain unavailable: {0}")]
    Unavailable(String),
    /// Occurs when no pool exists for the pair and fee tier.
    #[error("Pool not found for {token0}/{token1} at fee tier {fee_tier}")]
    PoolNotFound {
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
    },
    /// Occurs when no position exists for the token id.
    #[error("Position {0} not found")]
    PositionNotFound(U256),
    /// Occurs when a contract call or simulation reverts.
    #[error("Call reverted: {0}")]
    CallReverted(String),
}

/// Rewards accrued by a staked position and not yet harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReward {
    /// The reward token.
    pub token: Address,
    /// The pending amount in raw reward token units.
    pub amount: U256,
}

/// Read access to pools, positions and token metadata.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync + Debug {
    /// Reads the current slot of the pool for a pair and fee tier, in either token order.
    async fn get_pool_slot(
        &self,
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
    ) -> Result<PoolSlot, ChainReaderError>;

    /// Reads a position from the position manager.
    async fn get_position(&self, token_id: U256) -> Result<Position, ChainReaderError>;

    /// Simulates collecting every uncollected fee of a position, returning `(amount0, amount1)`.
    async fn simulate_collect(&self, token_id: U256) -> Result<(U256, U256), ChainReaderError>;

    /// Reads a token's decimals.
    async fn get_token_decimals(&self, token: Address) -> Result<u8, ChainReaderError>;

    /// Reads a token's symbol, defaulting to its checksum address.
    async fn get_token_symbol(&self, token: Address) -> Result<String, ChainReaderError> {
        Ok(token.to_string())
    }

    /// Reads the opaque per-token fee accounting fields a staking wrapper exposes, if any.
    async fn get_staking_fee_accounting(
        &self,
        _token_id: U256,
    ) -> Result<Option<(U256, U256)>, ChainReaderError> {
        Ok(None)
    }

    /// Reads the rewards a staked position has accrued, if it is staked.
    async fn get_pending_rewards(
        &self,
        _token_id: U256,
    ) -> Result<Option<PendingReward>, ChainReaderError> {
        Ok(None)
    }
}
