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

use alloy_primitives::{Address, U256};
use lpscope_model::{error::ModelError, fee_tier::FeeTier};
use thiserror::Error;

use crate::reader::ChainReaderError;

/// Represents errors surfaced by the valuation services.
///
/// Only [`ValuationError::Config`] and [`ValuationError::Cancelled`] escape a portfolio
/// valuation; every other variant is converted into a degraded row by the orchestrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// Occurs when the pure model rejects its inputs.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Occurs when the chain reader cannot complete a read; retry policy belongs to the reader.
    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),
    /// Occurs when no pool exists for a pair and fee tier.
    #[error("Pool not found for {token0}/{token1} at fee tier {fee_tier}")]
    PoolNotFound {
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
    },
    /// Occurs when the position manager has no position for a token id.
    #[error("Position {0} not found")]
    PositionNotFound(U256),
    /// Occurs when every configured price source failed for a token.
    #[error("No price available for token {0}")]
    NoPriceAvailable(Address),
    /// Occurs when the valuation services are configured with invalid values.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Occurs when the caller cancels an in-flight valuation.
    #[error("Valuation cancelled")]
    Cancelled,
}

impl From<ChainReaderError> for ValuationError {
    fn from(error: ChainReaderError) -> Self {
        match error {
            ChainReaderError::Unavailable(message) => Self::ChainUnavailable(message),
            ChainReaderError::CallReverted(message) => {
                Self::ChainUnavailable(format!("call reverted: {message}"))
            }
            ChainReaderError::PoolNotFound {
                token0,
                token1,
                fee_tier,
            } => Self::PoolNotFound {
                token0,
                token1,
                fee_tier,
            },
            ChainReaderError::PositionNotFound(token_id) => Self::PositionNotFound(token_id),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lpscope_model::stubs::{usdc, weth};
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_chain_reader_errors_map_to_valuation_errors() {
        assert_eq!(
            ValuationError::from(ChainReaderError::Unavailable("timeout".to_string())),
            ValuationError::ChainUnavailable("timeout".to_string())
        );
        assert_eq!(
            ValuationError::from(ChainReaderError::CallReverted("STF".to_string())),
            ValuationError::ChainUnavailable("call reverted: STF".to_string())
        );
        assert_eq!(
            ValuationError::from(ChainReaderError::PoolNotFound {
                token0: usdc(),
                token1: weth(),
                fee_tier: FeeTier::Low,
            }),
            ValuationError::PoolNotFound {
                token0: usdc(),
                token1: weth(),
                fee_tier: FeeTier::Low,
            }
        );
        assert_eq!(
            ValuationError::from(ChainReaderError::PositionNotFound(U256::from(7u8))),
            ValuationError::PositionNotFound(U256::from(7u8))
        );
    }

    #[rstest]
    fn test_model_errors_are_transparent() {
        let error = ValuationError::from(ModelError::InvalidFeeTier(42));
        assert_eq!(
            error.to_string(),
            "Invalid fee tier 42: expected one of 100, 500, 2500, 3000, 10000"
        );
    }
}
