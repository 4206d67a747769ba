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

use alloy_primitives::{Address, U160};
use thiserror::Error;

use crate::fee_tier::FeeTier;

/// Represents errors raised by the pure valuation model.
///
/// These are programmer or data errors: they are never retried and callers should fail fast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Occurs when a tick lies outside `[-887272, 887272]`.
    #[error("Invalid tick {tick}: must be within [-887272, 887272]")]
    InvalidTick { tick: i32 },
    /// Occurs when a fee tier is not one of the supported parts-per-million values.
    #[error("Invalid fee tier {0}: expected one of 100, 500, 2500, 3000, 10000")]
    InvalidFeeTier(u32),
    /// Occurs when a position's tick range is inverted or misaligned with its tick spacing.
    #[error("Invalid tick range [{tick_lower}, {tick_upper}]: {reason}")]
    InvalidTickRange {
        tick_lower: i32,
        tick_upper: i32,
        reason: String,
    },
    /// Occurs when a sqrt price lies outside the range reachable from valid ticks.
    #[error("Invalid sqrt price {0}: outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)")]
    InvalidSqrtPrice(U160),
    /// Occurs when the pool backing a position has no slot to value against.
    #[error("Pool not found for {token0}/{token1} at fee tier {fee_tier}")]
    PoolNotFound {
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
    },
    /// Occurs when a pool slot describes a different pair than the position being valued.
    #[error(
        "Pool slot {slot_token0}/{slot_token1} does not match position pair {token0}/{token1}"
    )]
    PoolMismatch {
        token0: Address,
        token1: Address,
        slot_token0: Address,
        slot_token1: Address,
    },
    /// Occurs when fixed-point arithmetic leaves its documented domain.
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
}
