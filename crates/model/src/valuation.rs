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

//! Decomposition of a position's liquidity into token amounts.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    math::{
        sqrt_price_math::{get_amount0_delta, get_amount1_delta},
        tick_math::get_sqrt_ratio_at_tick,
    },
    pool::PoolSlot,
    position::Position,
};

/// Raw token amounts in the smallest unit of each token, oriented like the position's pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmounts {
    /// Amount of the position's token0.
    pub amount0: U256,
    /// Amount of the position's token1.
    pub amount1: U256,
}

impl TokenAmounts {
    /// Zero amounts of both tokens.
    pub const ZERO: Self = Self::new(U256::ZERO, U256::ZERO);

    /// Creates a new [`TokenAmounts`] instance.
    #[must_use]
    pub const fn new(amount0: U256, amount1: U256) -> Self {
        Self { amount0, amount1 }
    }

    /// Returns whether both amounts are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount0.is_zero() && self.amount1.is_zero()
    }
}

/// Values a position against a pool slot, rounding amounts up.
///
/// See [`value_position_with_rounding`].
///
/// # Errors
///
/// Returns an error under the same conditions as [`value_position_with_rounding`].
pub fn value_position(
    position: &Position,
    slot: Option<&PoolSlot>,
) -> Result<TokenAmounts, ModelError> {
    value_position_with_rounding(position, slot, true)
}

/// Decomposes `position`'s liquidity into token amounts at the slot's current price.
///
/// - Below the range (`tick < tick_lower`) everything is held in token0.
/// - At or above the range (`tick >= tick_upper`) everything is held in token1.
/// - Otherwise the slot's sqrt price splits the range between both tokens.
///
/// A closed position is worth zero without looking at the slot at all. When the slot lists the
/// pair in the opposite order to the position, amounts are swapped back into the position's
/// order.
///
/// # Errors
///
/// Returns an error if:
/// - The position's tick range is invalid.
/// - `slot` is `None` for a position with liquidity ([`ModelError::PoolNotFound`]).
/// - The slot describes a different pair ([`ModelError::PoolMismatch`]) or is out of range.
/// - The amount math leaves its domain.
pub fn value_position_with_rounding(
    position: &Position,
    slot: Option<&PoolSlot>,
    round_up: bool,
) -> Result<TokenAmounts, ModelError> {
    if position.is_closed() {
        return Ok(TokenAmounts::ZERO);
    }

    position.validate()?;

    let slot = slot.ok_or(ModelError::PoolNotFound {
        token0: position.token0,
        token1: position.token1,
        fee_tier: position.fee_tier,
    })?;

    if !position.matches_pair(slot.token0, slot.token1) {
        return Err(ModelError::PoolMismatch {
            token0: position.token0,
            token1: position.token1,
            slot_token0: slot.token0,
            slot_token1: slot.token1,
        });
    }
    slot.validate()?;

    let sqrt_lower = get_sqrt_ratio_at_tick(position.tick_lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(position.tick_upper)?;
    let liquidity = position.liquidity;

    let (amount0, amount1) = if slot.tick < position.tick_lower {
        (
            get_amount0_delta(sqrt_lower, sqrt_upper, liquidity, round_up)?,
            U256::ZERO,
        )
    } else if slot.tick >= position.tick_upper {
        (
            U256::ZERO,
            get_amount1_delta(sqrt_lower, sqrt_upper, liquidity, round_up)?,
        )
    } else {
        (
            get_amount0_delta(slot.sqrt_price_x96, sqrt_upper, liquidity, round_up)?,
            get_amount1_delta(sqrt_lower, slot.sqrt_price_x96, liquidity, round_up)?,
        )
    };

    if slot.token0 == position.token0 {
        Ok(TokenAmounts::new(amount0, amount1))
    } else {
        Ok(TokenAmounts::new(amount1, amount0))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
