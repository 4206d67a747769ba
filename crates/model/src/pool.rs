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

//! Live pool state needed to value positions.

use alloy_primitives::{Address, U160};
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    fee_tier::FeeTier,
    math::{
        sqrt_price_math::sqrt_price_to_price,
        tick_math::{check_sqrt_price, check_tick, get_tick_at_sqrt_ratio},
    },
};

/// A snapshot of a pool's current tick and sqrt price.
///
/// The token pair is kept in the order the pool reports it, so consumers can orient prices
/// without assuming address ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSlot {
    /// The pool's token0.
    pub token0: Address,
    /// The pool's token1.
    pub token1: Address,
    /// The pool fee tier.
    pub fee_tier: FeeTier,
    /// The current tick.
    pub tick: i32,
    /// The current sqrt price as a Q64.96 value, in raw token1 per raw token0.
    pub sqrt_price_x96: U160,
}

impl PoolSlot {
    /// Creates a new [`PoolSlot`] instance.
    #[must_use]
    pub const fn new(
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
        tick: i32,
        sqrt_price_x96: U160,
    ) -> Self {
        Self {
            token0,
            token1,
            fee_tier,
            tick,
            sqrt_price_x96,
        }
    }

    /// Creates a [`PoolSlot`] whose tick is derived from `sqrt_price_x96`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSqrtPrice`] if the sqrt price is outside the valid range.
    pub fn from_sqrt_price(
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
        sqrt_price_x96: U160,
    ) -> Result<Self, ModelError> {
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        Ok(Self::new(token0, token1, fee_tier, tick, sqrt_price_x96))
    }

    /// Validates the tick and sqrt price bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTick`] or [`ModelError::InvalidSqrtPrice`] if either field is
    /// out of range.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_tick(self.tick)?;
        check_sqrt_price(self.sqrt_price_x96)
    }

    /// Returns whether `token` is this pool's token0, or `None` if it is not in the pool.
    #[must_use]
    pub fn is_token0(&self, token: Address) -> Option<bool> {
        if token == self.token0 {
            Some(true)
        } else if token == self.token1 {
            Some(false)
        } else {
            None
        }
    }

    /// Returns the display price of one whole token0 in whole token1.
    #[must_use]
    pub fn price(&self, decimals0: u8, decimals1: u8) -> f64 {
        sqrt_price_to_price(self.sqrt_price_x96, decimals0, decimals1)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
