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

//! A concentrated liquidity position as reported by the position manager.

use std::fmt::{Display, Formatter};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    fee_tier::FeeTier,
    math::tick_math::{check_tick, is_aligned_tick},
};

/// Represents a concentrated liquidity position over a tick range.
///
/// The value object is rebuilt from chain data on every query and is never mutated by the
/// valuation code. Token order is kept as reported by the chain; `token0 < token1` is not assumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// The position NFT identifier.
    pub token_id: U256,
    /// The first token of the pool pair, in chain order.
    pub token0: Address,
    /// The second token of the pool pair, in chain order.
    pub token1: Address,
    /// The pool fee tier.
    pub fee_tier: FeeTier,
    /// The lower tick boundary of the position (inclusive).
    pub tick_lower: i32,
    /// The upper tick boundary of the position (exclusive).
    pub tick_upper: i32,
    /// The amount of liquidity in the position, zero once fully withdrawn.
    pub liquidity: u128,
    /// Whether the position NFT is deposited in a staking contract.
    pub is_staked: bool,
    /// Token0 fees owed as of the last on-chain touch of the position.
    pub tokens_owed_0: u128,
    /// Token1 fees owed as of the last on-chain touch of the position.
    pub tokens_owed_1: u128,
}

impl Position {
    /// Creates a new unstaked [`Position`] with no owed fees.
    #[must_use]
    pub fn new(
        token_id: U256,
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> Self {
        Self {
            token_id,
            token0,
            token1,
            fee_tier,
            tick_lower,
            tick_upper,
            liquidity,
            is_staked: false,
            tokens_owed_0: 0,
            tokens_owed_1: 0,
        }
    }

    /// Sets whether the position is held by a staking contract.
    #[must_use]
    pub fn with_staked(mut self, is_staked: bool) -> Self {
        self.is_staked = is_staked;
        self
    }

    /// Sets the owed fee snapshot recorded by the position manager.
    #[must_use]
    pub fn with_tokens_owed(mut self, tokens_owed_0: u128, tokens_owed_1: u128) -> Self {
        self.tokens_owed_0 = tokens_owed_0;
        self.tokens_owed_1 = tokens_owed_1;
        self
    }

    /// Validates the tick range against the protocol bounds and the fee tier's tick spacing.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTick`] if either bound is out of range, or
    /// [`ModelError::InvalidTickRange`] if the range is inverted, empty or misaligned.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_tick(self.tick_lower)?;
        check_tick(self.tick_upper)?;

        if self.tick_lower >= self.tick_upper {
            return Err(self.invalid_range("tick_lower must be less than tick_upper"));
        }

        let spacing = self.fee_tier.tick_spacing();
        if !is_aligned_tick(self.tick_lower, spacing) || !is_aligned_tick(self.tick_upper, spacing)
        {
            return Err(self.invalid_range(&format!(
                "ticks must be multiples of tick spacing {spacing}"
            )));
        }

        Ok(())
    }

    /// Returns whether the position has no liquidity left.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.liquidity == 0
    }

    /// Returns whether `current_tick` lies in `[tick_lower, tick_upper)`.
    #[must_use]
    pub fn is_in_range(&self, current_tick: i32) -> bool {
        (self.tick_lower..self.tick_upper).contains(&current_tick)
    }

    /// Returns whether this position belongs to a pool over the given pair, in either order.
    #[must_use]
    pub fn matches_pair(&self, token0: Address, token1: Address) -> bool {
        (self.token0 == token0 && self.token1 == token1)
            || (self.token0 == token1 && self.token1 == token0)
    }

    fn invalid_range(&self, reason: &str) -> ModelError {
        ModelError::InvalidTickRange {
            tick_lower: self.tick_lower,
            tick_upper: self.tick_upper,
            reason: reason.to_string(),
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Position(token_id={}, pair={}/{}, fee_tier={}, range=[{}, {}), liquidity={})",
            self.token_id,
            self.token0,
            self.token1,
            self.fee_tier.fee(),
            self.tick_lower,
            self.tick_upper,
            self.liquidity,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use rstest::rstest;

    use super::*;

    fn position(fee_tier: FeeTier, tick_lower: i32, tick_upper: i32) -> Position {
        Position::new(
            U256::from(1u8),
            address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            fee_tier,
            tick_lower,
            tick_upper,
            1_000,
        )
    }

    #[rstest]
    fn test_new_position_defaults() {
        let position = position(FeeTier::Medium, -600, 600);
        assert!(!position.is_staked);
        assert_eq!(position.tokens_owed_0, 0);
        assert_eq!(position.tokens_owed_1, 0);
        assert!(!position.is_closed());

        let position = position.with_staked(true).with_tokens_owed(5, 7);
        assert!(position.is_staked);
        assert_eq!((position.tokens_owed_0, position.tokens_owed_1), (5, 7));
    }

    #[rstest]
    #[case(FeeTier::Lowest, -1, 1)]
    #[case(FeeTier::Low, -1000, 1000)]
    #[case(FeeTier::Medium, -887_220, 887_220)]
    #[case(FeeTier::High, -887_200, 887_200)]
    fn test_validate_accepts_aligned_ranges(
        #[case] fee_tier: FeeTier,
        #[case] tick_lower: i32,
        #[case] tick_upper: i32,
    ) {
        assert!(position(fee_tier, tick_lower, tick_upper).validate().is_ok());
    }

    #[rstest]
    #[case(FeeTier::Low, 1000, -1000)]
    #[case(FeeTier::Low, 100, 100)]
    #[case(FeeTier::Medium, -1000, 1000)]
    #[case(FeeTier::High, -100, 200)]
    fn test_validate_rejects_bad_ranges(
        #[case] fee_tier: FeeTier,
        #[case] tick_lower: i32,
        #[case] tick_upper: i32,
    ) {
        assert!(matches!(
            position(fee_tier, tick_lower, tick_upper).validate(),
            Err(ModelError::InvalidTickRange { .. })
        ));
    }

    #[rstest]
    fn test_validate_rejects_out_of_range_tick() {
        assert_eq!(
            position(FeeTier::Lowest, -887_273, 0).validate(),
            Err(ModelError::InvalidTick { tick: -887_273 })
        );
    }

    #[rstest]
    #[case(-1000, true)]
    #[case(0, true)]
    #[case(999, true)]
    #[case(1000, false)]
    #[case(-1001, false)]
    fn test_is_in_range(#[case] current_tick: i32, #[case] expected: bool) {
        assert_eq!(
            position(FeeTier::Low, -1000, 1000).is_in_range(current_tick),
            expected
        );
    }

    #[rstest]
    fn test_matches_pair_in_either_order() {
        let position = position(FeeTier::Low, -10, 10);
        assert!(position.matches_pair(position.token0, position.token1));
        assert!(position.matches_pair(position.token1, position.token0));
        assert!(!position.matches_pair(position.token0, Address::ZERO));
    }

    #[rstest]
    fn test_display() {
        let display = position(FeeTier::Low, -10, 10).to_string();
        assert!(display.starts_with("Position(token_id=1, pair="));
        assert!(display.ends_with("fee_tier=500, range=[-10, 10), liquidity=1000)"));
    }
}
