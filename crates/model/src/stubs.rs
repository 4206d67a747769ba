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

//! Type stubs to facilitate testing.

use alloy_primitives::{Address, U256, address};
use rstest::fixture;

use crate::{
    fee_tier::FeeTier, math::tick_math::get_sqrt_ratio_at_tick, pool::PoolSlot,
    position::Position, token::TokenInfo,
};

/// Mainnet USDC.
#[fixture]
pub fn usdc() -> Address {
    address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
}

/// Mainnet WETH.
#[fixture]
pub fn weth() -> Address {
    address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")
}

/// Mainnet DAI.
#[fixture]
pub fn dai() -> Address {
    address!("6b175474e89094c44da98b954eedeac495271d0f")
}

/// USDC metadata with 6 decimals.
#[fixture]
pub fn usdc_info() -> TokenInfo {
    TokenInfo::new(usdc(), "USDC".to_string(), 6)
}

/// WETH metadata with 18 decimals.
#[fixture]
pub fn weth_info() -> TokenInfo {
    TokenInfo::new(weth(), "WETH".to_string(), 18)
}

/// Returns a USDC/WETH position with token id 1.
#[must_use]
pub fn position_usdc_weth(
    fee_tier: FeeTier,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
) -> Position {
    Position::new(
        U256::from(1u8),
        usdc(),
        weth(),
        fee_tier,
        tick_lower,
        tick_upper,
        liquidity,
    )
}

/// Returns a USDC/WETH 0.05% pool slot at exactly `tick`.
///
/// # Panics
///
/// Panics if `tick` is outside the valid tick range.
#[must_use]
pub fn pool_slot_at_tick(tick: i32) -> PoolSlot {
    let sqrt_price = get_sqrt_ratio_at_tick(tick).expect("tick out of range");
    PoolSlot::new(usdc(), weth(), FeeTier::Low, tick, sqrt_price)
}
