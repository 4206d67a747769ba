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

//! Token amounts implied by liquidity between two sqrt prices.

use alloy_primitives::{U160, U256};

use super::{
    conversion::limbs_to_f64,
    full_math::{FullMath, Q96},
};
use crate::error::ModelError;

fn arithmetic(e: anyhow::Error) -> ModelError {
    ModelError::Arithmetic(e.to_string())
}

fn ordered(sqrt_ratio_ax96: U160, sqrt_ratio_bx96: U160) -> Result<(U256, U256), ModelError> {
    let (lower, upper) = if sqrt_ratio_ax96 > sqrt_ratio_bx96 {
        (sqrt_ratio_bx96, sqrt_ratio_ax96)
    } else {
        (sqrt_ratio_ax96, sqrt_ratio_bx96)
    };

    if lower.is_zero() {
        return Err(ModelError::InvalidSqrtPrice(lower));
    }
    Ok((U256::from(lower), U256::from(upper)))
}

/// Encodes the price `amount1 / amount0` as a Q64.96 sqrt price.
///
/// Calculates `sqrt(amount1 / amount0) * 2^96`, saturating at `U160::MAX`.
///
/// # Errors
///
/// Returns an error if `amount0` is zero.
pub fn encode_sqrt_ratio_x96(amount1: u128, amount0: u128) -> Result<U160, ModelError> {
    if amount0 == 0 {
        return Err(ModelError::Arithmetic(
            "Cannot encode a sqrt ratio with a zero denominator".to_string(),
        ));
    }
    if amount1 == 0 {
        return Ok(U160::ZERO);
    }

    let numerator = U256::from(amount1);
    let denominator = U256::from(amount0);
    let q192 = U256::from(1u8) << 192;

    // sqrt(a1 / a0) * 2^96 == sqrt(a1 * 2^192 / a0) while the scaled ratio fits in 256 bits
    let encoded = if numerator > U256::MAX / q192 {
        FullMath::mul_div(
            FullMath::sqrt(numerator),
            Q96,
            FullMath::sqrt(denominator),
        )
        .map_err(arithmetic)?
    } else {
        FullMath::sqrt(FullMath::mul_div(numerator, q192, denominator).map_err(arithmetic)?)
    };

    if encoded > U256::from(U160::MAX) {
        Ok(U160::MAX)
    } else {
        Ok(U160::from(encoded))
    }
}

/// Calculates the amount of token0 held by `liquidity` between two sqrt prices.
///
/// Computes `liquidity * 2^96 * (sqrt_b - sqrt_a) / sqrt_b / sqrt_a`. The order of the two
/// prices does not matter.
///
/// # Errors
///
/// Returns an error if the lower sqrt price is zero or the result overflows 256 bits.
pub fn get_amount0_delta(
    sqrt_ratio_ax96: U160,
    sqrt_ratio_bx96: U160,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, ModelError> {
    let (sqrt_ratio_a, sqrt_ratio_b) = ordered(sqrt_ratio_ax96, sqrt_ratio_bx96)?;

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sqrt_ratio_b - sqrt_ratio_a;

    if round_up {
        let intermediate = FullMath::mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_b)
            .map_err(arithmetic)?;
        FullMath::div_rounding_up(intermediate, sqrt_ratio_a).map_err(arithmetic)
    } else {
        let intermediate =
            FullMath::mul_div(numerator1, numerator2, sqrt_ratio_b).map_err(arithmetic)?;
        Ok(intermediate / sqrt_ratio_a)
    }
}

/// Calculates the amount of token1 held by `liquidity` between two sqrt prices.
///
/// Computes `liquidity * (sqrt_b - sqrt_a) / 2^96`. The order of the two prices does not
/// matter.
///
/// # Errors
///
/// Returns an error if the lower sqrt price is zero or the result overflows 256 bits.
pub fn get_amount1_delta(
    sqrt_ratio_ax96: U160,
    sqrt_ratio_bx96: U160,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, ModelError> {
    let (sqrt_ratio_a, sqrt_ratio_b) = ordered(sqrt_ratio_ax96, sqrt_ratio_bx96)?;
    let liquidity = U256::from(liquidity);
    let difference = sqrt_ratio_b - sqrt_ratio_a;

    let amount = if round_up {
        FullMath::mul_div_rounding_up(liquidity, difference, Q96)
    } else {
        FullMath::mul_div(liquidity, difference, Q96)
    };
    amount.map_err(arithmetic)
}

/// Converts a Q64.96 sqrt price to the display price of one whole token0 in whole token1.
///
/// The raw ratio `(sqrt_price / 2^96)^2` is in raw token1 units per raw token0 unit and is
/// rescaled by `10^(decimals0 - decimals1)`.
#[must_use]
pub fn sqrt_price_to_price(sqrt_price_x96: U160, decimals0: u8, decimals1: u8) -> f64 {
    let sqrt_price = limbs_to_f64(sqrt_price_x96.as_limbs()) / limbs_to_f64(Q96.as_limbs());
    let scale = 10f64.powi(i32::from(decimals0) - i32::from(decimals1));
    sqrt_price * sqrt_price * scale
}

/// Scales a whole number of tokens to an 18 decimal raw amount.
#[must_use]
pub fn expand_to_18_decimals(amount: u64) -> u128 {
    u128::from(amount) * 10u128.pow(18)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::math::{full_math::Q96_U160, tick_math::get_sqrt_ratio_at_tick};

    fn encode(amount1: u128, amount0: u128) -> U160 {
        encode_sqrt_ratio_x96(amount1, amount0).unwrap()
    }

    #[rstest]
    fn test_encode_sqrt_ratio_x96_some_values() {
        assert_eq!(encode(1, 1), Q96_U160);
        assert_eq!(
            encode(100, 1),
            U160::from(792_281_625_142_643_375_935_439_503_360_u128)
        );
        assert_eq!(
            encode(1, 100),
            U160::from(7_922_816_251_426_433_759_354_395_033_u128)
        );
        assert_eq!(
            encode(111, 333),
            U160::from(45_742_400_955_009_932_534_161_870_629_u128)
        );
        assert_eq!(
            encode(333, 111),
            U160::from(137_227_202_865_029_797_602_485_611_888_u128)
        );
        assert_eq!(
            encode(121, 100),
            U160::from(87_150_978_765_690_771_352_898_345_369_u128)
        );
    }

    #[rstest]
    fn test_encode_sqrt_ratio_x96_zero_numerator_and_denominator() {
        assert_eq!(encode(0, 5), U160::ZERO);
        assert!(matches!(
            encode_sqrt_ratio_x96(5, 0),
            Err(ModelError::Arithmetic(_))
        ));
    }

    #[rstest]
    fn test_encode_sqrt_ratio_x96_large_numerator_takes_split_sqrt_path() {
        // 2^96 / 1 squared-root is 2^48, scaled by 2^96
        let encoded = encode(1u128 << 96, 1);
        assert_eq!(U256::from(encoded), U256::from(1u8) << 144);
    }

    #[rstest]
    fn test_get_amount0_delta_returns_0_if_liquidity_is_0() {
        let amount0 = get_amount0_delta(encode(1, 1), encode(2, 1), 0, true).unwrap();
        assert_eq!(amount0, U256::ZERO);
    }

    #[rstest]
    fn test_get_amount0_delta_returns_0_if_prices_are_equal() {
        let amount0 =
            get_amount0_delta(encode(1, 1), encode(1, 1), expand_to_18_decimals(1), true).unwrap();
        assert_eq!(amount0, U256::ZERO);
    }

    #[rstest]
    fn test_get_amount0_delta_for_price_of_1_to_1_21() {
        let amount0 =
            get_amount0_delta(encode(1, 1), encode(121, 100), expand_to_18_decimals(1), true)
                .unwrap();
        assert_eq!(amount0, U256::from(90_909_090_909_090_910u128));

        let amount0_rounded_down =
            get_amount0_delta(encode(1, 1), encode(121, 100), expand_to_18_decimals(1), false)
                .unwrap();
        assert_eq!(amount0_rounded_down, amount0 - U256::from(1));
    }

    #[rstest]
    fn test_get_amount0_delta_is_symmetric_in_price_order() {
        let forward =
            get_amount0_delta(encode(1, 1), encode(121, 100), expand_to_18_decimals(1), true)
                .unwrap();
        let reverse =
            get_amount0_delta(encode(121, 100), encode(1, 1), expand_to_18_decimals(1), true)
                .unwrap();
        assert_eq!(forward, reverse);
    }

    #[rstest]
    fn test_get_amount0_delta_works_for_prices_that_overflow() {
        let price_low = encode(1u128 << 90, 1);
        let price_high = encode(1u128 << 96, 1);

        let amount0_up =
            get_amount0_delta(price_low, price_high, expand_to_18_decimals(1), true).unwrap();
        let amount0_down =
            get_amount0_delta(price_low, price_high, expand_to_18_decimals(1), false).unwrap();

        assert_eq!(amount0_up, U256::from(24_869u64));
        assert_eq!(amount0_up, amount0_down + U256::from(1));
    }

    #[rstest]
    fn test_get_amount0_delta_rejects_zero_price() {
        let result = get_amount0_delta(U160::ZERO, Q96_U160, 1, true);
        assert_eq!(result, Err(ModelError::InvalidSqrtPrice(U160::ZERO)));
    }

    #[rstest]
    fn test_get_amount1_delta_returns_0_if_liquidity_is_0() {
        let amount1 = get_amount1_delta(encode(1, 1), encode(2, 1), 0, true).unwrap();
        assert_eq!(amount1, U256::ZERO);
    }

    #[rstest]
    fn test_get_amount1_delta_returns_0_if_prices_are_equal() {
        let amount1 =
            get_amount1_delta(encode(1, 1), encode(1, 1), expand_to_18_decimals(1), true).unwrap();
        assert_eq!(amount1, U256::ZERO);
    }

    #[rstest]
    fn test_get_amount1_delta_for_price_of_1_to_1_21() {
        let amount1 =
            get_amount1_delta(encode(1, 1), encode(121, 100), expand_to_18_decimals(1), true)
                .unwrap();
        assert_eq!(amount1, U256::from(100_000_000_000_000_000u128));

        let amount1_rounded_down =
            get_amount1_delta(encode(1, 1), encode(121, 100), expand_to_18_decimals(1), false)
                .unwrap();
        assert_eq!(amount1_rounded_down, amount1 - U256::from(1));
    }

    #[rstest]
    fn test_amounts_across_symmetric_tick_range() {
        let lower = get_sqrt_ratio_at_tick(-1000).unwrap();
        let upper = get_sqrt_ratio_at_tick(1000).unwrap();
        let liquidity = expand_to_18_decimals(1);

        let amount0 = get_amount0_delta(lower, upper, liquidity, true).unwrap();
        let amount1 = get_amount1_delta(lower, upper, liquidity, true).unwrap();

        assert_eq!(amount0, U256::from(100_036_665_958_045_480u128));
        assert_eq!(amount1, U256::from(100_036_665_958_045_480u128));
    }

    #[rstest]
    #[case(Q96_U160, 18, 18, 1.0)]
    #[case(Q96_U160, 18, 6, 1e12)]
    #[case(Q96_U160, 6, 18, 1e-12)]
    fn test_sqrt_price_to_price_exact(
        #[case] sqrt_price: U160,
        #[case] decimals0: u8,
        #[case] decimals1: u8,
        #[case] expected: f64,
    ) {
        let price = sqrt_price_to_price(sqrt_price, decimals0, decimals1);
        assert!((price / expected - 1.0).abs() < 1e-12);
    }

    #[rstest]
    fn test_sqrt_price_to_price_usdc_weth_style_pool() {
        // token0 with 6 decimals priced in an 18 decimal token1 at tick 200000
        let sqrt_price = get_sqrt_ratio_at_tick(200_000).unwrap();
        let price = sqrt_price_to_price(sqrt_price, 6, 18);
        assert!((price / 0.000_484_680_305_025_733_5 - 1.0).abs() < 1e-9);
    }

    #[rstest]
    fn test_sqrt_price_to_price_near_one_for_stable_pair() {
        // Stablecoin pair with 6 and 18 decimals trading at parity
        let sqrt_price = get_sqrt_ratio_at_tick(-276_324).unwrap();
        let price = sqrt_price_to_price(sqrt_price, 18, 6);
        assert!((price - 1.000_002_643_830_950_6).abs() < 1e-9);
    }
}
