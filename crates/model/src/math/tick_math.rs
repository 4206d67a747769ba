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

//! Conversions between ticks and Q64.96 sqrt prices.
//!
//! Reproduces the canonical concentrated-liquidity `TickMath` library bit for bit: the sqrt
//! ratio for `|tick|` is built by multiplying Q128.128 constants of `1/sqrt(1.0001)^(2^i)` for
//! each set bit, inverted for positive ticks, then rounded up to Q64.96.

use alloy_primitives::{U160, U256};

use super::full_math::{FullMath, Q128};
use crate::error::ModelError;

/// The minimum tick that can be used on any pool.
pub const MIN_TICK: i32 = -887_272;

/// The maximum tick that can be used on any pool.
pub const MAX_TICK: i32 = -MIN_TICK;

/// The sqrt ratio at [`MIN_TICK`], i.e. `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U160 = U160::from_limbs([4_295_128_739, 0, 0]);

/// The sqrt ratio at [`MAX_TICK`], i.e. `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U160 =
    U160::from_limbs([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963]);

/// Q128.128 value of `1/sqrt(1.0001)` used when bit 0 of `|tick|` is set.
const TICK_BIT_0: u128 = 0xfffc_b933_bd6f_ad37_aa2d_162d_1a59_4001;

/// Q128.128 values of `1/sqrt(1.0001)^(2^i)` for bits 1 through 19 of `|tick|`.
const TICK_MULTIPLIERS: [u128; 19] = [
    0xfff9_7272_373d_4132_59a4_6990_580e_213a,
    0xfff2_e50f_5f65_6932_ef12_357c_f3c7_fdcc,
    0xffe5_caca_7e10_e4e6_1c36_24ea_a094_1cd0,
    0xffcb_9843_d60f_6159_c9db_5883_5c92_6644,
    0xff97_3b41_fa98_c081_472e_6896_dfb2_54c0,
    0xff2e_a164_66c9_6a38_43ec_78b3_26b5_2861,
    0xfe5d_ee04_6a99_a2a8_11c4_61f1_969c_3053,
    0xfcbe_86c7_900a_88ae_dcff_c83b_479a_a3a4,
    0xf987_a725_3ac4_1317_6f2b_074c_f781_5e54,
    0xf339_2b08_22b7_0005_940c_7a39_8e4b_70f3,
    0xe715_9475_a2c2_9b74_43b2_9c7f_a6e8_89d9,
    0xd097_f3bd_fd20_22b8_845a_d8f7_92aa_5825,
    0xa9f7_4646_2d87_0fdf_8a65_dc1f_90e0_61e5,
    0x70d8_69a1_56d2_a1b8_90bb_3df6_2baf_32f7,
    0x31be_135f_97d0_8fd9_8123_1505_542f_cfa6,
    0x09aa_508b_5b7a_84e1_c677_de54_f3e9_9bc9,
    0x005d_6af8_dedb_8119_6699_c329_225e_e604,
    0x0000_2216_e584_f5fa_1ea9_2604_1bed_fe98,
    0x0000_0000_048a_1703_91f7_dc42_444e_8fa2,
];

/// Validates that `tick` lies within `[MIN_TICK, MAX_TICK]`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidTick`] if the tick is out of range.
pub fn check_tick(tick: i32) -> Result<(), ModelError> {
    if (MIN_TICK..=MAX_TICK).contains(&tick) {
        Ok(())
    } else {
        Err(ModelError::InvalidTick { tick })
    }
}

/// Returns whether `tick` is aligned to `tick_spacing`.
#[must_use]
pub fn is_aligned_tick(tick: i32, tick_spacing: i32) -> bool {
    tick_spacing > 0 && tick % tick_spacing == 0
}

/// Calculates `sqrt(1.0001^tick) * 2^96` as a Q64.96 fixed-point number.
///
/// # Errors
///
/// Returns [`ModelError::InvalidTick`] if `tick` is outside `[MIN_TICK, MAX_TICK]`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U160, ModelError> {
    check_tick(tick)?;

    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(TICK_BIT_0)
    } else {
        Q128
    };

    for (i, multiplier) in TICK_MULTIPLIERS.iter().enumerate() {
        if abs_tick & (1 << (i + 1)) != 0 {
            ratio = FullMath::mul_shift(ratio, U256::from(*multiplier), 128)
                .map_err(|e| ModelError::Arithmetic(e.to_string()))?;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 to Q64.96, rounding up so the result never understates the price
    let remainder_mask = (U256::from(1u8) << 32) - U256::from(1u8);
    let mut sqrt_price = ratio >> 32;
    let remainder: U256 = ratio & remainder_mask;
    if !remainder.is_zero() {
        sqrt_price += U256::from(1u8);
    }

    Ok(U160::from(sqrt_price))
}

/// Calculates the greatest tick whose sqrt ratio is less than or equal to `sqrt_price_x96`.
///
/// The search runs over [`get_sqrt_ratio_at_tick`] itself, so the result is consistent with
/// the forward conversion by construction.
///
/// # Errors
///
/// Returns [`ModelError::InvalidSqrtPrice`] if the price is outside
/// `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U160) -> Result<i32, ModelError> {
    check_sqrt_price(sqrt_price_x96)?;

    let mut low = MIN_TICK;
    let mut high = MAX_TICK - 1;

    while low < high {
        // Round the midpoint up so `low = mid` always makes progress
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Ok(low)
}

/// Validates that a sqrt price lies within `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidSqrtPrice`] otherwise.
pub fn check_sqrt_price(sqrt_price_x96: U160) -> Result<(), ModelError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(ModelError::InvalidSqrtPrice(sqrt_price_x96));
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    // Reference vectors match the TickMath.sol test suite
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::math::full_math::Q96_U160;

    fn u160(value: &str) -> U160 {
        U160::from_str_radix(value, 10).unwrap()
    }

    #[rstest]
    #[case(MIN_TICK, "4295128739")]
    #[case(MIN_TICK + 1, "4295343490")]
    #[case(-200_000, "3598751819609688046946419")]
    #[case(-2000, "71688964425171947676218820835")]
    #[case(-1000, "75364347830767020784054125655")]
    #[case(-1, "79224201403219477170569942574")]
    #[case(0, "79228162514264337593543950336")]
    #[case(1, "79232123823359799118286999568")]
    #[case(50, "79426470787362580746886972461")]
    #[case(100, "79625275426524748796330556128")]
    #[case(1000, "83290069058676223003182343270")]
    #[case(2000, "87560223330309670419052669889")]
    #[case(5000, "101729702841318637793976746270")]
    #[case(50_000, "965075977353221155028623082916")]
    #[case(200_000, "1744244129640337381386292603617838")]
    #[case(MAX_TICK - 1, "1461373636630004318706518188784493106690254656249")]
    #[case(MAX_TICK, "1461446703485210103287273052203988822378723970342")]
    fn test_get_sqrt_ratio_at_tick_reference_vectors(#[case] tick: i32, #[case] expected: &str) {
        assert_eq!(get_sqrt_ratio_at_tick(tick).unwrap(), u160(expected));
    }

    #[rstest]
    fn test_bounds_match_constants() {
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK).unwrap(), MIN_SQRT_RATIO);
        assert_eq!(get_sqrt_ratio_at_tick(MAX_TICK).unwrap(), MAX_SQRT_RATIO);
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), Q96_U160);
    }

    #[rstest]
    #[case(MIN_TICK - 1)]
    #[case(MAX_TICK + 1)]
    #[case(i32::MIN)]
    #[case(i32::MAX)]
    fn test_get_sqrt_ratio_at_tick_rejects_out_of_range(#[case] tick: i32) {
        assert_eq!(
            get_sqrt_ratio_at_tick(tick),
            Err(ModelError::InvalidTick { tick })
        );
    }

    #[rstest]
    #[case(-500_000)]
    #[case(-50_000)]
    #[case(-250)]
    #[case(-3)]
    #[case(7)]
    #[case(3000)]
    #[case(150_000)]
    #[case(400_000)]
    fn test_get_sqrt_ratio_at_tick_close_to_float_formula(#[case] tick: i32) {
        let result = get_sqrt_ratio_at_tick(tick).unwrap();
        let result_f64: f64 = result.to_string().parse().unwrap();
        let expected = 1.0001_f64.powf(f64::from(tick) / 2.0) * 2f64.powi(96);
        let relative_error = ((result_f64 - expected) / expected).abs();
        assert!(
            relative_error < 1e-9,
            "tick={tick} result={result_f64} expected={expected}"
        );
    }

    #[rstest]
    #[case("4295128739", MIN_TICK)]
    #[case("79228162514264337593543950336", 0)]
    #[case("79228162514264337593543950335", -1)]
    #[case("112045541949572279837463876454", 6931)]
    #[case("56022770974786139918731938227", -6932)]
    #[case("1461446703485210103287273052203988822378723970341", MAX_TICK - 1)]
    fn test_get_tick_at_sqrt_ratio(#[case] sqrt_price: &str, #[case] expected: i32) {
        assert_eq!(get_tick_at_sqrt_ratio(u160(sqrt_price)).unwrap(), expected);
    }

    #[rstest]
    fn test_get_tick_at_sqrt_ratio_rejects_out_of_range() {
        let below = MIN_SQRT_RATIO - U160::from(1);
        assert_eq!(
            get_tick_at_sqrt_ratio(below),
            Err(ModelError::InvalidSqrtPrice(below))
        );
        assert_eq!(
            get_tick_at_sqrt_ratio(MAX_SQRT_RATIO),
            Err(ModelError::InvalidSqrtPrice(MAX_SQRT_RATIO))
        );
    }

    #[rstest]
    #[case(0, 10, true)]
    #[case(-20, 10, true)]
    #[case(15, 10, false)]
    #[case(600, 200, true)]
    #[case(10, 0, false)]
    fn test_is_aligned_tick(#[case] tick: i32, #[case] spacing: i32, #[case] expected: bool) {
        assert_eq!(is_aligned_tick(tick, spacing), expected);
    }

    proptest! {
        #[test]
        fn prop_sqrt_ratio_strictly_increases(tick in MIN_TICK..MAX_TICK) {
            let lower = get_sqrt_ratio_at_tick(tick).unwrap();
            let upper = get_sqrt_ratio_at_tick(tick + 1).unwrap();
            prop_assert!(lower < upper);
        }

        #[test]
        fn prop_tick_round_trips(tick in MIN_TICK..MAX_TICK) {
            let sqrt_price = get_sqrt_ratio_at_tick(tick).unwrap();
            prop_assert_eq!(get_tick_at_sqrt_ratio(sqrt_price).unwrap(), tick);
        }
    }
}
