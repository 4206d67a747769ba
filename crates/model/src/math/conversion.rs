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

//! Conversions from raw token units to human-scale values.
//!
//! Raw amounts are scaled by `10^decimals` using integer arithmetic only. Floating point is
//! introduced at the very last step, either by parsing the exact decimal rendering or, for
//! fixed-point prices, by folding the limbs directly.

use alloy_primitives::U256;
use anyhow::bail;

/// Maximum decimals such that `10^decimals` fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn pow10(decimals: u8) -> anyhow::Result<U256> {
    if decimals > MAX_DECIMALS {
        bail!("Decimals {decimals} exceed the capacity of U256 (max {MAX_DECIMALS})");
    }
    Ok(U256::from(10u8).pow(U256::from(decimals)))
}

/// Splits `amount / 10^decimals` into its integer part and a zero-padded fraction of exactly
/// `decimals` digits.
fn scaled_parts(amount: U256, decimals: u8) -> anyhow::Result<(U256, String)> {
    if decimals == 0 {
        return Ok((amount, String::new()));
    }

    let denominator = pow10(decimals)?;
    let fraction = (amount % denominator).to_string();
    let width = decimals as usize;

    Ok((amount / denominator, format!("{fraction:0>width$}")))
}

/// Renders a raw token amount as an exact decimal string with trailing zeros trimmed.
///
/// # Examples
///
/// - `1_000_000_000_000_000_000` with 18 decimals renders as `"1"`.
/// - `12_345` with 6 decimals renders as `"0.012345"`.
///
/// # Errors
///
/// Returns an error if `decimals` exceeds [`MAX_DECIMALS`].
pub fn u256_to_decimal_string(amount: U256, decimals: u8) -> anyhow::Result<String> {
    let (integer, fraction) = scaled_parts(amount, decimals)?;
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        Ok(integer.to_string())
    } else {
        Ok(format!("{integer}.{fraction}"))
    }
}

/// Converts a raw token amount to whole tokens as the nearest `f64`.
///
/// The exact decimal rendering is parsed, so the only rounding is the final one into `f64`.
///
/// # Errors
///
/// Returns an error if `decimals` exceeds [`MAX_DECIMALS`].
pub fn u256_to_f64_scaled(amount: U256, decimals: u8) -> anyhow::Result<f64> {
    let rendered = u256_to_decimal_string(amount, decimals)?;
    Ok(rendered.parse::<f64>()?)
}

/// Folds little-endian 64-bit limbs into an `f64`, losing precision beyond 53 bits.
#[must_use]
pub fn limbs_to_f64(limbs: &[u64]) -> f64 {
    limbs
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc.mul_add(TWO_POW_64, limb as f64))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use alloy_primitives::U160;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(U256::from(1_000_000_000_000_000_000u128), 18, "1")]
    #[case(U256::from(12_345u64), 6, "0.012345")]
    #[case(U256::from(1_500_000u64), 6, "1.5")]
    #[case(U256::from(42u64), 0, "42")]
    #[case(U256::ZERO, 18, "0")]
    #[case(U256::from(1u64), 18, "0.000000000000000001")]
    fn test_u256_to_decimal_string(
        #[case] amount: U256,
        #[case] decimals: u8,
        #[case] expected: &str,
    ) {
        assert_eq!(u256_to_decimal_string(amount, decimals).unwrap(), expected);
    }

    #[rstest]
    fn test_u256_to_decimal_string_max_value_with_max_decimals() {
        let rendered = u256_to_decimal_string(U256::MAX, MAX_DECIMALS).unwrap();
        assert!(rendered.starts_with("1.15792089237316195423570985008687907853"));
    }

    #[rstest]
    fn test_decimals_beyond_capacity_rejected() {
        assert!(u256_to_decimal_string(U256::from(1u8), 78).is_err());
        assert!(u256_to_f64_scaled(U256::from(1u8), 78).is_err());
    }

    #[rstest]
    #[case(U256::from(2_500_000u64), 6, 2.5)]
    #[case(U256::from(1_000_000_000_000_000_000u128), 18, 1.0)]
    #[case(U256::from(123_456_789u64), 8, 1.234_567_89)]
    #[case(U256::ZERO, 6, 0.0)]
    fn test_u256_to_f64_scaled(#[case] amount: U256, #[case] decimals: u8, #[case] expected: f64) {
        let value = u256_to_f64_scaled(amount, decimals).unwrap();
        assert!((value - expected).abs() <= f64::EPSILON * expected.abs().max(1.0));
    }

    #[rstest]
    fn test_u256_to_f64_scaled_large_amount_is_not_refused() {
        // 10^30 raw units at 6 decimals is 10^24 whole tokens, well past 2^53
        let amount = U256::from(10u8).pow(U256::from(30u8));
        let value = u256_to_f64_scaled(amount, 6).unwrap();
        assert!((value / 1e24 - 1.0).abs() < 1e-12);
    }

    #[rstest]
    fn test_limbs_to_f64() {
        assert_eq!(limbs_to_f64(U256::ZERO.as_limbs()), 0.0);
        assert_eq!(limbs_to_f64(U256::from(12_345u64).as_limbs()), 12_345.0);
        assert_eq!(
            limbs_to_f64(U160::from_limbs([0, 1 << 32, 0]).as_limbs()),
            2f64.powi(96)
        );
    }
}
