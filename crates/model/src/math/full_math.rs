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

//! Full-precision fixed-point primitives over 256-bit integers.
//!
//! Intermediate products are widened to 512 bits so that `a * b` never overflows before the
//! final division or shift. Results that do not fit back into 256 bits are reported as errors
//! rather than silently truncated.

use alloy_primitives::{U160, U256, U512};

/// 2^96, the resolution of Q64.96 fixed-point values.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

/// 2^128, the resolution of Q128.128 fee growth accumulators.
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);

/// 2^96 as a sqrt price, i.e. a price of exactly one.
pub const Q96_U160: U160 = U160::from_limbs([0, 1 << 32, 0]);

/// Full-precision multiply/divide helpers used by the tick and amount math.
#[derive(Debug, Clone, Copy)]
pub struct FullMath;

impl FullMath {
    /// Calculates `floor(a * b / denominator)` with a 512-bit intermediate product.
    ///
    /// # Errors
    ///
    /// Returns an error if `denominator` is zero or the quotient does not fit in 256 bits.
    pub fn mul_div(a: U256, b: U256, denominator: U256) -> anyhow::Result<U256> {
        if denominator.is_zero() {
            anyhow::bail!("Division by zero in mul_div");
        }

        let product = U512::from(a) * U512::from(b);
        let quotient = product / U512::from(denominator);

        narrow(quotient).ok_or_else(|| anyhow::anyhow!("mul_div result overflows U256"))
    }

    /// Calculates `ceil(a * b / denominator)` with a 512-bit intermediate product.
    ///
    /// # Errors
    ///
    /// Returns an error if `denominator` is zero or the quotient does not fit in 256 bits.
    pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> anyhow::Result<U256> {
        if denominator.is_zero() {
            anyhow::bail!("Division by zero in mul_div_rounding_up");
        }

        let product = U512::from(a) * U512::from(b);
        let denominator = U512::from(denominator);
        let mut quotient = product / denominator;
        if !(product % denominator).is_zero() {
            quotient += U512::from(1u8);
        }

        narrow(quotient)
            .ok_or_else(|| anyhow::anyhow!("mul_div_rounding_up result overflows U256"))
    }

    /// Calculates `ceil(a / denominator)`.
    ///
    /// # Errors
    ///
    /// Returns an error if `denominator` is zero.
    pub fn div_rounding_up(a: U256, denominator: U256) -> anyhow::Result<U256> {
        if denominator.is_zero() {
            anyhow::bail!("Division by zero in div_rounding_up");
        }

        let quotient = a / denominator;
        if (a % denominator).is_zero() {
            Ok(quotient)
        } else {
            // A non-zero remainder implies denominator >= 2, so the quotient is below U256::MAX
            Ok(quotient + U256::from(1u8))
        }
    }

    /// Calculates `(a * b) >> shift` without intermediate overflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the shifted product does not fit in 256 bits.
    pub fn mul_shift(a: U256, b: U256, shift: usize) -> anyhow::Result<U256> {
        let product = U512::from(a) * U512::from(b);
        narrow(product >> shift)
            .ok_or_else(|| anyhow::anyhow!("mul_shift result overflows U256 (shift={shift})"))
    }

    /// Integer square root via Newton's method.
    ///
    /// Returns the largest `r` such that `r * r <= x`.
    #[must_use]
    pub fn sqrt(x: U256) -> U256 {
        if x.is_zero() {
            return U256::ZERO;
        }

        // ceil(x / 2) is never below floor(sqrt(x)) for x >= 1
        let mut estimate = (x >> 1) + (x & U256::from(1u8));
        let mut result = x;

        while estimate < result {
            result = estimate;
            estimate = (x / estimate + estimate) >> 1;
        }

        result
    }

    /// Keeps the low 128 bits of `value`, matching Solidity's `uint128(x)` cast.
    #[must_use]
    pub fn truncate_to_u128(value: U256) -> u128 {
        let limbs = value.as_limbs();
        u128::from(limbs[0]) | (u128::from(limbs[1]) << 64)
    }
}

fn narrow(value: U512) -> Option<U256> {
    if value > U512::from(U256::MAX) {
        None
    } else {
        Some(U256::from(value))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
