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

//! Uncollected fee estimates.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// How much a [`FeeEstimate`] can be trusted.
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum FeeConfidence {
    /// Amounts as the position manager would pay them out right now.
    Exact,
    /// Amounts from a stale snapshot or a heuristic decoding.
    Approximate,
    /// No strategy produced an estimate; amounts are zero.
    Unavailable,
}

/// The strategy that produced a [`FeeEstimate`].
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    Display,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum FeeStrategyKind {
    /// A simulated `collect` call against the position manager.
    SimulatedCollect,
    /// The `tokensOwed` fields last written to the position.
    OwedSnapshot,
    /// Right-shift probing of a staking contract's opaque accounting fields.
    ShiftHeuristic,
}

/// An estimate of a position's uncollected swap fees in raw token units.
///
/// The [`FeeConfidence::Unavailable`] variant always carries zero amounts so USD sums stay
/// well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Uncollected token0 fees.
    pub amount0: U256,
    /// Uncollected token1 fees.
    pub amount1: U256,
    /// The confidence level of the amounts.
    pub confidence: FeeConfidence,
    /// The strategy that produced the estimate, if any did.
    pub source: Option<FeeStrategyKind>,
}

impl FeeEstimate {
    /// Creates an estimate attributed to `source`.
    #[must_use]
    pub const fn new(
        amount0: U256,
        amount1: U256,
        confidence: FeeConfidence,
        source: FeeStrategyKind,
    ) -> Self {
        Self {
            amount0,
            amount1,
            confidence,
            source: Some(source),
        }
    }

    /// Creates the zero-amount estimate returned when every strategy fails.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            amount0: U256::ZERO,
            amount1: U256::ZERO,
            confidence: FeeConfidence::Unavailable,
            source: None,
        }
    }

    /// Returns whether any strategy produced the estimate.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.confidence != FeeConfidence::Unavailable
    }
}

impl Default for FeeEstimate {
    fn default() -> Self {
        Self::unavailable()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
