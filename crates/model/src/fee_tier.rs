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

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use crate::error::ModelError;

/// Represents a pool fee tier in parts-per-million of swap volume.
///
/// Each tier maps deterministically to the tick spacing its pools are created with.
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
#[serde(try_from = "u32", into = "u32")]
pub enum FeeTier {
    /// 0.01%, for pegged pairs.
    Lowest,
    /// 0.05%, for stable and correlated pairs.
    Low,
    /// 0.25%.
    MediumLow,
    /// 0.30%, the standard tier for most pairs.
    Medium,
    /// 1.00%, for exotic pairs.
    High,
}

impl FeeTier {
    /// Returns the fee in parts-per-million.
    #[must_use]
    pub const fn fee(self) -> u32 {
        match self {
            Self::Lowest => 100,
            Self::Low => 500,
            Self::MediumLow => 2500,
            Self::Medium => 3000,
            Self::High => 10_000,
        }
    }

    /// Returns the minimum tick increment for pools in this tier.
    #[must_use]
    pub const fn tick_spacing(self) -> i32 {
        match self {
            Self::Lowest => 1,
            Self::Low => 10,
            Self::MediumLow => 50,
            Self::Medium => 60,
            Self::High => 200,
        }
    }

    /// Returns the fee as a fraction of swap volume, e.g. `0.003` for [`FeeTier::Medium`].
    #[must_use]
    pub fn fee_rate(self) -> f64 {
        f64::from(self.fee()) / 1_000_000.0
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = ModelError;

    fn try_from(fee: u32) -> Result<Self, Self::Error> {
        match fee {
            100 => Ok(Self::Lowest),
            500 => Ok(Self::Low),
            2500 => Ok(Self::MediumLow),
            3000 => Ok(Self::Medium),
            10_000 => Ok(Self::High),
            other => Err(ModelError::InvalidFeeTier(other)),
        }
    }
}

impl From<FeeTier> for u32 {
    fn from(tier: FeeTier) -> Self {
        tier.fee()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    #[case(100, 1)]
    #[case(500, 10)]
    #[case(2500, 50)]
    #[case(3000, 60)]
    #[case(10_000, 200)]
    fn test_fee_tier_tick_spacing(#[case] fee: u32, #[case] expected_spacing: i32) {
        let tier = FeeTier::try_from(fee).unwrap();
        assert_eq!(tier.tick_spacing(), expected_spacing);
        assert_eq!(u32::from(tier), fee);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(300)]
    #[case(1000)]
    #[case(100_000)]
    fn test_unrecognized_fee_tier_rejected(#[case] fee: u32) {
        assert_eq!(FeeTier::try_from(fee), Err(ModelError::InvalidFeeTier(fee)));
    }

    #[rstest]
    fn test_fee_tier_round_trips_through_every_variant() {
        for tier in FeeTier::iter() {
            assert_eq!(FeeTier::try_from(tier.fee()), Ok(tier));
        }
    }

    #[rstest]
    fn test_fee_tier_serializes_as_parts_per_million() {
        let json = serde_json::to_string(&FeeTier::Low).unwrap();
        assert_eq!(json, "500");

        let tier: FeeTier = serde_json::from_str("3000").unwrap();
        assert_eq!(tier, FeeTier::Medium);
        assert!(serde_json::from_str::<FeeTier>("123").is_err());
    }

    #[rstest]
    fn test_fee_rate() {
        assert!((FeeTier::Medium.fee_rate() - 0.003).abs() < f64::EPSILON);
        assert_eq!(FeeTier::Medium.to_string(), "Medium");
    }
}
