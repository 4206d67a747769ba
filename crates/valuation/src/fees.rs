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

//! Cascading estimation of a position's uncollected swap fees.
//!
//! Strategies run in the configured order and the first success wins:
//!
//! 1. [`FeeStrategyKind::SimulatedCollect`] simulates the position manager's `collect` and is
//!    [`FeeConfidence::Exact`].
//! 2. [`FeeStrategyKind::OwedSnapshot`] reads the `tokensOwed` snapshot, stale since the last
//!    on-chain touch of the position.
//! 3. [`FeeStrategyKind::ShiftHeuristic`] decodes a staking wrapper's undocumented accounting
//!    fields by probing right shifts against a USD plausibility band. The field semantics are
//!    unverified, so this never reports more than [`FeeConfidence::Approximate`].
//!
//! When every strategy fails the estimate is [`FeeEstimate::unavailable`]; fee failures never
//! surface as errors.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use alloy_primitives::U256;
use anyhow::bail;
use lpscope_model::{
    fee::{FeeConfidence, FeeEstimate, FeeStrategyKind},
    math::conversion::u256_to_f64_scaled,
    position::Position,
};
use serde::{Deserialize, Serialize};

use crate::{error::ValuationError, reader::ChainReader};

/// The USD range a decoded fee candidate must fall in to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityBand {
    /// Inclusive lower bound in USD.
    pub min_usd: f64,
    /// Inclusive upper bound in USD.
    pub max_usd: f64,
}

impl PlausibilityBand {
    /// Creates a new [`PlausibilityBand`] instance.
    #[must_use]
    pub const fn new(min_usd: f64, max_usd: f64) -> Self {
        Self { min_usd, max_usd }
    }

    /// Returns whether `usd` lies within the band.
    #[must_use]
    pub fn contains(&self, usd: f64) -> bool {
        (self.min_usd..=self.max_usd).contains(&usd)
    }
}

impl Default for PlausibilityBand {
    fn default() -> Self {
        Self::new(0.01, 100_000.0)
    }
}

/// Configuration for [`FeeEstimator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeEstimatorConfig {
    /// Strategies to try, in order.
    pub strategies: Vec<FeeStrategyKind>,
    /// Right-shift amounts probed by the heuristic strategy, in order.
    pub shift_candidates: Vec<u32>,
    /// The USD band a heuristic candidate must fall in.
    pub band: PlausibilityBand,
    /// Rejects heuristic candidates worth more than this fraction of the position's value.
    pub max_fraction_of_position: Option<f64>,
}

impl Default for FeeEstimatorConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                FeeStrategyKind::SimulatedCollect,
                FeeStrategyKind::OwedSnapshot,
                FeeStrategyKind::ShiftHeuristic,
            ],
            shift_candidates: vec![64, 96, 128, 160, 192],
            band: PlausibilityBand::default(),
            max_fraction_of_position: Some(1.0),
        }
    }
}

impl FeeEstimatorConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Config`] if no strategy is configured, a shift is not below
    /// 256, the band is empty or negative, or the position fraction is not positive.
    pub fn validate(&self) -> Result<(), ValuationError> {
        if self.strategies.is_empty() {
            return Err(config_error("fees.strategies must not be empty"));
        }
        if let Some(shift) = self.shift_candidates.iter().find(|shift| **shift >= 256) {
            return Err(config_error(&format!(
                "fees.shift_candidates must be below 256, was {shift}"
            )));
        }
        let band = self.band;
        if !(band.min_usd.is_finite() && band.max_usd.is_finite())
            || band.min_usd < 0.0
            || band.min_usd > band.max_usd
        {
            return Err(config_error(&format!(
                "fees.band must satisfy 0 <= min_usd <= max_usd, was [{}, {}]",
                band.min_usd, band.max_usd
            )));
        }
        if let Some(fraction) = self.max_fraction_of_position {
            if fraction.is_nan() || fraction <= 0.0 {
                return Err(config_error(&format!(
                    "fees.max_fraction_of_position must be positive, was {fraction}"
                )));
            }
        }
        Ok(())
    }
}

fn config_error(message: &str) -> ValuationError {
    ValuationError::Config(message.to_string())
}

/// Token metadata and prices the heuristic strategy needs to value candidates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeePricing {
    /// Decimals of token0.
    pub decimals0: u8,
    /// Decimals of token1.
    pub decimals1: u8,
    /// USD price of one whole token0, if resolved.
    pub price0_usd: Option<f64>,
    /// USD price of one whole token1, if resolved.
    pub price1_usd: Option<f64>,
    /// Value of the position's liquidity, used to cap heuristic candidates.
    pub position_value_usd: Option<f64>,
}

impl FeePricing {
    /// Returns the USD value of raw fee amounts, or `None` if a non-zero amount is unpriced.
    ///
    /// # Errors
    ///
    /// Returns an error if a token's decimals cannot be scaled.
    pub fn value_usd(&self, amount0: U256, amount1: U256) -> anyhow::Result<Option<f64>> {
        let Some(value0) = leg_usd(amount0, self.decimals0, self.price0_usd)? else {
            return Ok(None);
        };
        let Some(value1) = leg_usd(amount1, self.decimals1, self.price1_usd)? else {
            return Ok(None);
        };
        Ok(Some(value0 + value1))
    }
}

fn leg_usd(amount: U256, decimals: u8, price_usd: Option<f64>) -> anyhow::Result<Option<f64>> {
    if amount.is_zero() {
        return Ok(Some(0.0));
    }
    match price_usd {
        Some(price) => Ok(Some(u256_to_f64_scaled(amount, decimals)? * price)),
        None => Ok(None),
    }
}

/// Estimates uncollected fees by running strategies until one succeeds.
#[derive(Clone)]
pub struct FeeEstimator {
    reader: Arc<dyn ChainReader>,
    config: FeeEstimatorConfig,
}

impl FeeEstimator {
    /// Creates a new [`FeeEstimator`] instance.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Config`] if `config` is invalid.
    pub fn new(
        reader: Arc<dyn ChainReader>,
        config: FeeEstimatorConfig,
    ) -> Result<Self, ValuationError> {
        config.validate()?;
        Ok(Self { reader, config })
    }

    /// Estimates the uncollected fees of `position`.
    ///
    /// Never fails: strategy errors are logged and the next strategy is tried.
    pub async fn estimate(&self, position: &Position, pricing: &FeePricing) -> FeeEstimate {
        for &kind in &self.config.strategies {
            match self.run(kind, position, pricing).await {
                Ok(estimate) => {
                    tracing::debug!(
                        "Fee estimate for position {} from {kind}: {} / {}",
                        position.token_id,
                        estimate.amount0,
                        estimate.amount1
                    );
                    return estimate;
                }
                Err(e) => {
                    tracing::debug!(
                        "Fee strategy {kind} failed for position {}: {e}",
                        position.token_id
                    );
                }
            }
        }

        tracing::warn!("No fee estimate available for position {}", position.token_id);
        FeeEstimate::unavailable()
    }

    async fn run(
        &self,
        kind: FeeStrategyKind,
        position: &Position,
        pricing: &FeePricing,
    ) -> anyhow::Result<FeeEstimate> {
        match kind {
            FeeStrategyKind::SimulatedCollect => self.simulated_collect(position).await,
            FeeStrategyKind::OwedSnapshot => owed_snapshot(position),
            FeeStrategyKind::ShiftHeuristic => self.shift_heuristic(position, pricing).await,
        }
    }

    async fn simulated_collect(&self, position: &Position) -> anyhow::Result<FeeEstimate> {
        let (amount0, amount1) = self.reader.simulate_collect(position.token_id).await?;
        Ok(FeeEstimate::new(
            amount0,
            amount1,
            FeeConfidence::Exact,
            FeeStrategyKind::SimulatedCollect,
        ))
    }

    async fn shift_heuristic(
        &self,
        position: &Position,
        pricing: &FeePricing,
    ) -> anyhow::Result<FeeEstimate> {
        let Some((field0, field1)) = self
            .reader
            .get_staking_fee_accounting(position.token_id)
            .await?
        else {
            bail!("No staking fee accounting exposed");
        };

        let max_u128 = U256::from(u128::MAX);
        let cap_usd = self
            .config
            .max_fraction_of_position
            .zip(pricing.position_value_usd)
            .map(|(fraction, value)| fraction * value);

        for &shift in &self.config.shift_candidates {
            let amount0 = field0 >> shift as usize;
            let amount1 = field1 >> shift as usize;

            if (amount0.is_zero() && amount1.is_zero()) || amount0 > max_u128 || amount1 > max_u128
            {
                continue;
            }

            let Some(usd) = pricing.value_usd(amount0, amount1)? else {
                bail!("Cannot value heuristic candidates without token prices");
            };

            if !self.config.band.contains(usd) {
                tracing::trace!("Shift {shift} yields ${usd}, outside plausibility band");
                continue;
            }
            if cap_usd.is_some_and(|cap| usd > cap) {
                tracing::trace!("Shift {shift} yields ${usd}, above position value cap");
                continue;
            }

            tracing::debug!("Accepted fee decoding shift {shift} at ${usd}");
            return Ok(FeeEstimate::new(
                amount0,
                amount1,
                FeeConfidence::Approximate,
                FeeStrategyKind::ShiftHeuristic,
            ));
        }

        bail!("No shift candidate within the plausibility band")
    }
}

/// A staked position's manager snapshot belongs to the staking contract, so an empty snapshot
/// there says nothing about fees.
fn owed_snapshot(position: &Position) -> anyhow::Result<FeeEstimate> {
    let owed_nothing = position.tokens_owed_0 == 0 && position.tokens_owed_1 == 0;
    if owed_nothing && position.is_staked {
        bail!("Owed snapshot of a staked position is empty");
    }

    Ok(FeeEstimate::new(
        U256::from(position.tokens_owed_0),
        U256::from(position.tokens_owed_1),
        FeeConfidence::Approximate,
        FeeStrategyKind::OwedSnapshot,
    ))
}

impl Debug for FeeEstimator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(FeeEstimator))
            .field("reader", &self.reader)
            .field("config", &self.config)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
