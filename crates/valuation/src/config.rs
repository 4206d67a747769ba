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

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{error::ValuationError, fees::FeeEstimatorConfig, oracle::OracleConfig};

/// Configuration for a [`PortfolioValuer`](crate::valuer::PortfolioValuer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Per price source deadline in milliseconds.
    pub source_timeout_ms: u64,
    /// The maximum number of positions valued concurrently.
    pub max_concurrency: usize,
    /// How long resolved token prices are reused, in milliseconds.
    pub price_cache_ttl_ms: u64,
    /// How long token metadata (symbol, decimals) is reused, in milliseconds.
    pub token_cache_ttl_ms: u64,
    /// Price quotes below this confidence are discarded.
    pub min_confidence: f64,
    /// Fee estimation settings.
    pub fees: FeeEstimatorConfig,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 5_000,
            max_concurrency: 4,
            price_cache_ttl_ms: 60_000,
            token_cache_ttl_ms: 3_600_000,
            min_confidence: 0.0,
            fees: FeeEstimatorConfig::default(),
        }
    }
}

impl ValuationConfig {
    /// Creates a new [`ValuationConfig`] instance, defaulting every `None`.
    #[must_use]
    pub fn new(
        source_timeout_ms: Option<u64>,
        max_concurrency: Option<usize>,
        price_cache_ttl_ms: Option<u64>,
        token_cache_ttl_ms: Option<u64>,
        min_confidence: Option<f64>,
        fees: Option<FeeEstimatorConfig>,
    ) -> Self {
        let default = Self::default();
        Self {
            source_timeout_ms: source_timeout_ms.unwrap_or(default.source_timeout_ms),
            max_concurrency: max_concurrency.unwrap_or(default.max_concurrency),
            price_cache_ttl_ms: price_cache_ttl_ms.unwrap_or(default.price_cache_ttl_ms),
            token_cache_ttl_ms: token_cache_ttl_ms.unwrap_or(default.token_cache_ttl_ms),
            min_confidence: min_confidence.unwrap_or(default.min_confidence),
            fees: fees.unwrap_or(default.fees),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Config`] if a timeout or the concurrency limit is zero,
    /// `min_confidence` is outside `[0, 1]`, or the fee settings are invalid.
    pub fn validate(&self) -> Result<(), ValuationError> {
        if self.source_timeout_ms == 0 {
            return Err(ValuationError::Config(
                "source_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ValuationError::Config(
                "max_concurrency must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ValuationError::Config(format!(
                "min_confidence must be within [0, 1], was {}",
                self.min_confidence
            )));
        }
        self.fees.validate()
    }

    /// Returns the settings for a [`PriceOracleAggregator`](crate::oracle::PriceOracleAggregator).
    #[must_use]
    pub fn oracle_config(&self) -> OracleConfig {
        OracleConfig {
            source_timeout_ms: self.source_timeout_ms,
            min_confidence: self.min_confidence,
        }
    }

    /// Returns how long resolved prices are reused.
    #[must_use]
    pub const fn price_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.price_cache_ttl_ms)
    }

    /// Returns how long token metadata is reused.
    #[must_use]
    pub const fn token_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.token_cache_ttl_ms)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
