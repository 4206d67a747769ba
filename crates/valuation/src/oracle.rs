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

//! Reduction of independent price sources into one robust USD price.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Duration,
};

use alloy_primitives::Address;
use futures::future::join_all;
use lpscope_model::quote::PriceQuote;
use serde::{Deserialize, Serialize};

use crate::{error::ValuationError, source::PriceSource};

/// Identifier recorded on aggregated quotes.
pub const MEDIAN_SOURCE_ID: &str = "median";

/// Configuration for [`PriceOracleAggregator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Per-source deadline in milliseconds; late sources count as failures.
    pub source_timeout_ms: u64,
    /// Quotes below this confidence count as failures.
    pub min_confidence: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 5_000,
            min_confidence: 0.0,
        }
    }
}

/// Returns the median of `values`, averaging the two central values for even counts.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Queries every configured [`PriceSource`] concurrently and reduces the answers to a median.
///
/// Failed, late, non-positive, non-finite and low-confidence quotes are logged and dropped. A
/// token is never assigned a default price: when no source answers the result is
/// [`ValuationError::NoPriceAvailable`].
#[derive(Clone)]
pub struct PriceOracleAggregator {
    sources: Vec<Arc<dyn PriceSource>>,
    config: OracleConfig,
}

impl PriceOracleAggregator {
    /// Creates a new [`PriceOracleAggregator`] instance.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Config`] if `sources` is empty, the timeout is zero, or
    /// `min_confidence` is outside `[0, 1]`.
    pub fn new(
        sources: Vec<Arc<dyn PriceSource>>,
        config: OracleConfig,
    ) -> Result<Self, ValuationError> {
        if sources.is_empty() {
            return Err(ValuationError::Config(
                "at least one price source is required".to_string(),
            ));
        }
        if config.source_timeout_ms == 0 {
            return Err(ValuationError::Config(
                "source_timeout_ms must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.min_confidence) {
            return Err(ValuationError::Config(format!(
                "min_confidence must be within [0, 1], was {}",
                config.min_confidence
            )));
        }

        Ok(Self { sources, config })
    }

    /// Returns the number of configured sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Resolves one USD price for `token` from every source.
    ///
    /// The returned quote carries [`MEDIAN_SOURCE_ID`] and a confidence equal to the mean
    /// confidence of the accepted quotes scaled by the fraction of sources that answered.
    ///
    /// Dropping the returned future drops every outstanding source query.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::NoPriceAvailable`] if no source produced a usable quote.
    pub async fn resolve(&self, token: Address) -> Result<PriceQuote, ValuationError> {
        let timeout = Duration::from_millis(self.config.source_timeout_ms);

        let results = join_all(self.sources.iter().map(|source| async move {
            let result = tokio::time::timeout(timeout, source.get_price(token)).await;
            (source.id(), result)
        }))
        .await;

        let mut accepted = Vec::with_capacity(results.len());
        for (source_id, result) in results {
            match result {
                Ok(Ok(quote)) if quote.is_usable(self.config.min_confidence) => {
                    accepted.push(quote);
                }
                Ok(Ok(quote)) => tracing::warn!(
                    "Discarding quote from {source_id} for {token}: price={}, confidence={}",
                    quote.price_usd,
                    quote.confidence
                ),
                Ok(Err(e)) => tracing::debug!("Price source {source_id} failed for {token}: {e}"),
                Err(_) => tracing::warn!(
                    "Price source {source_id} timed out for {token} after {timeout:?}"
                ),
            }
        }

        let prices: Vec<f64> = accepted.iter().map(|quote| quote.price_usd).collect();
        let Some(price_usd) = median(&prices) else {
            tracing::warn!("No price available for {token} from {} sources", self.sources.len());
            return Err(ValuationError::NoPriceAvailable(token));
        };

        let mean_confidence =
            accepted.iter().map(|quote| quote.confidence).sum::<f64>() / accepted.len() as f64;
        let coverage = accepted.len() as f64 / self.sources.len() as f64;

        tracing::debug!(
            "Resolved {token} at {price_usd} from {}/{} sources",
            accepted.len(),
            self.sources.len()
        );

        Ok(PriceQuote::new(
            MEDIAN_SOURCE_ID,
            price_usd,
            mean_confidence * coverage,
        ))
    }
}

impl Debug for PriceOracleAggregator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let source_ids: Vec<&str> = self.sources.iter().map(|source| source.id()).collect();
        f.debug_struct(stringify!(PriceOracleAggregator))
            .field("sources", &source_ids)
            .field("config", &self.config)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lpscope_model::stubs::{usdc, weth};
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::stubs::MockPriceSource;

    fn aggregator(sources: Vec<MockPriceSource>) -> PriceOracleAggregator {
        let sources = sources
            .into_iter()
            .map(|source| Arc::new(source) as Arc<dyn PriceSource>)
            .collect();
        PriceOracleAggregator::new(sources, OracleConfig::default()).unwrap()
    }

    fn priced(id: &str, price: f64) -> MockPriceSource {
        MockPriceSource::new(id).with_price(weth(), price)
    }

    #[rstest]
    #[case(&[1.0, 1.2, 0.9], 1.0)]
    #[case(&[1.0, 2.0, 3.0, 4.0], 2.5)]
    #[case(&[7.0], 7.0)]
    #[case(&[4.0, 1.0], 2.5)]
    #[case(&[100.0, 1.0, 1.1, 0.9, 1.05], 1.05)]
    fn test_median(#[case] values: &[f64], #[case] expected: f64) {
        assert_eq!(median(values), Some(expected));
    }

    #[rstest]
    fn test_median_of_empty_is_none() {
        assert_eq!(median(&[]), None);
    }

    #[rstest]
    fn test_new_requires_sources() {
        let result = PriceOracleAggregator::new(vec![], OracleConfig::default());
        assert!(matches!(result, Err(ValuationError::Config(_))));
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(1_000, 1.5)]
    #[case(1_000, -0.1)]
    fn test_new_rejects_invalid_config(
        #[case] source_timeout_ms: u64,
        #[case] min_confidence: f64,
    ) {
        let sources: Vec<Arc<dyn PriceSource>> = vec![Arc::new(priced("a", 1.0))];
        let config = OracleConfig {
            source_timeout_ms,
            min_confidence,
        };
        assert!(matches!(
            PriceOracleAggregator::new(sources, config),
            Err(ValuationError::Config(_))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_resolve_returns_median_of_three() {
        let oracle = aggregator(vec![priced("a", 1.0), priced("b", 1.2), priced("c", 0.9)]);

        let quote = oracle.resolve(weth()).await.unwrap();
        assert_eq!(quote.source_id, MEDIAN_SOURCE_ID);
        assert_eq!(quote.price_usd, 1.0);
        assert_eq!(quote.confidence, 1.0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_resolve_averages_central_pair() {
        let oracle = aggregator(vec![
            priced("a", 1.0),
            priced("b", 2.0),
            priced("c", 3.0),
            priced("d", 4.0),
        ]);
        assert_eq!(oracle.resolve(weth()).await.unwrap().price_usd, 2.5);
    }

    #[rstest]
    #[tokio::test]
    async fn test_failures_are_discarded_and_reduce_confidence() {
        let oracle = aggregator(vec![
            priced("a", 2_000.0).with_confidence(0.8),
            priced("b", 2_010.0).with_confidence(0.6),
            MockPriceSource::new("c").failing(),
            priced("d", f64::NAN),
        ]);

        let quote = oracle.resolve(weth()).await.unwrap();
        assert_eq!(quote.price_usd, 2_005.0);
        // Mean confidence 0.7 over 2 of 4 sources
        assert!((quote.confidence - 0.35).abs() < 1e-12);
    }

    #[rstest]
    #[tokio::test]
    async fn test_all_sources_fail_is_no_price_available() {
        let oracle = aggregator(vec![
            MockPriceSource::new("a").failing(),
            priced("b", 1.0),
            priced("c", 0.0),
        ]);

        // "b" only prices WETH
        assert_eq!(
            oracle.resolve(usdc()).await,
            Err(ValuationError::NoPriceAvailable(usdc()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_low_confidence_quotes_are_discarded() {
        let sources: Vec<Arc<dyn PriceSource>> = vec![
            Arc::new(priced("a", 1.0).with_confidence(0.2)),
            Arc::new(priced("b", 3.0).with_confidence(0.9)),
        ];
        let config = OracleConfig {
            min_confidence: 0.5,
            ..OracleConfig::default()
        };
        let oracle = PriceOracleAggregator::new(sources, config).unwrap();

        assert_eq!(oracle.resolve(weth()).await.unwrap().price_usd, 3.0);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out_without_blocking_others() {
        let slow = Arc::new(priced("slow", 9_999.0).with_delay(Duration::from_secs(60)));
        let sources: Vec<Arc<dyn PriceSource>> = vec![
            slow.clone(),
            Arc::new(priced("fast", 1.0)),
            Arc::new(priced("medium", 3.0).with_delay(Duration::from_millis(200))),
        ];
        let oracle = PriceOracleAggregator::new(sources, OracleConfig::default()).unwrap();

        let start = tokio::time::Instant::now();
        let quote = oracle.resolve(weth()).await.unwrap();

        assert_eq!(quote.price_usd, 2.0);
        assert_eq!(start.elapsed(), Duration::from_millis(5_000));
        assert_eq!(slow.calls(), 1);
    }

    #[rstest]
    fn test_debug_lists_source_ids() {
        let oracle = aggregator(vec![priced("chainlink", 1.0), priced("pool", 1.0)]);
        let debug = format!("{oracle:?}");
        assert!(debug.contains("[\"chainlink\", \"pool\"]"));
    }

    proptest! {
        #[test]
        fn prop_median_lies_within_bounds(values in prop::collection::vec(0.001f64..1e9, 1..32)) {
            let result = median(&values).unwrap();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(result >= min && result <= max);
        }
    }
}
