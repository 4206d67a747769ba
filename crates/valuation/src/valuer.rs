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

//! The portfolio orchestrator composing pool reads, valuation, pricing and fee estimation.

use std::{
    fmt::{Debug, Formatter},
    future::Future,
    sync::Arc,
};

use alloy_primitives::{Address, U256};
use futures::{StreamExt, stream};
use lpscope_model::{
    math::conversion::{u256_to_decimal_string, u256_to_f64_scaled},
    position::Position,
    quote::PriceQuote,
    token::TokenInfo,
    valuation::{TokenAmounts, value_position},
};
use tokio_util::sync::CancellationToken;

use crate::{
    cache::TtlCache,
    config::ValuationConfig,
    error::ValuationError,
    fees::{FeeEstimator, FeePricing},
    oracle::PriceOracleAggregator,
    reader::ChainReader,
    report::{PortfolioReport, PositionReport, TokenValuation},
    source::PriceSource,
};

/// Values positions and whole portfolios.
///
/// Each position is valued independently: a failed pool read, token read or price resolution
/// degrades only that position's [`PositionReport`]. Token metadata and resolved prices are
/// shared across positions through read-through caches.
pub struct PortfolioValuer {
    reader: Arc<dyn ChainReader>,
    aggregator: PriceOracleAggregator,
    fees: FeeEstimator,
    config: ValuationConfig,
    prices: Arc<TtlCache<Address, PriceQuote>>,
    tokens: Arc<TtlCache<Address, TokenInfo>>,
}

impl PortfolioValuer {
    /// Creates a new [`PortfolioValuer`] instance with its own caches.
    ///
    /// Prices are aggregated over `sources` with the source timeout and minimum confidence of
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Config`] if `config` is invalid or `sources` is empty.
    pub fn new(
        reader: Arc<dyn ChainReader>,
        sources: Vec<Arc<dyn PriceSource>>,
        config: ValuationConfig,
    ) -> Result<Self, ValuationError> {
        config.validate()?;
        let aggregator = PriceOracleAggregator::new(sources, config.oracle_config())?;
        let fees = FeeEstimator::new(Arc::clone(&reader), config.fees.clone())?;
        let prices = Arc::new(TtlCache::new(config.price_cache_ttl()));
        let tokens = Arc::new(TtlCache::new(config.token_cache_ttl()));

        Ok(Self {
            reader,
            aggregator,
            fees,
            config,
            prices,
            tokens,
        })
    }

    /// Replaces the price cache, e.g. to share one across valuers.
    #[must_use]
    pub fn with_price_cache(mut self, prices: Arc<TtlCache<Address, PriceQuote>>) -> Self {
        self.prices = prices;
        self
    }

    /// Replaces the token metadata cache, e.g. to share one across valuers.
    #[must_use]
    pub fn with_token_cache(mut self, tokens: Arc<TtlCache<Address, TokenInfo>>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Returns the configuration the valuer was built with.
    #[must_use]
    pub const fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Returns the cache of resolved token prices.
    #[must_use]
    pub fn price_cache(&self) -> &Arc<TtlCache<Address, PriceQuote>> {
        &self.prices
    }

    /// Values `positions` concurrently, at most `max_concurrency` at a time.
    ///
    /// Reports are returned in the order of `positions`.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Cancelled`] if `cancel` fires before every position is valued.
    pub async fn value_positions(
        &self,
        positions: &[Position],
        cancel: &CancellationToken,
    ) -> Result<PortfolioReport, ValuationError> {
        self.run_bounded(
            positions.iter().map(|position| self.value_position(position)),
            cancel,
        )
        .await
    }

    /// Reads and values the positions with the given token ids.
    ///
    /// A position that cannot be read yields a degraded report without a position.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Cancelled`] if `cancel` fires before every position is valued.
    pub async fn value_token_ids(
        &self,
        token_ids: &[U256],
        cancel: &CancellationToken,
    ) -> Result<PortfolioReport, ValuationError> {
        self.run_bounded(
            token_ids.iter().map(|&token_id| self.read_and_value(token_id)),
            cancel,
        )
        .await
    }

    async fn run_bounded<I, Fut>(
        &self,
        futures: I,
        cancel: &CancellationToken,
    ) -> Result<PortfolioReport, ValuationError>
    where
        I: Iterator<Item = Fut>,
        Fut: Future<Output = PositionReport>,
    {
        if cancel.is_cancelled() {
            return Err(ValuationError::Cancelled);
        }

        let purged = self.prices.purge_expired() + self.tokens.purge_expired();
        if purged > 0 {
            tracing::trace!("Purged {purged} stale cache entries");
        }

        let reports = stream::iter(futures)
            .buffered(self.config.max_concurrency)
            .collect::<Vec<_>>();

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::warn!("Portfolio valuation cancelled");
                Err(ValuationError::Cancelled)
            }
            reports = reports => Ok(PortfolioReport::new(reports)),
        }
    }

    async fn read_and_value(&self, token_id: U256) -> PositionReport {
        match self.reader.get_position(token_id).await {
            Ok(position) => self.value_position(&position).await,
            Err(e) => {
                let e = ValuationError::from(e);
                tracing::warn!("Cannot read position {token_id}: {e}");
                PositionReport::unreadable(token_id, e.to_string())
            }
        }
    }

    /// Values a single position. Never fails; failures are recorded on the report.
    pub async fn value_position(&self, position: &Position) -> PositionReport {
        let mut report = PositionReport::new(position);

        let amounts_known = match self.token_amounts(position).await {
            Ok((amounts, in_range)) => {
                report.amounts = amounts;
                report.in_range = in_range;
                true
            }
            Err(e) => {
                tracing::warn!("Cannot value position {}: {e}", position.token_id);
                report.degrade(e.to_string());
                false
            }
        };

        let (info0, info1, price0, price1) = tokio::join!(
            self.token_info(position.token0),
            self.token_info(position.token1),
            self.price(position.token0),
            self.price(position.token1),
        );

        let amounts = report.amounts;
        let leg0 = value_leg(&mut report, position.token0, amounts.amount0, info0, price0);
        let leg1 = value_leg(&mut report, position.token1, amounts.amount1, info1, price1);

        let pricing = FeePricing {
            decimals0: leg0.decimals.unwrap_or_default(),
            decimals1: leg1.decimals.unwrap_or_default(),
            price0_usd: leg0.decimals.and(leg0.price_usd),
            price1_usd: leg1.decimals.and(leg1.price_usd),
            position_value_usd: leg0
                .value_usd
                .zip(leg1.value_usd)
                .map(|(a, b)| a + b)
                .filter(|_| amounts_known),
        };

        report.fee_estimate = self.fees.estimate(position, &pricing).await;

        // A position whose liquidity could not be valued reports zero value
        if amounts_known {
            report.fees_usd = fees_usd(&mut report, &pricing);
        } else if report.fee_estimate.is_available() {
            report
                .warnings
                .push("Fees excluded from value of unvalued position".to_string());
        }

        if position.is_staked {
            report.pending_rewards_usd = self.pending_rewards_usd(&mut report).await;
        }

        report.total_value_usd =
            leg0.value_usd.unwrap_or(0.0) + leg1.value_usd.unwrap_or(0.0) + report.fees_usd;
        report.token0 = Some(leg0);
        report.token1 = Some(leg1);

        tracing::debug!(
            "Valued position {} at {} USD (degraded={})",
            position.token_id,
            report.total_value_usd,
            report.degraded
        );

        report
    }

    async fn token_amounts(
        &self,
        position: &Position,
    ) -> Result<(TokenAmounts, Option<bool>), ValuationError> {
        if position.is_closed() {
            return Ok((TokenAmounts::ZERO, None));
        }

        let slot = self
            .reader
            .get_pool_slot(position.token0, position.token1, position.fee_tier)
            .await?;
        let amounts = value_position(position, Some(&slot))?;

        Ok((amounts, Some(position.is_in_range(slot.tick))))
    }

    async fn token_info(&self, token: Address) -> Result<TokenInfo, ValuationError> {
        self.tokens
            .get_or_try_init(token, || async {
                let (decimals, symbol) = tokio::try_join!(
                    self.reader.get_token_decimals(token),
                    self.reader.get_token_symbol(token),
                )?;
                Ok::<_, ValuationError>(TokenInfo::new(token, symbol, decimals))
            })
            .await
    }

    async fn price(&self, token: Address) -> Result<PriceQuote, ValuationError> {
        self.prices
            .get_or_try_init(token, || self.aggregator.resolve(token))
            .await
    }

    async fn pending_rewards_usd(&self, report: &mut PositionReport) -> Option<f64> {
        let reward = match self.reader.get_pending_rewards(report.token_id).await {
            Ok(reward) => reward?,
            Err(e) => {
                report
                    .warnings
                    .push(format!("Pending rewards unavailable: {}", ValuationError::from(e)));
                return None;
            }
        };

        let (info, price) = tokio::join!(self.token_info(reward.token), self.price(reward.token));
        let valued = value_leg(report, reward.token, reward.amount, info, price);
        valued.value_usd
    }
}

impl Debug for PortfolioValuer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(PortfolioValuer))
            .field("reader", &self.reader)
            .field("aggregator", &self.aggregator)
            .field("config", &self.config)
            .field("prices", &self.prices)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

/// Values one token amount, recording unpriced tokens and metadata failures on `report`.
fn value_leg(
    report: &mut PositionReport,
    token: Address,
    amount: U256,
    info: Result<TokenInfo, ValuationError>,
    price: Result<PriceQuote, ValuationError>,
) -> TokenValuation {
    let mut valuation = TokenValuation {
        address: token,
        symbol: token.to_string(),
        decimals: None,
        amount,
        formatted_amount: None,
        price_usd: None,
        value_usd: None,
    };

    match info {
        Ok(info) => {
            valuation.symbol = info.symbol;
            valuation.decimals = Some(info.decimals);
        }
        Err(e) => report.degrade(format!("Token metadata unavailable for {token}: {e}")),
    }
    match price {
        Ok(quote) => valuation.price_usd = Some(quote.price_usd),
        Err(e) => report.warnings.push(e.to_string()),
    }

    if let Some(decimals) = valuation.decimals {
        match u256_to_decimal_string(amount, decimals) {
            Ok(formatted) => valuation.formatted_amount = Some(formatted),
            Err(e) => report.degrade(format!("Cannot format amount of {token}: {e}")),
        }
        if let Some(price) = valuation.price_usd {
            match u256_to_f64_scaled(amount, decimals) {
                Ok(units) => valuation.value_usd = Some(units * price),
                Err(e) => report.degrade(format!("Cannot scale amount of {token}: {e}")),
            }
        }
    }

    if valuation.value_usd.is_none() {
        report.mark_unpriced(token);
    }
    valuation
}

/// Sums the priced legs of the report's fee estimate; unpriced legs are excluded.
fn fees_usd(report: &mut PositionReport, pricing: &FeePricing) -> f64 {
    let estimate = report.fee_estimate;
    let legs = [
        pricing.value_usd(estimate.amount0, U256::ZERO),
        pricing.value_usd(U256::ZERO, estimate.amount1),
    ];

    let mut total = 0.0;
    for leg in legs {
        match leg {
            Ok(Some(value)) => total += value,
            Ok(None) => {}
            Err(e) => report.degrade(format!("Cannot value fees: {e}")),
        }
    }
    total
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
