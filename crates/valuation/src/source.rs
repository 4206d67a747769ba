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

//! Price source capability and the adapters supplied with the crate.

use std::{fmt::Debug, sync::Arc};

use ahash::AHashMap;
use alloy_primitives::Address;
use anyhow::{anyhow, bail};
use lpscope_model::{fee_tier::FeeTier, pool::PoolSlot, quote::PriceQuote};

use crate::reader::ChainReader;

/// A single provider of USD prices.
///
/// Implementations wrap one upstream (an on-chain oracle feed, a pool-implied price, an index
/// API). Failures are reported as errors and discarded by the aggregator.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync + Debug {
    /// Returns the identifier recorded on quotes from this source.
    fn id(&self) -> &str;

    /// Returns a USD quote for one whole `token`.
    async fn get_price(&self, token: Address) -> anyhow::Result<PriceQuote>;
}

/// A fixed table of USD prices, for pegged assets and tests.
#[derive(Debug, Clone)]
pub struct StaticPriceSource {
    id: String,
    prices: AHashMap<Address, f64>,
    confidence: f64,
}

impl StaticPriceSource {
    /// Creates a new empty [`StaticPriceSource`] with full confidence.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prices: AHashMap::new(),
            confidence: 1.0,
        }
    }

    /// Adds or replaces the price of `token`.
    #[must_use]
    pub fn with_price(mut self, token: Address, price_usd: f64) -> Self {
        self.prices.insert(token, price_usd);
        self
    }

    /// Sets the confidence attached to every quote.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

#[async_trait::async_trait]
impl PriceSource for StaticPriceSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get_price(&self, token: Address) -> anyhow::Result<PriceQuote> {
        let price = self
            .prices
            .get(&token)
            .ok_or_else(|| anyhow!("No static price for token {token}"))?;
        Ok(PriceQuote::new(self.id.as_str(), *price, self.confidence))
    }
}

/// Derives USD prices from the current price of a pool against a known stablecoin.
///
/// Candidate fee tiers are probed in order and the first existing pool is used. The pool's
/// reported token order decides whether the price is inverted.
#[derive(Debug, Clone)]
pub struct PoolImpliedPriceSource {
    id: String,
    reader: Arc<dyn ChainReader>,
    stablecoin: Address,
    stablecoin_price_usd: f64,
    fee_tiers: Vec<FeeTier>,
    confidence: f64,
}

impl PoolImpliedPriceSource {
    /// Creates a new [`PoolImpliedPriceSource`] quoting against `stablecoin`.
    ///
    /// `stablecoin_price_usd` is the peg assumed for the stablecoin itself.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        reader: Arc<dyn ChainReader>,
        stablecoin: Address,
        stablecoin_price_usd: f64,
    ) -> Self {
        Self {
            id: id.into(),
            reader,
            stablecoin,
            stablecoin_price_usd,
            fee_tiers: vec![FeeTier::Low, FeeTier::Medium, FeeTier::Lowest, FeeTier::High],
            confidence: 0.8,
        }
    }

    /// Sets the fee tiers probed for a pool, in order.
    #[must_use]
    pub fn with_fee_tiers(mut self, fee_tiers: Vec<FeeTier>) -> Self {
        self.fee_tiers = fee_tiers;
        self
    }

    /// Sets the confidence attached to every quote.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    async fn quote_from_slot(&self, token: Address, slot: &PoolSlot) -> anyhow::Result<PriceQuote> {
        if slot.is_token0(self.stablecoin).is_none() {
            bail!(
                "Pool {}/{} does not contain stablecoin {}",
                slot.token0,
                slot.token1,
                self.stablecoin
            );
        }

        let token_decimals = self.reader.get_token_decimals(token).await?;
        let stable_decimals = self.reader.get_token_decimals(self.stablecoin).await?;

        let stable_per_token = match slot.is_token0(token) {
            Some(true) => slot.price(token_decimals, stable_decimals),
            Some(false) => {
                let token_per_stable = slot.price(stable_decimals, token_decimals);
                if token_per_stable <= 0.0 {
                    bail!("Pool {}/{} reports a zero price", slot.token0, slot.token1);
                }
                token_per_stable.recip()
            }
            None => bail!(
                "Pool {}/{} does not contain token {token}",
                slot.token0,
                slot.token1
            ),
        };

        Ok(PriceQuote::new(
            self.id.as_str(),
            stable_per_token * self.stablecoin_price_usd,
            self.confidence,
        ))
    }
}

#[async_trait::async_trait]
impl PriceSource for PoolImpliedPriceSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get_price(&self, token: Address) -> anyhow::Result<PriceQuote> {
        if token == self.stablecoin {
            return Ok(PriceQuote::new(
                self.id.as_str(),
                self.stablecoin_price_usd,
                self.confidence,
            ));
        }

        let mut last_error = None;
        for &fee_tier in &self.fee_tiers {
            match self
                .reader
                .get_pool_slot(token, self.stablecoin, fee_tier)
                .await
            {
                Ok(slot) => return self.quote_from_slot(token, &slot).await,
                Err(e) => {
                    tracing::debug!("No {fee_tier} pool for {token}/{}: {e}", self.stablecoin);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(anyhow!(e).context(format!("No pool-implied price for {token}"))),
            None => bail!("No fee tiers configured for pool-implied pricing"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lpscope_model::{
        math::tick_math::get_sqrt_ratio_at_tick,
        stubs::{dai, usdc, weth},
    };
    use rstest::rstest;

    use super::*;
    use crate::stubs::MockChainReader;

    fn reader_with_pool(slot: PoolSlot) -> Arc<MockChainReader> {
        Arc::new(
            MockChainReader::new()
                .with_token(usdc(), "USDC", 6)
                .with_token(weth(), "WETH", 18)
                .with_pool(slot),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn test_static_source_quotes_known_tokens_only() {
        let source = StaticPriceSource::new("static")
            .with_price(usdc(), 1.0)
            .with_confidence(0.9);

        let quote = source.get_price(usdc()).await.unwrap();
        assert_eq!(quote, PriceQuote::new("static", 1.0, 0.9));
        assert!(source.get_price(weth()).await.is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn test_pool_implied_price_when_token_is_token1() {
        let slot = PoolSlot::new(
            usdc(),
            weth(),
            FeeTier::Low,
            200_000,
            get_sqrt_ratio_at_tick(200_000).unwrap(),
        );
        let source = PoolImpliedPriceSource::new("pool", reader_with_pool(slot), usdc(), 1.0);

        let quote = source.get_price(weth()).await.unwrap();
        assert_eq!(quote.source_id, "pool");
        assert!((quote.price_usd - 2_063.215_669_444_018_7).abs() < 1e-6);
    }

    #[rstest]
    #[tokio::test]
    async fn test_pool_implied_price_when_token_is_token0() {
        // Same market listed with WETH first
        let slot = PoolSlot::new(
            weth(),
            usdc(),
            FeeTier::Low,
            -200_000,
            get_sqrt_ratio_at_tick(-200_000).unwrap(),
        );
        let source = PoolImpliedPriceSource::new("pool", reader_with_pool(slot), usdc(), 1.0);

        let quote = source.get_price(weth()).await.unwrap();
        assert!((quote.price_usd - 2_063.215_669_444_018_7).abs() < 1e-6);
    }

    #[rstest]
    #[tokio::test]
    async fn test_pool_implied_price_falls_through_fee_tiers() {
        let slot = PoolSlot::new(
            usdc(),
            weth(),
            FeeTier::High,
            200_000,
            get_sqrt_ratio_at_tick(200_000).unwrap(),
        );
        let reader = reader_with_pool(slot);
        let source = PoolImpliedPriceSource::new("pool", reader.clone(), usdc(), 1.0);

        assert!(source.get_price(weth()).await.is_ok());
        assert_eq!(reader.calls.pool_slot(), 4);
    }

    #[rstest]
    #[tokio::test]
    async fn test_pool_implied_price_for_stablecoin_is_the_peg() {
        let reader = Arc::new(MockChainReader::new());
        let source = PoolImpliedPriceSource::new("pool", reader.clone(), usdc(), 0.999);

        let quote = source.get_price(usdc()).await.unwrap();
        assert_eq!(quote.price_usd, 0.999);
        assert_eq!(reader.calls.total(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_pool_implied_price_without_pool_fails() {
        let reader = Arc::new(MockChainReader::new().with_token(dai(), "DAI", 18));
        let source = PoolImpliedPriceSource::new("pool", reader, usdc(), 1.0)
            .with_fee_tiers(vec![FeeTier::Lowest]);

        let error = source.get_price(dai()).await.unwrap_err();
        assert!(error.to_string().starts_with("No pool-implied price for"));
    }
}
