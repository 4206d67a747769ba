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

//! Test doubles for the chain reader and price source capabilities.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use ahash::{AHashMap, AHashSet};
use alloy_primitives::{Address, U256};
use anyhow::{anyhow, bail};
use lpscope_model::{fee_tier::FeeTier, pool::PoolSlot, position::Position, quote::PriceQuote};

use crate::{
    reader::{ChainReader, ChainReaderError, PendingReward},
    source::PriceSource,
};

type PoolKey = (Address, Address, FeeTier);

fn pool_key(token_a: Address, token_b: Address, fee_tier: FeeTier) -> PoolKey {
    if token_a <= token_b {
        (token_a, token_b, fee_tier)
    } else {
        (token_b, token_a, fee_tier)
    }
}

/// Counts calls made against a [`MockChainReader`], per method.
#[derive(Debug, Default)]
pub struct CallCounters {
    pool_slot: AtomicUsize,
    position: AtomicUsize,
    collect: AtomicUsize,
    decimals: AtomicUsize,
    symbol: AtomicUsize,
    staking: AtomicUsize,
    rewards: AtomicUsize,
    pool_slot_in_flight: AtomicUsize,
    pool_slot_peak: AtomicUsize,
}

impl CallCounters {
    /// Returns the number of `get_pool_slot` calls.
    #[must_use]
    pub fn pool_slot(&self) -> usize {
        self.pool_slot.load(Ordering::SeqCst)
    }

    /// Returns the highest number of concurrent `get_pool_slot` calls observed.
    #[must_use]
    pub fn pool_slot_peak(&self) -> usize {
        self.pool_slot_peak.load(Ordering::SeqCst)
    }

    /// Returns the number of `get_position` calls.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position.load(Ordering::SeqCst)
    }

    /// Returns the number of `simulate_collect` calls.
    #[must_use]
    pub fn collect(&self) -> usize {
        self.collect.load(Ordering::SeqCst)
    }

    /// Returns the number of `get_token_decimals` calls.
    #[must_use]
    pub fn decimals(&self) -> usize {
        self.decimals.load(Ordering::SeqCst)
    }

    /// Returns the number of calls across every method.
    #[must_use]
    pub fn total(&self) -> usize {
        [
            &self.pool_slot,
            &self.position,
            &self.collect,
            &self.decimals,
            &self.symbol,
            &self.staking,
            &self.rewards,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }
}

/// An in-memory [`ChainReader`] with configurable failures and latency.
#[derive(Debug, Default)]
pub struct MockChainReader {
    pools: AHashMap<PoolKey, PoolSlot>,
    unavailable_pools: AHashSet<PoolKey>,
    positions: AHashMap<U256, Position>,
    collects: AHashMap<U256, (U256, U256)>,
    tokens: AHashMap<Address, (String, u8)>,
    staking_accounting: AHashMap<U256, (U256, U256)>,
    pending_rewards: AHashMap<U256, PendingReward>,
    latency: Option<Duration>,
    /// Per-method call counters.
    pub calls: CallCounters,
}

impl MockChainReader {
    /// Creates an empty reader where every lookup misses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `slot` for its pair, in either token order.
    #[must_use]
    pub fn with_pool(mut self, slot: PoolSlot) -> Self {
        self.pools
            .insert(pool_key(slot.token0, slot.token1, slot.fee_tier), slot);
        self
    }

    /// Makes reads of this pool fail with [`ChainReaderError::Unavailable`].
    #[must_use]
    pub fn with_unavailable_pool(
        mut self,
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
    ) -> Self {
        self.unavailable_pools
            .insert(pool_key(token0, token1, fee_tier));
        self
    }

    /// Serves `position` by its token id.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.insert(position.token_id, position);
        self
    }

    /// Makes `simulate_collect` succeed for `token_id`; other ids revert.
    #[must_use]
    pub fn with_collect(mut self, token_id: U256, amount0: U256, amount1: U256) -> Self {
        self.collects.insert(token_id, (amount0, amount1));
        self
    }

    /// Registers the symbol and decimals of `token`.
    #[must_use]
    pub fn with_token(mut self, token: Address, symbol: &str, decimals: u8) -> Self {
        self.tokens.insert(token, (symbol.to_string(), decimals));
        self
    }

    /// Exposes staking fee accounting fields for `token_id`.
    #[must_use]
    pub fn with_staking_accounting(mut self, token_id: U256, field0: U256, field1: U256) -> Self {
        self.staking_accounting.insert(token_id, (field0, field1));
        self
    }

    /// Reports `reward` as pending for `token_id`.
    #[must_use]
    pub fn with_pending_reward(mut self, token_id: U256, reward: PendingReward) -> Self {
        self.pending_rewards.insert(token_id, reward);
        self
    }

    /// Delays every read by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn enter(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait::async_trait]
impl ChainReader for MockChainReader {
    async fn get_pool_slot(
        &self,
        token0: Address,
        token1: Address,
        fee_tier: FeeTier,
    ) -> Result<PoolSlot, ChainReaderError> {
        let in_flight = self.calls.pool_slot_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .pool_slot_peak
            .fetch_max(in_flight, Ordering::SeqCst);
        self.enter(&self.calls.pool_slot).await;
        self.calls.pool_slot_in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = pool_key(token0, token1, fee_tier);
        if self.unavailable_pools.contains(&key) {
            return Err(ChainReaderError::Unavailable("rpc timeout".to_string()));
        }
        self.pools
            .get(&key)
            .copied()
            .ok_or(ChainReaderError::PoolNotFound {
                token0,
                token1,
                fee_tier,
            })
    }

    async fn get_position(&self, token_id: U256) -> Result<Position, ChainReaderError> {
        self.enter(&self.calls.position).await;
        self.positions
            .get(&token_id)
            .cloned()
            .ok_or(ChainReaderError::PositionNotFound(token_id))
    }

    async fn simulate_collect(&self, token_id: U256) -> Result<(U256, U256), ChainReaderError> {
        self.enter(&self.calls.collect).await;
        self.collects
            .get(&token_id)
            .copied()
            .ok_or_else(|| ChainReaderError::CallReverted("Not approved".to_string()))
    }

    async fn get_token_decimals(&self, token: Address) -> Result<u8, ChainReaderError> {
        self.enter(&self.calls.decimals).await;
        self.tokens
            .get(&token)
            .map(|(_, decimals)| *decimals)
            .ok_or_else(|| ChainReaderError::CallReverted(format!("decimals() on {token}")))
    }

    async fn get_token_symbol(&self, token: Address) -> Result<String, ChainReaderError> {
        self.enter(&self.calls.symbol).await;
        Ok(self
            .tokens
            .get(&token)
            .map_or_else(|| token.to_string(), |(symbol, _)| symbol.clone()))
    }

    async fn get_staking_fee_accounting(
        &self,
        token_id: U256,
    ) -> Result<Option<(U256, U256)>, ChainReaderError> {
        self.enter(&self.calls.staking).await;
        Ok(self.staking_accounting.get(&token_id).copied())
    }

    async fn get_pending_rewards(
        &self,
        token_id: U256,
    ) -> Result<Option<PendingReward>, ChainReaderError> {
        self.enter(&self.calls.rewards).await;
        Ok(self.pending_rewards.get(&token_id).copied())
    }
}

/// A scripted [`PriceSource`] that counts calls and can be slow or failing.
#[derive(Debug)]
pub struct MockPriceSource {
    id: String,
    prices: AHashMap<Address, f64>,
    confidence: f64,
    delay: Option<Duration>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockPriceSource {
    /// Creates a source quoting nothing at full confidence.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            prices: AHashMap::new(),
            confidence: 1.0,
            delay: None,
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Quotes `price_usd` for `token`.
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

    /// Delays every quote by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes every call fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Returns the number of `get_price` calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PriceSource for MockPriceSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get_price(&self, token: Address) -> anyhow::Result<PriceQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            bail!("{} is down", self.id);
        }
        let price = self
            .prices
            .get(&token)
            .ok_or_else(|| anyhow!("{} has no price for {token}", self.id))?;
        Ok(PriceQuote::new(self.id.as_str(), *price, self.confidence))
    }
}
