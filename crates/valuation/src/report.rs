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

//! Per-position and per-portfolio valuation reports.

use ahash::AHashSet;
use alloy_primitives::{Address, U256};
use lpscope_model::{fee::FeeEstimate, position::Position, valuation::TokenAmounts};
use serde::{Deserialize, Serialize};

/// The valuation of one token leg of a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenValuation {
    /// The token contract address.
    pub address: Address,
    /// The token symbol, or the address when metadata is unavailable.
    pub symbol: String,
    /// Token decimals, absent if the chain read failed.
    pub decimals: Option<u8>,
    /// Raw amount in the smallest token unit.
    pub amount: U256,
    /// Exact decimal rendering of `amount`, absent without decimals.
    pub formatted_amount: Option<String>,
    /// Resolved USD price of one whole token, absent when every price source failed.
    pub price_usd: Option<f64>,
    /// USD value of `amount`, absent when the token is unpriced.
    pub value_usd: Option<f64>,
}

/// The valuation of one position.
///
/// Failures while valuing the position are recorded in `warnings` and set `degraded`. Token
/// values that could not be priced are excluded from the USD totals and listed in
/// `unpriced_tokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// The position NFT identifier.
    pub token_id: U256,
    /// The position, absent if it could not be read.
    pub position: Option<Position>,
    /// Raw token amounts held by the position's liquidity, zero when they could not be computed.
    pub amounts: TokenAmounts,
    /// Valuation of the token0 leg.
    pub token0: Option<TokenValuation>,
    /// Valuation of the token1 leg.
    pub token1: Option<TokenValuation>,
    /// Whether the pool's current tick lies inside the position's range, if the pool was read.
    pub in_range: Option<bool>,
    /// Uncollected fees in raw token units.
    pub fee_estimate: FeeEstimate,
    /// USD value of the priced legs of `fee_estimate`, zero when `amounts` are unknown.
    pub fees_usd: f64,
    /// USD value of pending staking rewards, if any were reported and priced.
    pub pending_rewards_usd: Option<f64>,
    /// USD value of the priced token legs plus `fees_usd`.
    pub total_value_usd: f64,
    /// Tokens whose value is excluded from `total_value_usd`.
    pub unpriced_tokens: Vec<Address>,
    /// Whether a read or computation failed while valuing the position.
    pub degraded: bool,
    /// Human-readable reasons for degradation and missing prices.
    pub warnings: Vec<String>,
}

impl PositionReport {
    /// Creates an empty report for `position`.
    #[must_use]
    pub fn new(position: &Position) -> Self {
        Self {
            token_id: position.token_id,
            position: Some(position.clone()),
            ..Self::missing(position.token_id)
        }
    }

    /// Creates a degraded report for a position that could not be read.
    #[must_use]
    pub fn unreadable(token_id: U256, reason: impl Into<String>) -> Self {
        let mut report = Self::missing(token_id);
        report.degrade(reason);
        report
    }

    fn missing(token_id: U256) -> Self {
        Self {
            token_id,
            position: None,
            amounts: TokenAmounts::ZERO,
            token0: None,
            token1: None,
            in_range: None,
            fee_estimate: FeeEstimate::unavailable(),
            fees_usd: 0.0,
            pending_rewards_usd: None,
            total_value_usd: 0.0,
            unpriced_tokens: Vec::new(),
            degraded: false,
            warnings: Vec::new(),
        }
    }

    /// Marks the report degraded and records why.
    pub fn degrade(&mut self, reason: impl Into<String>) {
        self.degraded = true;
        self.warnings.push(reason.into());
    }

    /// Records `token` as unpriced, once.
    pub fn mark_unpriced(&mut self, token: Address) {
        if !self.unpriced_tokens.contains(&token) {
            self.unpriced_tokens.push(token);
        }
    }

    /// Returns whether the underlying position is staked, if it was read.
    #[must_use]
    pub fn is_staked(&self) -> Option<bool> {
        self.position.as_ref().map(|position| position.is_staked)
    }
}

/// Aggregate figures across every position of a portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Number of reports, including unreadable positions.
    pub position_count: usize,
    /// Number of read positions deposited in a staking contract.
    pub staked_count: usize,
    /// Number of read positions held directly.
    pub unstaked_count: usize,
    /// Number of degraded reports.
    pub degraded_count: usize,
    /// Sum of every report's `total_value_usd`.
    pub total_value_usd: f64,
    /// Sum of every report's priced pending rewards.
    pub total_pending_rewards_usd: f64,
    /// Sum of every report's `fees_usd`.
    pub total_fees_usd: f64,
    /// Distinct tokens whose value was excluded from the totals.
    pub unpriced_token_count: usize,
}

impl PortfolioSummary {
    /// Sums `reports` into a summary.
    #[must_use]
    pub fn from_reports(reports: &[PositionReport]) -> Self {
        let mut summary = Self {
            position_count: reports.len(),
            ..Self::default()
        };
        let mut unpriced = AHashSet::new();

        for report in reports {
            match report.is_staked() {
                Some(true) => summary.staked_count += 1,
                Some(false) => summary.unstaked_count += 1,
                None => {}
            }
            if report.degraded {
                summary.degraded_count += 1;
            }
            summary.total_value_usd += report.total_value_usd;
            summary.total_fees_usd += report.fees_usd;
            summary.total_pending_rewards_usd += report.pending_rewards_usd.unwrap_or(0.0);
            unpriced.extend(report.unpriced_tokens.iter().copied());
        }

        summary.unpriced_token_count = unpriced.len();
        summary
    }
}

/// Every position report of a portfolio together with its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// One report per requested position, in request order.
    pub positions: Vec<PositionReport>,
    /// Aggregates over `positions`.
    pub summary: PortfolioSummary,
}

impl PortfolioReport {
    /// Creates a new [`PortfolioReport`], computing the summary from `positions`.
    #[must_use]
    pub fn new(positions: Vec<PositionReport>) -> Self {
        let summary = PortfolioSummary::from_reports(&positions);
        Self { positions, summary }
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
