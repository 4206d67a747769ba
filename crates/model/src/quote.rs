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

/// A USD price for one token from one source.
///
/// Quotes are produced per provider call and consumed immediately by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Identifies the source that produced the quote.
    pub source_id: String,
    /// The USD price of one whole token.
    pub price_usd: f64,
    /// The source's confidence in the quote, in `[0, 1]`.
    pub confidence: f64,
}

impl PriceQuote {
    /// Creates a new [`PriceQuote`], clamping `confidence` into `[0, 1]`.
    #[must_use]
    pub fn new(source_id: impl Into<String>, price_usd: f64, confidence: f64) -> Self {
        Self {
            source_id: source_id.into(),
            price_usd,
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
        }
    }

    /// Returns whether the quote carries a finite positive price at or above `min_confidence`.
    #[must_use]
    pub fn is_usable(&self, min_confidence: f64) -> bool {
        self.price_usd.is_finite() && self.price_usd > 0.0 && self.confidence >= min_confidence
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
