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

use std::fmt::{Display, Formatter};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Represents an ERC-20 token's metadata, optionally with a resolved USD price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The token contract address.
    pub address: Address,
    /// The token's ticker symbol.
    pub symbol: String,
    /// The number of decimal places used by raw amounts.
    pub decimals: u8,
    /// The USD price of one whole token, absent until resolved.
    pub price_usd: Option<f64>,
}

impl TokenInfo {
    /// Creates a new [`TokenInfo`] without a price.
    #[must_use]
    pub fn new(address: Address, symbol: String, decimals: u8) -> Self {
        Self {
            address,
            symbol,
            decimals,
            price_usd: None,
        }
    }

    /// Sets the resolved USD price.
    #[must_use]
    pub fn with_price(mut self, price_usd: Option<f64>) -> Self {
        self.price_usd = price_usd;
        self
    }
}

impl Display for TokenInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TokenInfo(symbol={}, address={}, decimals={})",
            self.symbol, self.address, self.decimals
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_token_info_price_is_absent_until_resolved() {
        let address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let token = TokenInfo::new(address, "USDC".to_string(), 6);
        assert_eq!(token.price_usd, None);
        assert_eq!(
            token.to_string(),
            "TokenInfo(symbol=USDC, address=0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48, decimals=6)"
        );

        let token = token.with_price(Some(1.0));
        assert_eq!(token.price_usd, Some(1.0));
    }
}
