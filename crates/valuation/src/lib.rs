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

//! Portfolio valuation services for concentrated-liquidity positions.
//!
//! The `lpscope-valuation` crate composes the pure model in `lpscope-model` with the
//! asynchronous collaborators a valuation needs:
//!
//! - [`reader::ChainReader`] and [`source::PriceSource`] capabilities supplied by the embedding
//!   application.
//! - A [`oracle::PriceOracleAggregator`] reducing many price sources to a median quote.
//! - A [`fees::FeeEstimator`] cascading through fee strategies of decreasing reliability.
//! - The [`valuer::PortfolioValuer`] orchestrator producing per-position and portfolio reports.
//!
//! Component-local failures degrade the affected report row. Only invalid configuration and
//! cancellation surface as errors.
//!
//! # Feature flags
//!
//! - `stubs`: Enables mock chain readers and price sources for use in testing scenarios.

#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fees;
pub mod logging;
pub mod oracle;
pub mod reader;
pub mod report;
pub mod source;
pub mod valuer;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;
