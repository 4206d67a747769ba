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

//! Concentrated-liquidity valuation model for [NautilusTrader](http://nautilustrader.io).
//!
//! The `lpscope-model` crate holds the pure, synchronous half of position valuation:
//! bit-exact Q64.96 fixed-point math, tick and sqrt price conversions, and the decomposition
//! of a position's liquidity into raw token amounts given a pool's live slot.
//!
//! Everything here is deterministic integer arithmetic. Floating point is only produced at the
//! presentation boundary (display prices and whole-token conversions).
//!
//! # Feature flags
//!
//! - `stubs`: Enables type stubs for use in testing scenarios.

#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod fee;
pub mod fee_tier;
pub mod math;
pub mod pool;
pub mod position;
pub mod quote;
pub mod token;
pub mod valuation;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;
