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

//! Tracing initialization for applications embedding the valuation services.
//!
//! The library itself only emits `tracing` events; installing a subscriber is left to the
//! application, which passes the filter it wants (typically read from its own `RUST_LOG`).

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber filtered by `filter` (e.g. `"lpscope_valuation=debug"`).
///
/// Should only be called once during an application's run, ideally at the beginning.
///
/// # Errors
///
/// Returns an error if the filter does not parse or a global subscriber is already installed.
pub fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_new(filter)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{filter}': {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))?;

    tracing::debug!("Initialized tracing with filter {filter}");
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
