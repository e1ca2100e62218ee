// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pre-fetched snapshots the commands evaluate.

use std::{path::Path, sync::Arc};

use alloy_primitives::Address;
use anyhow::{Context, Result};
use lyra_rewards::{
    AccountBalances, AccountEpochData, AccountEpochPosition, ClaimEvent, EpochProgram,
    GlobalEpochData, MarketSnapshot, RewardTokens,
};
use serde::{de::DeserializeOwned, Deserialize};

/// Everything needed to build the programs of every window.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSnapshot {
    pub epochs: Vec<GlobalEpochData>,
    #[serde(default)]
    pub markets: Vec<MarketSnapshot>,
    /// Live LYRA and OP prices
    pub prices: RewardTokens,
    #[serde(default)]
    pub staked_lyra_supply: f64,
    pub block_timestamp: u64,
}

impl GlobalSnapshot {
    pub async fn load(path: &Path) -> Result<Self> {
        read_json(path, "global snapshot").await
    }

    /// Builds the programs of every window, evaluated at `now` or the snapshot's block timestamp.
    pub fn programs(&self, now: Option<u64>) -> Vec<Arc<EpochProgram>> {
        let block_timestamp = now.unwrap_or(self.block_timestamp);
        lyra_rewards::build_programs(
            &self.epochs,
            self.prices,
            &self.markets,
            self.staked_lyra_supply,
            block_timestamp,
        )
    }
}

/// One account's accruals, balances and claims.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub address: Address,
    #[serde(default)]
    pub epochs: Vec<AccountEpochData>,
    #[serde(default)]
    pub balances: AccountBalances,
    #[serde(default)]
    pub claims: Vec<ClaimEvent>,
}

impl AccountSnapshot {
    pub async fn load(path: &Path) -> Result<Self> {
        read_json(path, "account snapshot").await
    }

    pub fn positions(&self, programs: &[Arc<EpochProgram>]) -> Result<Vec<AccountEpochPosition>> {
        lyra_rewards::positions_for_account(
            self.address,
            programs,
            &self.epochs,
            &self.balances,
            &self.claims,
        )
        .with_context(|| format!("failed to build positions for {}", self.address))
    }
}

/// Reads both snapshots concurrently.
pub async fn load_snapshots(
    global_path: &Path,
    account_path: &Path,
) -> Result<(GlobalSnapshot, AccountSnapshot)> {
    let (global, account) =
        tokio::join!(GlobalSnapshot::load(global_path), AccountSnapshot::load(account_path));
    Ok((global?, account?))
}

async fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {what} {}", path.display()))?;
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to decode {what} {}", path.display()))?;
    tracing::debug!("Loaded {} from {}", what, path.display());
    Ok(value)
}
