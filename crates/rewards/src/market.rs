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

//! Typed market identifiers and the per-market state of a reward epoch.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    config::{GlobalEpochData, ShortCollateralRewardConfig, VaultRewardConfig},
    RewardTokens,
};

/// Index of a market within the market list a program was built from.
///
/// Programs built from the same market list share identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub usize);

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "market#{}", self.0)
    }
}

/// Live state of a market's vault, as fetched alongside the epoch snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub address: Address,
    /// Base asset symbol, the key of all per-market snapshot maps
    pub base_symbol: String,
    /// Current value of one vault token in dollars
    #[serde(default)]
    pub token_price: f64,
    /// Dollar value of queued deposits that have not minted vault tokens yet
    #[serde(default)]
    pub pending_deposits: f64,
}

/// Vault reward program of a market within one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VaultProgram {
    Configured(VaultRewardConfig),
    NotConfigured,
}

/// Short collateral rebate program of a market within one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortCollateralProgram {
    Configured(ShortCollateralRewardConfig),
    NotConfigured,
}

/// A market's share of an epoch's configuration and aggregates.
#[derive(Debug, Clone)]
pub struct MarketEpoch {
    pub id: MarketId,
    pub address: Address,
    pub base_symbol: String,
    pub token_price: f64,
    pub pending_deposits: f64,
    pub vault: VaultProgram,
    pub short_collateral: ShortCollateralProgram,
    pub scaled_stk_lyra_days: f64,
    pub total_lp_token_days: f64,
    pub total_boosted_lp_token_days: f64,
    pub rewarded_vault_rewards: RewardTokens,
}

impl MarketEpoch {
    pub(crate) fn new(id: MarketId, market: &MarketSnapshot, epoch: &GlobalEpochData) -> Self {
        let key = market.base_symbol.as_str();
        // The boost curve is only defined for x in (0, 1]
        let vault = match epoch.vault_reward_config.get(key) {
            Some(config) if config.x > 0.0 => VaultProgram::Configured(*config),
            Some(config) => {
                tracing::warn!("Ignoring vault rewards for {} with x = {}", key, config.x);
                VaultProgram::NotConfigured
            }
            None => VaultProgram::NotConfigured,
        };
        let short_collateral = match epoch.trading_reward_config.short_collat_rewards.get(key) {
            Some(config) => ShortCollateralProgram::Configured(*config),
            None => ShortCollateralProgram::NotConfigured,
        };
        Self {
            id,
            address: market.address,
            base_symbol: market.base_symbol.clone(),
            token_price: market.token_price,
            pending_deposits: market.pending_deposits,
            vault,
            short_collateral,
            scaled_stk_lyra_days: epoch.scaled_stk_lyra_days.get(key).copied().unwrap_or(0.0),
            total_lp_token_days: epoch.total_lp_token_days.get(key).copied().unwrap_or(0.0),
            total_boosted_lp_token_days: epoch
                .total_boosted_lp_token_days
                .get(key)
                .copied()
                .unwrap_or(0.0),
            rewarded_vault_rewards: epoch
                .rewarded_vault_rewards
                .get(key)
                .copied()
                .unwrap_or_default(),
        }
    }
}
