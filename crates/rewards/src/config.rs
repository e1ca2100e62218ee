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

//! Program level snapshot data, as produced by the data access layer.
//!
//! Per-market maps are keyed by the market's base asset symbol. They are resolved into typed
//! per-market state once, when an [EpochProgram](crate::EpochProgram) is built.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{math, RewardTokens};

/// Snapshot of one global reward epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEpochData {
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    /// Timestamp at which the aggregates below were last updated
    #[serde(default)]
    pub last_updated: u64,
    /// Staked LYRA integrated over the elapsed part of the window, in token days
    #[serde(default)]
    pub total_stk_lyra_days: f64,
    #[serde(default)]
    pub staking_reward_config: StakingRewardConfig,
    #[serde(default)]
    pub trading_reward_config: TradingRewardConfig,
    /// Vault reward pools by market
    #[serde(default)]
    pub vault_reward_config: HashMap<String, VaultRewardConfig>,
    /// Staked LYRA token days scaled for each market's boost reference
    #[serde(default)]
    pub scaled_stk_lyra_days: HashMap<String, f64>,
    /// Vault token days by market
    #[serde(default)]
    pub total_lp_token_days: HashMap<String, f64>,
    /// Boosted vault token days by market
    #[serde(default)]
    pub total_boosted_lp_token_days: HashMap<String, f64>,
    /// Vault rewards already allocated by market
    #[serde(default)]
    pub rewarded_vault_rewards: HashMap<String, RewardTokens>,
    #[serde(default)]
    pub weth_lyra_staking_reward_config: Option<WethLyraStakingRewardConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingRewardConfig {
    /// Tokens distributed to stakers over the whole window
    #[serde(default)]
    pub total_rewards: RewardTokens,
}

/// Reward pool for one market's vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRewardConfig {
    /// Share of a provider's balance that counts without any stake, in `(0, 1]`.
    pub x: f64,
    #[serde(default)]
    pub lyra: f64,
    #[serde(default)]
    pub op: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WethLyraStakingRewardConfig {
    #[serde(default)]
    pub total_rewards: RewardTokens,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingRewardConfig {
    /// Selects the step table over the continuous curve.
    #[serde(default)]
    pub use_rebate_table: bool,
    #[serde(default)]
    pub rebate_rate_table: Vec<RebateTier>,
    #[serde(flatten)]
    pub rebate_curve: RebateCurve,
    #[serde(default)]
    pub rewards: TradingRewardTokenConfig,
    /// Short collateral rebate rates by market
    #[serde(default)]
    pub short_collat_rewards: HashMap<String, ShortCollateralRewardConfig>,
}

/// One entry of the fee rebate table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateTier {
    /// Minimum staked LYRA for this tier
    pub cutoff: f64,
    /// Fraction of fees rebated
    pub return_rate: f64,
}

/// Parameters of the continuous fee rebate curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateCurve {
    #[serde(default)]
    pub max_rebate_percentage: f64,
    #[serde(default)]
    pub net_vertical_stretch: f64,
    #[serde(default)]
    pub vertical_shift: f64,
    #[serde(default)]
    pub vert_intercept: f64,
    #[serde(default)]
    pub stretchiness: f64,
}

impl RebateCurve {
    /// Fee rebate fraction for a staked balance.
    ///
    /// Logarithmic in the stake, floored at the intercept and capped at the max rebate. A negative
    /// stretch is treated as flat.
    pub fn rebate(&self, staked_lyra: f64) -> f64 {
        let curve = if staked_lyra > 0.0 && self.stretchiness > 0.0 {
            self.net_vertical_stretch.max(0.0)
                * (self.vertical_shift + (staked_lyra / self.stretchiness).ln_1p())
        } else {
            f64::NEG_INFINITY
        };
        curve.max(self.vert_intercept).min(self.max_rebate_percentage).max(0.0)
    }
}

/// How trading and short collateral rebates convert into reward tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingRewardTokenConfig {
    /// Share of each rebate dollar paid in LYRA; the rest is paid in OP
    #[serde(default)]
    pub lyra_portion: f64,
    /// LYRA price used once the window is complete
    #[serde(default)]
    pub fixed_lyra_price: f64,
    /// OP price used once the window is complete
    #[serde(default)]
    pub fixed_op_price: f64,
    #[serde(default)]
    pub floor_token_price_lyra: f64,
    #[serde(default, rename = "floorTokenPriceOP")]
    pub floor_token_price_op: f64,
    #[serde(default)]
    pub lyra_rewards_cap: f64,
    #[serde(default)]
    pub op_rewards_cap: f64,
}

impl TradingRewardTokenConfig {
    /// Splits a dollar amount between the two tokens and converts it at the given prices.
    pub fn convert(&self, dollars: f64, prices: RewardTokens) -> RewardTokens {
        let lyra_portion = self.lyra_portion.clamp(0.0, 1.0);
        RewardTokens {
            lyra: math::safe_div(dollars * lyra_portion, prices.lyra),
            op: math::safe_div(dollars * (1.0 - lyra_portion), prices.op),
        }
    }
}

/// Per option day rebate rates for shorts in one market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortCollateralRewardConfig {
    /// Multiplier for positions expiring four weeks or more out
    pub long_dated_penalty: f64,
    pub ten_delta_rebate_per_option_day: f64,
    pub ninety_delta_rebate_per_option_day: f64,
}
