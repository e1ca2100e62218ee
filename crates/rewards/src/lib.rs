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

//! Reward epoch computation for LYRA staking, vault liquidity, trading fee rebates and short
//! collateral rebates.
//!
//! An [EpochProgram] holds the account independent figures of one reward window. An
//! [AccountEpochPosition] binds an account's accruals for that window to the program and derives
//! the account's entitlements. Both are immutable once built and every getter is a pure function
//! of the snapshot data they were built from.

use serde::{Deserialize, Serialize};

// Declare modules
pub mod account;
pub mod claims;
pub mod config;
pub mod error;
pub mod market;
pub mod math;
pub mod program;

// Re-export commonly used types
pub use account::{
    position_by_start_timestamp, positions_for_account, AccountBalances, AccountEpochData,
    AccountEpochPosition, AccountTradingRewards, AccountVaultRewards, StakingUnlockTimestamps,
    WethLyraStakingPosition,
};

pub use claims::{ClaimEvent, ClaimParseError, ClaimTags, RewardStream, RewardToken};

pub use config::{
    GlobalEpochData, RebateCurve, RebateTier, ShortCollateralRewardConfig, StakingRewardConfig,
    TradingRewardConfig, TradingRewardTokenConfig, VaultRewardConfig, WethLyraStakingRewardConfig,
};

pub use error::RewardsError;

pub use market::{MarketEpoch, MarketId, MarketSnapshot, ShortCollateralProgram, VaultProgram};

pub use program::{
    build_programs, latest_program, program_by_start_timestamp, EpochProgram, RebateSchedule,
};

/// Seconds in a day
pub const SECONDS_IN_DAY: u64 = 86_400;
/// Seconds in a week
pub const SECONDS_IN_WEEK: u64 = 7 * SECONDS_IN_DAY;
/// Seconds in six months, counted as 180 days
pub const SECONDS_IN_SIX_MONTHS: u64 = 180 * SECONDS_IN_DAY;
/// Seconds in a 365 day year
pub const SECONDS_IN_YEAR: u64 = 365 * SECONDS_IN_DAY;

/// Nominal vault token balance used for the display range of vault APYs.
pub const NOMINAL_VAULT_TOKEN_BALANCE: f64 = 10_000.0;

/// Time range for an epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochTimeRange {
    pub start_time: u64,
    pub end_time: u64,
}

impl EpochTimeRange {
    /// Length of the window in seconds, zero for an inverted range.
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Amounts denominated in each of the two reward tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardTokens {
    /// Amount of the LYRA governance token
    #[serde(default)]
    pub lyra: f64,
    /// Amount of the OP incentive token
    #[serde(default)]
    pub op: f64,
}

impl RewardTokens {
    pub const ZERO: Self = Self { lyra: 0.0, op: 0.0 };

    pub fn new(lyra: f64, op: f64) -> Self {
        Self { lyra, op }
    }

    /// Returns the amount for a single token.
    pub fn get(&self, token: RewardToken) -> f64 {
        match token {
            RewardToken::Lyra => self.lyra,
            RewardToken::Op => self.op,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.lyra <= 0.0 && self.op <= 0.0
    }
}

impl std::ops::Add for RewardTokens {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { lyra: self.lyra + rhs.lyra, op: self.op + rhs.op }
    }
}

/// Annualized yield per reward token, plus their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardApy {
    pub lyra: f64,
    pub op: f64,
    pub total: f64,
}

impl RewardApy {
    pub const ZERO: Self = Self { lyra: 0.0, op: 0.0, total: 0.0 };

    pub fn new(lyra: f64, op: f64) -> Self {
        Self { lyra, op, total: lyra + op }
    }
}
