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

//! Reports printed by the commands, either as log lines or as JSON.

use alloy_primitives::Address;
use anyhow::Result;
use chrono::DateTime;
use lyra_rewards::{
    AccountEpochPosition, EpochProgram, MarketId, RewardApy, RewardTokens,
    StakingUnlockTimestamps, WethLyraStakingPosition,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochState {
    Upcoming,
    Current,
    Complete,
}

impl EpochState {
    fn of(program: &EpochProgram) -> Self {
        if program.is_complete() {
            EpochState::Complete
        } else if program.is_current() {
            EpochState::Current
        } else {
            EpochState::Upcoming
        }
    }
}

impl std::fmt::Display for EpochState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpochState::Upcoming => f.write_str("upcoming"),
            EpochState::Current => f.write_str("current"),
            EpochState::Complete => f.write_str("complete"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochReport {
    pub id: u64,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub last_updated_timestamp: u64,
    pub state: EpochState,
    pub progress_days: f64,
    pub total_staked_lyra: f64,
    pub staking_apy: RewardApy,
    pub total_staking_rewards: RewardTokens,
    pub weth_lyra_staking: RewardTokens,
    pub min_trading_fee_rebate: f64,
    pub max_trading_fee_rebate: f64,
    pub trading_rewards_cap: RewardTokens,
    pub effective_prices: RewardTokens,
    pub markets: Vec<MarketReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub address: Address,
    pub base_symbol: String,
    pub total_average_vault_tokens: f64,
    pub total_average_boosted_vault_tokens: f64,
    pub min_vault_apy: RewardApy,
    pub max_vault_apy: RewardApy,
    pub max_boost_multiplier: f64,
    pub total_vault_rewards: RewardTokens,
}

impl EpochReport {
    /// Report of a program, restricted to `markets` when given.
    pub fn new(program: &EpochProgram, markets: Option<&[MarketId]>) -> Self {
        let markets = program
            .markets()
            .iter()
            .filter(|m| markets.is_none_or(|ids| ids.contains(&m.id)))
            .map(|m| MarketReport {
                address: m.address,
                base_symbol: m.base_symbol.clone(),
                total_average_vault_tokens: program.total_average_vault_tokens(m.id),
                total_average_boosted_vault_tokens: program
                    .total_average_boosted_vault_tokens(m.id),
                min_vault_apy: program.min_vault_apy(m.id),
                max_vault_apy: program.max_vault_apy(m.id),
                max_boost_multiplier: program.max_boost_multiplier(m.id),
                total_vault_rewards: program.total_vault_rewards(m.id),
            })
            .collect();

        Self {
            id: program.id(),
            start_timestamp: program.start_timestamp(),
            end_timestamp: program.end_timestamp(),
            last_updated_timestamp: program.last_updated_timestamp(),
            state: EpochState::of(program),
            progress_days: program.progress_days(),
            total_staked_lyra: program.total_staked_lyra(),
            staking_apy: program.staking_apy(),
            total_staking_rewards: program.total_staking_rewards(),
            weth_lyra_staking: program.weth_lyra_staking(),
            min_trading_fee_rebate: program.min_trading_fee_rebate(),
            max_trading_fee_rebate: program.max_trading_fee_rebate(),
            trading_rewards_cap: program.trading_rewards_cap(),
            effective_prices: program.effective_prices(),
            markets,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "Epoch {} [{} - {}] {} ({:.2} days elapsed)",
            self.id,
            format_timestamp(self.start_timestamp),
            format_timestamp(self.end_timestamp),
            self.state,
            self.progress_days
        );
        tracing::info!(
            "  Staking APY: {:.4} LYRA, {:.4} OP over {:.2} staked LYRA",
            self.staking_apy.lyra,
            self.staking_apy.op,
            self.total_staked_lyra
        );
        tracing::info!(
            "  Trading fee rebate: {:.4} to {:.4}",
            self.min_trading_fee_rebate,
            self.max_trading_fee_rebate
        );
        for market in &self.markets {
            tracing::info!(
                "  Vault {} ({}): APY {:.4} to {:.4}, max boost x{:.2}",
                market.base_symbol,
                market.address,
                market.min_vault_apy.total,
                market.max_vault_apy.total,
                market.max_boost_multiplier
            );
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub account: Address,
    pub epoch_id: u64,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub state: EpochState,
    pub staked_lyra_balance: f64,
    pub trading_fees: f64,
    pub trading_fee_rebate: f64,
    pub trading_rewards: RewardTokens,
    pub short_collateral_rewards: RewardTokens,
    pub staking_rewards: RewardTokens,
    pub staking_rewards_unlock_timestamp: StakingUnlockTimestamps,
    pub total_vault_rewards: RewardTokens,
    pub weth_lyra_staking: WethLyraStakingPosition,
    pub is_pending_rewards: bool,
    pub vaults: Vec<VaultPositionReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultPositionReport {
    pub base_symbol: String,
    pub vault_token_balance: f64,
    pub vault_apy: RewardApy,
    pub vault_apy_multiplier: f64,
    pub vault_max_boost: f64,
    pub vault_rewards: RewardTokens,
}

impl PositionReport {
    /// Report of a position, restricted to `markets` when given.
    pub fn new(position: &AccountEpochPosition, markets: Option<&[MarketId]>) -> Self {
        let program = position.program();
        let vaults = program
            .markets()
            .iter()
            .filter(|m| markets.is_none_or(|ids| ids.contains(&m.id)))
            .map(|m| VaultPositionReport {
                base_symbol: m.base_symbol.clone(),
                vault_token_balance: position.vault_token_balance(m.id),
                vault_apy: position.vault_apy(m.id),
                vault_apy_multiplier: position.vault_apy_multiplier(m.id),
                vault_max_boost: position.vault_max_boost(m.id),
                vault_rewards: position.vault_rewards(m.id),
            })
            .collect();

        Self {
            account: position.account(),
            epoch_id: program.id(),
            start_timestamp: program.start_timestamp(),
            end_timestamp: program.end_timestamp(),
            state: EpochState::of(program),
            staked_lyra_balance: position.staked_lyra_balance(),
            trading_fees: position.trading_fees(),
            trading_fee_rebate: position.trading_fee_rebate(),
            trading_rewards: position.trading_rewards(),
            short_collateral_rewards: position.short_collateral_rewards(),
            staking_rewards: position.staking_rewards(),
            staking_rewards_unlock_timestamp: position.staking_rewards_unlock_timestamp(),
            total_vault_rewards: position.total_vault_rewards(),
            weth_lyra_staking: position.weth_lyra_staking(),
            is_pending_rewards: position.is_pending_rewards(),
            vaults,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "Epoch {} [{} - {}] {}: pending rewards {}",
            self.epoch_id,
            format_timestamp(self.start_timestamp),
            format_timestamp(self.end_timestamp),
            self.state,
            self.is_pending_rewards
        );
        tracing::info!(
            "  Staked LYRA {:.4}, trading fees {:.2} rebated at {:.4}",
            self.staked_lyra_balance,
            self.trading_fees,
            self.trading_fee_rebate
        );
        tracing::info!(
            "  Trading rewards: {:.4} LYRA, {:.4} OP",
            self.trading_rewards.lyra,
            self.trading_rewards.op
        );
        tracing::info!(
            "  Short collateral rewards: {:.4} LYRA, {:.4} OP",
            self.short_collateral_rewards.lyra,
            self.short_collateral_rewards.op
        );
        tracing::info!(
            "  Staking rewards: {:.4} LYRA (unlocks {}), {:.4} OP (unlocks {})",
            self.staking_rewards.lyra,
            format_timestamp(self.staking_rewards_unlock_timestamp.lyra),
            self.staking_rewards.op,
            format_timestamp(self.staking_rewards_unlock_timestamp.op)
        );
        for vault in &self.vaults {
            tracing::info!(
                "  Vault {}: balance {:.4}, APY {:.4} (x{:.2}), stake {:.4} LYRA for max boost",
                vault.base_symbol,
                vault.vault_token_balance,
                vault.vault_apy.total,
                vault.vault_apy_multiplier,
                vault.vault_max_boost
            );
        }
    }
}

/// Prints a report as pretty JSON on stdout.
pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Formats a unix timestamp as UTC, falling back to the raw seconds when out of range.
pub fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
