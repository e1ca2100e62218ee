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

//! An account's participation in a reward epoch.

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    claims::{ClaimEvent, ClaimTags, RewardStream, RewardToken},
    error::RewardsError,
    market::MarketId,
    math,
    program::EpochProgram,
    RewardApy, RewardTokens, SECONDS_IN_SIX_MONTHS,
};

/// Accruals of one account over one window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEpochData {
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    /// Staked LYRA integrated over the elapsed part of the window, in token days
    #[serde(default)]
    pub stk_lyra_days: f64,
    /// Staking rewards computed for the window
    #[serde(default)]
    pub inflationary_rewards: RewardTokens,
    #[serde(default)]
    pub trading_rewards: AccountTradingRewards,
    /// Vault token days by market
    #[serde(default)]
    pub boosted_lp_days: HashMap<String, f64>,
    /// Vault rewards allocated by market
    #[serde(default)]
    pub vault_rewards: HashMap<String, AccountVaultRewards>,
    #[serde(default)]
    pub weth_lyra_staking_rewards: WethLyraStakingPosition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTradingRewards {
    /// Trading fees paid in dollars
    #[serde(default)]
    pub trading_fees: f64,
    /// Short collateral rebate accrued in dollars
    #[serde(default)]
    pub total_collat_rebate_dollars: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountVaultRewards {
    #[serde(default)]
    pub lyra: f64,
    #[serde(default)]
    pub op: f64,
    /// The market was excluded from vault rewards for this account
    #[serde(default)]
    pub is_ignored: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WethLyraStakingPosition {
    #[serde(default)]
    pub op_rewards: f64,
    #[serde(default)]
    pub g_uni_tokens_staked: f64,
    #[serde(default)]
    pub percent_share: f64,
}

/// Live balances of an account at the evaluation timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalances {
    /// Staked LYRA by chain
    #[serde(default)]
    pub staked_lyra: HashMap<String, f64>,
    /// Vault token balances by market base symbol
    #[serde(default)]
    pub vault_tokens: HashMap<String, f64>,
}

impl AccountBalances {
    pub fn total_staked_lyra(&self) -> f64 {
        self.staked_lyra.values().sum()
    }
}

/// Earliest timestamps at which staking rewards can be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingUnlockTimestamps {
    pub lyra: u64,
    pub op: u64,
}

/// One account's entitlements within one [EpochProgram].
#[derive(Debug, Clone)]
pub struct AccountEpochPosition {
    account: Address,
    program: Arc<EpochProgram>,
    staked_lyra_balance: f64,
    trading_fees: f64,
    trading_fee_rebate: f64,
    trading_rewards: RewardTokens,
    short_collateral_rewards: RewardTokens,
    staking_rewards: RewardTokens,
    /// Indexed by [MarketId]
    vault_token_balances: Vec<f64>,
    /// Indexed by [MarketId]
    vault_rewards: Vec<RewardTokens>,
    total_vault_rewards: RewardTokens,
    is_pending_rewards: bool,
    weth_lyra_staking: WethLyraStakingPosition,
}

impl AccountEpochPosition {
    /// Binds an account's accruals to its program.
    ///
    /// `claims` are the claim events recorded for this window only.
    pub fn new(
        account: Address,
        program: Arc<EpochProgram>,
        data: &AccountEpochData,
        balances: &AccountBalances,
        claims: &[ClaimEvent],
    ) -> Self {
        let is_complete = program.is_complete();
        let progress_days = program.progress_days();

        // Averages for completed windows, live balances otherwise
        let staked_lyra_balance = if is_complete {
            math::time_weighted_average(data.stk_lyra_days, progress_days)
        } else {
            balances.total_staked_lyra()
        };

        let vault_token_balances: Vec<f64> = program
            .markets()
            .iter()
            .map(|market| {
                let key = market.base_symbol.as_str();
                if is_complete {
                    let lp_days = data.boosted_lp_days.get(key).copied().unwrap_or(0.0);
                    math::time_weighted_average(lp_days, progress_days)
                } else {
                    balances.vault_tokens.get(key).copied().unwrap_or(0.0)
                }
            })
            .collect();

        let vault_rewards: Vec<RewardTokens> = program
            .markets()
            .iter()
            .map(|market| match data.vault_rewards.get(&market.base_symbol) {
                Some(rewards) if !rewards.is_ignored => RewardTokens::new(rewards.lyra, rewards.op),
                Some(_) | None => RewardTokens::ZERO,
            })
            .collect();
        let total_vault_rewards =
            vault_rewards.iter().fold(RewardTokens::ZERO, |sum, rewards| sum + *rewards);

        let trading_fees = data.trading_rewards.trading_fees;
        let trading_fee_rebate = program.trading_fee_rebate(staked_lyra_balance);
        let trading_rewards = program.trading_rewards(trading_fees, staked_lyra_balance);
        let short_collateral_rewards =
            program.short_collateral_rewards(data.trading_rewards.total_collat_rebate_dollars);
        let staking_rewards = data.inflationary_rewards;

        let tags = ClaimTags::from_events(claims);
        let unclaimed = |stream: &RewardStream, token: RewardToken, amount: f64| {
            amount > 0.0 && !tags.is_claimed(stream, token)
        };

        let trading_total = trading_rewards + short_collateral_rewards;
        let is_trading_pending =
            unclaimed(&RewardStream::Trading, RewardToken::Lyra, trading_total.lyra)
                || unclaimed(&RewardStream::Trading, RewardToken::Op, trading_total.op);

        // LYRA staking rewards stay locked for six months after the window, so they never hold
        // a window open.
        let is_staking_pending =
            unclaimed(&RewardStream::Staking, RewardToken::Op, staking_rewards.op);

        let is_vaults_pending =
            program.markets().iter().zip(&vault_rewards).any(|(market, rewards)| {
                let stream = RewardStream::Vault(market.base_symbol.clone());
                unclaimed(&stream, RewardToken::Lyra, rewards.lyra)
                    || unclaimed(&stream, RewardToken::Op, rewards.op)
            });

        let is_pending_rewards =
            !is_complete || is_trading_pending || is_staking_pending || is_vaults_pending;

        tracing::debug!(
            "Built position for {} in epoch {}: staked_lyra={:.4}, pending={}",
            account,
            program.id(),
            staked_lyra_balance,
            is_pending_rewards
        );

        Self {
            account,
            program,
            staked_lyra_balance,
            trading_fees,
            trading_fee_rebate,
            trading_rewards,
            short_collateral_rewards,
            staking_rewards,
            vault_token_balances,
            vault_rewards,
            total_vault_rewards,
            is_pending_rewards,
            weth_lyra_staking: data.weth_lyra_staking_rewards,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn program(&self) -> &Arc<EpochProgram> {
        &self.program
    }

    /// Average staked LYRA for completed windows, live stake across chains otherwise.
    pub fn staked_lyra_balance(&self) -> f64 {
        self.staked_lyra_balance
    }

    pub fn trading_fees(&self) -> f64 {
        self.trading_fees
    }

    pub fn trading_fee_rebate(&self) -> f64 {
        self.trading_fee_rebate
    }

    pub fn trading_rewards(&self) -> RewardTokens {
        self.trading_rewards
    }

    pub fn short_collateral_rewards(&self) -> RewardTokens {
        self.short_collateral_rewards
    }

    pub fn staking_rewards(&self) -> RewardTokens {
        self.staking_rewards
    }

    pub fn staking_rewards_unlock_timestamp(&self) -> StakingUnlockTimestamps {
        let end = self.program.end_timestamp();
        StakingUnlockTimestamps { lyra: end.saturating_add(SECONDS_IN_SIX_MONTHS), op: end }
    }

    /// Vault rewards summed over every market of the program.
    pub fn total_vault_rewards(&self) -> RewardTokens {
        self.total_vault_rewards
    }

    /// Whether some entitlement of this window is still unclaimed, or the window is not over.
    pub fn is_pending_rewards(&self) -> bool {
        self.is_pending_rewards
    }

    pub fn weth_lyra_staking(&self) -> WethLyraStakingPosition {
        self.weth_lyra_staking
    }

    /// Average vault tokens for completed windows, the live balance otherwise.
    pub fn vault_token_balance(&self, market: MarketId) -> f64 {
        self.vault_token_balances.get(market.0).copied().unwrap_or(0.0)
    }

    /// The account's boosted vault APY, or the unboosted APY a new deposit would earn.
    pub fn vault_apy(&self, market: MarketId) -> RewardApy {
        let balance = self.vault_token_balance(market);
        if balance <= 0.0 {
            self.program.min_vault_apy(market)
        } else {
            self.program.vault_apy(market, self.staked_lyra_balance, balance)
        }
    }

    pub fn vault_max_boost(&self, market: MarketId) -> f64 {
        self.program.vault_max_boost(market, self.vault_token_balance(market).max(0.0))
    }

    pub fn vault_apy_multiplier(&self, market: MarketId) -> f64 {
        let balance = self.vault_token_balance(market);
        if balance <= 0.0 {
            1.0
        } else {
            self.program.vault_apy_multiplier(market, self.staked_lyra_balance, balance)
        }
    }

    pub fn vault_rewards(&self, market: MarketId) -> RewardTokens {
        self.vault_rewards.get(market.0).copied().unwrap_or_default()
    }
}

/// Builds an account's position in every window it has accruals for, sorted by end timestamp.
///
/// Fails if an account window has no program with the same bounds, which means the snapshots were
/// fetched inconsistently.
pub fn positions_for_account(
    account: Address,
    programs: &[Arc<EpochProgram>],
    epochs: &[AccountEpochData],
    balances: &AccountBalances,
    claims: &[ClaimEvent],
) -> Result<Vec<AccountEpochPosition>, RewardsError> {
    let mut positions = epochs
        .iter()
        .map(|data| -> Result<AccountEpochPosition, RewardsError> {
            let program = programs
                .iter()
                .find(|p| {
                    p.start_timestamp() == data.start_timestamp
                        && p.end_timestamp() == data.end_timestamp
                })
                .ok_or_else(|| {
                    tracing::warn!(
                        "No epoch program matches account epoch [{}, {}] for {}",
                        data.start_timestamp,
                        data.end_timestamp,
                        account
                    );
                    RewardsError::MissingEpochReference {
                        start_timestamp: data.start_timestamp,
                        end_timestamp: data.end_timestamp,
                    }
                })?;
            let epoch_claims: Vec<ClaimEvent> = claims
                .iter()
                .filter(|claim| claim.epoch_timestamp == program.start_timestamp())
                .cloned()
                .collect();
            Ok(AccountEpochPosition::new(
                account,
                Arc::clone(program),
                data,
                balances,
                &epoch_claims,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;
    positions.sort_by_key(|p| p.program.end_timestamp());
    Ok(positions)
}

pub fn position_by_start_timestamp(
    positions: &[AccountEpochPosition],
    start_timestamp: u64,
) -> Option<&AccountEpochPosition> {
    positions.iter().find(|p| p.program.start_timestamp() == start_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GlobalEpochData, RebateTier, VaultRewardConfig},
        market::MarketSnapshot,
        SECONDS_IN_DAY,
    };
    use tracing_test::traced_test;

    const START: u64 = 1_700_000_000;
    const END: u64 = START + 14 * SECONDS_IN_DAY;
    const ETH: MarketId = MarketId(0);
    const BTC: MarketId = MarketId(1);

    fn program(now: u64) -> Arc<EpochProgram> {
        let mut epoch = GlobalEpochData {
            start_timestamp: START,
            end_timestamp: END,
            total_stk_lyra_days: 14.0 * 10_000.0,
            ..Default::default()
        };
        epoch
            .vault_reward_config
            .insert("sETH".into(), VaultRewardConfig { x: 0.5, lyra: 1_000.0, op: 1_000.0 });
        epoch.scaled_stk_lyra_days.insert("sETH".into(), 14.0 * 10_000.0);
        epoch.total_lp_token_days.insert("sETH".into(), 14.0 * 100_000.0);
        epoch.total_boosted_lp_token_days.insert("sETH".into(), 14.0 * 60_000.0);
        let trading = &mut epoch.trading_reward_config;
        trading.use_rebate_table = true;
        trading.rebate_rate_table = vec![
            RebateTier { cutoff: 0.0, return_rate: 0.1 },
            RebateTier { cutoff: 500.0, return_rate: 0.2 },
        ];
        trading.rewards.lyra_portion = 0.5;
        trading.rewards.fixed_lyra_price = 1.0;
        trading.rewards.fixed_op_price = 1.0;
        trading.rewards.floor_token_price_lyra = 1.0;
        trading.rewards.floor_token_price_op = 1.0;

        let markets = vec![
            MarketSnapshot {
                address: Address::repeat_byte(1),
                base_symbol: "sETH".into(),
                token_price: 1.0,
                pending_deposits: 0.0,
            },
            MarketSnapshot {
                address: Address::repeat_byte(2),
                base_symbol: "sBTC".into(),
                token_price: 1.0,
                pending_deposits: 0.0,
            },
        ];
        let prices = RewardTokens::new(1.0, 1.0);
        Arc::new(EpochProgram::new(1, &epoch, prices, &markets, 50_000.0, now))
    }

    fn account_data() -> AccountEpochData {
        let mut data = AccountEpochData {
            start_timestamp: START,
            end_timestamp: END,
            stk_lyra_days: 14.0 * 600.0,
            inflationary_rewards: RewardTokens::new(40.0, 8.0),
            trading_rewards: AccountTradingRewards {
                trading_fees: 1_000.0,
                total_collat_rebate_dollars: 50.0,
            },
            ..Default::default()
        };
        data.boosted_lp_days.insert("sETH".into(), 14.0 * 2_000.0);
        data.vault_rewards
            .insert("sETH".into(), AccountVaultRewards { lyra: 12.0, op: 3.0, is_ignored: false });
        data.vault_rewards
            .insert("sBTC".into(), AccountVaultRewards { lyra: 7.0, op: 7.0, is_ignored: true });
        data
    }

    fn balances() -> AccountBalances {
        let mut balances = AccountBalances::default();
        balances.staked_lyra.insert("ethereum".into(), 100.0);
        balances.staked_lyra.insert("optimism".into(), 150.0);
        balances.vault_tokens.insert("sETH".into(), 5_000.0);
        balances
    }

    fn claim(token: RewardToken, stream: RewardStream) -> ClaimEvent {
        ClaimEvent { epoch_timestamp: START, token, stream }
    }

    fn all_but_lyra_staking_claims() -> Vec<ClaimEvent> {
        vec![
            claim(RewardToken::Lyra, RewardStream::Trading),
            claim(RewardToken::Op, RewardStream::Trading),
            claim(RewardToken::Op, RewardStream::Staking),
            claim(RewardToken::Lyra, RewardStream::Vault("sETH".into())),
            claim(RewardToken::Op, RewardStream::Vault("sETH".into())),
        ]
    }

    #[test]
    fn test_completed_window_uses_averages() {
        let position = AccountEpochPosition::new(
            Address::ZERO,
            program(END + 1),
            &account_data(),
            &balances(),
            &[],
        );
        assert_eq!(position.staked_lyra_balance(), 600.0);
        assert_eq!(position.vault_token_balance(ETH), 2_000.0);
        assert_eq!(position.vault_token_balance(BTC), 0.0);
        assert_eq!(position.trading_fee_rebate(), 0.2);
        assert_eq!(position.trading_rewards(), RewardTokens::new(100.0, 100.0));
        assert_eq!(position.short_collateral_rewards(), RewardTokens::new(25.0, 25.0));
    }

    #[test]
    fn test_current_window_uses_live_balances() {
        let position = AccountEpochPosition::new(
            Address::ZERO,
            program(START + SECONDS_IN_DAY),
            &account_data(),
            &balances(),
            &all_but_lyra_staking_claims(),
        );
        assert_eq!(position.staked_lyra_balance(), 250.0);
        assert_eq!(position.vault_token_balance(ETH), 5_000.0);
        assert_eq!(position.trading_fee_rebate(), 0.1);
        // Not complete, so always pending.
        assert!(position.is_pending_rewards());
    }

    #[test]
    fn test_vault_queries() {
        let position = AccountEpochPosition::new(
            Address::ZERO,
            program(END + 1),
            &account_data(),
            &balances(),
            &[],
        );
        let program = position.program().clone();

        assert_eq!(position.vault_apy(BTC), program.min_vault_apy(BTC));
        assert_eq!(position.vault_apy_multiplier(BTC), 1.0);
        assert_eq!(position.vault_max_boost(BTC), 0.0);

        assert_eq!(position.vault_apy(ETH), program.vault_apy(ETH, 600.0, 2_000.0));
        assert!(position.vault_apy_multiplier(ETH) > 1.0);
        assert_eq!(position.vault_max_boost(ETH), program.vault_max_boost(ETH, 2_000.0));

        assert_eq!(position.vault_rewards(ETH), RewardTokens::new(12.0, 3.0));
        assert_eq!(position.vault_rewards(BTC), RewardTokens::ZERO);
        assert_eq!(position.vault_rewards(MarketId(9)), RewardTokens::ZERO);
        assert_eq!(position.total_vault_rewards(), RewardTokens::new(12.0, 3.0));
    }

    #[test]
    fn test_pending_rewards_round_trip() {
        let unclaimed = AccountEpochPosition::new(
            Address::ZERO,
            program(END + 1),
            &account_data(),
            &balances(),
            &[],
        );
        assert!(unclaimed.is_pending_rewards());

        let claimed = AccountEpochPosition::new(
            Address::ZERO,
            program(END + 1),
            &account_data(),
            &balances(),
            &all_but_lyra_staking_claims(),
        );
        assert!(!claimed.is_pending_rewards());
    }

    #[test]
    fn test_each_stream_holds_pending_independently() {
        let full = all_but_lyra_staking_claims();
        for skipped in 0..full.len() {
            let claims: Vec<ClaimEvent> = full
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != skipped)
                .map(|(_, c)| c.clone())
                .collect();
            let position = AccountEpochPosition::new(
                Address::ZERO,
                program(END + 1),
                &account_data(),
                &balances(),
                &claims,
            );
            assert!(position.is_pending_rewards(), "missing claim {:?}", full[skipped]);
        }
    }

    #[test]
    fn test_zero_entitlements_need_no_claims() {
        let data = AccountEpochData {
            start_timestamp: START,
            end_timestamp: END,
            ..Default::default()
        };
        let position = AccountEpochPosition::new(
            Address::ZERO,
            program(END + 1),
            &data,
            &AccountBalances::default(),
            &[],
        );
        assert_eq!(position.staked_lyra_balance(), 0.0);
        assert_eq!(position.trading_rewards(), RewardTokens::ZERO);
        assert_eq!(position.total_vault_rewards(), RewardTokens::ZERO);
        assert!(!position.is_pending_rewards());
    }

    #[test]
    fn test_staking_unlock_timestamps() {
        let position = AccountEpochPosition::new(
            Address::ZERO,
            program(END + 1),
            &account_data(),
            &balances(),
            &[],
        );
        let unlock = position.staking_rewards_unlock_timestamp();
        assert_eq!(unlock.op, END);
        assert_eq!(unlock.lyra, END + 180 * SECONDS_IN_DAY);
        assert_eq!(position.staking_rewards(), RewardTokens::new(40.0, 8.0));
    }

    #[test]
    fn test_staking_unlock_timestamp_saturates() {
        let end = u64::MAX - 10;
        let epoch = GlobalEpochData {
            start_timestamp: START,
            end_timestamp: end,
            ..Default::default()
        };
        let program = Arc::new(EpochProgram::new(1, &epoch, RewardTokens::ZERO, &[], 0.0, START));
        let data = AccountEpochData { start_timestamp: START, end_timestamp: end, ..Default::default() };
        let position = AccountEpochPosition::new(
            Address::ZERO,
            program,
            &data,
            &AccountBalances::default(),
            &[],
        );
        let unlock = position.staking_rewards_unlock_timestamp();
        assert_eq!(unlock.lyra, u64::MAX);
        assert_eq!(unlock.op, end);
    }

    #[test]
    fn test_positions_for_account_filters_claims_by_window() {
        let programs = vec![program(END + 1)];
        let mut claims = all_but_lyra_staking_claims();
        // A claim from another window must not count.
        claims[0].epoch_timestamp = START - 1;

        let positions = positions_for_account(
            Address::repeat_byte(9),
            &programs,
            &[account_data()],
            &balances(),
            &claims,
        )
        .unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].account(), Address::repeat_byte(9));
        assert!(positions[0].is_pending_rewards());
        assert!(position_by_start_timestamp(&positions, START).is_some());
        assert!(position_by_start_timestamp(&positions, END).is_none());
    }

    #[test]
    #[traced_test]
    fn test_positions_for_account_missing_program() {
        let programs = vec![program(END + 1)];
        let mut data = account_data();
        data.end_timestamp += 1;

        let err = positions_for_account(Address::ZERO, &programs, &[data], &balances(), &[])
            .unwrap_err();
        assert_eq!(
            err,
            RewardsError::MissingEpochReference { start_timestamp: START, end_timestamp: END + 1 }
        );
        assert!(logs_contain("No epoch program matches account epoch"));
    }
}
