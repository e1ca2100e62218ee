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

//! Account independent figures of a reward epoch.

use std::sync::Arc;

use alloy_primitives::Address;

use crate::{
    config::{
        GlobalEpochData, RebateCurve, RebateTier, TradingRewardConfig, TradingRewardTokenConfig,
    },
    market::{MarketEpoch, MarketId, MarketSnapshot, ShortCollateralProgram, VaultProgram},
    math::{self, safe_div},
    EpochTimeRange, RewardApy, RewardTokens, NOMINAL_VAULT_TOKEN_BALANCE, SECONDS_IN_DAY,
    SECONDS_IN_WEEK, SECONDS_IN_YEAR,
};

/// Positions expiring at least this far out take the long dated penalty.
const LONG_DATED_EXPIRY: u64 = 4 * SECONDS_IN_WEEK;

/// Trading fee rebate schedule of an epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum RebateSchedule {
    /// Step lookup, tiers sorted by ascending cutoff
    Table(Vec<RebateTier>),
    Curve(RebateCurve),
}

impl RebateSchedule {
    fn from_config(config: &TradingRewardConfig) -> Self {
        if config.use_rebate_table {
            let mut tiers = config.rebate_rate_table.clone();
            tiers.sort_by(|a, b| a.cutoff.total_cmp(&b.cutoff));
            RebateSchedule::Table(tiers)
        } else {
            RebateSchedule::Curve(config.rebate_curve)
        }
    }

    /// Fraction of trading fees rebated at a staked balance.
    pub fn rebate(&self, staked_lyra: f64) -> f64 {
        match self {
            RebateSchedule::Table(tiers) => math::rebate_from_table(tiers, staked_lyra),
            RebateSchedule::Curve(curve) => curve.rebate(staked_lyra),
        }
    }
}

/// One reward distribution window, shared by all accounts.
///
/// Built once from a snapshot and an evaluation timestamp; nothing about it changes afterwards,
/// including whether it is current or complete.
#[derive(Debug, Clone)]
pub struct EpochProgram {
    id: u64,
    start_timestamp: u64,
    end_timestamp: u64,
    last_updated_timestamp: u64,
    block_timestamp: u64,
    duration: u64,
    progress_days: f64,
    is_current: bool,
    is_complete: bool,
    total_average_staked_lyra: f64,
    /// Staked LYRA backing the staking APY: the average once complete, live supply otherwise
    staking_denominator: f64,
    prices: RewardTokens,
    staking_rewards: RewardTokens,
    rebate_schedule: RebateSchedule,
    trading_rewards: TradingRewardTokenConfig,
    weth_lyra_staking_rewards: RewardTokens,
    markets: Vec<MarketEpoch>,
}

impl EpochProgram {
    /// Builds the program for one window.
    ///
    /// `staked_lyra_supply` is the live staked LYRA total supply and `block_timestamp` the
    /// evaluation time; both come from the same snapshot as `epoch`.
    pub fn new(
        id: u64,
        epoch: &GlobalEpochData,
        prices: RewardTokens,
        markets: &[MarketSnapshot],
        staked_lyra_supply: f64,
        block_timestamp: u64,
    ) -> Self {
        let start_timestamp = epoch.start_timestamp;
        let end_timestamp = epoch.end_timestamp;
        let is_current = block_timestamp >= start_timestamp && block_timestamp <= end_timestamp;
        let is_complete = block_timestamp > end_timestamp;

        let duration = end_timestamp.saturating_sub(start_timestamp);
        let progress_days = math::progress_seconds(start_timestamp, end_timestamp, block_timestamp)
            as f64
            / SECONDS_IN_DAY as f64;
        let total_average_staked_lyra =
            math::time_weighted_average(epoch.total_stk_lyra_days, progress_days);
        let staking_denominator =
            if is_complete { total_average_staked_lyra } else { staked_lyra_supply };

        let markets: Vec<MarketEpoch> = markets
            .iter()
            .enumerate()
            .map(|(idx, market)| MarketEpoch::new(MarketId(idx), market, epoch))
            .collect();

        tracing::debug!(
            "Built epoch {} [{}, {}]: current={}, complete={}, progress_days={:.4}, markets={}",
            id,
            start_timestamp,
            end_timestamp,
            is_current,
            is_complete,
            progress_days,
            markets.len()
        );

        Self {
            id,
            start_timestamp,
            end_timestamp,
            last_updated_timestamp: epoch.last_updated,
            block_timestamp,
            duration,
            progress_days,
            is_current,
            is_complete,
            total_average_staked_lyra,
            staking_denominator,
            prices,
            staking_rewards: epoch.staking_reward_config.total_rewards,
            rebate_schedule: RebateSchedule::from_config(&epoch.trading_reward_config),
            trading_rewards: epoch.trading_reward_config.rewards,
            weth_lyra_staking_rewards: epoch
                .weth_lyra_staking_reward_config
                .as_ref()
                .map(|config| config.total_rewards)
                .unwrap_or_default(),
            markets,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    pub fn end_timestamp(&self) -> u64 {
        self.end_timestamp
    }

    pub fn time_range(&self) -> EpochTimeRange {
        EpochTimeRange { start_time: self.start_timestamp, end_time: self.end_timestamp }
    }

    pub fn last_updated_timestamp(&self) -> u64 {
        self.last_updated_timestamp
    }

    /// The evaluation timestamp the program was built at.
    pub fn block_timestamp(&self) -> u64 {
        self.block_timestamp
    }

    /// Window length in seconds.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Days elapsed within the window, capped at its length.
    pub fn progress_days(&self) -> f64 {
        self.progress_days
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_upcoming(&self) -> bool {
        !self.is_current && !self.is_complete
    }

    /// Live token prices the program was built with.
    pub fn prices(&self) -> RewardTokens {
        self.prices
    }

    pub fn total_average_staked_lyra(&self) -> f64 {
        self.total_average_staked_lyra
    }

    /// Staked LYRA that the staking pool is shared between.
    pub fn total_staked_lyra(&self) -> f64 {
        self.staking_denominator
    }

    pub fn rebate_schedule(&self) -> &RebateSchedule {
        &self.rebate_schedule
    }

    pub fn markets(&self) -> &[MarketEpoch] {
        &self.markets
    }

    pub fn market(&self, market: MarketId) -> Option<&MarketEpoch> {
        self.markets.get(market.0)
    }

    pub fn market_by_address(&self, address: Address) -> Option<MarketId> {
        self.markets.iter().find(|m| m.address == address).map(|m| m.id)
    }

    pub fn market_by_symbol(&self, base_symbol: &str) -> Option<MarketId> {
        self.markets.iter().find(|m| m.base_symbol == base_symbol).map(|m| m.id)
    }

    // Staking

    /// Annualized yield per dollar of staked LYRA.
    pub fn staking_apy(&self) -> RewardApy {
        let stk_lyra_per_dollar = safe_div(1.0, self.prices.lyra);
        let share_per_dollar = safe_div(stk_lyra_per_dollar, self.staking_denominator);
        let apy = |rewards: f64, price: f64| {
            let per_dollar_per_second =
                safe_div(share_per_dollar * rewards, self.duration as f64);
            per_dollar_per_second * price * SECONDS_IN_YEAR as f64
        };
        RewardApy::new(
            apy(self.staking_rewards.lyra, self.prices.lyra),
            apy(self.staking_rewards.op, self.prices.op),
        )
    }

    /// LYRA distributed to stakers over the window. OP staking rewards are not distributed from
    /// this pool.
    pub fn total_staking_rewards(&self) -> RewardTokens {
        RewardTokens { lyra: self.staking_rewards.lyra, op: 0.0 }
    }

    /// OP distributed to the WETH/LYRA liquidity staking program.
    pub fn weth_lyra_staking(&self) -> RewardTokens {
        RewardTokens { lyra: 0.0, op: self.weth_lyra_staking_rewards.op }
    }

    // Vaults

    /// Time weighted average vault tokens in a market.
    pub fn total_average_vault_tokens(&self, market: MarketId) -> f64 {
        self.market(market)
            .map(|m| math::time_weighted_average(m.total_lp_token_days, self.progress_days))
            .unwrap_or(0.0)
    }

    /// Time weighted average boosted vault tokens in a market.
    pub fn total_average_boosted_vault_tokens(&self, market: MarketId) -> f64 {
        self.market(market)
            .map(|m| math::time_weighted_average(m.total_boosted_lp_token_days, self.progress_days))
            .unwrap_or(0.0)
    }

    /// Time weighted average of the staked LYRA reference for a market's boost curve.
    pub fn total_average_scaled_staked_lyra(&self, market: MarketId) -> f64 {
        self.market(market)
            .map(|m| math::time_weighted_average(m.scaled_stk_lyra_days, self.progress_days))
            .unwrap_or(0.0)
    }

    /// Vault APY for a provider holding `vault_token_balance` with `staked_lyra` staked.
    pub fn vault_apy(
        &self,
        market: MarketId,
        staked_lyra: f64,
        vault_token_balance: f64,
    ) -> RewardApy {
        let Some(market_epoch) = self.market(market) else {
            return RewardApy::ZERO;
        };
        let config = match market_epoch.vault {
            VaultProgram::Configured(config) if market_epoch.scaled_stk_lyra_days > 0.0 => config,
            VaultProgram::Configured(_) | VaultProgram::NotConfigured => return RewardApy::ZERO,
        };

        let total_avg_vault_tokens = self.total_average_vault_tokens(market);
        let total_avg_scaled_stk_lyra = self.total_average_scaled_staked_lyra(market);

        let effective_vault_tokens = math::effective_liquidity_tokens(
            vault_token_balance,
            total_avg_vault_tokens,
            staked_lyra,
            total_avg_scaled_stk_lyra,
            config.x,
        );

        let boosted_portion = safe_div(
            effective_vault_tokens,
            self.total_average_boosted_vault_tokens(market),
        );
        let base_portion = safe_div(vault_token_balance, total_avg_vault_tokens);
        // Boost relative to an unstaked provider counted at its full raw balance
        let apy_multiplier = safe_div(boosted_portion, base_portion);

        // Queued deposits dilute the pool as soon as they mint
        let token_price = market_epoch.token_price;
        let total_queued_vault_tokens = safe_div(market_epoch.pending_deposits, token_price);
        let total_vault_tokens = total_avg_vault_tokens + total_queued_vault_tokens;

        let vault_tokens_per_dollar = safe_div(1.0, token_price);
        let share_per_dollar = safe_div(vault_tokens_per_dollar, total_vault_tokens);

        let apy = |rewards: f64, price: f64| {
            let per_dollar_per_second =
                safe_div(share_per_dollar * rewards, self.duration as f64);
            per_dollar_per_second * price * SECONDS_IN_YEAR as f64 * apy_multiplier
        };

        RewardApy::new(apy(config.lyra, self.prices.lyra), apy(config.op, self.prices.op))
    }

    /// Ratio of the boosted vault APY to the APY at zero stake, for a fixed balance.
    ///
    /// Exactly 1 at zero stake, and 1 when the market pays no vault rewards.
    pub fn vault_apy_multiplier(
        &self,
        market: MarketId,
        staked_lyra: f64,
        vault_token_balance: f64,
    ) -> f64 {
        let base_apy = self.vault_apy(market, 0.0, vault_token_balance).total;
        if base_apy <= 0.0 {
            return 1.0;
        }
        let boosted_apy = self.vault_apy(market, staked_lyra, vault_token_balance).total;
        boosted_apy / base_apy
    }

    /// Smallest staked LYRA balance that gives `vault_token_balance` the full boost.
    pub fn vault_max_boost(&self, market: MarketId, vault_token_balance: f64) -> f64 {
        math::minimum_staked_for_max_boost(
            self.total_average_scaled_staked_lyra(market),
            vault_token_balance,
            self.total_average_vault_tokens(market),
        )
    }

    /// Highest value [Self::vault_apy_multiplier] reaches in a market, zero without a vault program.
    pub fn max_boost_multiplier(&self, market: MarketId) -> f64 {
        match self.market(market).map(|m| m.vault) {
            Some(VaultProgram::Configured(config)) => safe_div(1.0, config.x.min(1.0)),
            Some(VaultProgram::NotConfigured) | None => 0.0,
        }
    }

    /// Vault APY without any stake, at a nominal balance.
    pub fn min_vault_apy(&self, market: MarketId) -> RewardApy {
        self.vault_apy(market, 0.0, NOMINAL_VAULT_TOKEN_BALANCE)
    }

    /// Vault APY staking the market's average staked reference, at a nominal balance.
    pub fn max_vault_apy(&self, market: MarketId) -> RewardApy {
        match self.market(market) {
            Some(m) if m.scaled_stk_lyra_days > 0.0 => self.vault_apy(
                market,
                self.total_average_scaled_staked_lyra(market),
                NOMINAL_VAULT_TOKEN_BALANCE,
            ),
            _ => RewardApy::ZERO,
        }
    }

    /// Vault rewards allocated to a market so far.
    pub fn total_vault_rewards(&self, market: MarketId) -> RewardTokens {
        self.market(market).map(|m| m.rewarded_vault_rewards).unwrap_or_default()
    }

    // Trading

    pub fn trading_fee_rebate(&self, staked_lyra: f64) -> f64 {
        self.rebate_schedule.rebate(staked_lyra)
    }

    pub fn min_trading_fee_rebate(&self) -> f64 {
        self.trading_fee_rebate(0.0)
    }

    pub fn max_trading_fee_rebate(&self) -> f64 {
        self.trading_fee_rebate(self.staking_denominator)
    }

    pub fn trading_rewards_cap(&self) -> RewardTokens {
        RewardTokens {
            lyra: self.trading_rewards.lyra_rewards_cap,
            op: self.trading_rewards.op_rewards_cap,
        }
    }

    /// Prices rebates convert at: fixed once complete, otherwise live but never below the floor.
    pub fn effective_prices(&self) -> RewardTokens {
        let config = &self.trading_rewards;
        if self.is_complete {
            RewardTokens { lyra: config.fixed_lyra_price, op: config.fixed_op_price }
        } else {
            RewardTokens {
                lyra: self.prices.lyra.max(config.floor_token_price_lyra),
                op: self.prices.op.max(config.floor_token_price_op),
            }
        }
    }

    /// Reward tokens for `trading_fees` dollars of fees paid at a staked balance.
    pub fn trading_rewards(&self, trading_fees: f64, staked_lyra: f64) -> RewardTokens {
        let fees_rebated = self.trading_fee_rebate(staked_lyra) * trading_fees;
        self.trading_rewards.convert(fees_rebated, self.effective_prices())
    }

    /// Reward tokens for an accrued short collateral rebate in dollars.
    pub fn short_collateral_rewards(&self, short_collateral_rebate: f64) -> RewardTokens {
        self.trading_rewards.convert(short_collateral_rebate, self.effective_prices())
    }

    /// Dollar rebate per day for a short position of `contracts` options.
    pub fn short_collateral_rebate_per_day(
        &self,
        contracts: f64,
        delta: f64,
        expiry_timestamp: u64,
        market: MarketId,
    ) -> f64 {
        let config = match self.market(market).map(|m| m.short_collateral) {
            Some(ShortCollateralProgram::Configured(config)) => config,
            Some(ShortCollateralProgram::NotConfigured) | None => return 0.0,
        };
        if self.is_complete {
            return 0.0;
        }
        let time_to_expiry = expiry_timestamp.saturating_sub(self.block_timestamp);
        let discount =
            if time_to_expiry >= LONG_DATED_EXPIRY { config.long_dated_penalty } else { 1.0 };
        math::interpolate_delta_rebate(
            config.ten_delta_rebate_per_option_day,
            config.ninety_delta_rebate_per_option_day,
            delta.abs(),
            discount,
        ) * contracts
    }

    /// Reward tokens per day for a short position of `contracts` options.
    pub fn short_collateral_yield_per_day(
        &self,
        contracts: f64,
        delta: f64,
        expiry_timestamp: u64,
        market: MarketId,
    ) -> RewardTokens {
        let rebate_per_day =
            self.short_collateral_rebate_per_day(contracts, delta, expiry_timestamp, market);
        self.trading_rewards.convert(rebate_per_day, self.effective_prices())
    }
}

/// Builds a program per window. Ids follow snapshot order starting at 1; the result is sorted by
/// end timestamp.
pub fn build_programs(
    epochs: &[GlobalEpochData],
    prices: RewardTokens,
    markets: &[MarketSnapshot],
    staked_lyra_supply: f64,
    block_timestamp: u64,
) -> Vec<Arc<EpochProgram>> {
    let mut programs: Vec<Arc<EpochProgram>> = epochs
        .iter()
        .enumerate()
        .map(|(idx, epoch)| {
            Arc::new(EpochProgram::new(
                idx as u64 + 1,
                epoch,
                prices,
                markets,
                staked_lyra_supply,
                block_timestamp,
            ))
        })
        .collect();
    programs.sort_by_key(|p| p.end_timestamp);
    tracing::debug!("Built {} epoch programs", programs.len());
    programs
}

/// The first program that is not complete, or the last one if all are.
pub fn latest_program(programs: &[Arc<EpochProgram>]) -> Option<&Arc<EpochProgram>> {
    programs.iter().find(|p| !p.is_complete).or_else(|| programs.last())
}

pub fn program_by_start_timestamp(
    programs: &[Arc<EpochProgram>],
    start_timestamp: u64,
) -> Option<&Arc<EpochProgram>> {
    programs.iter().find(|p| p.start_timestamp == start_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ShortCollateralRewardConfig, VaultRewardConfig};

    const START: u64 = 1_700_000_000;
    const DURATION: u64 = 14 * SECONDS_IN_DAY;
    const END: u64 = START + DURATION;

    fn assert_close(a: f64, b: f64) {
        let tolerance = 1e-9 * a.abs().max(b.abs()).max(1.0);
        assert!((a - b).abs() <= tolerance, "{a} != {b}");
    }

    fn test_epoch() -> GlobalEpochData {
        let mut epoch = GlobalEpochData {
            start_timestamp: START,
            end_timestamp: END,
            total_stk_lyra_days: 50_000.0 * 14.0,
            ..Default::default()
        };
        epoch.staking_reward_config.total_rewards = RewardTokens::new(100_000.0, 0.0);
        epoch
            .vault_reward_config
            .insert("sETH".into(), VaultRewardConfig { x: 0.2, lyra: 50_000.0, op: 10_000.0 });
        epoch.scaled_stk_lyra_days.insert("sETH".into(), 20_000.0 * 14.0);
        epoch.total_lp_token_days.insert("sETH".into(), 1_000_000.0 * 14.0);
        epoch.total_boosted_lp_token_days.insert("sETH".into(), 400_000.0 * 14.0);
        epoch.rewarded_vault_rewards.insert("sETH".into(), RewardTokens::new(25_000.0, 5_000.0));

        let trading = &mut epoch.trading_reward_config;
        trading.use_rebate_table = true;
        trading.rebate_rate_table = vec![
            RebateTier { cutoff: 10_000.0, return_rate: 0.3 },
            RebateTier { cutoff: 0.0, return_rate: 0.1 },
            RebateTier { cutoff: 1_000.0, return_rate: 0.2 },
        ];
        trading.rebate_curve = RebateCurve {
            max_rebate_percentage: 0.4,
            net_vertical_stretch: 0.05,
            vertical_shift: 0.0,
            vert_intercept: 0.1,
            stretchiness: 500.0,
        };
        trading.rewards = TradingRewardTokenConfig {
            lyra_portion: 0.5,
            fixed_lyra_price: 0.25,
            fixed_op_price: 2.0,
            floor_token_price_lyra: 0.1,
            floor_token_price_op: 1.0,
            lyra_rewards_cap: 1_000.0,
            op_rewards_cap: 500.0,
        };
        trading.short_collat_rewards.insert(
            "sETH".into(),
            ShortCollateralRewardConfig {
                long_dated_penalty: 0.5,
                ten_delta_rebate_per_option_day: 0.2,
                ninety_delta_rebate_per_option_day: 1.0,
            },
        );
        epoch
    }

    fn test_markets() -> Vec<MarketSnapshot> {
        vec![
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
        ]
    }

    fn program_at(epoch: &GlobalEpochData, now: u64) -> EpochProgram {
        EpochProgram::new(1, epoch, RewardTokens::new(2.0, 1.5), &test_markets(), 60_000.0, now)
    }

    const ETH: MarketId = MarketId(0);
    const BTC: MarketId = MarketId(1);

    #[test]
    fn test_lifecycle_flags_are_exclusive() {
        let epoch = test_epoch();
        for now in [0, START - 1, START, START + 1, END - 1, END, END + 1, END + DURATION] {
            let program = program_at(&epoch, now);
            let states = [program.is_upcoming(), program.is_current(), program.is_complete()];
            assert_eq!(states.iter().filter(|s| **s).count(), 1, "now = {now}");
        }
        assert!(program_at(&epoch, END).is_current());
        assert!(program_at(&epoch, END + 1).is_complete());
    }

    #[test]
    fn test_progress_days() {
        let epoch = test_epoch();
        assert_eq!(program_at(&epoch, START - 100).progress_days(), 0.0);
        assert_eq!(program_at(&epoch, START).progress_days(), 0.0);
        assert_eq!(program_at(&epoch, START + 3 * SECONDS_IN_DAY).progress_days(), 3.0);
        assert_eq!(program_at(&epoch, END).progress_days(), 14.0);
        assert_eq!(program_at(&epoch, END + 10 * SECONDS_IN_DAY).progress_days(), 14.0);
        assert_eq!(program_at(&epoch, START).time_range().duration(), DURATION);

        let mut last = 0.0;
        for now in (START..=END).step_by(3_600) {
            let progress = program_at(&epoch, now).progress_days();
            assert!(progress >= last);
            last = progress;
        }
    }

    #[test]
    fn test_staking_apy_complete_epoch() {
        let program = program_at(&test_epoch(), END + 1);
        assert_close(program.total_average_staked_lyra(), 50_000.0);
        assert_close(program.total_staked_lyra(), 50_000.0);

        let apy = program.staking_apy();
        let expected = (1.0 / 2.0) / 50_000.0 * 100_000.0 / 1_209_600.0 * 2.0 * 31_536_000.0;
        assert_close(apy.lyra, expected);
        assert!((apy.lyra - 52.142857).abs() < 1e-5);
        assert_eq!(apy.op, 0.0);
        assert_close(apy.total, apy.lyra);
    }

    #[test]
    fn test_staking_apy_uses_live_supply_while_current() {
        let program = program_at(&test_epoch(), START + SECONDS_IN_DAY);
        assert_eq!(program.total_staked_lyra(), 60_000.0);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let mut epoch = test_epoch();
        epoch.end_timestamp = epoch.start_timestamp;
        let program = EpochProgram::new(1, &epoch, RewardTokens::ZERO, &test_markets(), 0.0, START);
        assert_eq!(program.duration(), 0);
        assert_eq!(program.staking_apy(), RewardApy::ZERO);
        assert_eq!(program.vault_apy(ETH, 100.0, 100.0), RewardApy::ZERO);
        assert_eq!(program.total_average_vault_tokens(ETH), 0.0);
        assert_eq!(program.total_average_staked_lyra(), 0.0);
    }

    #[test]
    fn test_vault_apy_zero_stake_matches_min() {
        let program = program_at(&test_epoch(), END + 1);
        let min = program.min_vault_apy(ETH);
        assert!(min.total > 0.0);
        for balance in [1.0, 500.0, 10_000.0, 250_000.0] {
            assert_close(program.vault_apy(ETH, 0.0, balance).total, min.total);
            assert_eq!(program.vault_apy_multiplier(ETH, 0.0, balance), 1.0);
        }
    }

    #[test]
    fn test_vault_apy_multiplier_non_decreasing() {
        let program = program_at(&test_epoch(), START + 7 * SECONDS_IN_DAY);
        let balance = 10_000.0;
        let mut last = 1.0;
        for stake in (0..=50).map(|i| i as f64 * 50.0) {
            let multiplier = program.vault_apy_multiplier(ETH, stake, balance);
            assert!(multiplier >= last, "stake = {stake}");
            last = multiplier;
        }
        assert!(last > 1.0);
    }

    #[test]
    fn test_vault_max_boost_reaches_cap() {
        let program = program_at(&test_epoch(), END + 1);
        let balance = 10_000.0;
        let stake = program.vault_max_boost(ETH, balance);
        assert_close(stake, 10_000.0 * 20_000.0 / 1_000_000.0);
        assert_close(program.vault_apy_multiplier(ETH, stake, balance), 5.0);
        assert_close(program.max_boost_multiplier(ETH), 5.0);
        // Staking beyond the minimum does not boost further.
        assert_close(program.vault_apy_multiplier(ETH, stake * 10.0, balance), 5.0);
    }

    #[test]
    fn test_pending_deposits_dilute_vault_apy() {
        let epoch = test_epoch();
        let without = program_at(&epoch, END + 1).min_vault_apy(ETH);

        let mut markets = test_markets();
        markets[0].pending_deposits = 1_000_000.0;
        let program =
            EpochProgram::new(1, &epoch, RewardTokens::new(2.0, 1.5), &markets, 60_000.0, END + 1);
        let with = program.min_vault_apy(ETH);
        assert_close(with.total * 2.0, without.total);
    }

    #[test]
    fn test_unconfigured_market_is_zero() {
        let program = program_at(&test_epoch(), START + SECONDS_IN_DAY);
        assert_eq!(program.vault_apy(BTC, 1_000.0, 1_000.0), RewardApy::ZERO);
        assert_eq!(program.max_vault_apy(BTC), RewardApy::ZERO);
        assert_eq!(program.max_boost_multiplier(BTC), 0.0);
        assert_eq!(program.vault_apy_multiplier(BTC, 1_000.0, 1_000.0), 1.0);
        assert_eq!(program.total_vault_rewards(BTC), RewardTokens::ZERO);
        assert_eq!(
            program.short_collateral_yield_per_day(10.0, 0.5, START, BTC),
            RewardTokens::ZERO
        );
        assert_eq!(program.vault_apy(MarketId(7), 1_000.0, 1_000.0), RewardApy::ZERO);
    }

    #[test]
    fn test_zero_x_vault_reports_agree() {
        let mut epoch = test_epoch();
        epoch.vault_reward_config.get_mut("sETH").unwrap().x = 0.0;
        let program = program_at(&epoch, END + 1);
        let stake = program.vault_max_boost(ETH, 100.0);
        assert_eq!(program.max_boost_multiplier(ETH), 0.0);
        assert_eq!(program.vault_apy(ETH, 0.0, 100.0), RewardApy::ZERO);
        assert_eq!(program.vault_apy(ETH, stake, 100.0), RewardApy::ZERO);
        assert_eq!(program.max_vault_apy(ETH), RewardApy::ZERO);
        assert_eq!(program.vault_apy_multiplier(ETH, stake, 100.0), 1.0);
    }

    #[test]
    fn test_market_lookup() {
        let program = program_at(&test_epoch(), START);
        assert_eq!(program.market_by_symbol("sBTC"), Some(BTC));
        assert_eq!(program.market_by_address(Address::repeat_byte(1)), Some(ETH));
        assert_eq!(program.market_by_symbol("sLINK"), None);
        assert_eq!(program.total_vault_rewards(ETH), RewardTokens::new(25_000.0, 5_000.0));
    }

    #[test]
    fn test_trading_fee_rebate_table() {
        let program = program_at(&test_epoch(), START);
        assert_eq!(program.trading_fee_rebate(0.0), 0.1);
        assert_eq!(program.trading_fee_rebate(1_500.0), 0.2);
        assert_eq!(program.trading_fee_rebate(10_000.0), 0.3);
        assert_eq!(program.min_trading_fee_rebate(), 0.1);
        assert_eq!(program.max_trading_fee_rebate(), 0.3);
        assert!(matches!(
            program.rebate_schedule(),
            RebateSchedule::Table(tiers) if tiers.first().map(|t| t.cutoff) == Some(0.0)
        ));
    }

    #[test]
    fn test_trading_fee_rebate_non_decreasing_in_both_modes() {
        let table = test_epoch();
        let mut curve = test_epoch();
        curve.trading_reward_config.use_rebate_table = false;

        for epoch in [table, curve] {
            let program = program_at(&epoch, START);
            let mut last = 0.0;
            for stake in (0..200).map(|i| i as f64 * 137.0) {
                let rebate = program.trading_fee_rebate(stake);
                assert!(rebate >= last, "stake = {stake}");
                assert!(rebate <= 0.4);
                last = rebate;
            }
        }
    }

    #[test]
    fn test_trading_rewards_prices() {
        let epoch = test_epoch();

        // Live LYRA price above its floor, OP below.
        let mut current = program_at(&epoch, START + SECONDS_IN_DAY);
        current.prices = RewardTokens::new(2.0, 0.5);
        assert_eq!(current.effective_prices(), RewardTokens::new(2.0, 1.0));
        let rewards = current.trading_rewards(1_000.0, 0.0);
        assert_close(rewards.lyra, 1_000.0 * 0.1 * 0.5 / 2.0);
        assert_close(rewards.op, 1_000.0 * 0.1 * 0.5 / 1.0);

        let complete = program_at(&epoch, END + 1);
        assert_eq!(complete.effective_prices(), RewardTokens::new(0.25, 2.0));
        let rewards = complete.short_collateral_rewards(100.0);
        assert_close(rewards.lyra, 200.0);
        assert_close(rewards.op, 25.0);
        assert_eq!(complete.trading_rewards_cap(), RewardTokens::new(1_000.0, 500.0));
    }

    #[test]
    fn test_short_collateral_yield() {
        let epoch = test_epoch();
        let now = START + SECONDS_IN_DAY;
        let program = program_at(&epoch, now);
        let near = now + SECONDS_IN_WEEK;
        let far = now + 4 * SECONDS_IN_WEEK;

        assert_eq!(program.short_collateral_rebate_per_day(1.0, 0.05, near, ETH), 0.0);
        assert_eq!(program.short_collateral_rebate_per_day(1.0, -0.95, near, ETH), 0.0);
        assert_close(program.short_collateral_rebate_per_day(1.0, 0.1, near, ETH), 0.2);
        assert_close(program.short_collateral_rebate_per_day(1.0, -0.9, near, ETH), 1.0);
        assert_close(program.short_collateral_rebate_per_day(1.0, 0.5, near, ETH), 0.6);
        assert_close(program.short_collateral_rebate_per_day(1.0, 0.5, far, ETH), 0.4);
        assert_close(program.short_collateral_rebate_per_day(10.0, 0.5, near, ETH), 6.0);

        for delta in (10..=90).map(|d| d as f64 / 100.0) {
            for expiry in [near, far] {
                let rate = program.short_collateral_rebate_per_day(1.0, delta, expiry, ETH);
                assert!((0.2 - 1e-12..=1.0 + 1e-12).contains(&rate));
            }
        }

        let tokens = program.short_collateral_yield_per_day(10.0, 0.5, near, ETH);
        assert_close(tokens.lyra, 6.0 * 0.5 / 2.0);
        assert_close(tokens.op, 6.0 * 0.5 / 1.5);

        let complete = program_at(&epoch, END + 1);
        assert_eq!(
            complete.short_collateral_yield_per_day(10.0, 0.5, near, ETH),
            RewardTokens::ZERO
        );
    }

    #[test]
    fn test_weth_lyra_staking_and_staking_totals() {
        let mut epoch = test_epoch();
        epoch.weth_lyra_staking_reward_config = Some(crate::config::WethLyraStakingRewardConfig {
            total_rewards: RewardTokens::new(3.0, 4_000.0),
        });
        let program = program_at(&epoch, START);
        assert_eq!(program.weth_lyra_staking(), RewardTokens::new(0.0, 4_000.0));
        assert_eq!(program.total_staking_rewards(), RewardTokens::new(100_000.0, 0.0));
        assert_eq!(program_at(&test_epoch(), START).weth_lyra_staking(), RewardTokens::ZERO);
    }

    #[test]
    fn test_build_programs_sorting_and_latest() {
        let first = test_epoch();
        let mut second = test_epoch();
        second.start_timestamp = END;
        second.end_timestamp = END + DURATION;

        let programs = build_programs(
            &[second.clone(), first.clone()],
            RewardTokens::new(1.0, 1.0),
            &test_markets(),
            0.0,
            END + 10,
        );
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].start_timestamp(), START);
        assert_eq!(programs[0].id(), 2);
        assert_eq!(programs[1].id(), 1);
        assert_eq!(latest_program(&programs).map(|p| p.id()), Some(1));
        assert_eq!(program_by_start_timestamp(&programs, START).map(|p| p.id()), Some(2));
        assert!(program_by_start_timestamp(&programs, 42).is_none());

        let finished =
            build_programs(&[first, second], RewardTokens::ZERO, &[], 0.0, END + 2 * DURATION);
        assert_eq!(latest_program(&finished).map(|p| p.start_timestamp()), Some(END));
        assert!(latest_program(&[]).is_none());
    }
}
