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

use anyhow::Result;
use clap::Args;
use lyra_rewards::{RewardToken, RewardTokens};
use serde::Serialize;

use super::{resolve_market, select_program};
use crate::{
    config::GlobalConfig,
    report::{format_timestamp, print_json},
    snapshot::GlobalSnapshot,
};

/// Command to estimate the short collateral rebate of an option position.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct ShortYieldCmd {
    /// Market of the option, by vault address or base symbol.
    #[clap(long)]
    pub market: String,
    /// Number of option contracts held short.
    #[clap(long)]
    pub contracts: f64,
    /// Option delta. The sign is ignored.
    #[clap(long, allow_negative_numbers = true)]
    pub delta: f64,
    /// Option expiry as a unix timestamp.
    #[clap(long)]
    pub expiry: u64,
    /// Start timestamp of the epoch. Defaults to the latest epoch.
    #[clap(long)]
    pub start_timestamp: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShortYieldReport {
    epoch_id: u64,
    base_symbol: String,
    rebate_per_day: f64,
    yield_per_day: RewardTokens,
}

impl ShortYieldCmd {
    /// Run the [ShortYieldCmd] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let snapshot = GlobalSnapshot::load(global_config.require_global_snapshot()?).await?;
        let programs = snapshot.programs(global_config.now);
        let program = select_program(&programs, self.start_timestamp)?;
        let market = resolve_market(&program, &self.market)?;

        let rebate_per_day =
            program.short_collateral_rebate_per_day(self.contracts, self.delta, self.expiry, market);
        let yield_per_day =
            program.short_collateral_yield_per_day(self.contracts, self.delta, self.expiry, market);
        let report = ShortYieldReport {
            epoch_id: program.id(),
            base_symbol: program.market(market).map(|m| m.base_symbol.clone()).unwrap_or_default(),
            rebate_per_day,
            yield_per_day,
        };

        if global_config.json {
            return print_json(&report);
        }
        tracing::info!(
            "Short {} {} contracts, delta {}, expiring {} in epoch {}",
            self.contracts,
            report.base_symbol,
            self.delta,
            format_timestamp(self.expiry),
            report.epoch_id
        );
        tracing::info!("Rebate per day: ${:.4}", report.rebate_per_day);
        for token in [RewardToken::Lyra, RewardToken::Op] {
            tracing::info!("Yield per day: {:.6} {}", yield_per_day.get(token), token);
        }
        Ok(())
    }
}
