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

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use lyra_rewards::RewardTokens;

use super::resolve_market;
use crate::{
    config::GlobalConfig,
    report::{print_json, PositionReport},
    snapshot::load_snapshots,
};

/// Command to show an account's reward positions.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct AccountCmd {
    /// Path to the account snapshot (JSON)
    #[clap(long, env = "ACCOUNT_SNAPSHOT")]
    pub account_snapshot: PathBuf,
    /// Only report this market's vault, by vault address or base symbol.
    #[clap(long)]
    pub market: Option<String>,
    /// Only report epochs with rewards still pending.
    #[clap(long, default_value_t = false)]
    pub pending_only: bool,
}

impl AccountCmd {
    /// Run the [AccountCmd] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let (global, account) =
            load_snapshots(global_config.require_global_snapshot()?, &self.account_snapshot)
                .await?;
        let programs = global.programs(global_config.now);
        let positions = account.positions(&programs)?;

        let reports = positions
            .iter()
            .filter(|p| !self.pending_only || p.is_pending_rewards())
            .map(|position| -> Result<PositionReport> {
                let markets = match &self.market {
                    Some(key) => Some(vec![resolve_market(position.program(), key)?]),
                    None => None,
                };
                Ok(PositionReport::new(position, markets.as_deref()))
            })
            .collect::<Result<Vec<_>>>()?;

        if global_config.json {
            return print_json(&reports);
        }

        let pending = reports.iter().filter(|r| r.is_pending_rewards).count();
        let total_vault_rewards =
            reports.iter().fold(RewardTokens::ZERO, |sum, r| sum + r.total_vault_rewards);
        tracing::info!(
            "Account {}: {} epochs, {} with pending rewards",
            account.address,
            reports.len(),
            pending
        );
        for report in &reports {
            report.log();
        }
        if !total_vault_rewards.is_zero() {
            tracing::info!(
                "Vault rewards across epochs: {:.4} LYRA, {:.4} OP",
                total_vault_rewards.lyra,
                total_vault_rewards.op
            );
        }
        Ok(())
    }
}
