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

//! Commands of the rewards CLI.

mod account;
mod epochs;
mod short_yield;

pub use account::AccountCmd;
pub use epochs::{EpochCmd, EpochsCmd};
pub use short_yield::ShortYieldCmd;

use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use lyra_rewards::{program_by_start_timestamp, EpochProgram, MarketId};

use crate::config::GlobalConfig;

/// Commands of the rewards CLI.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// List every reward epoch in the snapshot.
    Epochs(EpochsCmd),
    /// Show one reward epoch, the latest by default.
    Epoch(EpochCmd),
    /// Show an account's position in every epoch it participated in.
    Account(AccountCmd),
    /// Estimate the daily short collateral rebate of an option position.
    ShortYield(ShortYieldCmd),
}

impl Command {
    /// Run the command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        match self {
            Self::Epochs(cmd) => cmd.run(global_config).await,
            Self::Epoch(cmd) => cmd.run(global_config).await,
            Self::Account(cmd) => cmd.run(global_config).await,
            Self::ShortYield(cmd) => cmd.run(global_config).await,
        }
    }
}

/// Resolves a market key, either a vault address or a base symbol, within a program.
///
/// Fails when the key matches no market or more than one.
pub(crate) fn resolve_market(program: &EpochProgram, key: &str) -> Result<MarketId> {
    let address = key.parse::<Address>().ok();
    let matches: Vec<MarketId> = program
        .markets()
        .iter()
        .filter(|m| match address {
            Some(address) => m.address == address,
            None => m.base_symbol == key,
        })
        .map(|m| m.id)
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("unknown market {key} in epoch {}", program.id()),
        _ => bail!("ambiguous market {key} in epoch {}: {} matches", program.id(), matches.len()),
    }
}

/// The program starting at `start_timestamp`, or the latest one.
pub(crate) fn select_program(
    programs: &[Arc<EpochProgram>],
    start_timestamp: Option<u64>,
) -> Result<Arc<EpochProgram>> {
    let program = match start_timestamp {
        Some(start) => program_by_start_timestamp(programs, start)
            .with_context(|| format!("no epoch starts at {start}"))?,
        None => lyra_rewards::latest_program(programs).context("snapshot contains no epochs")?,
    };
    Ok(Arc::clone(program))
}
