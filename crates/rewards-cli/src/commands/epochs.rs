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

use super::{resolve_market, select_program};
use crate::{
    config::GlobalConfig,
    report::{print_json, EpochReport},
    snapshot::GlobalSnapshot,
};

/// Command to list every reward epoch.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct EpochsCmd {
    /// Only report this market, by vault address or base symbol.
    #[clap(long)]
    pub market: Option<String>,
}

impl EpochsCmd {
    /// Run the [EpochsCmd] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let snapshot = GlobalSnapshot::load(global_config.require_global_snapshot()?).await?;
        let programs = snapshot.programs(global_config.now);

        let reports = programs
            .iter()
            .map(|program| -> Result<EpochReport> {
                let markets = match &self.market {
                    Some(key) => Some(vec![resolve_market(program, key)?]),
                    None => None,
                };
                Ok(EpochReport::new(program, markets.as_deref()))
            })
            .collect::<Result<Vec<_>>>()?;

        if global_config.json {
            return print_json(&reports);
        }
        tracing::info!("Epochs: {}", reports.len());
        for report in &reports {
            report.log();
        }
        Ok(())
    }
}

/// Command to show a single reward epoch.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct EpochCmd {
    /// Start timestamp of the epoch. Defaults to the latest epoch.
    #[clap(long)]
    pub start_timestamp: Option<u64>,
    /// Only report this market, by vault address or base symbol.
    #[clap(long)]
    pub market: Option<String>,
}

impl EpochCmd {
    /// Run the [EpochCmd] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let snapshot = GlobalSnapshot::load(global_config.require_global_snapshot()?).await?;
        let programs = snapshot.programs(global_config.now);
        let program = select_program(&programs, self.start_timestamp)?;

        let markets = match &self.market {
            Some(key) => Some(vec![resolve_market(&program, key)?]),
            None => None,
        };
        let report = EpochReport::new(&program, markets.as_deref());

        if global_config.json {
            return print_json(&report);
        }
        report.log();
        Ok(())
    }
}
