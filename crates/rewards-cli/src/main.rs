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

mod commands;
mod config;
mod report;
mod snapshot;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::{commands::Command, config::GlobalConfig};

/// Evaluates reward epochs and account positions from pre-fetched snapshots.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    #[clap(subcommand)]
    command: Command,

    #[clap(flatten)]
    config: GlobalConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = MainArgs::parse();
    init_tracing(&args.config);

    args.command.run(&args.config).await
}

fn init_tracing(config: &GlobalConfig) {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    // Reports own stdout when printed as JSON
    let writer = if config.json {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    if config.log_json {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_ansi(false).with_writer(writer).with_env_filter(filter).init();
    }
}
