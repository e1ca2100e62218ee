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

//! Common configuration options for commands in the rewards CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

/// Common configuration options for all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// Path to the global rewards snapshot (JSON)
    #[clap(long, env = "GLOBAL_SNAPSHOT", global = true)]
    pub global_snapshot: Option<PathBuf>,

    /// Evaluation timestamp in unix seconds. Defaults to the snapshot's block timestamp.
    #[clap(long, env = "EVALUATION_TIMESTAMP", global = true)]
    pub now: Option<u64>,

    /// Whether to log in JSON format.
    #[clap(long, env = "LOG_JSON", global = true, default_value_t = false)]
    pub log_json: bool,

    /// Print reports as JSON on stdout. Logs move to stderr.
    #[clap(long, global = true, default_value_t = false)]
    pub json: bool,
}

impl GlobalConfig {
    /// Access [Self::global_snapshot] or return an error that can be shown to the user.
    pub fn require_global_snapshot(&self) -> Result<&Path> {
        self.global_snapshot.as_deref().context(
            "Global snapshot not provided; please set --global-snapshot or the GLOBAL_SNAPSHOT env var",
        )
    }
}
