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

//! Claim events recorded by the reward distributor.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const VAULT_TAG_PREFIX: &str = "MMV-";

/// Error parsing a claim's token or tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimParseError {
    #[error("unknown reward token {0}")]
    UnknownToken(String),
    #[error("unknown claim tag {0}")]
    UnknownTag(String),
}

/// One of the two reward tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RewardToken {
    Lyra,
    Op,
}

impl FromStr for RewardToken {
    type Err = ClaimParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LYRA" => Ok(RewardToken::Lyra),
            "OP" => Ok(RewardToken::Op),
            other => Err(ClaimParseError::UnknownToken(other.to_string())),
        }
    }
}

impl fmt::Display for RewardToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardToken::Lyra => f.write_str("LYRA"),
            RewardToken::Op => f.write_str("OP"),
        }
    }
}

/// Reward stream a claim was recorded for.
///
/// Tags are `TRADING`, `STAKING` and `MMV-<base symbol>` for a market's vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RewardStream {
    Trading,
    Staking,
    Vault(String),
}

impl FromStr for RewardStream {
    type Err = ClaimParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRADING" => Ok(RewardStream::Trading),
            "STAKING" => Ok(RewardStream::Staking),
            other => match other.strip_prefix(VAULT_TAG_PREFIX) {
                Some(symbol) if !symbol.is_empty() => Ok(RewardStream::Vault(symbol.to_string())),
                _ => Err(ClaimParseError::UnknownTag(other.to_string())),
            },
        }
    }
}

impl TryFrom<String> for RewardStream {
    type Error = ClaimParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RewardStream> for String {
    fn from(stream: RewardStream) -> Self {
        stream.to_string()
    }
}

impl fmt::Display for RewardStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardStream::Trading => f.write_str("TRADING"),
            RewardStream::Staking => f.write_str("STAKING"),
            RewardStream::Vault(symbol) => write!(f, "{VAULT_TAG_PREFIX}{symbol}"),
        }
    }
}

/// A claim added on chain for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEvent {
    /// Start timestamp of the window the claim belongs to
    pub epoch_timestamp: u64,
    pub token: RewardToken,
    #[serde(rename = "tag")]
    pub stream: RewardStream,
}

/// Which (stream, token) pairs already have a recorded claim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimTags {
    claimed: HashMap<RewardStream, TokenFlags>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TokenFlags {
    lyra: bool,
    op: bool,
}

impl ClaimTags {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ClaimEvent>) -> Self {
        let mut claimed: HashMap<RewardStream, TokenFlags> = HashMap::new();
        for event in events {
            let flags = claimed.entry(event.stream.clone()).or_default();
            match event.token {
                RewardToken::Lyra => flags.lyra = true,
                RewardToken::Op => flags.op = true,
            }
        }
        Self { claimed }
    }

    pub fn is_claimed(&self, stream: &RewardStream, token: RewardToken) -> bool {
        self.claimed.get(stream).is_some_and(|flags| match token {
            RewardToken::Lyra => flags.lyra,
            RewardToken::Op => flags.op,
        })
    }
}
