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

//! Numeric helpers shared by the program and account computations.
//!
//! All functions are total: a zero or negative denominator yields zero instead of NaN or infinity.

use crate::config::RebateTier;

/// Lowest absolute delta that earns a short collateral rebate.
pub const MIN_REBATE_DELTA: f64 = 0.1;
/// Highest absolute delta that earns a short collateral rebate.
pub const MAX_REBATE_DELTA: f64 = 0.9;

/// Divides, returning zero when the denominator is not positive.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Seconds elapsed within `[start, end]` at `now`, clamped into `[0, end - start]`.
pub fn progress_seconds(start: u64, end: u64, now: u64) -> u64 {
    let duration = end.saturating_sub(start);
    let remaining = end.saturating_sub(now);
    duration.saturating_sub(remaining)
}

/// Converts a time integrated balance into an average balance over `progress_days`.
pub fn time_weighted_average(token_days: f64, progress_days: f64) -> f64 {
    safe_div(token_days, progress_days)
}

/// Boost adjusted liquidity token balance.
///
/// An unstaked provider keeps an `x` share of its balance. Staking LYRA in proportion to the
/// provider's share of the vault restores the balance up to the full raw amount, which is the cap.
pub fn effective_liquidity_tokens(
    lp_tokens: f64,
    total_lp_tokens: f64,
    staked_lyra: f64,
    total_staked_lyra: f64,
    x: f64,
) -> f64 {
    let x = x.clamp(0.0, 1.0);
    let boost = safe_div((1.0 - x) * staked_lyra.max(0.0) * total_lp_tokens, total_staked_lyra);
    (x * lp_tokens + boost).min(lp_tokens)
}

/// Smallest staked balance at which [effective_liquidity_tokens] reaches its cap.
pub fn minimum_staked_for_max_boost(
    total_staked_lyra: f64,
    lp_tokens: f64,
    total_lp_tokens: f64,
) -> f64 {
    safe_div(lp_tokens * total_staked_lyra, total_lp_tokens)
}

/// Step lookup into an ascending rebate table: the rebate of the highest cutoff not above
/// `staked_lyra`, or zero below the first cutoff.
pub fn rebate_from_table(tiers: &[RebateTier], staked_lyra: f64) -> f64 {
    tiers
        .iter()
        .take_while(|tier| tier.cutoff <= staked_lyra)
        .last()
        .map(|tier| tier.return_rate)
        .unwrap_or(0.0)
}

/// Linear interpolation of a per option day rebate between the 10 and 90 delta rates.
///
/// `discount` scales only the increment above the 10 delta rate. Returns zero outside
/// `[MIN_REBATE_DELTA, MAX_REBATE_DELTA]`.
pub fn interpolate_delta_rebate(
    ten_delta_rate: f64,
    ninety_delta_rate: f64,
    abs_delta: f64,
    discount: f64,
) -> f64 {
    if !(MIN_REBATE_DELTA..=MAX_REBATE_DELTA).contains(&abs_delta) {
        return 0.0;
    }
    let fraction = (abs_delta - MIN_REBATE_DELTA) / (MAX_REBATE_DELTA - MIN_REBATE_DELTA);
    ten_delta_rate + (ninety_delta_rate - ten_delta_rate) * fraction * discount
}
