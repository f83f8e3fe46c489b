//! Two-leg arbitrage stake allocation.
//!
//! Each leg is staked in proportion to its implied probability:
//!   p_i     = 1 / odds_i
//!   stake_i = total · p_i / (p1 + p2)
//! which makes `stake1 · odds1 == stake2 · odds2`, i.e. the payout is the
//! same whichever leg wins.  The two stakes always sum to `total`; profit is
//! the payout minus `total`, not extra capital.
use serde::Serialize;
use thiserror::Error;

use crate::db::models::Opportunity;

/// How a total stake splits across the two legs of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StakePlan {
    pub total_stake: f64,
    pub stake1: f64,
    pub stake2: f64,
    /// Payout if either leg wins
    pub expected_return: f64,
    pub profit: f64,
    pub roi_percent: f64,
}

/// A record whose odds can't be fed to the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DataError {
    #[error("missing odds on leg {leg}")]
    MissingOdds { leg: u8 },
    #[error("invalid odds {value} on leg {leg}")]
    InvalidOdds { leg: u8, value: f64 },
}

/// Split `total_stake` across two legs so both pay out the same amount.
///
/// Pure and unchecked: odds ≤ 0 propagate NaN/inf.  When `1/odds1 + 1/odds2
/// >= 1` the split is still consistent, just with a non-positive profit.
pub fn allocate(odds1: f64, odds2: f64, total_stake: f64) -> StakePlan {
    let prob1 = 1.0 / odds1;
    let prob2 = 1.0 / odds2;
    let total_prob = prob1 + prob2;

    let stake1 = prob1 / total_prob * total_stake;
    let stake2 = prob2 / total_prob * total_stake;

    let expected_return = stake1 * odds1;
    let profit = expected_return - total_stake;
    let roi_percent = profit / total_stake * 100.0;

    StakePlan {
        total_stake,
        stake1,
        stake2,
        expected_return,
        profit,
        roi_percent,
    }
}

fn checked_odds(leg: u8, odds: Option<f64>) -> Result<f64, DataError> {
    match odds {
        None => Err(DataError::MissingOdds { leg }),
        Some(value) if !value.is_finite() || value <= 0.0 => {
            Err(DataError::InvalidOdds { leg, value })
        }
        Some(value) => Ok(value),
    }
}

impl Opportunity {
    /// Allocate `total_stake` across this opportunity's legs, rejecting
    /// records whose odds would turn the plan into NaN.
    pub fn stake_plan(&self, total_stake: f64) -> Result<StakePlan, DataError> {
        let odds1 = checked_odds(1, self.odds1)?;
        let odds2 = checked_odds(2, self.odds2)?;
        Ok(allocate(odds1, odds2, total_stake))
    }
}
