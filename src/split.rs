use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::CONFIG;
use crate::error::LedgerError;
use crate::models::SplitKind;
use crate::money::Money;

/// How an expense amount is divided between participants.
///
/// The calculator assigns rounding remainders by position, so the participant
/// order inside a spec is part of the contract. [`SplitSpec::canonicalized`]
/// sorts participants ascending by user id; the service applies it before both
/// preview and commit so recomputation always reproduces the same shares.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitSpec {
    Equal { participants: Vec<Uuid> },
    Exact { shares: Vec<ExactShare> },
    Percentage { shares: Vec<PercentShare> },
    Weighted { shares: Vec<WeightedShare> },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExactShare {
    pub user_id: Uuid,
    pub amount: Money,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PercentShare {
    pub user_id: Uuid,
    pub percent: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightedShare {
    pub user_id: Uuid,
    pub weight: f64,
}

/// One computed share, before it is attached to an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitShare {
    pub user_id: Uuid,
    pub amount: Money,
}

impl SplitSpec {
    pub fn kind(&self) -> SplitKind {
        match self {
            SplitSpec::Equal { .. } => SplitKind::Equal,
            SplitSpec::Exact { .. } => SplitKind::Exact,
            SplitSpec::Percentage { .. } => SplitKind::Percentage,
            SplitSpec::Weighted { .. } => SplitKind::Weighted,
        }
    }

    pub fn participants(&self) -> Vec<Uuid> {
        match self {
            SplitSpec::Equal { participants } => participants.clone(),
            SplitSpec::Exact { shares } => shares.iter().map(|s| s.user_id).collect(),
            SplitSpec::Percentage { shares } => shares.iter().map(|s| s.user_id).collect(),
            SplitSpec::Weighted { shares } => shares.iter().map(|s| s.user_id).collect(),
        }
    }

    /// Sorts participants ascending by user id, fixing the remainder
    /// assignment order independently of how the caller listed them.
    pub fn canonicalized(mut self) -> SplitSpec {
        match &mut self {
            SplitSpec::Equal { participants } => participants.sort_unstable(),
            SplitSpec::Exact { shares } => shares.sort_by_key(|s| s.user_id),
            SplitSpec::Percentage { shares } => shares.sort_by_key(|s| s.user_id),
            SplitSpec::Weighted { shares } => shares.sort_by_key(|s| s.user_id),
        }
        self
    }
}

/// Computes per-participant owed amounts for `total` under `spec`.
///
/// The output always sums exactly to `total`, for every kind and participant
/// count; participants owed nothing are absent from the output. Remainder
/// minor units go to the earliest participants (equal kind) or to the largest
/// fractional remainders, ties broken by position (percentage and weighted
/// kinds).
pub fn compute_splits(total: Money, spec: &SplitSpec) -> Result<Vec<SplitShare>, LedgerError> {
    if !total.is_positive() {
        return Err(LedgerError::InvalidAmount);
    }
    let participants = spec.participants();
    if participants.is_empty() {
        return Err(LedgerError::InvalidSplitSpec(
            "no participants".to_string(),
        ));
    }
    if participants.len() > CONFIG.max_participants {
        return Err(LedgerError::InvalidSplitSpec(format!(
            "too many participants ({}, limit {})",
            participants.len(),
            CONFIG.max_participants
        )));
    }
    let mut seen = HashSet::new();
    for user_id in &participants {
        if !seen.insert(*user_id) {
            return Err(LedgerError::InvalidSplitSpec(format!(
                "duplicate participant {user_id}"
            )));
        }
    }

    let shares = match spec {
        SplitSpec::Equal { participants } => equal_shares(total, participants),
        SplitSpec::Exact { shares } => exact_shares(total, shares)?,
        SplitSpec::Percentage { shares } => percentage_shares(total, shares)?,
        SplitSpec::Weighted { shares } => weighted_shares(total, shares)?,
    };

    debug_assert_eq!(
        shares.iter().map(|s| s.amount.minor()).sum::<i64>(),
        total.minor()
    );
    debug!(total = %total, count = shares.len(), "computed splits");
    Ok(shares)
}

fn equal_shares(total: Money, participants: &[Uuid]) -> Vec<SplitShare> {
    let n = participants.len() as i64;
    let base = total.minor() / n;
    let remainder = total.minor() - base * n;

    participants
        .iter()
        .enumerate()
        .filter_map(|(i, &user_id)| {
            let minor = base + i64::from((i as i64) < remainder);
            (minor > 0).then(|| SplitShare {
                user_id,
                amount: Money::new(minor, total.currency()),
            })
        })
        .collect()
}

fn exact_shares(total: Money, shares: &[ExactShare]) -> Result<Vec<SplitShare>, LedgerError> {
    let mut sum = Money::zero(total.currency());
    for share in shares {
        if share.amount.is_negative() {
            return Err(LedgerError::InvalidSplitSpec(format!(
                "negative share for {}",
                share.user_id
            )));
        }
        sum = sum.checked_add(share.amount)?;
    }
    if sum != total {
        return Err(LedgerError::InvalidSplitSpec(format!(
            "shares sum to {sum}, expense amount is {total}"
        )));
    }
    Ok(shares
        .iter()
        .filter(|s| s.amount.is_positive())
        .map(|s| SplitShare {
            user_id: s.user_id,
            amount: s.amount,
        })
        .collect())
}

fn percentage_shares(
    total: Money,
    shares: &[PercentShare],
) -> Result<Vec<SplitShare>, LedgerError> {
    let pct_sum: f64 = shares.iter().map(|s| s.percent).sum();
    if !pct_sum.is_finite() || (pct_sum - 100.0).abs() > CONFIG.percent_tolerance {
        return Err(LedgerError::InvalidSplitSpec(format!(
            "percentages sum to {pct_sum}, expected 100"
        )));
    }
    let weighted: Vec<(Uuid, f64)> = shares.iter().map(|s| (s.user_id, s.percent)).collect();
    distribute(total, &weighted)
}

fn weighted_shares(total: Money, shares: &[WeightedShare]) -> Result<Vec<SplitShare>, LedgerError> {
    let weighted: Vec<(Uuid, f64)> = shares.iter().map(|s| (s.user_id, s.weight)).collect();
    distribute(total, &weighted)
}

/// Largest-remainder apportionment of `total` over non-negative weights.
///
/// Base shares are floored; leftover minor units go one at a time to the
/// entries with the largest fractional remainder, ties broken by position.
/// The result sums to `total` exactly regardless of float noise in the
/// intermediate products.
fn distribute(total: Money, entries: &[(Uuid, f64)]) -> Result<Vec<SplitShare>, LedgerError> {
    let mut weight_sum = 0.0;
    for (user_id, weight) in entries {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(LedgerError::InvalidSplitSpec(format!(
                "invalid weight {weight} for {user_id}"
            )));
        }
        weight_sum += weight;
    }
    if weight_sum <= 0.0 {
        return Err(LedgerError::InvalidSplitSpec(
            "weights sum to zero".to_string(),
        ));
    }

    let mut minors = Vec::with_capacity(entries.len());
    let mut fractions = Vec::with_capacity(entries.len());
    for (i, (_, weight)) in entries.iter().enumerate() {
        let raw = total.minor() as f64 * weight / weight_sum;
        let base = raw.floor() as i64;
        minors.push(base);
        fractions.push((raw - base as f64, i));
    }
    fractions.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut leftover = total.minor() - minors.iter().sum::<i64>();
    while leftover > 0 {
        for &(_, i) in &fractions {
            if leftover == 0 {
                break;
            }
            minors[i] += 1;
            leftover -= 1;
        }
    }
    // Float noise can in principle push the floored sum past the total; take
    // the excess back from the smallest remainders.
    while leftover < 0 {
        for &(_, i) in fractions.iter().rev() {
            if leftover == 0 {
                break;
            }
            if minors[i] > 0 {
                minors[i] -= 1;
                leftover += 1;
            }
        }
    }

    Ok(entries
        .iter()
        .zip(&minors)
        .filter(|&(_, &minor)| minor > 0)
        .map(|((user_id, _), &minor)| SplitShare {
            user_id: *user_id,
            amount: Money::new(minor, total.currency()),
        })
        .collect())
}
