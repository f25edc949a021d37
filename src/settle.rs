//! Greedy debt simplification.
//!
//! Repeatedly matches the largest outstanding debtor with the largest
//! outstanding creditor and settles the smaller of the two magnitudes. This
//! does not guarantee the theoretical minimum number of transfers in every
//! topology, but it is deterministic and never needs more than
//! `creditors + debtors - 1` payments: each round zeroes at least one party.

use tracing::error;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{GroupBalances, SuggestedPayment};
use crate::money::Money;

/// Produces an ordered payment plan that zeroes every balance.
///
/// Balances must conserve to zero; a non-zero residual means corrupted
/// history or an aggregation bug, and surfaces as
/// [`LedgerError::BalanceInconsistency`] rather than a partial plan. No
/// suggested amount ever overshoots either party's remaining balance.
pub fn suggest(balances: &GroupBalances) -> Result<Vec<SuggestedPayment>, LedgerError> {
    let Some(first) = balances.values().next() else {
        return Ok(Vec::new());
    };
    let currency = first.currency();

    let mut residual = 0i64;
    for amount in balances.values() {
        // Re-adding through Money keeps the currency check in one place
        residual = Money::new(residual, currency)
            .checked_add(*amount)?
            .minor();
    }
    if residual != 0 {
        error!(residual, "balance conservation violated before suggestion");
        return Err(LedgerError::BalanceInconsistency(residual));
    }

    let mut creditors: Vec<(Uuid, i64)> = balances
        .iter()
        .filter(|(_, m)| m.is_positive())
        .map(|(&u, m)| (u, m.minor()))
        .collect();
    let mut debtors: Vec<(Uuid, i64)> = balances
        .iter()
        .filter(|(_, m)| m.is_negative())
        .map(|(&u, m)| (u, -m.minor()))
        .collect();

    let bound = creditors.len() + debtors.len();
    let mut plan = Vec::new();

    while !debtors.is_empty() && !creditors.is_empty() {
        let di = largest(&debtors);
        let ci = largest(&creditors);
        let settled = debtors[di].1.min(creditors[ci].1);

        plan.push(SuggestedPayment {
            payer_id: debtors[di].0,
            payee_id: creditors[ci].0,
            amount: Money::new(settled, currency),
        });

        debtors[di].1 -= settled;
        creditors[ci].1 -= settled;
        if debtors[di].1 == 0 {
            debtors.swap_remove(di);
        }
        if creditors[ci].1 == 0 {
            creditors.swap_remove(ci);
        }
    }

    debug_assert!(debtors.is_empty() && creditors.is_empty());
    debug_assert!(bound == 0 || plan.len() <= bound - 1);
    Ok(plan)
}

/// Index of the entry with the largest amount, ties broken by ascending
/// user id for determinism.
fn largest(entries: &[(Uuid, i64)]) -> usize {
    let mut best = 0;
    for i in 1..entries.len() {
        let (best_user, best_amount) = entries[best];
        let (user, amount) = entries[i];
        if amount > best_amount || (amount == best_amount && user < best_user) {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use std::collections::BTreeMap;

    fn user(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn usd(minor: i64) -> Money {
        Money::new(minor, Currency::USD)
    }

    fn balances(entries: &[(u128, i64)]) -> GroupBalances {
        entries
            .iter()
            .map(|&(u, minor)| (user(u), usd(minor)))
            .collect()
    }

    fn apply(balances: &GroupBalances, plan: &[SuggestedPayment]) -> BTreeMap<Uuid, i64> {
        let mut result: BTreeMap<Uuid, i64> =
            balances.iter().map(|(&u, m)| (u, m.minor())).collect();
        for payment in plan {
            *result.entry(payment.payer_id).or_insert(0) += payment.amount.minor();
            *result.entry(payment.payee_id).or_insert(0) -= payment.amount.minor();
        }
        result
    }

    #[test]
    fn two_debt_plan_matches_expected() {
        // {A:+50, B:+30, C:-80} -> C pays A 50, then C pays B 30
        let balances = balances(&[(1, 50), (2, 30), (3, -80)]);
        let plan = suggest(&balances).unwrap();

        assert_eq!(
            plan,
            vec![
                SuggestedPayment { payer_id: user(3), payee_id: user(1), amount: usd(50) },
                SuggestedPayment { payer_id: user(3), payee_id: user(2), amount: usd(30) },
            ]
        );
        assert!(apply(&balances, &plan).values().all(|&v| v == 0));
    }

    #[test]
    fn applying_plan_zeroes_all_balances() {
        let cases = [
            balances(&[(1, 10), (2, -10)]),
            balances(&[(1, 100), (2, -40), (3, -60)]),
            balances(&[(1, 25), (2, 25), (3, 25), (4, -75)]),
            balances(&[(1, 7), (2, 13), (3, -5), (4, -15)]),
        ];
        for case in &cases {
            let plan = suggest(case).unwrap();
            assert!(apply(case, &plan).values().all(|&v| v == 0));

            let creditors = case.values().filter(|m| m.is_positive()).count();
            let debtors = case.values().filter(|m| m.is_negative()).count();
            assert!(plan.len() <= creditors + debtors - 1);
        }
    }

    #[test]
    fn zero_balances_yield_empty_plan() {
        assert!(suggest(&balances(&[])).unwrap().is_empty());
        assert!(suggest(&balances(&[(1, 0), (2, 0)])).unwrap().is_empty());
    }

    #[test]
    fn ties_break_by_ascending_user_id() {
        let plan = suggest(&balances(&[(2, 40), (1, 40), (3, -80)])).unwrap();
        assert_eq!(plan[0].payee_id, user(1));
        assert_eq!(plan[1].payee_id, user(2));
    }

    #[test]
    fn non_zero_total_is_an_inconsistency() {
        let result = suggest(&balances(&[(1, 50), (2, -49)]));
        assert!(matches!(result, Err(LedgerError::BalanceInconsistency(1))));
    }
}
