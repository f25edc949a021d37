//! Pure balance aggregation: a fold over the expense/split/settlement history.
//!
//! No I/O and no state between calls, so the same functions back both the
//! balances read path and the settlement-suggestion pipeline. Tombstoned
//! expenses and their splits are skipped. All net balances in a group sum to
//! exactly zero by construction: every credit applied here has a matching
//! debit.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Expense, GroupBalances, PairwiseBalances, Settlement, Split};
use crate::money::Money;

/// Net balance per user: payer gains the expense total, each split
/// participant loses their share (a payer's own split nets out), a settlement
/// moves its amount from payee to payer.
pub fn group_balances(
    expenses: &[Expense],
    splits: &[Split],
    settlements: &[Settlement],
) -> Result<GroupBalances, LedgerError> {
    let live = live_expense_ids(expenses);
    let mut balances = GroupBalances::new();

    for expense in expenses.iter().filter(|e| !e.is_deleted()) {
        credit(&mut balances, expense.payer_id, expense.amount)?;
    }
    for split in splits.iter().filter(|s| live.contains(&s.expense_id)) {
        debit(&mut balances, split.user_id, split.amount)?;
    }
    for settlement in settlements {
        credit(&mut balances, settlement.payer_id, settlement.amount)?;
        debit(&mut balances, settlement.payee_id, settlement.amount)?;
    }

    debug_assert_eq!(
        balances.values().map(|m| m.minor()).sum::<i64>(),
        0,
        "group balances must conserve to zero"
    );
    Ok(balances)
}

/// Signed pairwise balances, keyed `(a, b)` with `a < b`; a positive value
/// means `a` owes `b`. Each user's net balance equals the sum of their
/// pairwise positions.
pub fn pairwise_balances(
    expenses: &[Expense],
    splits: &[Split],
    settlements: &[Settlement],
) -> Result<PairwiseBalances, LedgerError> {
    let mut pairs = PairwiseBalances::new();

    for expense in expenses.iter().filter(|e| !e.is_deleted()) {
        for split in splits.iter().filter(|s| s.expense_id == expense.id) {
            if split.user_id != expense.payer_id {
                add_debt(&mut pairs, split.user_id, expense.payer_id, split.amount)?;
            }
        }
    }
    // A settlement pays down the payer's debt to the payee
    for settlement in settlements {
        add_debt(
            &mut pairs,
            settlement.payee_id,
            settlement.payer_id,
            settlement.amount,
        )?;
    }

    Ok(pairs)
}

/// Net position of a single user over one group's history; zero when the user
/// never appears. Used for the cross-group balance view.
pub fn user_net(
    user_id: Uuid,
    expenses: &[Expense],
    splits: &[Split],
    settlements: &[Settlement],
) -> Result<Option<Money>, LedgerError> {
    let balances = group_balances(expenses, splits, settlements)?;
    Ok(balances.get(&user_id).copied())
}

fn live_expense_ids(expenses: &[Expense]) -> HashSet<Uuid> {
    expenses
        .iter()
        .filter(|e| !e.is_deleted())
        .map(|e| e.id)
        .collect()
}

fn credit(balances: &mut GroupBalances, user_id: Uuid, amount: Money) -> Result<(), LedgerError> {
    let next = match balances.get(&user_id) {
        Some(current) => current.checked_add(amount)?,
        None => amount,
    };
    balances.insert(user_id, next);
    Ok(())
}

fn debit(balances: &mut GroupBalances, user_id: Uuid, amount: Money) -> Result<(), LedgerError> {
    credit(balances, user_id, amount.checked_neg()?)
}

/// Records `debtor owes creditor amount` under the canonical pair key.
fn add_debt(
    pairs: &mut PairwiseBalances,
    debtor: Uuid,
    creditor: Uuid,
    amount: Money,
) -> Result<(), LedgerError> {
    let (key, signed) = if debtor < creditor {
        ((debtor, creditor), amount)
    } else {
        ((creditor, debtor), amount.checked_neg()?)
    };
    let next = match pairs.get(&key) {
        Some(current) => current.checked_add(signed)?,
        None => signed,
    };
    pairs.insert(key, next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SplitKind;
    use crate::money::Currency;
    use chrono::Utc;

    fn user(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn usd(minor: i64) -> Money {
        Money::new(minor, Currency::USD)
    }

    fn expense(id: u128, payer: u128, amount: i64) -> Expense {
        let now = Utc::now();
        Expense {
            id: Uuid::from_u128(id),
            group_id: Uuid::from_u128(99),
            payer_id: user(payer),
            amount: usd(amount),
            description: "test".to_string(),
            category: None,
            split_version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn split(expense_id: u128, participant: u128, amount: i64) -> Split {
        Split {
            expense_id: Uuid::from_u128(expense_id),
            user_id: user(participant),
            amount: usd(amount),
            kind: SplitKind::Equal,
        }
    }

    fn settlement(payer: u128, payee: u128, amount: i64) -> Settlement {
        Settlement {
            id: Uuid::new_v4(),
            group_id: Uuid::from_u128(99),
            payer_id: user(payer),
            payee_id: user(payee),
            amount: usd(amount),
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn payer_gains_total_participants_lose_shares() {
        // 100 split equally among three users, paid by U1
        let expenses = vec![expense(1, 1, 100)];
        let splits = vec![split(1, 1, 34), split(1, 2, 33), split(1, 3, 33)];
        let balances = group_balances(&expenses, &splits, &[]).unwrap();

        assert_eq!(balances[&user(1)], usd(66));
        assert_eq!(balances[&user(2)], usd(-33));
        assert_eq!(balances[&user(3)], usd(-33));
    }

    #[test]
    fn zero_sum_holds_after_every_event() {
        let expenses = vec![expense(1, 1, 100), expense(2, 2, 75)];
        let splits = vec![
            split(1, 1, 34),
            split(1, 2, 33),
            split(1, 3, 33),
            split(2, 1, 38),
            split(2, 3, 37),
        ];
        let settlements = vec![settlement(3, 1, 20)];

        for n_exp in 0..=expenses.len() {
            for n_set in 0..=settlements.len() {
                let exp = &expenses[..n_exp];
                let live: HashSet<Uuid> = exp.iter().map(|e| e.id).collect();
                let spl: Vec<Split> = splits
                    .iter()
                    .filter(|s| live.contains(&s.expense_id))
                    .cloned()
                    .collect();
                let balances = group_balances(exp, &spl, &settlements[..n_set]).unwrap();
                let total: i64 = balances.values().map(|m| m.minor()).sum();
                assert_eq!(total, 0, "after {n_exp} expenses, {n_set} settlements");
            }
        }
    }

    #[test]
    fn settlement_moves_exactly_its_amount() {
        let expenses = vec![expense(1, 1, 100)];
        let splits = vec![split(1, 1, 34), split(1, 2, 33), split(1, 3, 33)];

        let before = group_balances(&expenses, &splits, &[]).unwrap();
        let after = group_balances(&expenses, &splits, &[settlement(2, 1, 33)]).unwrap();

        assert_eq!(
            after[&user(2)].minor(),
            before[&user(2)].minor() + 33
        );
        assert_eq!(
            after[&user(1)].minor(),
            before[&user(1)].minor() - 33
        );
        assert_eq!(after[&user(3)], before[&user(3)]);
    }

    #[test]
    fn tombstoned_expense_is_excluded() {
        let mut dead = expense(1, 1, 100);
        dead.deleted_at = Some(Utc::now());
        let expenses = vec![dead, expense(2, 2, 50)];
        let splits = vec![
            split(1, 2, 50),
            split(1, 3, 50),
            split(2, 1, 25),
            split(2, 3, 25),
        ];

        let balances = group_balances(&expenses, &splits, &[]).unwrap();
        assert_eq!(balances[&user(2)], usd(50));
        assert_eq!(balances[&user(1)], usd(-25));
        assert_eq!(balances[&user(3)], usd(-25));
    }

    #[test]
    fn mixed_currency_history_is_rejected() {
        let mut eur_expense = expense(2, 1, 50);
        eur_expense.amount = Money::new(50, Currency::EUR);
        let expenses = vec![expense(1, 1, 100), eur_expense];
        let splits = vec![split(1, 1, 100)];

        assert!(matches!(
            group_balances(&expenses, &splits, &[]),
            Err(LedgerError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn pairwise_sums_to_net_balances() {
        let expenses = vec![expense(1, 1, 100), expense(2, 2, 60)];
        let splits = vec![
            split(1, 1, 34),
            split(1, 2, 33),
            split(1, 3, 33),
            split(2, 1, 30),
            split(2, 3, 30),
        ];
        let settlements = vec![settlement(3, 1, 10)];

        let net = group_balances(&expenses, &splits, &settlements).unwrap();
        let pairs = pairwise_balances(&expenses, &splits, &settlements).unwrap();

        for (&user_id, &balance) in &net {
            let mut from_pairs = 0i64;
            for (&(a, b), &amount) in &pairs {
                if b == user_id {
                    from_pairs += amount.minor();
                } else if a == user_id {
                    from_pairs -= amount.minor();
                }
            }
            assert_eq!(from_pairs, balance.minor(), "user {user_id}");
        }
    }

    #[test]
    fn settlement_reduces_pairwise_debt() {
        let expenses = vec![expense(1, 1, 100)];
        let splits = vec![split(1, 1, 50), split(1, 2, 50)];

        let pairs = pairwise_balances(&expenses, &splits, &[settlement(2, 1, 30)]).unwrap();
        // U2 owed U1 fifty, paid thirty back
        assert_eq!(pairs[&(user(1), user(2))], usd(-20));
    }
}
