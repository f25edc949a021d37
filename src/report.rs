//! Summary numbers for the reporting collaborator.
//!
//! Rendering (CSV, PDF) happens outside the engine; this module only
//! aggregates the figures a report needs.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Expense, Split};
use crate::money::Money;

pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GroupSummary {
    /// None when the group has no live expenses (no currency to denominate in)
    pub total: Option<Money>,
    pub by_category: BTreeMap<String, Money>,
    pub by_payer: BTreeMap<Uuid, Money>,
}

/// Totals over a group's live expenses, grouped by category and by payer.
pub fn summarize(expenses: &[Expense]) -> Result<GroupSummary, LedgerError> {
    let mut summary = GroupSummary::default();

    for expense in expenses.iter().filter(|e| !e.is_deleted()) {
        summary.total = Some(match summary.total {
            Some(total) => total.checked_add(expense.amount)?,
            None => expense.amount,
        });

        let category = expense
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        accumulate(&mut summary.by_category, category, expense.amount)?;

        let payer_total = match summary.by_payer.get(&expense.payer_id) {
            Some(current) => current.checked_add(expense.amount)?,
            None => expense.amount,
        };
        summary.by_payer.insert(expense.payer_id, payer_total);
    }

    Ok(summary)
}

/// One month of a single user's activity within a group. `None` fields mean
/// no activity of that kind in the month.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserMonthlySummary {
    pub user_id: Uuid,
    pub year: i32,
    pub month: u32,
    /// Total of the live expenses the user paid for
    pub paid: Option<Money>,
    /// Total of the user's split shares across the month's live expenses
    pub owed: Option<Money>,
    /// `paid` minus `owed`
    pub net: Option<Money>,
}

/// Totals for one user over the live expenses dated within the given month.
pub fn monthly_user_summary(
    user_id: Uuid,
    year: i32,
    month: u32,
    expenses: &[Expense],
    splits: &[Split],
) -> Result<UserMonthlySummary, LedgerError> {
    let in_month: Vec<&Expense> = expenses
        .iter()
        .filter(|e| !e.is_deleted())
        .filter(|e| e.created_at.year() == year && e.created_at.month() == month)
        .collect();

    let mut paid = None;
    for expense in in_month.iter().filter(|e| e.payer_id == user_id) {
        paid = Some(add(paid, expense.amount)?);
    }

    let mut owed = None;
    for expense in &in_month {
        for split in splits
            .iter()
            .filter(|s| s.expense_id == expense.id && s.user_id == user_id)
        {
            owed = Some(add(owed, split.amount)?);
        }
    }

    let net = match (paid, owed) {
        (Some(paid), Some(owed)) => Some(paid.checked_sub(owed)?),
        (Some(paid), None) => Some(paid),
        (None, Some(owed)) => Some(owed.checked_neg()?),
        (None, None) => None,
    };

    Ok(UserMonthlySummary {
        user_id,
        year,
        month,
        paid,
        owed,
        net,
    })
}

fn add(acc: Option<Money>, amount: Money) -> Result<Money, LedgerError> {
    match acc {
        Some(current) => current.checked_add(amount),
        None => Ok(amount),
    }
}

fn accumulate(
    map: &mut BTreeMap<String, Money>,
    key: String,
    amount: Money,
) -> Result<(), LedgerError> {
    let next = match map.get(&key) {
        Some(current) => current.checked_add(amount)?,
        None => amount,
    };
    map.insert(key, next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use chrono::Utc;

    fn expense(payer: u128, amount: i64, category: Option<&str>) -> Expense {
        let now = Utc::now();
        Expense {
            id: Uuid::new_v4(),
            group_id: Uuid::from_u128(1),
            payer_id: Uuid::from_u128(payer),
            amount: Money::new(amount, Currency::USD),
            description: "test".to_string(),
            category: category.map(String::from),
            split_version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn totals_by_category_and_payer() {
        let expenses = vec![
            expense(1, 100, Some("food")),
            expense(1, 50, Some("travel")),
            expense(2, 25, None),
        ];
        let summary = summarize(&expenses).unwrap();

        assert_eq!(summary.total, Some(Money::new(175, Currency::USD)));
        assert_eq!(summary.by_category["food"].minor(), 100);
        assert_eq!(summary.by_category[UNCATEGORIZED].minor(), 25);
        assert_eq!(summary.by_payer[&Uuid::from_u128(1)].minor(), 150);
    }

    #[test]
    fn skips_tombstoned_expenses() {
        let mut dead = expense(1, 100, Some("food"));
        dead.deleted_at = Some(Utc::now());
        let summary = summarize(&[dead, expense(2, 30, None)]).unwrap();

        assert_eq!(summary.total, Some(Money::new(30, Currency::USD)));
        assert!(!summary.by_category.contains_key("food"));
    }

    #[test]
    fn empty_history_has_no_total() {
        let summary = summarize(&[]).unwrap();
        assert!(summary.total.is_none());
        assert!(summary.by_category.is_empty());
    }

    fn usd(minor: i64) -> Money {
        Money::new(minor, Currency::USD)
    }

    fn split(expense_id: Uuid, user: u128, amount: i64) -> crate::models::Split {
        crate::models::Split {
            expense_id,
            user_id: Uuid::from_u128(user),
            amount: usd(amount),
            kind: crate::models::SplitKind::Equal,
        }
    }

    #[test]
    fn monthly_totals_cover_paid_and_owed() {
        let mut paid_by_user = expense(1, 100, None);
        paid_by_user.created_at = "2026-07-10T12:00:00Z".parse().unwrap();
        let mut paid_by_other = expense(2, 60, None);
        paid_by_other.created_at = "2026-07-20T12:00:00Z".parse().unwrap();
        let mut previous_month = expense(1, 500, None);
        previous_month.created_at = "2026-06-30T12:00:00Z".parse().unwrap();

        let splits = vec![
            split(paid_by_user.id, 1, 50),
            split(paid_by_user.id, 2, 50),
            split(paid_by_other.id, 1, 30),
            split(paid_by_other.id, 2, 30),
            split(previous_month.id, 1, 500),
        ];
        let expenses = vec![paid_by_user, paid_by_other, previous_month];

        let summary =
            monthly_user_summary(Uuid::from_u128(1), 2026, 7, &expenses, &splits).unwrap();
        assert_eq!(summary.paid, Some(usd(100)));
        assert_eq!(summary.owed, Some(usd(80)));
        assert_eq!(summary.net, Some(usd(20)));
    }

    #[test]
    fn month_without_activity_is_empty() {
        let mut other_user = expense(2, 40, None);
        other_user.created_at = "2026-07-01T12:00:00Z".parse().unwrap();
        let splits = vec![split(other_user.id, 2, 40)];

        let summary =
            monthly_user_summary(Uuid::from_u128(1), 2026, 7, &[other_user], &splits).unwrap();
        assert!(summary.paid.is_none());
        assert!(summary.owed.is_none());
        assert!(summary.net.is_none());
    }
}
