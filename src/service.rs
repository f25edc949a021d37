use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::GroupDirectory;
use crate::balance;
use crate::cache::BalanceCache;
use crate::config::CONFIG;
use crate::error::LedgerError;
use crate::models::{
    Expense, ExpenseWithSplits, GroupBalances, PairwiseBalances, Settlement, Split,
    SuggestedPayment, UserGroupBalance,
};
use crate::money::Money;
use crate::report::{self, GroupSummary, UserMonthlySummary};
use crate::settle;
use crate::split::{self, SplitShare, SplitSpec};
use crate::storage::LedgerStore;

const MAX_PAGE_SIZE: usize = 100;

/// Page selector for history listings. Pages are numbered from 1.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Page { number: 1, size: 20 }
    }
}

impl Page {
    fn validate(&self) -> Result<(), LedgerError> {
        if self.number < 1 {
            return Err(LedgerError::InvalidInput {
                field: "page".to_string(),
                reason: "pages are numbered from 1".to_string(),
            });
        }
        if self.size < 1 || self.size > MAX_PAGE_SIZE {
            return Err(LedgerError::InvalidInput {
                field: "page_size".to_string(),
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
        Ok(())
    }
}

/// Orchestrates the split calculator, balance aggregator and settlement
/// suggester over a [`LedgerStore`], consulting a [`GroupDirectory`] before
/// every mutation. Stateless apart from the injected collaborators, so a
/// single instance serves concurrent requests.
pub struct ExpenseService<S, D, C> {
    store: S,
    directory: D,
    cache: C,
}

impl<S, D, C> ExpenseService<S, D, C>
where
    S: LedgerStore,
    D: GroupDirectory,
    C: BalanceCache,
{
    pub fn new(store: S, directory: D, cache: C) -> Self {
        ExpenseService {
            store,
            directory,
            cache,
        }
    }

    // EXPENSES

    #[allow(clippy::too_many_arguments)]
    pub async fn create_expense(
        &self,
        group_id: Uuid,
        created_by: Uuid,
        payer_id: Uuid,
        amount: Money,
        description: String,
        category: Option<String>,
        spec: SplitSpec,
    ) -> Result<ExpenseWithSplits, LedgerError> {
        info!(%group_id, %payer_id, amount = %amount, "creating expense");
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }
        validate_description(&description)?;
        self.require_member(group_id, created_by).await?;
        self.require_member(group_id, payer_id).await?;
        self.require_group_currency(group_id, amount).await?;

        let spec = spec.canonicalized();
        let shares = split::compute_splits(amount, &spec)?;
        for share in &shares {
            self.require_member(group_id, share.user_id).await?;
        }

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            group_id,
            payer_id,
            amount,
            description,
            category,
            split_version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let splits = attach(&shares, expense.id, &spec);

        self.store
            .write_expense_with_splits(expense.clone(), splits.clone())
            .await?;
        self.cache.invalidate_group(group_id).await?;

        debug!(expense_id = %expense.id, splits = splits.len(), "expense persisted");
        Ok(ExpenseWithSplits { expense, splits })
    }

    /// Pure projection of what [`Self::create_expense`] would persist for the
    /// same total and spec; shares identical bit for bit with the commit path.
    pub fn preview_split(
        &self,
        total: Money,
        spec: SplitSpec,
    ) -> Result<Vec<SplitShare>, LedgerError> {
        split::compute_splits(total, &spec.canonicalized())
    }

    /// Replaces an expense's splits under optimistic concurrency. The caller
    /// supplies the split version it computed against; a concurrent edit
    /// surfaces as [`LedgerError::StaleVersion`] and the caller re-reads and
    /// retries.
    pub async fn update_split(
        &self,
        expense_id: Uuid,
        updated_by: Uuid,
        expected_version: u64,
        new_spec: SplitSpec,
    ) -> Result<ExpenseWithSplits, LedgerError> {
        info!(%expense_id, expected_version, "updating splits");
        let expense = self.live_expense(expense_id).await?;
        self.require_member(expense.group_id, updated_by).await?;

        let spec = new_spec.canonicalized();
        let shares = split::compute_splits(expense.amount, &spec)?;
        for share in &shares {
            self.require_member(expense.group_id, share.user_id).await?;
        }
        let splits = attach(&shares, expense_id, &spec);

        let updated = self
            .store
            .compare_and_set_splits(expense_id, expected_version, splits.clone())
            .await?;
        self.cache.invalidate_group(expense.group_id).await?;

        debug!(%expense_id, new_version = updated.split_version, "splits replaced");
        Ok(ExpenseWithSplits { expense: updated, splits })
    }

    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        updated_by: Uuid,
        description: Option<String>,
        category: Option<String>,
    ) -> Result<Expense, LedgerError> {
        info!(%expense_id, "updating expense metadata");
        let expense = self.live_expense(expense_id).await?;
        self.require_member(expense.group_id, updated_by).await?;
        if let Some(description) = &description {
            validate_description(description)?;
        }
        self.store
            .update_expense_metadata(expense_id, description, category)
            .await
    }

    pub async fn delete_expense(
        &self,
        expense_id: Uuid,
        deleted_by: Uuid,
    ) -> Result<(), LedgerError> {
        info!(%expense_id, %deleted_by, "deleting expense");
        let expense = self.live_expense(expense_id).await?;
        self.require_member(expense.group_id, deleted_by).await?;

        self.store
            .tombstone_expense(expense_id, Utc::now())
            .await?;
        self.cache.invalidate_group(expense.group_id).await?;
        Ok(())
    }

    pub async fn get_expense(&self, expense_id: Uuid) -> Result<ExpenseWithSplits, LedgerError> {
        let expense = self.live_expense(expense_id).await?;
        let splits = self.store.read_splits(expense_id).await?;
        Ok(ExpenseWithSplits { expense, splits })
    }

    /// Live expenses for the group, oldest first, one page at a time.
    pub async fn list_group_expenses(
        &self,
        group_id: Uuid,
        page: Page,
    ) -> Result<Vec<Expense>, LedgerError> {
        page.validate()?;
        let expenses = self.store.read_expenses(group_id).await?;
        Ok(expenses
            .into_iter()
            .filter(|e| !e.is_deleted())
            .skip((page.number - 1) * page.size)
            .take(page.size)
            .collect())
    }

    // SETTLEMENTS

    pub async fn record_settlement(
        &self,
        group_id: Uuid,
        recorded_by: Uuid,
        payer_id: Uuid,
        payee_id: Uuid,
        amount: Money,
        note: Option<String>,
    ) -> Result<Settlement, LedgerError> {
        info!(%group_id, %payer_id, %payee_id, amount = %amount, "recording settlement");
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }
        if payer_id == payee_id {
            return Err(LedgerError::SelfSettlement);
        }
        self.require_member(group_id, recorded_by).await?;
        self.require_member(group_id, payer_id).await?;
        self.require_member(group_id, payee_id).await?;
        self.require_group_currency(group_id, amount).await?;

        let settlement = Settlement {
            id: Uuid::new_v4(),
            group_id,
            payer_id,
            payee_id,
            amount,
            note,
            created_at: Utc::now(),
        };
        self.store.append_settlement(settlement.clone()).await?;
        self.cache.invalidate_group(group_id).await?;
        Ok(settlement)
    }

    /// Settlements are immutable; undoing one means appending a compensating
    /// settlement with payer and payee swapped. Allowed for either party or a
    /// group owner.
    pub async fn reverse_settlement(
        &self,
        settlement_id: Uuid,
        reversed_by: Uuid,
    ) -> Result<Settlement, LedgerError> {
        info!(%settlement_id, %reversed_by, "reversing settlement");
        let original = self
            .store
            .read_settlement(settlement_id)
            .await?
            .ok_or(LedgerError::SettlementNotFound(settlement_id))?;

        let is_party = reversed_by == original.payer_id || reversed_by == original.payee_id;
        if !is_party
            && !self
                .directory
                .is_group_owner(original.group_id, reversed_by)
                .await?
        {
            warn!(%settlement_id, %reversed_by, "reversal denied");
            return Err(LedgerError::NotGroupOwner(reversed_by));
        }

        let reversal = Settlement {
            id: Uuid::new_v4(),
            group_id: original.group_id,
            payer_id: original.payee_id,
            payee_id: original.payer_id,
            amount: original.amount,
            note: Some(format!("reversal of settlement {}", original.id)),
            created_at: Utc::now(),
        };
        self.store.append_settlement(reversal.clone()).await?;
        self.cache.invalidate_group(original.group_id).await?;
        Ok(reversal)
    }

    pub async fn list_settlements(&self, group_id: Uuid) -> Result<Vec<Settlement>, LedgerError> {
        self.store.read_settlements(group_id).await
    }

    // BALANCES & SUGGESTIONS

    pub async fn get_group_balances(&self, group_id: Uuid) -> Result<GroupBalances, LedgerError> {
        if let Some(cached) = self.cache.get_group_balances(group_id).await? {
            debug!(%group_id, "balances served from cache");
            return Ok(cached);
        }

        let (expenses, splits, settlements) = self.store.read_group_history(group_id).await?;
        let balances = balance::group_balances(&expenses, &splits, &settlements)?;
        self.cache
            .save_group_balances(
                group_id,
                &balances,
                Duration::from_secs(CONFIG.balance_cache_ttl_secs),
            )
            .await?;
        Ok(balances)
    }

    pub async fn get_pairwise_balances(
        &self,
        group_id: Uuid,
    ) -> Result<PairwiseBalances, LedgerError> {
        let (expenses, splits, settlements) = self.store.read_group_history(group_id).await?;
        balance::pairwise_balances(&expenses, &splits, &settlements)
    }

    /// Net position per group for a single user. Groups stay separate so
    /// amounts in different currencies are never combined.
    pub async fn get_user_balances(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserGroupBalance>, LedgerError> {
        let mut result = Vec::new();
        for group_id in self.store.read_user_group_ids(user_id).await? {
            let (expenses, splits, settlements) = self.store.read_group_history(group_id).await?;
            if let Some(net) = balance::user_net(user_id, &expenses, &splits, &settlements)? {
                result.push(UserGroupBalance { group_id, net });
            }
        }
        Ok(result)
    }

    pub async fn suggest_settlements(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<SuggestedPayment>, LedgerError> {
        let balances = self.get_group_balances(group_id).await?;
        settle::suggest(&balances)
    }

    // REPORTS

    pub async fn group_summary(&self, group_id: Uuid) -> Result<GroupSummary, LedgerError> {
        let expenses = self.store.read_expenses(group_id).await?;
        report::summarize(&expenses)
    }

    /// What the user paid for and owed within one group during one month.
    pub async fn user_monthly_summary(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<UserMonthlySummary, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidInput {
                field: "month".to_string(),
                reason: "must be between 1 and 12".to_string(),
            });
        }
        let (expenses, splits, _) = self.store.read_group_history(group_id).await?;
        report::monthly_user_summary(user_id, year, month, &expenses, &splits)
    }

    // HELPERS

    /// A group's history is single-currency; the first recorded amount fixes
    /// the denomination and every later write must match it, or the group's
    /// balance reads would fail forever after.
    async fn require_group_currency(
        &self,
        group_id: Uuid,
        amount: Money,
    ) -> Result<(), LedgerError> {
        let (expenses, _, settlements) = self.store.read_group_history(group_id).await?;
        let existing = expenses
            .iter()
            .filter(|e| !e.is_deleted())
            .map(|e| e.amount)
            .chain(settlements.iter().map(|s| s.amount))
            .next();
        if let Some(existing) = existing {
            if existing.currency() != amount.currency() {
                warn!(%group_id, "currency mismatch rejected");
                return Err(LedgerError::CurrencyMismatch {
                    expected: existing.currency(),
                    found: amount.currency(),
                });
            }
        }
        Ok(())
    }

    async fn require_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), LedgerError> {
        if self.directory.is_group_member(group_id, user_id).await? {
            Ok(())
        } else {
            warn!(%group_id, %user_id, "membership check failed");
            Err(LedgerError::NotGroupMember(user_id))
        }
    }

    async fn live_expense(&self, expense_id: Uuid) -> Result<Expense, LedgerError> {
        let expense = self
            .store
            .read_expense(expense_id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        if expense.is_deleted() {
            return Err(LedgerError::ExpenseNotFound(expense_id));
        }
        Ok(expense)
    }
}

fn attach(shares: &[SplitShare], expense_id: Uuid, spec: &SplitSpec) -> Vec<Split> {
    shares
        .iter()
        .map(|share| Split {
            expense_id,
            user_id: share.user_id,
            amount: share.amount,
            kind: spec.kind(),
        })
        .collect()
}

fn validate_description(description: &str) -> Result<(), LedgerError> {
    if description.trim().is_empty() {
        return Err(LedgerError::InvalidInput {
            field: "description".to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    if description.len() > CONFIG.max_description_len {
        return Err(LedgerError::InvalidInput {
            field: "description".to_string(),
            reason: format!("longer than {} characters", CONFIG.max_description_len),
        });
    }
    Ok(())
}
