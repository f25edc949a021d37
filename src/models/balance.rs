use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// Net amount each user is owed (positive) or owes (negative) within a group.
/// Derived from history, never persisted.
pub type GroupBalances = BTreeMap<Uuid, Money>;

/// Signed pairwise amounts, keyed canonically with the smaller user id first:
/// a positive value for `(a, b)` means `a` owes `b`.
pub type PairwiseBalances = BTreeMap<(Uuid, Uuid), Money>;

/// One entry of a user's cross-group balance view: the user's net position
/// within a single group. Groups are kept separate so amounts in different
/// currencies are never added together.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserGroupBalance {
    pub group_id: Uuid,
    pub net: Money,
}

/// One step of a settlement plan. Suggestions are never persisted; a
/// suggestion becomes a [`super::Settlement`] only when a caller explicitly
/// records it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPayment {
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount: Money,
}
