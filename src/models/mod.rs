pub mod balance;
pub mod expense;
pub mod settlement;
pub mod split;

pub use balance::{GroupBalances, PairwiseBalances, SuggestedPayment, UserGroupBalance};
pub use expense::{Expense, ExpenseWithSplits};
pub use settlement::Settlement;
pub use split::{Split, SplitKind};
