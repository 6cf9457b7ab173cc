//! Shared-expense ledger engine.
//!
//! The engine ingests expenses and payments between members, derives pairwise,
//! net and per-group balances from an append-only transaction log, and plans
//! the transfers that settle every balance.
//!
//! ```rust
//! use chrono::Utc;
//! use engine::{Currency, Engine, ExpenseCmd, Money, Scope, SplitPolicy, TransactionLog};
//!
//! let log = TransactionLog::new(Currency::Inr);
//! let engine = Engine::builder().log(log).build().unwrap();
//! for id in ["a", "b", "c"] {
//!     engine.add_member(id, id).unwrap();
//! }
//! engine
//!     .record_expense(ExpenseCmd::new(
//!         "a",
//!         Money::new(9000),
//!         SplitPolicy::even(["a", "b", "c"]),
//!         Utc::now(),
//!     ))
//!     .unwrap();
//!
//! let owed = engine.compute_balance(&"a".into(), &"b".into(), Scope::Global).unwrap();
//! assert_eq!(owed, Money::new(3000));
//! ```

pub use balances::{GroupKey, PairwiseBalances, Scope};
pub use commands::{EntryMeta, ExpenseCmd, PaymentCmd, VoidCmd};
pub use currency::Currency;
pub use entry::{EntryKind, Expense, LedgerEntry, Payment, Void};
pub use error::{EngineError, ErrorKind};
pub use groups::Group;
pub use ids::{EntryId, GroupId, MemberId};
pub use log::{LogRecord, LogState, MAX_LEDGER_TOTAL, Snapshot, TransactionLog};
pub use members::Member;
pub use money::Money;
pub use ops::{
    ActivityItem, BalanceSummary, Engine, EngineBuilder, GroupBalance, GroupOverview,
    MemberBalance,
};
pub use settlement::Transfer;
pub use split::{FULL_BASIS_POINTS, PercentShare, Share, SplitPolicy};
pub use store::{LogStore, MemoryStore, StoredLog};

pub mod balances;
mod commands;
mod currency;
mod entry;
mod error;
mod groups;
mod ids;
mod log;
mod members;
mod money;
mod ops;
pub mod settlement;
mod split;
mod store;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
