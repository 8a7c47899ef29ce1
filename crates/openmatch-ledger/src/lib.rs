//! # openmatch-ledger
//!
//! The Ledger (Wallet Store): per-(user, currency) balance rows and the
//! atomic primitives every other plane settles through — `deposit`,
//! `withdraw`, `lock`, `unlock`, and the settlement primitive
//! `transfer_locked`.
//!
//! Wallet rows are locked in canonical `(user_id, currency)` order so two
//! transfers running in opposite directions between the same pair of rows
//! can never deadlock.

pub mod ledger;

pub use ledger::Ledger;
