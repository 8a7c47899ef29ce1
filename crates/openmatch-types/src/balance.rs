//! Wallet balance types for the OpenMatch ledger.
//!
//! Every (user, currency) pair has a `balance` (total owned) and a
//! `locked` (reserved by open orders). `available` is always derived,
//! never stored, so it can't drift from `balance - locked`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single wallet row for a (user, currency) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallet {
    /// Total balance owned by the user, including locked funds.
    pub balance: Decimal,
    /// Portion of `balance` reserved by open orders.
    pub locked: Decimal,
}

impl Wallet {
    /// A fresh wallet with zero balance and zero locked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balance: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    /// Funds free for new orders or withdrawal: `balance - locked`.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.balance - self.locked
    }

    /// `true` when `0 <= locked <= balance` (P1 non-negativity).
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.balance >= Decimal::ZERO && self.locked >= Decimal::ZERO && self.locked <= self.balance
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Type alias for currency codes (e.g., "BTC", "USDT").
pub type Currency = String;
