//! The Ledger: per-(user, currency) wallet rows with atomic lock/unlock
//! and settlement primitives.
//!
//! Wallet rows are `Mutex`-guarded so a caller can hold a row lock across
//! a read-then-mutate sequence (the pessimistic row lock spec §5 requires).
//! New rows are created lazily; `rows` itself is behind an `RwLock` so
//! concurrent readers of *different* wallets never block each other, and a
//! writer only takes the global lock for the brief window needed to insert
//! a missing row.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use openmatch_types::{Currency, OpenmatchError, Result, UserId, Wallet};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

/// Key a wallet row is stored under. Ordering here is the canonical
/// `(user_id, currency)` lock order spec §4.1 requires when more than one
/// row must be locked for a single operation (e.g. `transfer_locked`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct WalletKey {
    user_id: UserId,
    currency: Currency,
}

/// The Ledger / Wallet Store.
pub struct Ledger {
    rows: RwLock<HashMap<WalletKey, Mutex<Wallet>>>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn key(user_id: UserId, currency: &str) -> WalletKey {
        WalletKey {
            user_id,
            currency: currency.to_uppercase(),
        }
    }

    /// Ensures a row exists for `(user_id, currency)` and returns a snapshot.
    /// Currency is normalized to uppercase; a missing row is created with
    /// zeros.
    #[instrument(skip(self))]
    pub fn get_or_create(&self, user_id: UserId, currency: &str) -> Wallet {
        let key = Self::key(user_id, currency);
        if let Some(row) = self.rows.read().unwrap().get(&key) {
            return row.lock().unwrap().clone();
        }
        let mut rows = self.rows.write().unwrap();
        let row = rows.entry(key).or_insert_with(|| Mutex::new(Wallet::new()));
        row.lock().unwrap().clone()
    }

    /// Explicit lookup; fails with `WalletNotFound` if no row has ever been
    /// created for this (user, currency) pair.
    pub fn get_wallet(&self, user_id: UserId, currency: &str) -> Result<Wallet> {
        let key = Self::key(user_id, currency);
        self.rows
            .read()
            .unwrap()
            .get(&key)
            .map(|row| row.lock().unwrap().clone())
            .ok_or_else(|| OpenmatchError::WalletNotFound {
                user_id: user_id.to_string(),
                currency: key.currency.clone(),
            })
    }

    fn row_for_mutation(&self, user_id: UserId, currency: &str) -> WalletKey {
        let key = Self::key(user_id, currency);
        if self.rows.read().unwrap().contains_key(&key) {
            return key;
        }
        let mut rows = self.rows.write().unwrap();
        rows.entry(key.clone())
            .or_insert_with(|| Mutex::new(Wallet::new()));
        key
    }

    /// `amount > 0`; increments `balance`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if `amount <= 0`.
    #[instrument(skip(self))]
    pub fn deposit(&self, user_id: UserId, currency: &str, amount: Decimal) -> Result<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(OpenmatchError::InvalidAmount {
                field: "amount".to_string(),
                value: amount,
            });
        }
        let key = self.row_for_mutation(user_id, currency);
        let rows = self.rows.read().unwrap();
        let row = rows.get(&key).expect("row created above");
        let mut wallet = row.lock().unwrap();
        wallet.balance += amount;
        debug!(user = %user_id, currency = %key.currency, %amount, "deposit");
        Ok(wallet.clone())
    }

    /// Requires `available >= amount`; decrements `balance`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` or `InvalidAmount`.
    #[instrument(skip(self))]
    pub fn withdraw(&self, user_id: UserId, currency: &str, amount: Decimal) -> Result<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(OpenmatchError::InvalidAmount {
                field: "amount".to_string(),
                value: amount,
            });
        }
        let key = self.row_for_mutation(user_id, currency);
        let rows = self.rows.read().unwrap();
        let row = rows.get(&key).expect("row created above");
        let mut wallet = row.lock().unwrap();
        if wallet.available() < amount {
            return Err(OpenmatchError::InsufficientBalance {
                required: amount,
                available: wallet.available(),
                currency: key.currency.clone(),
            });
        }
        wallet.balance -= amount;
        debug!(user = %user_id, currency = %key.currency, %amount, "withdraw");
        Ok(wallet.clone())
    }

    /// Requires `available >= amount`; increments `locked`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` or `InvalidAmount`.
    #[instrument(skip(self))]
    pub fn lock(&self, user_id: UserId, currency: &str, amount: Decimal) -> Result<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(OpenmatchError::InvalidAmount {
                field: "amount".to_string(),
                value: amount,
            });
        }
        let key = self.row_for_mutation(user_id, currency);
        let rows = self.rows.read().unwrap();
        let row = rows.get(&key).expect("row created above");
        let mut wallet = row.lock().unwrap();
        if wallet.available() < amount {
            return Err(OpenmatchError::InsufficientBalance {
                required: amount,
                available: wallet.available(),
                currency: key.currency.clone(),
            });
        }
        wallet.locked += amount;
        debug!(user = %user_id, currency = %key.currency, %amount, "lock");
        Ok(wallet.clone())
    }

    /// Requires `locked >= amount`; decrements `locked`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the row is missing or under-locked.
    #[instrument(skip(self))]
    pub fn unlock(&self, user_id: UserId, currency: &str, amount: Decimal) -> Result<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(OpenmatchError::InvalidAmount {
                field: "amount".to_string(),
                value: amount,
            });
        }
        let key = self.row_for_mutation(user_id, currency);
        let rows = self.rows.read().unwrap();
        let row = rows.get(&key).expect("row created above");
        let mut wallet = row.lock().unwrap();
        if wallet.locked < amount {
            return Err(OpenmatchError::InvalidAmount {
                field: "locked".to_string(),
                value: wallet.locked,
            });
        }
        wallet.locked -= amount;
        debug!(user = %user_id, currency = %key.currency, %amount, "unlock");
        Ok(wallet.clone())
    }

    /// The settlement primitive. Requires `from.locked >= amount`.
    /// Decrements both `from.locked` and `from.balance`; credits `to.balance`
    /// (creating the row if needed). Locks `from` and `to` in canonical
    /// `(user_id, currency)` order to avoid deadlock against a concurrent
    /// transfer in the opposite direction.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from.locked < amount`, or
    /// `InvalidAmount` for a non-positive amount.
    #[instrument(skip(self))]
    pub fn transfer_locked(
        &self,
        from_user: UserId,
        to_user: UserId,
        currency: &str,
        amount: Decimal,
    ) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(OpenmatchError::InvalidAmount {
                field: "amount".to_string(),
                value: amount,
            });
        }
        let from_key = self.row_for_mutation(from_user, currency);
        let to_key = self.row_for_mutation(to_user, currency);

        let rows = self.rows.read().unwrap();
        let from_row = rows.get(&from_key).expect("row created above");
        let to_row = rows.get(&to_key).expect("row created above");

        // Canonical lock order prevents deadlock with a concurrent transfer
        // running in the opposite direction between the same two rows.
        if from_key <= to_key {
            let mut from_wallet = from_row.lock().unwrap();
            if from_wallet.locked < amount {
                return Err(OpenmatchError::InsufficientBalance {
                    required: amount,
                    available: from_wallet.locked,
                    currency: from_key.currency.clone(),
                });
            }
            from_wallet.locked -= amount;
            from_wallet.balance -= amount;
            if from_key == to_key {
                from_wallet.balance += amount;
            } else {
                let mut to_wallet = to_row.lock().unwrap();
                to_wallet.balance += amount;
            }
        } else {
            let mut to_wallet = to_row.lock().unwrap();
            let mut from_wallet = from_row.lock().unwrap();
            if from_wallet.locked < amount {
                return Err(OpenmatchError::InsufficientBalance {
                    required: amount,
                    available: from_wallet.locked,
                    currency: from_key.currency.clone(),
                });
            }
            from_wallet.locked -= amount;
            from_wallet.balance -= amount;
            to_wallet.balance += amount;
        }

        debug!(
            from = %from_user, to = %to_user, currency = %from_key.currency, %amount,
            "transfer_locked"
        );
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_starts_at_zero() {
        let ledger = Ledger::new();
        let w = ledger.get_or_create(UserId::new(), "usdt");
        assert_eq!(w.balance, Decimal::ZERO);
        assert_eq!(w.locked, Decimal::ZERO);
    }

    #[test]
    fn currency_is_normalized_to_uppercase() {
        let ledger = Ledger::new();
        let user = UserId::new();
        ledger.deposit(user, "usdt", Decimal::new(100, 0)).unwrap();
        let w = ledger.get_wallet(user, "USDT").unwrap();
        assert_eq!(w.balance, Decimal::new(100, 0));
    }

    #[test]
    fn deposit_increases_balance() {
        let ledger = Ledger::new();
        let user = UserId::new();
        let w = ledger.deposit(user, "USDT", Decimal::new(500, 0)).unwrap();
        assert_eq!(w.balance, Decimal::new(500, 0));
    }

    #[test]
    fn deposit_rejects_non_positive() {
        let ledger = Ledger::new();
        let user = UserId::new();
        let err = ledger.deposit(user, "USDT", Decimal::ZERO).unwrap_err();
        assert!(matches!(err, OpenmatchError::InvalidAmount { .. }));
    }

    #[test]
    fn withdraw_requires_available() {
        let ledger = Ledger::new();
        let user = UserId::new();
        ledger.deposit(user, "USDT", Decimal::new(100, 0)).unwrap();
        let err = ledger
            .withdraw(user, "USDT", Decimal::new(200, 0))
            .unwrap_err();
        assert!(matches!(err, OpenmatchError::InsufficientBalance { .. }));
    }

    #[test]
    fn lock_then_unlock_roundtrips() {
        let ledger = Ledger::new();
        let user = UserId::new();
        ledger.deposit(user, "USDT", Decimal::new(1000, 0)).unwrap();
        ledger.lock(user, "USDT", Decimal::new(400, 0)).unwrap();
        let w = ledger.get_wallet(user, "USDT").unwrap();
        assert_eq!(w.locked, Decimal::new(400, 0));
        assert_eq!(w.available(), Decimal::new(600, 0));

        ledger.unlock(user, "USDT", Decimal::new(400, 0)).unwrap();
        let w = ledger.get_wallet(user, "USDT").unwrap();
        assert_eq!(w.locked, Decimal::ZERO);
    }

    #[test]
    fn lock_insufficient_available_fails() {
        let ledger = Ledger::new();
        let user = UserId::new();
        ledger.deposit(user, "USDT", Decimal::new(100, 0)).unwrap();
        let err = ledger
            .lock(user, "USDT", Decimal::new(200, 0))
            .unwrap_err();
        assert!(matches!(err, OpenmatchError::InsufficientBalance { .. }));
    }

    #[test]
    fn transfer_locked_moves_funds_between_users() {
        let ledger = Ledger::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        ledger
            .deposit(seller, "BTC", Decimal::new(1, 0))
            .unwrap();
        ledger.lock(seller, "BTC", Decimal::new(1, 0)).unwrap();

        ledger
            .transfer_locked(seller, buyer, "BTC", Decimal::new(1, 0))
            .unwrap();

        let seller_wallet = ledger.get_wallet(seller, "BTC").unwrap();
        assert_eq!(seller_wallet.balance, Decimal::ZERO);
        assert_eq!(seller_wallet.locked, Decimal::ZERO);

        let buyer_wallet = ledger.get_wallet(buyer, "BTC").unwrap();
        assert_eq!(buyer_wallet.balance, Decimal::new(1, 0));
        assert_eq!(buyer_wallet.locked, Decimal::ZERO);
    }

    #[test]
    fn transfer_locked_requires_sufficient_lock() {
        let ledger = Ledger::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        ledger
            .deposit(seller, "BTC", Decimal::new(1, 0))
            .unwrap();
        // Only 0.5 locked, attempt to transfer 1.
        ledger
            .lock(seller, "BTC", Decimal::new(5, 1))
            .unwrap();
        let err = ledger
            .transfer_locked(seller, buyer, "BTC", Decimal::new(1, 0))
            .unwrap_err();
        assert!(matches!(err, OpenmatchError::InsufficientBalance { .. }));
    }

    #[test]
    fn get_wallet_missing_row_errors() {
        let ledger = Ledger::new();
        let err = ledger.get_wallet(UserId::new(), "BTC").unwrap_err();
        assert!(matches!(err, OpenmatchError::WalletNotFound { .. }));
    }

    #[test]
    fn conservation_holds_across_many_transfers() {
        let ledger = Ledger::new();
        let a = UserId::new();
        let b = UserId::new();
        ledger.deposit(a, "USDT", Decimal::new(1000, 0)).unwrap();
        for _ in 0..10 {
            ledger.lock(a, "USDT", Decimal::new(10, 0)).unwrap();
            ledger
                .transfer_locked(a, b, "USDT", Decimal::new(10, 0))
                .unwrap();
        }
        let wa = ledger.get_wallet(a, "USDT").unwrap();
        let wb = ledger.get_wallet(b, "USDT").unwrap();
        assert_eq!(wa.balance + wb.balance, Decimal::new(1000, 0));
    }
}
