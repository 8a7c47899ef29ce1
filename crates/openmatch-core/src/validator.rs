//! The Order Validator (spec §4.3): a pure predicate layer.
//!
//! Six checks run in order; the first failure wins. Balance sufficiency
//! (step 6) reads the Ledger but never mutates it — the actual `lock`
//! happens in [`crate::service`] immediately afterward, and re-validates
//! availability atomically under the wallet's own row lock, so a race
//! between this read and that lock can only ever make the lock fail
//! safely, never under-lock.

use openmatch_ledger::Ledger;
use openmatch_types::{OpenmatchError, Order, OrderSide, OrderType, PairConfig, Result, TradingPair, UserId};
use rust_decimal::Decimal;

/// The currency and amount a successfully validated order will need
/// locked: BUY needs quote-currency notional, SELL needs base-currency
/// amount.
pub struct RequiredLock {
    pub currency: String,
    pub amount: Decimal,
}

/// Runs the six-step validation of spec §4.3 against `pair`/`config` and
/// the caller's current Ledger balance.
///
/// # Errors
/// Returns `InvalidOrder` for any of steps 1-5, or `InsufficientBalance`
/// for step 6.
pub fn validate(
    ledger: &Ledger,
    pair: &TradingPair,
    config: &PairConfig,
    user_id: UserId,
    side: OrderSide,
    order_type: OrderType,
    price: Decimal,
    amount: Decimal,
) -> Result<RequiredLock> {
    // 1. pair must be active.
    if !pair.is_active {
        return Err(OpenmatchError::InvalidOrder {
            reason: "pair inactive".to_string(),
        });
    }

    // 2. side/order_type enumerations are enforced by the type system
    // itself (OrderSide, OrderType) — nothing further to check here.
    let _ = side;

    // 3. LIMIT orders must carry a positive price.
    if order_type == OrderType::Limit && price <= Decimal::ZERO {
        return Err(OpenmatchError::InvalidOrder {
            reason: "limit order price must be positive".to_string(),
        });
    }

    // 4. amount must be positive.
    if amount <= Decimal::ZERO {
        return Err(OpenmatchError::InvalidOrder {
            reason: "amount must be positive".to_string(),
        });
    }

    // 5. notional bounds apply to every order, not just LIMIT: a MARKET
    // order's `price` is still the cap used to size its lock (step 6), so
    // it must fall within the same bounds a resting order would.
    let notional = price * amount;
    if notional < config.min_notional || notional > config.max_notional {
        return Err(OpenmatchError::InvalidOrder {
            reason: format!(
                "notional {notional} outside [{}, {}]",
                config.min_notional, config.max_notional
            ),
        });
    }

    // 6. balance sufficiency. Missing wallet is treated as zero available.
    let (currency, required) = match side {
        OrderSide::Buy => (pair.quote_currency.clone(), price * amount),
        OrderSide::Sell => (pair.base_currency.clone(), amount),
    };
    let wallet = ledger.get_or_create(user_id, &currency);
    if wallet.available() < required {
        return Err(OpenmatchError::InsufficientBalance {
            required,
            available: wallet.available(),
            currency,
        });
    }

    Ok(RequiredLock {
        currency,
        amount: required,
    })
}

/// Ownership/status check run by `cancel_order`: only the owning user may
/// cancel, and only a non-terminal order can be cancelled.
///
/// # Errors
/// Returns `InvalidOrder` on owner mismatch or a terminal order.
pub fn validate_cancellable(order: &Order, user_id: UserId) -> Result<()> {
    if order.user_id != user_id {
        return Err(OpenmatchError::InvalidOrder {
            reason: "order does not belong to this user".to_string(),
        });
    }
    if order.status.is_terminal() {
        return Err(OpenmatchError::InvalidOrder {
            reason: format!("order is already {}", order.status),
        });
    }
    Ok(())
}
