//! Error types for the OpenMatch matching engine.
//!
//! All errors use the `OM_ERR_` prefix convention for easy grepping in logs.
//! The six kinds mirror the spec's error table (§7) exactly; the outer layer
//! maps each to an HTTP or transport status.
//! - 1xx: Order errors
//! - 2xx: Balance errors
//! - 3xx: Validation errors
//! - 9xx: Concurrency / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::OrderId;

/// Central error enum for all OpenMatch operations.
#[derive(Debug, Error)]
pub enum OpenmatchError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// Cancel or fetch on a missing id.
    #[error("OM_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// lock/withdraw/settle found `available < required`.
    #[error("OM_ERR_200: Insufficient balance: need {required} {currency}, have {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
        currency: String,
    },

    /// Non-positive amount or price given to the Ledger or Validator.
    #[error("OM_ERR_201: Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: Decimal },

    /// Explicit `get_wallet` found no row.
    #[error("OM_ERR_202: No {currency} wallet for user {user_id}")]
    WalletNotFound { user_id: String, currency: String },

    // =================================================================
    // Validation Errors (3xx)
    // =================================================================
    /// Pair inactive, bad side/type, notional out of range, owner
    /// mismatch, or wrong status for cancel.
    #[error("OM_ERR_300: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    // =================================================================
    // Concurrency / Internal (9xx)
    // =================================================================
    /// Transaction retry budget exhausted under contention.
    #[error("OM_ERR_900: Concurrency conflict during {operation}")]
    ConcurrencyConflict { operation: String },

    /// Unrecoverable internal error.
    #[error("OM_ERR_901: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenmatchError>;
