//! # openmatch-types
//!
//! Shared types, errors, and configuration for the **OpenMatch** matching engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`UserId`], [`TradeId`], [`MarketPair`]
//! - **Order model**: [`Order`], [`OrderSide`], [`OrderType`], [`OrderStatus`]
//! - **Trade model**: [`Trade`]
//! - **Pair model**: [`TradingPair`]
//! - **Balance model**: [`Wallet`], [`Currency`]
//! - **Configuration**: [`PairConfig`]
//! - **Errors**: [`OpenmatchError`] with `OM_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod order;
pub mod pair;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use openmatch_types::{Order, OrderSide, Trade, Wallet, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use pair::*;
pub use trade::*;

// Constants are accessed via `openmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
