//! # openmatch-matchcore
//!
//! The Matching Engine: continuous price-time priority matching over an
//! in-memory [`OrderBook`], settling every fill through the
//! `openmatch-ledger` Ledger's `transfer_locked` primitive.
//!
//! - **Price-time priority**: best price first, FIFO within a price level.
//! - **Price-improvement**: every fill executes at the resting maker's price.
//! - **Self-trade skip-and-continue**: a same-user candidate is left
//!   resting untouched; matching proceeds to the next candidate.
//!
//! The book holds the *live* state of every resting order: a fill mutates
//! a maker's `filled_amount`/`status` in place inside the book, and that
//! is the authoritative copy until the caller persists it back to the
//! Order Store (`match_order`'s `touched_makers` return value exists for
//! exactly this). The book and the store are allowed to diverge between a
//! fill and that write-back; callers must not read a resting order's fill
//! state from the store without accounting for that window.

pub mod matcher;
pub mod orderbook;
pub mod price_level;

pub use matcher::match_order;
pub use orderbook::OrderBook;
pub use price_level::PriceLevel;
