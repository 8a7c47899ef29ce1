//! # openmatch-core
//!
//! The Order Service: validates, locks, stores, and matches orders over
//! the `openmatch-ledger` Ledger and the `openmatch-matchcore` matching
//! engine.
//!
//! - [`OrderValidator`] (module [`validator`]): the six-step pure
//!   predicate layer of spec §4.3.
//! - [`store::OrderStore`]: the Order Store of spec §4.2.
//! - [`OrderService`]: the façade exposing `place_order`, `cancel_order`,
//!   `get_user_orders`, and `get_order_book` (spec §6).
//!
//! `place_order` is the only place the three collaborators meet: it
//! validates against the Ledger, locks funds, inserts the order OPEN,
//! then hands the taker to the matcher, which settles each fill back
//! through the same Ledger.

pub mod service;
pub mod store;
pub mod validator;

pub use service::OrderService;
pub use store::OrderStore;
