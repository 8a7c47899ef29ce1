//! The Order Store (spec §4.2): durable order records plus the queries
//! the rest of the engine needs. This in-process implementation keeps
//! every order in a `RwLock<HashMap>`; a real deployment backs this with
//! the persisted schema in spec §6 (`order` table, indexed on
//! `(pair_symbol, status)` and `(user_id, created_at)`).

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use openmatch_types::{OpenmatchError, Order, OrderId, OrderStatus, Result, UserId};

/// In-memory Order Store. Issues monotonically increasing [`OrderId`]s
/// and answers the lookups `OrderService` needs.
pub struct OrderStore {
    next_id: AtomicU64,
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Issues the next order id. Called once per `place_order`, before
    /// the order is inserted.
    pub fn next_id(&self) -> OrderId {
        OrderId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Inserts a new order. Overwrites silently if an id is reused (never
    /// happens in practice — ids come from `next_id`).
    pub fn insert(&self, order: Order) {
        self.orders.write().unwrap().insert(order.id, order);
    }

    /// Fetch an order by id.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if no such order exists.
    pub fn get(&self, id: OrderId) -> Result<Order> {
        self.orders
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(OpenmatchError::OrderNotFound(id))
    }

    /// Persists an order's new state (after a fill or cancellation).
    pub fn update(&self, order: Order) {
        self.orders.write().unwrap().insert(order.id, order);
    }

    /// Orders for a user, optionally filtered by status and/or pair
    /// symbol, newest first.
    #[must_use]
    pub fn list_user_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        pair_symbol: Option<&str>,
    ) -> Vec<Order> {
        let mut out: Vec<Order> = self
            .orders
            .read()
            .unwrap()
            .values()
            .filter(|o| o.user_id == user_id)
            .filter(|o| status.is_none_or(|s| o.status == s))
            .filter(|o| pair_symbol.is_none_or(|p| o.market.symbol() == p))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
