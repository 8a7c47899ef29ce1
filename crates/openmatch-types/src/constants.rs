//! System-wide constants for the OpenMatch matching engine.

use rust_decimal::Decimal;

/// Decimal scale for prices (2 places, e.g. "20000.00").
pub const PRICE_SCALE: u32 = 2;

/// Decimal scale for amounts, balances, and locked funds (8 places).
pub const AMOUNT_SCALE: u32 = 8;

/// Default minimum notional value (`price * amount`) for a new order, in
/// quote currency.
pub const MIN_NOTIONAL: Decimal = Decimal::from_parts(1000, 0, 0, false, 2);

/// Default maximum notional value for a new order, in quote currency.
pub const MAX_NOTIONAL: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 2);

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenMatch";
