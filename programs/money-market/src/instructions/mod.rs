//! Market-level, admin, reward and view operations on a `MoneyMarket`

pub mod context;
pub mod admin;
pub mod market;
pub mod membership;
pub mod supply;
pub mod borrow;
pub mod liquidate;
pub mod rewards;
pub mod views;

pub use context::MoneyMarket;
pub use market::MarketParams;
