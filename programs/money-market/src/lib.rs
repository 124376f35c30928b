//! Collateralized Money Market Risk Engine
//!
//! A pooled lending protocol: each market takes deposits of one underlying
//! asset in exchange for interest-bearing shares and lends that asset to
//! borrowers who post collateral across other markets. A single risk engine
//! governs every market.
//!
//! ## Features
//! - Per-block interest accrual with a global borrow index and reserves
//! - Share-based supply accounting with first-deposit inflation protection
//! - Cross-market liquidity checks over the markets an account has entered
//! - Close-factor liquidations with an incentive and a protocol seize share
//! - Supply and borrow caps, guardian pause controls per action
//! - Reward flywheel for suppliers, borrowers and contributors
//! - CEI ordering, per-market reentrancy locks and all-or-nothing operations

pub mod constants;
pub mod errors;
pub mod events;
pub mod math;
pub mod state;
pub mod interfaces;
pub mod engine;
pub mod instructions;

pub use engine::{LiquidationEngine, LiquidationQuote, Liquidity, Markets, RewardFlywheel, RiskEngine};
pub use errors::RiskError;
pub use instructions::{MarketParams, MoneyMarket};
