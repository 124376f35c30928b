//! Risk engine, liquidation policy and reward flywheel

pub mod risk;
pub mod liquidation;
pub mod flywheel;

pub use risk::*;
pub use liquidation::*;
pub use flywheel::*;
