//! State records owned by the engine and its markets

pub mod protocol;
pub mod market;
pub mod membership;
pub mod rewards;

pub use protocol::*;
pub use market::*;
pub use membership::*;
pub use rewards::*;
