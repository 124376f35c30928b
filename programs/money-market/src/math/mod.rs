//! Math library modules for safe arithmetic operations

pub mod safe_math;
pub mod wad;
pub mod decimal;
pub mod shares;
pub mod interest;

pub use safe_math::*;
pub use wad::*;
pub use decimal::*;
pub use shares::*;
pub use interest::*;
