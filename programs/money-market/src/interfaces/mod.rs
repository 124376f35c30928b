//! Interfaces for external collaborators (oracle, rate model, transfers, roles)

pub mod oracle;
pub mod irm;
pub mod token;
pub mod auth;

pub use oracle::*;
pub use irm::*;
pub use token::*;
pub use auth::*;
