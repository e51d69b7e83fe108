//! Core data types for the scheduling engine.

mod card;
mod review;
mod session;

pub use card::*;
pub use review::*;
pub use session::*;
