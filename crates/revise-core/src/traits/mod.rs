//! Storage collaborator traits.

mod card_store;

pub use card_store::*;
