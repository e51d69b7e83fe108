//! Bounded study sessions over a deck scope.

mod manager;
mod queue;

pub use manager::{ReviewOutcome, SessionManager, StudyOverview};
pub use queue::StudyQueue;
