//! revise-core - Core library for revise.
//!
//! This crate provides the SM-2 scheduling strategies, the session queue
//! manager, and the SQLite-backed card store for the revise spaced
//! repetition engine.
//!
//! # Example
//!
//! ```ignore
//! use revise_core::{Engine, EngineConfig, Scope};
//!
//! let engine = Engine::with_sqlite(EngineConfig::default())?;
//!
//! // Start (or resume) a study session for user 1 over deck 7.
//! if let Some(overview) = engine.study(Scope::new(1, 7)).await? {
//!     let card = &overview.new_cards[0];
//!     // Good (3) on the current card.
//!     let outcome = engine.review(Scope::new(1, 7), card.id, 3, None).await?;
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{EngineConfig, StudyConfig};
pub use engine::Engine;
pub use error::{ErrorCode, ReviseError, ReviseResult};
pub use scheduler::{preview_intervals, QualityScale, RatingScale, ScaleStrategy};
pub use session::{ReviewOutcome, SessionManager, StudyOverview, StudyQueue};
pub use storage::SqliteStore;
pub use traits::{CardStore, ReviewTransaction, SessionProgress};
pub use types::{
    Card, Deck, Quality, Rating, ReviewEvent, ScheduleState, ScheduleUpdate, Scope, StudySession,
    DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR,
};
