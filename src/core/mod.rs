//! Core domain: money, ledgers and the pure balance engine

pub mod balance;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod expense;
pub mod itinerary;
pub mod log;
pub mod obligation;
pub mod plan;
pub mod rate;
pub mod record;
pub mod roster;
pub mod settlement;
pub mod stats;

// Re-export main types for cleaner imports
pub use currency::{Currency, CurrencyRateProvider};
pub use error::ValidationError;
pub use roster::{ParticipantId, Session};
