//! SQLite-backed collaborator for the adaptive mastery engine: record,
//! engagement and glossary storage, configuration, and the [`Tracker`] that
//! runs each learner action as one transaction.

pub mod config;
pub mod error;
pub mod json_bridge;
pub mod schema;
pub mod store;
pub mod tracker;

pub use config::EngineConfig;
pub use error::{Result, StoreError};
pub use store::{LearnerView, Store};
pub use tracker::{ExamReceipt, LookupReceipt, ReviewReceipt, Tracker};
