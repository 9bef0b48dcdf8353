//! The conversation core: section state machine, contour map store, tool
//! dispatcher, prompt context builder, live system lookups, and the
//! turn-processing orchestrator.

pub mod context;
pub mod contour;
pub mod dispatch;
pub mod error;
pub mod lookup;
pub mod runner;
pub mod state;

pub use error::EngineError;
pub use runner::{ConversationEngine, EngineConfig, IncomingFile, TurnOutcome};
