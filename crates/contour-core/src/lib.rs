//! Shared vocabulary for the contour interview engine: branded ids,
//! conversation messages, the contour map document, session state, tool
//! definitions, and the chat-gateway boundary.

pub mod context;
pub mod contour;
pub mod errors;
pub mod gateway;
pub mod ids;
pub mod messages;
pub mod session;
pub mod tools;
