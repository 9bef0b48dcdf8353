//! Model Gateway implementations: the Anthropic Messages API adapter, a
//! retry wrapper for retryable gateway errors, the interview tool catalog,
//! and a scripted mock for deterministic tests.

pub mod anthropic;
pub mod catalog;
pub mod convert;
pub mod mock;
pub mod retry;

pub use anthropic::AnthropicGateway;
pub use retry::{ReliableGateway, RetryConfig};
