//! Oracle backends for scenar.
//!
//! REST clients for the Claude Messages API and OpenAI-compatible Chat
//! Completions endpoints, plus the timeout and transient-retry decorators the
//! application layer stacks on top of them.

mod http_error;

pub mod claude_oracle;
pub mod factory;
pub mod openai_oracle;
pub mod retry;
pub mod timeout;

pub use claude_oracle::ClaudeApiOracle;
pub use factory::{build_oracle, build_oracle_from_storage, with_retry};
pub use openai_oracle::OpenAiCompatOracle;
pub use retry::RetryingOracle;
pub use timeout::TimeoutOracle;
