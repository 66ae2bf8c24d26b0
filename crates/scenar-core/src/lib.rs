//! Domain layer of the Scenar engine.
//!
//! Holds the heuristic catalog and shortcode matching, the scenario and
//! routing-decision models, conversation state, the oracle capability and its
//! tagged reply type, session models, repository traits, configuration and
//! the shared error type. Nothing here performs I/O.

pub mod config;
pub mod conversation;
pub mod error;
pub mod heuristic;
pub mod oracle;
pub mod scenario;
pub mod session;

pub use error::{Result, ScenarError};
pub use oracle::{Oracle, OracleError, OracleMessage, OracleReply};
