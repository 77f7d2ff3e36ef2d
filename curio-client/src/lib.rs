//! # curio-client
//!
//! Client library for Curio collection servers.
//!
//! This crate provides:
//! - Async TCP session with login/logout lifecycle
//! - Term-based search over collection tables
//! - Server-side sort and paged fetch of result sets
//! - Timestamp parsing for server audit columns

pub mod connection;
pub mod datetime;
pub mod error;
pub mod query;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use connection::{Connection, SessionConfig};
pub use curio_protocol::FetchFlag;
pub use datetime::{parse_datetime, DATETIME_FORMAT};
pub use error::ClientError;
pub use query::{Module, QueryResult, Term, TermOperator, DEFAULT_PAGE_SIZE};
pub use session::Session;
