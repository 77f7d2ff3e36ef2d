//! # curio
//!
//! Async client for Curio collection servers.
//!
//! This facade re-exports the crates that make up the client:
//! - [`curio_protocol`]: framing, JSON repair, message shapes
//! - [`curio_client`]: sessions, term search, paged fetch
//!
//! ## Example
//!
//! ```no_run
//! use curio::{Module, Session, SessionConfig, Term};
//!
//! # async fn run() -> Result<(), curio::ClientError> {
//! let config = SessionConfig::new("curio.example.org", 40000);
//! let mut session = Session::establish(config, "emu", "secret").await?;
//!
//! let mut term = Term::default();
//! term.add("NarTitle", "Waterfall", None);
//!
//! let narratives = Module::new("enarratives");
//! let result = narratives.find_terms(&mut session, &term).await?;
//! let records = result.fetch_all(&mut session, None, 100, None).await?;
//!
//! session.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub use curio_client::{
    parse_datetime, ClientError, Connection, FetchFlag, Module, QueryResult, Session,
    SessionConfig, Term, TermOperator, DATETIME_FORMAT, DEFAULT_PAGE_SIZE,
};
pub use curio_protocol::{
    encode_message, repair, FrameDecoder, ProtocolError, ResponseEnvelope, LICENSE_ERROR_CODE,
    MESSAGE_TERMINATOR, RESPONSE_TAIL, STATUS_ERROR, STATUS_OK,
};
