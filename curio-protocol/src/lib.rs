//! # curio-protocol
//!
//! Wire dialect implementation for the legacy collections-management
//! protocol.
//!
//! This crate provides:
//! - Line-oriented message framing (indented JSON plus a CRLF terminator)
//! - Repair of the malformed JSON the server emits
//! - Typed request and response message shapes
//! - Protocol error types

pub mod error;
pub mod frame;
pub mod message;
pub mod repair;

pub use error::ProtocolError;
pub use frame::{encode_message, FrameDecoder, MESSAGE_INDENT, MESSAGE_TERMINATOR, RESPONSE_TAIL};
pub use message::{
    FetchFlag, FetchParams, FetchRequest, FindTermsRequest, LoginRequest, LogoutRequest,
    ResponseEnvelope, SortParams, SortRequest, LICENSE_ERROR_CODE, STATUS_ERROR, STATUS_OK,
};
pub use repair::repair;
