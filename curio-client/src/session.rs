//! Session management: connection lifecycle, login context, request
//! dispatch.

use crate::connection::{Connection, SessionConfig};
use crate::error::ClientError;
use curio_protocol::{encode_message, repair, LoginRequest, LogoutRequest, ResponseEnvelope};
use serde::Serialize;
use serde_json::Value;

/// A session with the collections server.
///
/// Owns the connection and the login context. Every request method takes
/// `&mut self`: the protocol allows exactly one request in flight per
/// connection, and exclusive access keeps interleaving impossible without
/// any locking.
pub struct Session {
    config: SessionConfig,
    conn: Option<Connection>,
    context: Option<String>,
}

impl Session {
    /// Creates a session (not yet connected).
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            conn: None,
            context: None,
        }
    }

    /// Connects and logs in, returning the ready session.
    pub async fn establish(
        config: SessionConfig,
        username: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let mut session = Session::new(config);
        session.connect().await?;
        session.login(username, password).await?;
        Ok(session)
    }

    /// Opens the connection.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        tracing::info!("connecting to {}:{}", self.config.host, self.config.port);
        self.conn = Some(Connection::open(&self.config).await?);
        tracing::info!("connected");
        Ok(())
    }

    /// Closes the connection. Disconnecting a session that holds no open
    /// connection is an error.
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        tracing::info!("disconnecting from {}:{}", self.config.host, self.config.port);
        let mut conn = self.conn.take().ok_or(ClientError::NotConnected)?;
        conn.close().await?;
        tracing::info!("disconnected");
        Ok(())
    }

    /// Sends one message and returns the parsed, status-checked reply.
    ///
    /// The current context, if any, is attached to the outgoing message
    /// before serialization. The response frame is repaired before parsing;
    /// a reply whose status is not `"ok"` is an error, with the licensing
    /// code mapped to its own variant.
    pub async fn send<T: Serialize>(
        &mut self,
        message: &T,
    ) -> Result<ResponseEnvelope, ClientError> {
        let mut value = serde_json::to_value(message)?;
        if let (Some(context), Some(object)) = (self.context.as_ref(), value.as_object_mut()) {
            object.insert("context".to_string(), Value::String(context.clone()));
        }

        let encoded = encode_message(&value)?;
        let sent = String::from_utf8_lossy(&encoded).into_owned();
        tracing::debug!("Sent: {}", sent);

        let conn = self.conn.as_mut().ok_or(ClientError::NotConnected)?;
        let frame = conn.round_trip(&encoded).await?;

        let raw =
            std::str::from_utf8(&frame).map_err(|_| curio_protocol::ProtocolError::InvalidUtf8)?;
        tracing::debug!("Received: {}", raw);

        let repaired = repair(raw);
        let envelope: ResponseEnvelope = match serde_json::from_str(&repaired) {
            Ok(envelope) => envelope,
            Err(source) => {
                return Err(ClientError::MalformedResponse {
                    sent,
                    raw: raw.to_string(),
                    repaired: repaired.into_owned(),
                    source,
                });
            }
        };

        if envelope.is_ok() {
            Ok(envelope)
        } else if envelope.is_license_error() {
            Err(ClientError::License { envelope })
        } else {
            Err(ClientError::UnexpectedStatus { sent, envelope })
        }
    }

    /// Logs in and stores the issued context token.
    ///
    /// The server rejects reuse of credentials within a live context, so a
    /// second login without an intervening logout is refused locally.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<ResponseEnvelope, ClientError> {
        if let Some(context) = &self.context {
            return Err(ClientError::AlreadyLoggedIn {
                context: context.clone(),
            });
        }

        tracing::info!("logging in as {:?}", username);
        let envelope = self.send(&LoginRequest::new(username, password)).await?;
        match &envelope.context {
            Some(context) => self.context = Some(context.clone()),
            None => return Err(ClientError::MissingContext { envelope }),
        }
        tracing::info!("logged in");
        Ok(envelope)
    }

    /// Logs out and clears the context token.
    pub async fn logout(&mut self) -> Result<ResponseEnvelope, ClientError> {
        let context = self.context.clone().ok_or(ClientError::NotLoggedIn)?;

        tracing::info!("logging out from context {:?}", context);
        let envelope = self.send(&LogoutRequest::new(context)).await?;
        self.context = None;
        tracing::info!("logged out");
        Ok(envelope)
    }

    /// Returns the current login context, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns whether the session holds an open connection.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
