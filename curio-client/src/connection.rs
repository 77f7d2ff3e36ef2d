//! Connection management.

use crate::error::ClientError;
use bytes::Bytes;
use curio_protocol::FrameDecoder;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default bytes requested from the socket per read call (8 KiB).
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8192;

/// Minimum read chunk size (1 KiB).
pub const MIN_READ_CHUNK_SIZE: usize = 1024;

/// Maximum read chunk size (1 MiB).
pub const MAX_READ_CHUNK_SIZE: usize = 1024 * 1024;

/// Default timeout for connection establishment and for each read call.
/// The protocol has no native timeout or heartbeat, so waits are generous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server hostname or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Timeout applied to each socket read while waiting for a response.
    pub read_timeout: Duration,
    /// Bytes requested from the socket per read call.
    pub read_chunk_size: usize,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.clamp(MIN_READ_CHUNK_SIZE, MAX_READ_CHUNK_SIZE);
        self
    }
}

/// A connection to the server, exchanging one message per round trip.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    decoder: FrameDecoder,
    read_timeout: Duration,
    read_chunk_size: usize,
}

impl Connection {
    /// Opens a TCP connection per the configuration.
    pub async fn open(config: &SessionConfig) -> Result<Self, ClientError> {
        tracing::debug!("Connecting to {}:{}...", config.host, config.port);

        let stream = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| {
            tracing::debug!("Connection timeout");
            ClientError::Timeout
        })?
        .map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Io(e)
        })?;

        stream.set_nodelay(true).ok();

        Ok(Self {
            stream,
            decoder: FrameDecoder::new(),
            read_timeout: config.read_timeout,
            read_chunk_size: config.read_chunk_size,
        })
    }

    /// Sends one encoded message and reads until a complete response frame
    /// has accumulated.
    ///
    /// A zero-byte read before any response data is the empty-response
    /// condition; a zero-byte read mid-frame means the connection dropped.
    pub async fn round_trip(&mut self, request: &[u8]) -> Result<Bytes, ClientError> {
        // Stale bytes can only be left over from a failed round trip.
        self.decoder.clear();

        self.stream.write_all(request).await.map_err(ClientError::Io)?;

        let mut chunk = vec![0u8; self.read_chunk_size];
        loop {
            let n = tokio::time::timeout(self.read_timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| {
                    tracing::debug!("Read timeout");
                    ClientError::Timeout
                })?
                .map_err(ClientError::Io)?;

            tracing::debug!("Read {} bytes from socket", n);

            if n == 0 {
                if self.decoder.buffered() == 0 {
                    return Err(ClientError::EmptyResponse {
                        sent: String::from_utf8_lossy(request).into_owned(),
                    });
                }
                return Err(ClientError::ConnectionClosed);
            }

            self.decoder.extend(&chunk[..n]);
            if let Some(frame) = self.decoder.try_frame() {
                return Ok(frame);
            }
        }
    }

    /// Shuts down the stream.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        tracing::debug!("Shutting down connection");
        self.stream.shutdown().await.map_err(ClientError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::new("emu.example.org", 40000);
        assert_eq!(config.host, "emu.example.org");
        assert_eq!(config.port, 40000);
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
    }

    #[test]
    fn test_config_chunk_size_clamping() {
        let config = SessionConfig::new("127.0.0.1", 40000).with_read_chunk_size(100);
        assert_eq!(config.read_chunk_size, MIN_READ_CHUNK_SIZE);

        let config = SessionConfig::new("127.0.0.1", 40000).with_read_chunk_size(16 * 1024 * 1024);
        assert_eq!(config.read_chunk_size, MAX_READ_CHUNK_SIZE);
    }

    #[tokio::test]
    async fn test_round_trip_assembles_split_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            socket.read(&mut buf).await.unwrap();

            socket.write_all(b"{\r\n\t\"status\" : \"ok\"").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
            socket.write_all(b"\r\n}\r\n").await.unwrap();
        });

        let config = SessionConfig::new("127.0.0.1", addr.port());
        let mut conn = Connection::open(&config).await.unwrap();
        let frame = conn.round_trip(b"{\n        \"probe\": 1\n}\r\n").await.unwrap();
        assert_eq!(&frame[..], b"{\r\n\t\"status\" : \"ok\"\r\n}\r\n");
    }

    #[tokio::test]
    async fn test_round_trip_empty_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            socket.read(&mut buf).await.unwrap();
            // Close without replying.
        });

        let config = SessionConfig::new("127.0.0.1", addr.port());
        let mut conn = Connection::open(&config).await.unwrap();
        let err = conn.round_trip(b"{}\r\n").await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_round_trip_connection_closed_mid_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            socket.read(&mut buf).await.unwrap();
            socket.write_all(b"{\r\n\t\"status\" : \"ok\"").await.unwrap();
            // Close before the frame completes.
        });

        let config = SessionConfig::new("127.0.0.1", addr.port());
        let mut conn = Connection::open(&config).await.unwrap();
        let err = conn.round_trip(b"{}\r\n").await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_round_trip_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            socket.read(&mut buf).await.unwrap();
            // Hold the socket open without replying.
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let config =
            SessionConfig::new("127.0.0.1", addr.port()).with_read_timeout(Duration::from_millis(50));
        let mut conn = Connection::open(&config).await.unwrap();
        let err = conn.round_trip(b"{}\r\n").await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = SessionConfig::new("127.0.0.1", addr.port());
        let err = Connection::open(&config).await.unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }
}
