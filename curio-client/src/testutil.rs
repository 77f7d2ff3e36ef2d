//! In-process stub server for exercising the client against scripted
//! responses.
//!
//! Fixture frames are written the way the server actually formats them:
//! tab indentation, `" : "` key separators, CRLF line endings. The repair
//! scanner is calibrated to that layout, so fixtures must never be produced
//! with a standards-compliant pretty printer.

use crate::connection::SessionConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One scripted exchange: a request is read, then the reply is performed.
pub enum StubReply {
    /// Write a complete frame.
    Frame(String),
    /// Write a frame in timed pieces.
    Chunked(Vec<String>),
    /// Write these bytes, then close the connection.
    PartialThenClose(Vec<u8>),
    /// Close the connection without writing.
    Close,
}

/// A single-connection server that answers from a script and records every
/// request it received.
pub struct StubServer {
    addr: SocketAddr,
    handle: JoinHandle<Vec<String>>,
}

impl StubServer {
    pub async fn start(script: Vec<StubReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut captured = Vec::new();

            for reply in script {
                captured.push(read_request(&mut socket).await);
                match reply {
                    StubReply::Frame(text) => {
                        socket.write_all(text.as_bytes()).await.unwrap();
                    }
                    StubReply::Chunked(pieces) => {
                        for piece in pieces {
                            socket.write_all(piece.as_bytes()).await.unwrap();
                            socket.flush().await.unwrap();
                            tokio::time::sleep(Duration::from_millis(5)).await;
                        }
                    }
                    StubReply::PartialThenClose(bytes) => {
                        socket.write_all(&bytes).await.unwrap();
                        return captured;
                    }
                    StubReply::Close => return captured,
                }
            }

            captured
        });

        Self { addr, handle }
    }

    /// Session configuration pointing at this stub.
    pub fn config(&self) -> SessionConfig {
        SessionConfig::new("127.0.0.1", self.addr.port())
    }

    /// Waits for the script to finish and returns the captured requests.
    pub async fn finish(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}

/// Requests end with the CRLF terminator; the JSON body itself only ever
/// contains LF line breaks, so the first CRLF closes the request.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.ends_with(b"\r\n") {
            break;
        }
    }
    String::from_utf8(buf).unwrap()
}

/// Parses a captured request back into a JSON value.
pub fn parse_request(request: &str) -> serde_json::Value {
    serde_json::from_str(request.trim_end()).unwrap()
}

pub fn login_reply(context: &str) -> String {
    format!("{{\r\n\t\"status\" : \"ok\",\r\n\t\"context\" : \"{context}\"\r\n}}\r\n")
}

pub fn ok_reply() -> String {
    "{\r\n\t\"status\" : \"ok\"\r\n}\r\n".to_string()
}

pub fn status_reply(status: &str) -> String {
    format!("{{\r\n\t\"status\" : \"{status}\"\r\n}}\r\n")
}

pub fn error_reply(code: i64) -> String {
    format!("{{\r\n\t\"status\" : \"error\",\r\n\t\"code\" : {code}\r\n}}\r\n")
}

/// Reply to a search: the result-set id and the total match count.
pub fn find_reply(id: u64, count: u64) -> String {
    format!("{{\r\n\t\"status\" : \"ok\",\r\n\t\"id\" : {id},\r\n\t\"result\" : {count}\r\n}}\r\n")
}

/// Reply to a fetch: one page of rows carrying the given row numbers.
pub fn page_reply(id: u64, rownums: &[u64]) -> String {
    let mut rows = String::new();
    for (i, rownum) in rownums.iter().enumerate() {
        rows.push_str("\t\t\t{\r\n\t\t\t\t\"rownum\" : ");
        rows.push_str(&rownum.to_string());
        rows.push_str("\r\n\t\t\t}");
        if i + 1 < rownums.len() {
            rows.push(',');
        }
        rows.push_str("\r\n");
    }
    format!(
        "{{\r\n\t\"status\" : \"ok\",\r\n\t\"id\" : {id},\r\n\t\"result\" : {{\r\n\t\t\"rows\" : [\r\n{rows}\t\t]\r\n\t}}\r\n}}\r\n"
    )
}
