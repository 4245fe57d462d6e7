//! Async transport for the accessibility agent.
//!
//! [`AgentClient`] owns one bidirectional stream and exchanges framed
//! [`Request`]/[`Response`] pairs over it, strictly one at a time.
//!
//! # Example
//!
//! ```no_run
//! use std::net::SocketAddr;
//! use autovid_core::agent_client::AgentClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let addr: SocketAddr = "127.0.0.1:8080".parse()?;
//! let mut client = AgentClient::new(addr);
//!
//! client.connect().await?;
//! client.heartbeat().await?;
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, debug_span, trace, Instrument};

use crate::protocol::{decode_response, encode_request, read_frame_length, ProtocolError, Request, Response};

/// Timeout for establishing a TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for reading one response frame.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Any bidirectional async byte stream the client can speak over.
pub trait AgentStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AgentStream for T {}

/// Errors that can occur during agent communication.
#[derive(Error, Debug)]
pub enum AgentClientError {
    /// Attempted to send a request without an active connection.
    #[error("not connected to agent")]
    NotConnected,

    /// Failed to establish a TCP connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// An I/O error occurred on the stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The agent answered with an error response.
    #[error("agent error: {0}")]
    AgentError(String),

    /// A read or connect exceeded its timeout.
    #[error("operation timed out")]
    Timeout,
}

/// A single-connection client for the accessibility agent.
pub struct AgentClient {
    stream: Option<Box<dyn AgentStream>>,
    addr: Option<SocketAddr>,
    read_timeout: Duration,
}

impl AgentClient {
    /// A disconnected client targeting `addr`.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            stream: None,
            addr: Some(addr),
            read_timeout: READ_TIMEOUT,
        }
    }

    /// A client over an already-open stream.
    pub fn from_stream(stream: impl AgentStream + 'static) -> Self {
        Self {
            stream: Some(Box::new(stream)),
            addr: None,
            read_timeout: READ_TIMEOUT,
        }
    }

    /// Overrides the per-response read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Open the TCP connection (5 s timeout).
    pub async fn connect(&mut self) -> Result<(), AgentClientError> {
        let addr = self
            .addr
            .ok_or_else(|| AgentClientError::ConnectionFailed("no address configured".into()))?;

        debug!(%addr, "connecting to agent");
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| AgentClientError::Timeout)?
            .map_err(|e| AgentClientError::ConnectionFailed(e.to_string()))?;
        stream.set_nodelay(true)?;

        self.stream = Some(Box::new(stream));
        debug!("connected to agent");
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.stream.take();
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Send `request` and wait for its response.
    ///
    /// An agent-side [`Response::Error`] is surfaced as
    /// [`AgentClientError::AgentError`].
    pub async fn send(&mut self, request: &Request) -> Result<Response, AgentClientError> {
        let span = debug_span!("agent_send", opcode = request.opcode_name());
        async {
            self.write_frame(&encode_request(request)).await?;
            let payload = self.read_frame().await?;
            match decode_response(&payload)? {
                Response::Error { message } => Err(AgentClientError::AgentError(message)),
                other => Ok(other),
            }
        }
        .instrument(span)
        .await
    }

    /// Ping the agent.
    pub async fn heartbeat(&mut self) -> Result<(), AgentClientError> {
        self.send(&Request::Heartbeat).await.map(|_| ())
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), AgentClientError> {
        let stream = self.stream.as_mut().ok_or(AgentClientError::NotConnected)?;
        trace!(frame_bytes = frame.len(), "writing frame");
        let written = match stream.write_all(frame).await {
            Ok(()) => stream.flush().await,
            Err(err) => Err(err),
        };
        written.map_err(|err| {
            self.stream.take();
            AgentClientError::Io(err)
        })
    }

    /// Read one frame and return its payload (opcode onward).
    ///
    /// On I/O failure or timeout the stream is discarded: a late reply would
    /// otherwise be read as the answer to the next request.
    async fn read_frame(&mut self) -> Result<Vec<u8>, AgentClientError> {
        let read_timeout = self.read_timeout;
        let stream = self.stream.as_mut().ok_or(AgentClientError::NotConnected)?;

        let outcome = timeout(read_timeout, async {
            let mut header = [0u8; 4];
            stream.read_exact(&mut header).await?;
            let len = read_frame_length(&header) as usize;
            trace!(payload_bytes = len, "reading frame");
            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload).await?;
            Ok::<_, std::io::Error>(payload)
        })
        .await;

        match outcome {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(err)) => {
                self.stream.take();
                Err(AgentClientError::Io(err))
            }
            Err(_) => {
                self.stream.take();
                Err(AgentClientError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_response;
    use tokio::io::DuplexStream;

    /// Reads one request frame from the server side of a duplex pipe and
    /// answers with `response`.
    async fn answer(server: &mut DuplexStream, response: &Response) -> Request {
        let mut header = [0u8; 4];
        server.read_exact(&mut header).await.unwrap();
        let mut payload = vec![0u8; read_frame_length(&header) as usize];
        server.read_exact(&mut payload).await.unwrap();
        server.write_all(&encode_response(response)).await.unwrap();
        server.flush().await.unwrap();
        crate::protocol::decode_request(&payload).unwrap()
    }

    #[test]
    fn new_client_is_disconnected() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let client = AgentClient::new(addr);
        assert!(!client.is_connected());
        assert_eq!(client.addr, Some(addr));
    }

    #[tokio::test]
    async fn send_without_connection_fails() {
        let mut client = AgentClient::new("127.0.0.1:0".parse().unwrap());
        let result = client.send(&Request::Heartbeat).await;
        assert!(matches!(result, Err(AgentClientError::NotConnected)));
    }

    #[tokio::test]
    async fn heartbeat_over_duplex() {
        let (client_end, mut server_end) = tokio::io::duplex(1024);
        let server = tokio::spawn(async move { answer(&mut server_end, &Response::Ok).await });

        let mut client = AgentClient::from_stream(client_end);
        client.heartbeat().await.unwrap();
        assert_eq!(server.await.unwrap(), Request::Heartbeat);
    }

    #[tokio::test]
    async fn agent_error_is_surfaced() {
        let (client_end, mut server_end) = tokio::io::duplex(1024);
        tokio::spawn(async move {
            answer(&mut server_end, &Response::Error { message: "element not found".into() }).await
        });

        let mut client = AgentClient::from_stream(client_end);
        let result = client.send(&Request::TapElement { selector: "missing".into() }).await;
        match result {
            Err(AgentClientError::AgentError(msg)) => assert_eq!(msg, "element not found"),
            other => panic!("expected AgentError, got: {other:?}"),
        }
        // Agent errors leave the connection usable.
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn closed_stream_drops_connection() {
        let (client_end, server_end) = tokio::io::duplex(1024);
        drop(server_end);

        let mut client = AgentClient::from_stream(client_end);
        let result = client.send(&Request::DumpTree).await;
        assert!(matches!(result, Err(AgentClientError::Io(_))));
        assert!(!client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_agent_times_out() {
        let (client_end, _server_end) = tokio::io::duplex(1024);
        let mut client =
            AgentClient::from_stream(client_end).with_read_timeout(Duration::from_millis(200));

        let result = client.send(&Request::Heartbeat).await;
        assert!(matches!(result, Err(AgentClientError::Timeout)));
        assert!(!client.is_connected());
    }
}
