//! One-shot relay calls to the maze game server.
//!
//! Every call opens a fresh TCP connection, writes the command bytes as-is
//! (no framing, no terminator), waits for the reply, and closes the
//! connection. Nothing is shared between calls: concurrent calls use
//! concurrent sockets and resolve independently.
//!
//! The whole exchange (connect, write, read) runs under a single timeout so
//! a game server that accepts but never answers cannot pin a socket forever.

use std::time::Duration;

use mazebridge_proto::Command;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default game server address.
const DEFAULT_BACKEND_ADDR: &str = "localhost:12345";

/// Default upper bound for one relay call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum reply size in bytes (64 KB).
const DEFAULT_MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Largest accepted `max_response_size` (16 MiB).
pub const MAX_RESPONSE_SIZE_LIMIT: usize = 16 * 1024 * 1024;

/// Buffer reserved up front for a single read; never the whole cap.
const READ_CHUNK_CAPACITY: usize = 64 * 1024;

/// How the game server's reply is read off the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ReadMode {
    /// The first chunk received is the whole reply. A reply split across
    /// several TCP segments is truncated to the first one, and one read
    /// returns at most 64 KB.
    #[default]
    FirstChunk,
    /// Accumulate until the game server closes its side of the connection.
    UntilEof,
}

/// Errors a relay call can hit. Only used for logging: callers of
/// [`BackendClient::send`] see every variant as `None`.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The TCP connection could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialed.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the command failed.
    #[error("failed to write command: {0}")]
    Write(#[source] std::io::Error),

    /// Reading the reply failed.
    #[error("failed to read reply: {0}")]
    Read(#[source] std::io::Error),

    /// The game server closed the connection before sending any byte.
    #[error("game server closed the connection without replying")]
    Closed,

    /// The call did not finish within the configured timeout.
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// Settings for reaching the game server.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Game server address (`host:port`).
    pub addr: String,
    /// Upper bound for a whole relay call.
    pub timeout: Duration,
    /// How the reply is read.
    pub read_mode: ReadMode,
    /// Replies are cut off after this many bytes.
    pub max_response_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_BACKEND_ADDR.to_string(),
            timeout: DEFAULT_TIMEOUT,
            read_mode: ReadMode::default(),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

/// Client that relays commands to the game server, one connection per call.
#[derive(Debug, Clone)]
pub struct BackendClient {
    config: BackendConfig,
}

impl BackendClient {
    /// Creates a client for the given game server settings.
    #[must_use]
    pub const fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    /// Relays a [`Command`] and returns the reply text, or `None` on failure.
    pub async fn send(&self, command: Command) -> Option<String> {
        self.relay(command.as_str(), command.as_bytes()).await
    }

    /// Relays an arbitrary command string verbatim.
    ///
    /// Failures are logged and collapsed to `None`; they never propagate.
    pub async fn send_raw(&self, command: &str) -> Option<String> {
        self.relay(command, command.as_bytes()).await
    }

    async fn relay(&self, command: &str, bytes: &[u8]) -> Option<String> {
        match self.exchange_with_timeout(bytes).await {
            Ok(reply) => {
                tracing::debug!(
                    command = %command,
                    backend = %self.config.addr,
                    reply_len = reply.len(),
                    "relay call succeeded"
                );
                Some(reply)
            }
            Err(e) => {
                tracing::warn!(
                    command = %command,
                    backend = %self.config.addr,
                    error = %e,
                    "relay call failed"
                );
                None
            }
        }
    }

    /// Relays a command string and reports the failure kind.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if connecting, writing or reading fails, if
    /// the game server hangs up without replying, or if the call exceeds
    /// the configured timeout.
    pub async fn try_send(&self, command: &str) -> Result<String, BackendError> {
        self.exchange_with_timeout(command.as_bytes()).await
    }

    async fn exchange_with_timeout(&self, command: &[u8]) -> Result<String, BackendError> {
        let timeout = self.config.timeout;
        tokio::time::timeout(timeout, self.exchange(command))
            .await
            .map_err(|_| BackendError::Timeout(timeout))?
    }

    /// Connect, write, read, close. The stream is dropped on every path out
    /// of this function, including when the surrounding timeout fires.
    async fn exchange(&self, command: &[u8]) -> Result<String, BackendError> {
        let mut stream = TcpStream::connect(&self.config.addr).await.map_err(|source| {
            BackendError::Connect {
                addr: self.config.addr.clone(),
                source,
            }
        })?;

        stream.write_all(command).await.map_err(BackendError::Write)?;

        let max = self.config.max_response_size;
        let reply = match self.config.read_mode {
            ReadMode::FirstChunk => read_first_chunk(&mut stream, max).await?,
            ReadMode::UntilEof => read_until_eof(&mut stream, max).await?,
        };
        drop(stream);

        Ok(String::from_utf8_lossy(&reply).into_owned())
    }
}

/// Performs exactly one read of at most `max` bytes.
async fn read_first_chunk(stream: &mut TcpStream, max: usize) -> Result<Vec<u8>, BackendError> {
    let limit = u64::try_from(max).unwrap_or(u64::MAX);
    let mut buf = Vec::with_capacity(max.min(READ_CHUNK_CAPACITY));
    let n = stream
        .take(limit)
        .read_buf(&mut buf)
        .await
        .map_err(BackendError::Read)?;
    if n == 0 {
        return Err(BackendError::Closed);
    }
    Ok(buf)
}

/// Reads until EOF or until `max` bytes have arrived.
async fn read_until_eof(stream: &mut TcpStream, max: usize) -> Result<Vec<u8>, BackendError> {
    let limit = u64::try_from(max).unwrap_or(u64::MAX);
    let mut buf = Vec::new();
    stream
        .take(limit)
        .read_to_end(&mut buf)
        .await
        .map_err(BackendError::Read)?;
    if buf.is_empty() {
        return Err(BackendError::Closed);
    }
    Ok(buf)
}
