//! Single memcached connection speaking the ASCII protocol

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::trace;

use turnstile_common::{Result, TurnstileError};

/// Longest key memcached accepts
const MAX_KEY_LENGTH: usize = 250;

/// Largest item memcached stores by default
const MAX_VALUE_LENGTH: usize = 1024 * 1024;

/// Relative expiry limit; larger values are read by memcached as unix time
const MAX_RELATIVE_EXPIRY_SECS: u64 = 60 * 60 * 24 * 30;

/// Convert a TTL into memcached's `exptime` field
///
/// `0` means no expiry. Sub-second TTLs round up to one second so that a
/// short TTL never turns into "forever".
pub(crate) fn exptime(ttl: Option<Duration>) -> u64 {
    let Some(ttl) = ttl else {
        return 0;
    };
    let mut secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs += 1;
    }
    if secs > MAX_RELATIVE_EXPIRY_SECS {
        chrono::Utc::now().timestamp().max(0) as u64 + secs
    } else {
        secs
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.len() > MAX_KEY_LENGTH
        || key.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
    {
        return Err(TurnstileError::Protocol(format!("invalid key '{}'", key)));
    }
    Ok(())
}

fn reply_error(command: &str, line: &str) -> TurnstileError {
    TurnstileError::Protocol(format!("{} failed: {}", command, line))
}

/// One TCP connection to a memcached server
///
/// A request that was written but whose reply was not fully read leaves the
/// connection in flight. Dropping the future at that point (a timeout or a
/// `select!` branch losing) makes the connection unusable, and the pool
/// discards it.
pub struct MemcachedConnection {
    stream: BufStream<TcpStream>,
    broken: bool,
    in_flight: bool,
}

impl MemcachedConnection {
    /// Dial `address`, giving up after `connect_timeout`
    pub async fn connect(address: &str, connect_timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", address),
                )
            })??;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream: BufStream::new(stream),
            broken: false,
            in_flight: false,
        })
    }

    /// Whether the stream is in an unknown state: an I/O or framing error, or
    /// an exchange abandoned before its reply was read
    pub fn is_broken(&self) -> bool {
        self.broken || self.in_flight
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let result = self.get_inner(key).await;
        self.track(result)
    }

    pub async fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;
        let command = format!(
            "set {} 0 {} {}\r\n{}\r\n",
            key,
            exptime(ttl),
            value.len(),
            value
        );
        let result = self.round_trip(&command).await;
        match self.track(result)?.as_str() {
            "STORED" => Ok(()),
            other => Err(reply_error("set", other)),
        }
    }

    pub async fn increment(&mut self, key: &str) -> Result<u64> {
        self.counter("incr", key).await
    }

    pub async fn decrement(&mut self, key: &str) -> Result<u64> {
        self.counter("decr", key).await
    }

    pub async fn delete(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let result = self.round_trip(&format!("delete {}\r\n", key)).await;
        match self.track(result)?.as_str() {
            "DELETED" => Ok(true),
            "NOT_FOUND" => Ok(false),
            other => Err(reply_error("delete", other)),
        }
    }

    async fn counter(&mut self, command: &str, key: &str) -> Result<u64> {
        validate_key(key)?;
        let result = self.round_trip(&format!("{} {} 1\r\n", command, key)).await;
        let line = self.track(result)?;
        if line == "NOT_FOUND" {
            return Err(TurnstileError::KeyNotFound(key.to_string()));
        }
        if line.starts_with("CLIENT_ERROR") && line.contains("non-numeric") {
            return Err(TurnstileError::NotANumber {
                key: key.to_string(),
                value: line,
            });
        }
        line.parse::<u64>()
            .map_err(|_| reply_error(command, &line))
    }

    async fn get_inner(&mut self, key: &str) -> Result<Option<String>> {
        let header = self.round_trip(&format!("get {}\r\n", key)).await?;
        if header == "END" {
            return Ok(None);
        }

        // VALUE <key> <flags> <bytes>
        let mut parts = header.split_ascii_whitespace();
        let (Some("VALUE"), Some(_), Some(_), Some(len)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(self.framing_error(reply_error("get", &header)));
        };
        let len = match len.parse::<usize>() {
            Ok(len) if len <= MAX_VALUE_LENGTH => len,
            _ => return Err(self.framing_error(reply_error("get", &header))),
        };

        let mut data = vec![0u8; len + 2];
        self.stream.read_exact(&mut data).await?;
        data.truncate(len);

        let end = self.read_line().await?;
        if end != "END" {
            return Err(self.framing_error(reply_error("get", &end)));
        }

        String::from_utf8(data)
            .map(Some)
            .map_err(|_| TurnstileError::Protocol(format!("value of '{}' is not utf-8", key)))
    }

    async fn round_trip(&mut self, command: &str) -> Result<String> {
        trace!(command = %command.lines().next().unwrap_or_default(), "memcached request");
        // Cleared by `track` once the caller has consumed the whole reply
        self.in_flight = true;
        self.stream.write_all(command.as_bytes()).await?;
        self.stream.flush().await?;
        let line = self.read_line().await?;
        if line == "ERROR" || line.starts_with("SERVER_ERROR") {
            return Err(reply_error(command.split(' ').next().unwrap_or_default(), &line));
        }
        Ok(line)
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.stream.read_line(&mut line).await?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "memcached closed the connection",
            )
            .into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn framing_error(&mut self, err: TurnstileError) -> TurnstileError {
        self.broken = true;
        err
    }

    /// Finish an exchange; every public command ends here
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        self.in_flight = false;
        if matches!(result, Err(TurnstileError::Io(_))) {
            self.broken = true;
        }
        result
    }
}
