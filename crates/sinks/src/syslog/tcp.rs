//! TCP syslog writer
//!
//! Frames each message with RFC 6587 octet counting (`LEN SP MSG`). The
//! connection is opened lazily on the first write; connect and write are
//! both bounded by timeouts. A failed write drops the connection and
//! surfaces the error; the sink decides what happens next.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::{Result, SinkError, SyslogWriter};

const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Syslog over TCP with octet-counted framing
#[derive(Debug)]
pub struct TcpSyslogWriter {
    target: String,
    connection_timeout: Duration,
    write_timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpSyslogWriter {
    /// Writer for `host:port`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            stream: None,
        }
    }

    /// Set connection timeout
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set write timeout
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    async fn connect(&self) -> Result<TcpStream> {
        let stream = match timeout(self.connection_timeout, TcpStream::connect(&self.target)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(SinkError::connection(&self.target, e)),
            Err(_) => {
                return Err(SinkError::connection(
                    &self.target,
                    std::io::Error::new(ErrorKind::TimedOut, "connection timed out"),
                ));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(
                target_addr = %self.target,
                error = %e,
                "failed to set TCP_NODELAY, continuing with default buffering"
            );
        }

        tracing::debug!(target_addr = %self.target, "connected to syslog drain");
        Ok(stream)
    }
}

#[async_trait]
impl SyslogWriter for TcpSyslogWriter {
    async fn write_message(&mut self, message: &str) -> Result<()> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };

        let frame = format!("{} {}", message.len(), message);
        let result = timeout(self.write_timeout, async {
            stream.write_all(frame.as_bytes()).await?;
            stream.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await;

        match result {
            Ok(Ok(())) => {
                self.stream = Some(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(SinkError::Io(e)),
            Err(_) => Err(SinkError::write("write timed out")),
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}
