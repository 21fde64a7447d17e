//! # Connections
//!
//! Every query gets its own connection, opened through a [`Connector`]
//! and dropped when the query's stream ends. Nothing is pooled.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens fresh bidirectional byte streams to the query service.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self) -> io::Result<Self::Stream>;
}

/// Plain TCP to the service's HTTP port.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> io::Result<TcpStream> {
        tracing::trace!(addr = %self.addr, "opening connection");
        TcpStream::connect(&self.addr).await
    }
}
