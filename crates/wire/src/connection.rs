//! Framed TCP connection.

use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::codec;
use crate::error::{Result, WireError};
use crate::protocol::{Request, Response};

/// A TCP stream exchanging whole frames.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    /// Connects to `addr`, giving up after `timeout`.
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| WireError::ConnectTimeout {
                addr: addr.to_string(),
            })??;
        stream.set_nodelay(true)?;
        tracing::trace!(addr, "tcp connection established");
        Self::from_stream(stream)
    }

    /// Wraps an accepted or already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        let peer = stream.peer_addr()?;
        Ok(Self { stream, peer })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub async fn send<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        codec::write_frame(&mut self.stream, msg).await
    }

    /// Next message, or `None` once the peer has closed the stream.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        codec::read_frame(&mut self.stream).await
    }

    /// Sends `request` and waits for its response.
    pub async fn request(&mut self, request: &Request) -> Result<Response> {
        self.send(request).await?;
        match self.recv().await? {
            Some(response) => Ok(response),
            None => Err(WireError::Closed),
        }
    }

    /// Shuts down the write half; the peer sees end of stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
