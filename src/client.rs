//! Client side of the exchange: connect with fallback, send one message,
//! read one reply.

use crate::config::MAX_DATA_SIZE;
use crate::error::Error;
use crate::resolver::{self, Role};
use crate::stream::{recv_once, send_all};
use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Walk candidates in resolver order; the first successful connect wins.
async fn connect_first(candidates: &[SocketAddr], endpoint: &str) -> Result<TcpStream, Error> {
    for candidate in candidates {
        match TcpStream::connect(candidate).await {
            Ok(stream) => {
                info!(peer = %candidate, "connected");
                return Ok(stream);
            }
            Err(e) => {
                debug!(candidate = %candidate, error = %e, "connect failed, trying next candidate");
            }
        }
    }
    Err(Error::Connect(endpoint.to_string()))
}

/// One-shot exchange with an explicit receive limit.
///
/// A partial send aborts the exchange before any reply is read; the
/// connection closes when the stream drops.
pub async fn exchange(
    host: &str,
    port: &str,
    message: &[u8],
    limit: usize,
) -> Result<BytesMut, Error> {
    let endpoint = format!("{host}:{port}");
    let candidates = resolver::resolve(Some(host), port, Role::Client).await?;
    let mut stream = connect_first(&candidates, &endpoint).await?;

    if let Err(partial) = send_all(&mut stream, message).await {
        warn!(
            sent = partial.sent,
            total = message.len(),
            "message only partially sent, aborting exchange"
        );
        return Err(Error::Io(partial.source));
    }

    let reply = recv_once(&mut stream, limit).await?;
    Ok(reply)
}

/// Send one message and block until the reply arrives.
pub async fn send(host: &str, port: &str, message: &[u8]) -> Result<BytesMut, Error> {
    exchange(host, port, message, MAX_DATA_SIZE - 1).await
}
