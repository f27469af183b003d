//! TCP server for the one-request, one-reply exchange.
//!
//! Binds the first workable candidate address, then accepts connections
//! forever, spawning one independent task per connection. Each task reads
//! one message, asks the callback for a reply, transmits it fully, and
//! closes the connection.

use crate::config::{BACKLOG, MAX_DATA_SIZE};
use crate::error::Error;
use crate::resolver::{self, Role};
use crate::stream::{recv_once, send_all};
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Computes a reply from a received message.
///
/// Invoked concurrently from independent connection handlers, so it must
/// carry no unsynchronized mutable state of its own.
pub trait ReplyCallback: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static {}

impl<F> ReplyCallback for F where F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static {}

/// Walk candidates in resolver order; the first successful bind wins.
///
/// Address reuse is enabled on every attempt so a restarted server does
/// not fail on a lingering "address in use".
fn bind_first(candidates: &[SocketAddr], endpoint: &str) -> Result<Socket, Error> {
    for candidate in candidates {
        let socket = match Socket::new(
            Domain::for_address(*candidate),
            Type::STREAM,
            Some(Protocol::TCP),
        ) {
            Ok(socket) => socket,
            Err(e) => {
                debug!(candidate = %candidate, error = %e, "socket creation failed, trying next candidate");
                continue;
            }
        };

        if let Err(e) = socket.set_reuse_address(true) {
            debug!(candidate = %candidate, error = %e, "address reuse unavailable, trying next candidate");
            continue;
        }

        match socket.bind(&(*candidate).into()) {
            Ok(()) => {
                info!(address = %candidate, "bound");
                return Ok(socket);
            }
            Err(e) => {
                debug!(candidate = %candidate, error = %e, "bind failed, trying next candidate");
            }
        }
    }
    Err(Error::Bind(endpoint.to_string()))
}

/// Resolve, bind, and enter listening mode.
///
/// Bind failures fall through to the next candidate; a listen failure
/// after a successful bind is fatal.
pub async fn bind_listener(
    host: Option<&str>,
    port: &str,
    backlog: i32,
) -> Result<TcpListener, Error> {
    let endpoint = format!("{}:{}", host.unwrap_or(""), port);
    let candidates = resolver::resolve(host, port, Role::Server).await?;
    let socket = bind_first(&candidates, &endpoint)?;

    socket.listen(backlog).map_err(Error::Listen)?;
    socket.set_nonblocking(true).map_err(Error::Listen)?;
    TcpListener::from_std(socket.into()).map_err(Error::Listen)
}

/// Process one accepted connection end to end.
///
/// Any I/O failure here ends only this connection; nothing propagates back
/// to the accept loop. The stream closes when it drops.
async fn handle_connection<F>(
    mut stream: TcpStream,
    peer: SocketAddr,
    callback: Arc<F>,
    limit: usize,
) where
    F: ReplyCallback,
{
    let message = match recv_once(&mut stream, limit).await {
        Ok(message) => message,
        Err(e) => {
            warn!(peer = %peer, error = %e, "receive failed");
            return;
        }
    };

    let reply = callback(&message);

    if let Err(partial) = send_all(&mut stream, &reply).await {
        warn!(
            peer = %peer,
            sent = partial.sent,
            total = reply.len(),
            error = %partial.source,
            "reply send failed"
        );
    }
}

/// Accept connections forever, one detached handler task per connection.
///
/// Accept failures are logged and the loop continues; the loop never
/// blocks on a handler, so one slow connection cannot delay the next.
/// Dropping each join handle detaches the task, and the runtime reclaims
/// it when it finishes.
pub async fn accept_loop<F>(listener: TcpListener, callback: F, limit: usize) -> Infallible
where
    F: ReplyCallback,
{
    let callback = Arc::new(callback);
    info!("waiting for connections");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(peer = %peer, "got connection");
                let callback = Arc::clone(&callback);
                tokio::spawn(async move {
                    handle_connection(stream, peer, callback, limit).await;
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}

/// Serve on all local interfaces with the default limits.
///
/// Returns only on setup failure; once listening it runs until the
/// process is terminated externally.
pub async fn serve<F>(port: &str, callback: F) -> Result<Infallible, Error>
where
    F: ReplyCallback,
{
    let listener = bind_listener(None, port, BACKLOG).await?;
    Ok(accept_loop(listener, callback, MAX_DATA_SIZE - 1).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn spawn_echo_server() -> String {
        let listener = bind_listener(None, "0", BACKLOG).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(accept_loop(
            listener,
            |message: &[u8]| message.to_vec(),
            MAX_DATA_SIZE - 1,
        ));
        port.to_string()
    }

    #[tokio::test]
    async fn test_identity_round_trip() {
        let port = spawn_echo_server().await;
        let reply = client::send("localhost", &port, b"hello world")
            .await
            .unwrap();
        assert_eq!(&reply[..], b"hello world");
    }

    #[tokio::test]
    async fn test_round_trip_at_buffer_boundary() {
        let port = spawn_echo_server().await;

        let message: Vec<u8> = (0..MAX_DATA_SIZE - 1).map(|i| (i % 251) as u8).collect();
        let reply = client::send("localhost", &port, &message).await.unwrap();
        assert_eq!(&reply[..], &message[..]);
    }

    #[tokio::test]
    async fn test_oversized_message_truncates_at_boundary() {
        let port = spawn_echo_server().await;

        let message: Vec<u8> = (0..1500).map(|i| (i % 251) as u8).collect();
        let reply = client::send("localhost", &port, &message).await.unwrap();
        assert_eq!(reply.len(), MAX_DATA_SIZE - 1);
        assert_eq!(&reply[..], &message[..MAX_DATA_SIZE - 1]);
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_handlers() {
        let listener = bind_listener(None, "0", BACKLOG).await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        // Each invocation tags its reply with a fresh sequence number, so a
        // handler serving two sessions (or state leaking between them)
        // would show up as a repeated or skipped tag.
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        tokio::spawn(accept_loop(
            listener,
            move |message: &[u8]| {
                let seq = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let mut reply = format!("{seq}:").into_bytes();
                reply.extend_from_slice(message);
                reply
            },
            MAX_DATA_SIZE - 1,
        ));

        let first = client::send("localhost", &port, b"alpha").await.unwrap();
        let second = client::send("localhost", &port, b"beta").await.unwrap();

        assert_eq!(&first[..], b"1:alpha");
        assert_eq!(&second[..], b"2:beta");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_many_sequential_connections() {
        let port = spawn_echo_server().await;

        for i in 0..32u32 {
            let message = format!("message-{i}");
            let reply = client::send("localhost", &port, message.as_bytes())
                .await
                .unwrap();
            assert_eq!(&reply[..], message.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_serve_scenario_port_9034() {
        tokio::spawn(async {
            let _ = serve("9034", |message: &[u8]| message.to_vec()).await;
        });

        // The server binds asynchronously; retry until it is reachable.
        let mut reply = None;
        for _ in 0..50 {
            match client::send("localhost", "9034", b"hello world").await {
                Ok(r) => {
                    reply = Some(r);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }

        assert_eq!(
            &reply.expect("server never became reachable")[..],
            b"hello world"
        );
    }

    #[tokio::test]
    async fn test_bind_on_taken_port_fails() {
        let first = bind_listener(None, "0", BACKLOG).await.unwrap();
        let port = first.local_addr().unwrap().port().to_string();

        let second = bind_listener(Some("::"), &port, BACKLOG).await;
        assert!(matches!(second, Err(Error::Bind(_))));
    }
}
