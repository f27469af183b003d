//! Reliable send and bounded receive over a stream socket.

use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A write failed before the whole buffer was transmitted.
#[derive(Debug)]
pub struct PartialSend {
    /// Bytes the socket accepted before the failure.
    pub sent: usize,
    /// The write error that stopped the transmission.
    pub source: io::Error,
}

impl std::fmt::Display for PartialSend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "send stopped after {} bytes: {}", self.sent, self.source)
    }
}

impl std::error::Error for PartialSend {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Transmit an entire buffer, retrying until every byte is accepted.
///
/// A single write on a stream socket may accept fewer bytes than offered,
/// so this loops, advancing an offset by whatever each write accepted,
/// until the buffer is exhausted or a write fails. On failure the error
/// carries how many bytes actually went out.
pub async fn send_all<S>(stream: &mut S, buf: &[u8]) -> Result<usize, PartialSend>
where
    S: AsyncWrite + Unpin,
{
    let mut sent = 0;
    while sent < buf.len() {
        match stream.write(&buf[sent..]).await {
            Ok(0) => {
                return Err(PartialSend {
                    sent,
                    source: io::Error::new(io::ErrorKind::WriteZero, "socket accepted no bytes"),
                })
            }
            Ok(n) => sent += n,
            Err(e) => return Err(PartialSend { sent, source: e }),
        }
    }
    Ok(sent)
}

/// Read one message of at most `limit` bytes.
///
/// Exactly one read call: a short read is the entire message. There is no
/// framing that distinguishes "more data coming" from "message complete",
/// and anything beyond `limit` is left unread.
pub async fn recv_once<S>(stream: &mut S, limit: usize) -> io::Result<BytesMut>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(limit);
    buf.resize(limit, 0);

    let n = stream.read(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}
