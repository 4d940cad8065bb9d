use crate::error::{CommError, Result};
use crate::protocol::{FrameHeader, FrameKind, HEADER_SIZE};
use crate::transport::mailbox::{Envelope, Mailbox};
use crate::types::Rank;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Resolves once a queued frame has been fully written (or failed).
pub(crate) type SendCompletion = oneshot::Receiver<Result<()>>;

struct Outgoing {
    header: FrameHeader,
    payload: Vec<u8>,
    done: oneshot::Sender<Result<()>>,
}

enum Link {
    /// Frames go straight into this rank's own mailbox.
    Loopback(Arc<Mailbox>),
    Tcp {
        queue: mpsc::UnboundedSender<Outgoing>,
        reader: JoinHandle<()>,
    },
}

/// An ordered, tag-multiplexed stream to one peer rank.
///
/// Frames are written in the order `send` is called; the writer task drains
/// a FIFO queue, so that order is the order the peer reads them in.
pub struct Channel {
    far_rank: Rank,
    link: Link,
}

impl Channel {
    /// A channel from a rank to itself.
    pub(crate) fn loopback(rank: Rank, mailbox: Arc<Mailbox>) -> Self {
        Self {
            far_rank: rank,
            link: Link::Loopback(mailbox),
        }
    }

    /// Wrap an established stream whose far end declared `far_rank`.
    ///
    /// Spawns the reader and writer tasks; must be called inside a tokio runtime.
    pub(crate) fn from_stream(
        stream: TcpStream,
        far_rank: Rank,
        mailbox: Arc<Mailbox>,
        max_frame_bytes: usize,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        let (queue, outgoing) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(writer, outgoing, far_rank));
        let reader = tokio::spawn(recv_loop(reader, far_rank, mailbox, max_frame_bytes));
        Self {
            far_rank,
            link: Link::Tcp { queue, reader },
        }
    }

    /// Rank of the far end.
    pub fn far_rank(&self) -> Rank {
        self.far_rank
    }

    pub fn is_loopback(&self) -> bool {
        matches!(self.link, Link::Loopback(_))
    }

    /// Queue a data frame. Never blocks; the returned receiver resolves once
    /// the frame has left this process (or, for loopback, reached the mailbox).
    pub(crate) fn send(&self, header: FrameHeader, payload: Vec<u8>) -> SendCompletion {
        let (done, completion) = oneshot::channel();
        match &self.link {
            Link::Loopback(mailbox) => {
                let result = mailbox.deliver(Envelope {
                    source: self.far_rank,
                    tag: header.tag,
                    dtype: header.dtype,
                    count: header.count as usize,
                    payload,
                });
                let _ = done.send(result);
            }
            Link::Tcp { queue, .. } => {
                if let Err(mpsc::error::SendError(out)) = queue.send(Outgoing {
                    header,
                    payload,
                    done,
                }) {
                    let _ = out.done.send(Err(CommError::PeerDisconnected {
                        rank: self.far_rank,
                    }));
                }
            }
        }
        completion
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        // The writer exits on its own once the queue sender is gone.
        if let Link::Tcp { reader, .. } = &self.link {
            reader.abort();
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("far_rank", &self.far_rank)
            .field("loopback", &self.is_loopback())
            .finish()
    }
}

/// Write one frame: header, then payload.
pub(crate) async fn write_frame(
    writer: &mut (impl AsyncWriteExt + Unpin),
    header: &FrameHeader,
    payload: &[u8],
) -> Result<()> {
    writer
        .write_all(&header.encode())
        .await
        .map_err(|e| CommError::transport_with_source("tcp write header", e))?;
    writer
        .write_all(payload)
        .await
        .map_err(|e| CommError::transport_with_source("tcp write payload", e))?;
    writer
        .flush()
        .await
        .map_err(|e| CommError::transport_with_source("tcp flush", e))?;
    Ok(())
}

/// Read one frame, rejecting payloads above `max_frame_bytes`.
pub(crate) async fn read_frame(
    reader: &mut (impl AsyncReadExt + Unpin),
    max_frame_bytes: usize,
) -> Result<(FrameHeader, Vec<u8>)> {
    let mut raw = [0u8; HEADER_SIZE];
    reader.read_exact(&mut raw).await?;
    let header = FrameHeader::decode(&raw)?;
    let len = usize::try_from(header.len)
        .ok()
        .filter(|&len| len <= max_frame_bytes)
        .ok_or_else(|| {
            CommError::DecodeFailed(format!(
                "frame of {} bytes exceeds limit of {max_frame_bytes}",
                header.len
            ))
        })?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok((header, payload))
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    far_rank: Rank,
) {
    while let Some(out) = outgoing.recv().await {
        match write_frame(&mut writer, &out.header, &out.payload).await {
            Ok(()) => {
                tracing::trace!(peer = far_rank, tag = out.header.tag, bytes = out.payload.len(), "frame sent");
                let _ = out.done.send(Ok(()));
            }
            Err(e) => {
                tracing::debug!(peer = far_rank, "tcp write failed: {e}");
                let _ = out.done.send(Err(e));
                break;
            }
        }
    }
    // Anything still queued can no longer be written.
    outgoing.close();
    while let Some(out) = outgoing.recv().await {
        let _ = out
            .done
            .send(Err(CommError::PeerDisconnected { rank: far_rank }));
    }
}

/// Background loop: read frames and hand them to the mailbox.
async fn recv_loop(
    mut reader: OwnedReadHalf,
    far_rank: Rank,
    mailbox: Arc<Mailbox>,
    max_frame_bytes: usize,
) {
    loop {
        let (header, payload) = match read_frame(&mut reader, max_frame_bytes).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(peer = far_rank, "tcp recv loop ended: {e}");
                mailbox.close_peer(far_rank, e.to_string());
                return;
            }
        };
        if header.kind != FrameKind::Data {
            tracing::warn!(peer = far_rank, "unexpected control frame, closing channel");
            mailbox.close_peer(far_rank, "unexpected control frame");
            return;
        }
        tracing::trace!(peer = far_rank, tag = header.tag, bytes = payload.len(), "frame received");
        let delivered = mailbox.deliver(Envelope {
            source: far_rank,
            tag: header.tag,
            dtype: header.dtype,
            count: header.count as usize,
            payload,
        });
        if let Err(e) = delivered {
            tracing::warn!(peer = far_rank, "dropping inbound frame: {e}");
            return;
        }
    }
}
