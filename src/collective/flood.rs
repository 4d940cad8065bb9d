use crate::buffer::Buf;
use crate::client::{CommInner, CommRequest, Communicator, stage_into};
use crate::error::{CommError, Result};
use crate::protocol::FrameHeader;
use crate::transport::SendCompletion;
use crate::transport::mailbox::{Delivery, Envelope};
use crate::types::{DataType, Rank, Source, TagMatch};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Post a receive that forwards its message down the rank-0 tree.
///
/// Rank 0 accepts the message from anyone; every other rank takes it from
/// its parent. On arrival the message, cut to this rank's buffer length, is
/// re-sent under its own tag to each child, and the request only finishes
/// once those sends have.
pub(crate) async fn flood_receive_nb<'a, B: Buf + ?Sized>(
    comm: &Communicator,
    tag: TagMatch,
    buf: &'a mut B,
) -> Result<CommRequest<'a>> {
    let tree = comm.inner.tree(0).await;
    let source = match tree.parent {
        Some(parent) => {
            comm.inner.channel(parent).await?;
            Source::Rank(parent)
        }
        None => {
            for peer in 0..comm.size() {
                comm.inner.ensure_channel(peer).await?;
            }
            Source::Any
        }
    };
    for &child in &tree.children {
        comm.inner.ensure_channel(child).await?;
    }

    let delivery = comm.inner.group.mailbox().post(source, tag)?;
    let (env_tx, env_rx) = oneshot::channel();
    let (fwd_tx, fwd_rx) = oneshot::channel();
    tokio::spawn(forward(
        Arc::clone(&comm.inner),
        delivery,
        tree.children.clone(),
        buf.data_type(),
        buf.len(),
        env_tx,
        fwd_tx,
    ));
    Ok(CommRequest::for_flood(env_rx, stage_into(buf), fwd_rx))
}

async fn forward(
    inner: Arc<CommInner>,
    delivery: Delivery,
    children: Vec<Rank>,
    dtype: DataType,
    limit: usize,
    env_tx: oneshot::Sender<Result<Envelope>>,
    fwd_tx: oneshot::Sender<Vec<SendCompletion>>,
) {
    let env = match delivery.await {
        Ok(Ok(env)) => env,
        Ok(Err(e)) => {
            let _ = fwd_tx.send(Vec::new());
            let _ = env_tx.send(Err(e));
            return;
        }
        Err(_) => {
            let _ = fwd_tx.send(Vec::new());
            let _ = env_tx.send(Err(CommError::transport("flood receive abandoned")));
            return;
        }
    };

    let mut forwards = Vec::with_capacity(children.len());
    let mut failure = None;
    // A mismatched element type fails the request when staged; nothing is
    // passed on in that case.
    if env.dtype == dtype as u8 {
        let count = env.count.min(limit);
        let bytes = (count * dtype.size_in_bytes()).min(env.payload.len());
        for child in children {
            match inner.channel(child).await {
                Ok(channel) => {
                    tracing::trace!(rank = inner.rank, peer = child, tag = env.tag, "flood forward");
                    let header = FrameHeader::data(env.tag, env.dtype, count, bytes);
                    forwards.push(channel.send(header, env.payload[..bytes].to_vec()));
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
    }
    let _ = fwd_tx.send(forwards);
    let _ = env_tx.send(match failure {
        Some(e) => Err(e),
        None => Ok(env),
    });
}
