use crate::buffer::Buf;
use crate::client::{Communicator, RequestGroup};
use crate::error::{CommError, Result};
use crate::types::{CommStatus, Rank, Tag};

/// Wrap a failure talking to `peer` as `CollectiveFailed`.
///
/// Argument errors and errors already wrapped by a nested collective pass
/// through unchanged.
pub(crate) fn collective_error(
    operation: &'static str,
    peer: Rank,
) -> impl FnOnce(CommError) -> CommError {
    move |e| match e {
        e if e.is_argument_error() => e,
        e @ CommError::CollectiveFailed { .. } => e,
        e => CommError::CollectiveFailed {
            operation,
            rank: peer,
            reason: e.to_string(),
        },
    }
}

/// Send within a collective, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_send<B: Buf + ?Sized>(
    comm: &Communicator,
    to: Rank,
    tag: Tag,
    buf: &B,
    operation: &'static str,
) -> Result<()> {
    comm.send(to, tag, buf)
        .await
        .map_err(collective_error(operation, to))
}

/// Receive within a collective, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_recv<B: Buf + ?Sized>(
    comm: &Communicator,
    from: Rank,
    tag: Tag,
    buf: &mut B,
    operation: &'static str,
) -> Result<CommStatus> {
    comm.receive(from, tag, buf)
        .await
        .map_err(collective_error(operation, from))
}

/// Send to `to` while receiving from `from`, both under `tag`.
pub(crate) async fn collective_exchange<S: Buf + ?Sized, R: Buf + ?Sized>(
    comm: &Communicator,
    to: Rank,
    send: &S,
    from: Rank,
    recv: &mut R,
    tag: Tag,
    operation: &'static str,
) -> Result<CommStatus> {
    comm.send_receive(to, tag, send, from, tag, recv)
        .await
        .map_err(collective_error(operation, from))
}

/// Wait for a collective's outstanding requests, naming the peer of the
/// first one that failed.
pub(crate) async fn collective_wait(
    requests: RequestGroup<'_>,
    operation: &'static str,
) -> Result<()> {
    requests.wait_all_attributed().await.map_err(|(peer, e)| match peer {
        Some(peer) => collective_error(operation, peer)(e),
        None => e,
    })
}

pub(crate) fn check_root(comm: &Communicator, root: Rank) -> Result<()> {
    comm.check_rank(root)
}

/// Array-of-buffer arguments must hold one buffer per rank.
pub(crate) fn check_count(operation: &'static str, expected: u32, actual: usize) -> Result<()> {
    if actual != expected as usize {
        return Err(CommError::BufferCountMismatch {
            operation,
            expected: expected as usize,
            actual,
        });
    }
    Ok(())
}

/// Borrow slot `read` shared and slot `write` mutably (`read != write`).
pub(crate) fn split_pair<'s, T>(
    slots: &'s mut [&mut [T]],
    read: usize,
    write: usize,
) -> (&'s [T], &'s mut [T]) {
    debug_assert_ne!(read, write);
    if read < write {
        let (lo, hi) = slots.split_at_mut(write);
        (&*lo[read], &mut *hi[0])
    } else {
        let (lo, hi) = slots.split_at_mut(read);
        (&*hi[0], &mut *lo[write])
    }
}

/// Rank `offset` steps after `rank` on a ring of `size`.
pub(crate) fn ring_offset(rank: Rank, offset: u32, size: u32) -> Rank {
    ((u64::from(rank) + u64::from(offset)) % u64::from(size)) as Rank
}

/// Rank `offset` steps before `rank` on a ring of `size`.
pub(crate) fn ring_back(rank: Rank, offset: u32, size: u32) -> Rank {
    ((u64::from(rank) + u64::from(size) - u64::from(offset % size)) % u64::from(size)) as Rank
}
