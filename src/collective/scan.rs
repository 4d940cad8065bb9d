use crate::buffer::BufExt;
use crate::client::Communicator;
use crate::collective::helpers::{collective_exchange, collective_recv, collective_send};
use crate::error::Result;
use crate::reduce::{Element, Operator};
use crate::types::{Rank, Tag};

/// Recursive doubling over ranks `lowest..size`.
///
/// Round `k` sends to `rank + 2^k` and merges what `rank - 2^k` sent, so
/// after all rounds `buf` holds the combination of ranks `lowest..=rank`.
async fn doubling_rounds<T: Element, O: Operator<T>>(
    comm: &Communicator,
    tag: Tag,
    buf: &mut [T],
    op: &O,
    lowest: Rank,
    operation: &'static str,
) -> Result<()> {
    let rank = comm.rank();
    let size = comm.size();
    let mut temp = buf.temporary_view();

    let mut skip: u32 = 1;
    loop {
        let to = rank.checked_add(skip).filter(|&r| r < size);
        let from = rank.checked_sub(skip).filter(|&r| r >= lowest);
        match (to, from) {
            (Some(to), Some(from)) => {
                collective_exchange(comm, to, &*buf, from, &mut temp[..], tag, operation).await?;
                buf.reduction_view(op).merge_from(&temp);
            }
            (None, Some(from)) => {
                let mut view = buf.reduction_view(op);
                collective_recv(comm, from, tag, &mut view, operation).await?;
            }
            (Some(to), None) => {
                collective_send(comm, to, tag, &*buf, operation).await?;
            }
            (None, None) => break,
        }
        match skip.checked_shl(1) {
            Some(next) if next > skip => skip = next,
            _ => break,
        }
    }
    Ok(())
}

/// Inclusive prefix reduction: rank `i` ends with `buf[0] op .. op buf[i]`.
pub(crate) async fn inclusive_scan<T: Element, O: Operator<T>>(
    comm: &Communicator,
    tag: Tag,
    buf: &mut [T],
    op: &O,
) -> Result<()> {
    if comm.size() == 1 {
        return Ok(());
    }
    doubling_rounds(comm, tag, buf, op, 0, "scan").await
}

/// Exclusive prefix reduction: rank `i` ends with `buf[0] op .. op buf[i-1]`
/// and rank 0 with `initial` in every item.
///
/// Every rank first hands its input one rank up, replacing its own buffer
/// with the predecessor's; ranks above 0 then run the inclusive rounds
/// among themselves.
pub(crate) async fn exclusive_scan<T: Element, O: Operator<T>>(
    comm: &Communicator,
    tag: Tag,
    buf: &mut [T],
    op: &O,
    initial: T,
) -> Result<()> {
    let rank = comm.rank();
    let size = comm.size();

    if rank == 0 {
        if size > 1 {
            collective_send(comm, 1, tag, &*buf, "exclusive_scan").await?;
        }
        buf.fill(initial);
        return Ok(());
    }

    if rank + 1 < size {
        let mut temp = buf.temporary_view();
        collective_exchange(
            comm,
            rank + 1,
            &*buf,
            rank - 1,
            &mut temp[..],
            tag,
            "exclusive_scan",
        )
        .await?;
        buf.copy_from_truncating(&temp);
    } else {
        collective_recv(comm, rank - 1, tag, buf, "exclusive_scan").await?;
    }

    doubling_rounds(comm, tag, buf, op, 1, "exclusive_scan").await
}
