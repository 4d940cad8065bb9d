use crate::buffer::BufExt;
use crate::client::Communicator;
use crate::collective::helpers::{collective_exchange, collective_recv, collective_send};
use crate::error::{CommError, Result};
use crate::reduce::{Element, Operator};
use crate::types::{ReduceOp, Tag};

/// Butterfly all-reduce.
///
/// With `p2` the largest power of two not above `size`, ranks `p2..size`
/// fold into `rank - p2` before the butterfly and get the result back after
/// it. The `p2` inside ranks run `log2(p2)` rounds, exchanging with the
/// partner whose rank differs in one bit.
pub(crate) async fn butterfly_allreduce<T: Element, O: Operator<T>>(
    comm: &Communicator,
    tag: Tag,
    buf: &mut [T],
    op: &O,
) -> Result<()> {
    let size = comm.size();
    if size == 1 {
        return Ok(());
    }
    let rank = comm.rank();
    let p2 = comm.size_power_of_2();

    if rank >= p2 {
        let inside = rank - p2;
        collective_send(comm, inside, tag, &*buf, "all_reduce").await?;
        collective_recv(comm, inside, tag, buf, "all_reduce").await?;
        return Ok(());
    }

    let outside = rank + p2;
    let has_outside = outside < size;
    if has_outside {
        let mut view = buf.reduction_view(op);
        collective_recv(comm, outside, tag, &mut view, "all_reduce").await?;
    }

    let mut temp = buf.temporary_view();
    let mut round = 1;
    while round < p2 {
        let partner = rank ^ round;
        collective_exchange(comm, partner, &*buf, partner, &mut temp[..], tag, "all_reduce")
            .await?;
        buf.reduction_view(op).merge_from(&temp);
        round <<= 1;
    }

    if has_outside {
        collective_send(comm, outside, tag, &*buf, "all_reduce").await?;
    }
    Ok(())
}

/// Returns on every rank only after all ranks have entered.
pub(crate) async fn barrier(comm: &Communicator, tag: Tag) -> Result<()> {
    let mut empty: [i32; 0] = [];
    butterfly_allreduce(comm, tag, &mut empty[..], &ReduceOp::Sum)
        .await
        .map_err(|e| match e {
            CommError::CollectiveFailed { rank, reason, .. } => CommError::CollectiveFailed {
                operation: "barrier",
                rank,
                reason,
            },
            other => other,
        })
}
