use crate::buffer::BufExt;
use crate::client::Communicator;
use crate::collective::helpers::{
    check_count, collective_exchange, ring_back, ring_offset, split_pair,
};
use crate::error::Result;
use crate::reduce::Element;
use crate::types::Tag;

/// Ring all-gather: every rank ends with rank `r`'s `src` in `dst[r]`.
///
/// In round `i` a rank passes slot `rank + i - 1` to its predecessor and
/// takes slot `rank + i` from its successor, so after `size - 1` rounds every
/// slot has travelled the whole ring using only neighbour traffic.
pub(crate) async fn ring_allgather<T: Element>(
    comm: &Communicator,
    tag: Tag,
    src: &[T],
    dst: &mut [&mut [T]],
) -> Result<()> {
    let size = comm.size();
    let rank = comm.rank();
    check_count("all_gather", size, dst.len())?;

    dst[rank as usize].copy_from_truncating(src);
    if size == 1 {
        return Ok(());
    }

    let pred = ring_back(rank, 1, size);
    let succ = ring_offset(rank, 1, size);
    for i in 1..size {
        let outgoing = ring_offset(rank, i - 1, size) as usize;
        let incoming = ring_offset(rank, i, size) as usize;
        let (send, recv) = split_pair(dst, outgoing, incoming);
        collective_exchange(comm, pred, send, succ, recv, tag, "all_gather").await?;
    }
    Ok(())
}
