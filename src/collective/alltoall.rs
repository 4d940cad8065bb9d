use crate::buffer::BufExt;
use crate::client::{Communicator, RequestGroup};
use crate::collective::helpers::{
    check_count, collective_error, collective_wait, ring_back, ring_offset,
};
use crate::error::{CommError, Result};
use crate::reduce::Element;
use crate::types::Tag;

/// Personalised exchange: `src[k]` on rank `i` lands in `dst[i]` on rank `k`.
///
/// All `size - 1` send-receive pairs (distance `i` sends to `rank + i` and
/// receives from `rank - i`) are issued before any is awaited.
pub(crate) async fn alltoall<T: Element>(
    comm: &Communicator,
    tag: Tag,
    src: &[&[T]],
    dst: &mut [&mut [T]],
) -> Result<()> {
    let size = comm.size();
    let rank = comm.rank();
    check_count("all_to_all", size, src.len())?;
    check_count("all_to_all", size, dst.len())?;

    dst[rank as usize].copy_from_truncating(src[rank as usize]);

    let mut slots: Vec<Option<&mut [T]>> = dst.iter_mut().map(|s| Some(&mut **s)).collect();
    let mut pending = RequestGroup::new();
    for i in 1..size {
        let to = ring_offset(rank, i, size);
        let from = ring_back(rank, i, size);
        let recv = slots[from as usize]
            .take()
            .ok_or_else(|| CommError::transport("all_to_all slot reused"))?;
        let req = comm
            .send_receive_nb(to, tag, src[to as usize], from, tag, recv)
            .await
            .map_err(collective_error("all_to_all", from))?;
        pending.push_for(from, req);
    }
    collective_wait(pending, "all_to_all").await
}
