use crate::buffer::BufExt;
use crate::client::{Communicator, RequestGroup};
use crate::collective::helpers::{
    check_count, check_root, collective_error, collective_recv, collective_wait,
};
use crate::error::Result;
use crate::reduce::Element;
use crate::types::{Rank, Tag};

/// Root sends `src[r]` to every rank `r`, which receives it into `dst`.
///
/// `src` is only read at the root and must hold one buffer per rank there.
pub(crate) async fn scatter<T: Element>(
    comm: &Communicator,
    root: Rank,
    tag: Tag,
    src: &[&[T]],
    dst: &mut [T],
) -> Result<()> {
    check_root(comm, root)?;
    let rank = comm.rank();

    if rank != root {
        collective_recv(comm, root, tag, dst, "scatter").await?;
        return Ok(());
    }

    check_count("scatter", comm.size(), src.len())?;
    let mut sends = RequestGroup::new();
    for (peer, &slot) in (0..comm.size()).zip(src) {
        if peer == rank {
            continue;
        }
        let req = comm
            .send_nb(peer, tag, slot)
            .await
            .map_err(collective_error("scatter", peer))?;
        sends.push_for(peer, req);
    }
    dst.copy_from_truncating(src[rank as usize]);
    collective_wait(sends, "scatter").await
}
