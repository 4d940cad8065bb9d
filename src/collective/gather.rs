use crate::buffer::BufExt;
use crate::client::{Communicator, RequestGroup};
use crate::collective::helpers::{
    check_count, check_root, collective_error, collective_send, collective_wait,
};
use crate::error::Result;
use crate::reduce::Element;
use crate::types::{Rank, Tag};

/// Every rank sends `src` to the root, which stores rank `r`'s data in `dst[r]`.
///
/// `dst` is only touched at the root and must hold one buffer per rank there.
pub(crate) async fn gather<T: Element>(
    comm: &Communicator,
    root: Rank,
    tag: Tag,
    src: &[T],
    dst: &mut [&mut [T]],
) -> Result<()> {
    check_root(comm, root)?;
    let rank = comm.rank();

    if rank != root {
        return collective_send(comm, root, tag, src, "gather").await;
    }

    check_count("gather", comm.size(), dst.len())?;
    let mut recvs = RequestGroup::new();
    for (peer, slot) in (0..comm.size()).zip(dst.iter_mut()) {
        if peer == rank {
            slot.copy_from_truncating(src);
            continue;
        }
        let req = comm
            .receive_nb(peer, tag, &mut **slot)
            .await
            .map_err(collective_error("gather", peer))?;
        recvs.push_for(peer, req);
    }
    collective_wait(recvs, "gather").await
}
