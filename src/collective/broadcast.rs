use crate::client::{Communicator, RequestGroup};
use crate::collective::helpers::{check_root, collective_error, collective_recv, collective_wait};
use crate::error::Result;
use crate::reduce::Element;
use crate::types::{Rank, Tag};

/// Binomial-tree broadcast of `buf` from `root`.
///
/// Each rank's data leaves only after it arrived from the parent; sends to
/// the children are issued together and awaited as a group.
pub(crate) async fn tree_broadcast<T: Element>(
    comm: &Communicator,
    root: Rank,
    tag: Tag,
    buf: &mut [T],
) -> Result<()> {
    check_root(comm, root)?;
    if comm.size() == 1 {
        return Ok(());
    }
    let tree = comm.inner.tree(root).await;

    if let Some(parent) = tree.parent {
        collective_recv(comm, parent, tag, buf, "broadcast").await?;
    }

    let mut sends = RequestGroup::new();
    for &child in &tree.children {
        let req = comm
            .send_nb(child, tag, &*buf)
            .await
            .map_err(collective_error("broadcast", child))?;
        sends.push_for(child, req);
    }
    collective_wait(sends, "broadcast").await
}
