use crate::buffer::BufExt;
use crate::client::Communicator;
use crate::collective::helpers::{check_root, collective_recv, collective_send};
use crate::error::Result;
use crate::reduce::{Element, Operator};
use crate::types::{Rank, Tag};

/// Binomial-tree reduction into `root`.
///
/// Children are drained in reverse order, smallest subtree first, each
/// message merging into `buf`; the partial result then goes to the parent.
/// Only the root's buffer is meaningful afterwards.
pub(crate) async fn tree_reduce<T: Element, O: Operator<T>>(
    comm: &Communicator,
    root: Rank,
    tag: Tag,
    buf: &mut [T],
    op: &O,
) -> Result<()> {
    check_root(comm, root)?;
    if comm.size() == 1 {
        return Ok(());
    }
    let tree = comm.inner.tree(root).await;

    for &child in tree.children.iter().rev() {
        let mut view = buf.reduction_view(op);
        collective_recv(comm, child, tag, &mut view, "reduce").await?;
    }

    if let Some(parent) = tree.parent {
        collective_send(comm, parent, tag, &*buf, "reduce").await?;
    }
    Ok(())
}
