use crate::buffer::Buf;
use crate::collective;
use crate::error::Result;
use crate::reduce::{Element, Operator};
use crate::types::{CommStatus, DEFAULT_TAG, Rank, Tag, TagMatch};

use super::Communicator;
use super::request::CommRequest;

/// Collective operations. Every rank of the communicator must make the same
/// call, with the same root, tag and buffer lengths; the `_tagged` forms let
/// concurrent collectives on one communicator stay apart.
impl Communicator {
    /// Copy `buf` from `root` into `buf` on every rank.
    pub async fn broadcast<T: Element>(&self, root: Rank, buf: &mut [T]) -> Result<()> {
        self.broadcast_tagged(root, DEFAULT_TAG, buf).await
    }

    pub async fn broadcast_tagged<T: Element>(
        &self,
        root: Rank,
        tag: Tag,
        buf: &mut [T],
    ) -> Result<()> {
        collective::tree_broadcast(self, root, tag, buf).await
    }

    /// Send `src[r]` from `root` to rank `r`'s `dst`.
    ///
    /// Only the root reads `src`; it must hold one buffer per rank there.
    pub async fn scatter<T: Element>(&self, root: Rank, src: &[&[T]], dst: &mut [T]) -> Result<()> {
        self.scatter_tagged(root, DEFAULT_TAG, src, dst).await
    }

    pub async fn scatter_tagged<T: Element>(
        &self,
        root: Rank,
        tag: Tag,
        src: &[&[T]],
        dst: &mut [T],
    ) -> Result<()> {
        collective::scatter(self, root, tag, src, dst).await
    }

    /// Collect every rank's `src` into `dst[r]` on `root`.
    ///
    /// Only the root writes `dst`; it must hold one buffer per rank there.
    pub async fn gather<T: Element>(
        &self,
        root: Rank,
        src: &[T],
        dst: &mut [&mut [T]],
    ) -> Result<()> {
        self.gather_tagged(root, DEFAULT_TAG, src, dst).await
    }

    pub async fn gather_tagged<T: Element>(
        &self,
        root: Rank,
        tag: Tag,
        src: &[T],
        dst: &mut [&mut [T]],
    ) -> Result<()> {
        collective::gather(self, root, tag, src, dst).await
    }

    /// Collect every rank's `src` into `dst[r]` on every rank.
    pub async fn all_gather<T: Element>(&self, src: &[T], dst: &mut [&mut [T]]) -> Result<()> {
        self.all_gather_tagged(DEFAULT_TAG, src, dst).await
    }

    pub async fn all_gather_tagged<T: Element>(
        &self,
        tag: Tag,
        src: &[T],
        dst: &mut [&mut [T]],
    ) -> Result<()> {
        collective::ring_allgather(self, tag, src, dst).await
    }

    /// Combine every rank's `buf` element-wise into `buf` on `root`.
    ///
    /// The contents of `buf` on other ranks are unspecified afterwards.
    pub async fn reduce<T: Element, O: Operator<T>>(
        &self,
        root: Rank,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        self.reduce_tagged(root, DEFAULT_TAG, buf, op).await
    }

    pub async fn reduce_tagged<T: Element, O: Operator<T>>(
        &self,
        root: Rank,
        tag: Tag,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        collective::tree_reduce(self, root, tag, buf, op).await
    }

    /// Combine every rank's `buf` element-wise into `buf` on every rank.
    pub async fn all_reduce<T: Element, O: Operator<T>>(&self, buf: &mut [T], op: &O) -> Result<()> {
        self.all_reduce_tagged(DEFAULT_TAG, buf, op).await
    }

    pub async fn all_reduce_tagged<T: Element, O: Operator<T>>(
        &self,
        tag: Tag,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        collective::butterfly_allreduce(self, tag, buf, op).await
    }

    /// Send `src[k]` to rank `k`, receiving rank `i`'s contribution in `dst[i]`.
    pub async fn all_to_all<T: Element>(&self, src: &[&[T]], dst: &mut [&mut [T]]) -> Result<()> {
        self.all_to_all_tagged(DEFAULT_TAG, src, dst).await
    }

    pub async fn all_to_all_tagged<T: Element>(
        &self,
        tag: Tag,
        src: &[&[T]],
        dst: &mut [&mut [T]],
    ) -> Result<()> {
        collective::alltoall(self, tag, src, dst).await
    }

    /// Inclusive prefix reduction over ranks.
    pub async fn scan<T: Element, O: Operator<T>>(&self, buf: &mut [T], op: &O) -> Result<()> {
        self.scan_tagged(DEFAULT_TAG, buf, op).await
    }

    pub async fn scan_tagged<T: Element, O: Operator<T>>(
        &self,
        tag: Tag,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        collective::inclusive_scan(self, tag, buf, op).await
    }

    /// Exclusive prefix reduction over ranks; rank 0 ends with `initial`.
    pub async fn exclusive_scan<T: Element, O: Operator<T>>(
        &self,
        buf: &mut [T],
        op: &O,
        initial: T,
    ) -> Result<()> {
        self.exclusive_scan_tagged(DEFAULT_TAG, buf, op, initial)
            .await
    }

    pub async fn exclusive_scan_tagged<T: Element, O: Operator<T>>(
        &self,
        tag: Tag,
        buf: &mut [T],
        op: &O,
        initial: T,
    ) -> Result<()> {
        collective::exclusive_scan(self, tag, buf, op, initial).await
    }

    /// Wait until every rank has called `barrier`.
    pub async fn barrier(&self) -> Result<()> {
        self.barrier_tagged(DEFAULT_TAG).await
    }

    pub async fn barrier_tagged(&self, tag: Tag) -> Result<()> {
        collective::barrier(self, tag).await
    }

    /// Send `buf` to every rank, which each pick it up with a flood receive.
    ///
    /// Any rank may flood-send; the sender must flood-receive too.
    pub async fn flood_send<B: Buf + ?Sized>(&self, tag: Tag, buf: &B) -> Result<()> {
        self.flood_send_nb(tag, buf).await?.wait().await?;
        Ok(())
    }

    pub async fn flood_send_nb<B: Buf + ?Sized>(
        &self,
        tag: Tag,
        buf: &B,
    ) -> Result<CommRequest<'static>> {
        self.send_nb(0, tag, buf).await
    }

    /// Receive one flood-sent message, from whichever rank sent it.
    ///
    /// The status names the rank the message arrived from: the original
    /// sender on rank 0, the tree parent everywhere else.
    pub async fn flood_receive<B: Buf + ?Sized>(
        &self,
        tag: impl Into<TagMatch>,
        buf: &mut B,
    ) -> Result<CommStatus> {
        self.flood_receive_nb(tag, buf).await?.wait_received().await
    }

    /// Non-blocking [`flood_receive`](Self::flood_receive).
    ///
    /// The request finishes once the message is in `buf` and has been passed
    /// on to this rank's children in the rank-0 tree.
    pub async fn flood_receive_nb<'a, B: Buf + ?Sized>(
        &self,
        tag: impl Into<TagMatch>,
        buf: &'a mut B,
    ) -> Result<CommRequest<'a>> {
        collective::flood_receive_nb(self, tag.into(), buf).await
    }
}
