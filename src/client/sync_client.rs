use crate::buffer::Buf;
use crate::config::CommConfig;
use crate::error::{CommError, Result};
use crate::reduce::{Element, Operator};
use crate::types::{CommStatus, Rank, Source, Tag, TagMatch};
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::Communicator;
use super::request::CommRequest;

fn new_runtime() -> Result<Arc<Runtime>> {
    Runtime::new()
        .map(Arc::new)
        .map_err(|e| CommError::transport_with_source("tokio runtime", e))
}

/// Blocking wrapper around [`Communicator`].
///
/// Holds a multi-threaded tokio runtime and calls `block_on()` for each
/// operation. The communicator's background I/O runs on that runtime, so
/// a `SyncCommunicator` can be shared between OS threads; a rank that sends
/// to itself does so by receiving on a second thread.
pub struct SyncCommunicator {
    inner: Communicator,
    rt: Arc<Runtime>,
}

impl SyncCommunicator {
    /// Bootstrap a local world and return one blocking communicator per rank.
    ///
    /// All ranks share one runtime.
    pub fn bootstrap_local(size: u32, config: CommConfig) -> Result<Vec<Self>> {
        let rt = new_runtime()?;
        let comms = rt.block_on(Communicator::bootstrap_local(size, config))?;
        Ok(comms
            .into_iter()
            .map(|inner| Self {
                inner,
                rt: Arc::clone(&rt),
            })
            .collect())
    }

    /// Blocking [`Communicator::init`].
    pub fn init(config: CommConfig) -> Result<Self> {
        let rt = new_runtime()?;
        let inner = rt.block_on(Communicator::init(config))?;
        Ok(Self { inner, rt })
    }

    /// The async communicator behind this wrapper.
    pub fn as_async(&self) -> &Communicator {
        &self.inner
    }

    pub fn rank(&self) -> Rank {
        self.inner.rank()
    }

    pub fn size(&self) -> u32 {
        self.inner.size()
    }

    pub fn host(&self) -> &str {
        self.inner.host()
    }

    pub fn send<B: Buf + ?Sized>(&self, to: Rank, tag: Tag, buf: &B) -> Result<()> {
        self.rt.block_on(self.inner.send(to, tag, buf))
    }

    pub fn send_nb<B: Buf + ?Sized>(
        &self,
        to: Rank,
        tag: Tag,
        buf: &B,
    ) -> Result<SyncRequest<'static>> {
        let request = self.rt.block_on(self.inner.send_nb(to, tag, buf))?;
        Ok(self.wrap(request))
    }

    pub fn receive<B: Buf + ?Sized>(
        &self,
        from: impl Into<Source>,
        tag: impl Into<TagMatch>,
        buf: &mut B,
    ) -> Result<CommStatus> {
        self.rt.block_on(self.inner.receive(from, tag, buf))
    }

    pub fn receive_nb<'a, B: Buf + ?Sized>(
        &self,
        from: impl Into<Source>,
        tag: impl Into<TagMatch>,
        buf: &'a mut B,
    ) -> Result<SyncRequest<'a>> {
        let request = self.rt.block_on(self.inner.receive_nb(from, tag, buf))?;
        Ok(self.wrap(request))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_receive<S: Buf + ?Sized, R: Buf + ?Sized>(
        &self,
        to: Rank,
        send_tag: Tag,
        send_buf: &S,
        from: Rank,
        recv_tag: impl Into<TagMatch>,
        recv_buf: &mut R,
    ) -> Result<CommStatus> {
        self.rt.block_on(
            self.inner
                .send_receive(to, send_tag, send_buf, from, recv_tag, recv_buf),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_receive_nb<'a, S: Buf + ?Sized, R: Buf + ?Sized>(
        &self,
        to: Rank,
        send_tag: Tag,
        send_buf: &S,
        from: Rank,
        recv_tag: impl Into<TagMatch>,
        recv_buf: &'a mut R,
    ) -> Result<SyncRequest<'a>> {
        let request = self.rt.block_on(
            self.inner
                .send_receive_nb(to, send_tag, send_buf, from, recv_tag, recv_buf),
        )?;
        Ok(self.wrap(request))
    }

    pub fn flood_send<B: Buf + ?Sized>(&self, tag: Tag, buf: &B) -> Result<()> {
        self.rt.block_on(self.inner.flood_send(tag, buf))
    }

    pub fn flood_receive<B: Buf + ?Sized>(
        &self,
        tag: impl Into<TagMatch>,
        buf: &mut B,
    ) -> Result<CommStatus> {
        self.rt.block_on(self.inner.flood_receive(tag, buf))
    }

    pub fn flood_send_nb<B: Buf + ?Sized>(
        &self,
        tag: Tag,
        buf: &B,
    ) -> Result<SyncRequest<'static>> {
        let request = self.rt.block_on(self.inner.flood_send_nb(tag, buf))?;
        Ok(self.wrap(request))
    }

    pub fn flood_receive_nb<'a, B: Buf + ?Sized>(
        &self,
        tag: impl Into<TagMatch>,
        buf: &'a mut B,
    ) -> Result<SyncRequest<'a>> {
        let request = self.rt.block_on(self.inner.flood_receive_nb(tag, buf))?;
        Ok(self.wrap(request))
    }

    pub fn broadcast<T: Element>(&self, root: Rank, buf: &mut [T]) -> Result<()> {
        self.rt.block_on(self.inner.broadcast(root, buf))
    }

    pub fn broadcast_tagged<T: Element>(
        &self,
        root: Rank,
        tag: Tag,
        buf: &mut [T],
    ) -> Result<()> {
        self.rt.block_on(self.inner.broadcast_tagged(root, tag, buf))
    }

    pub fn scatter<T: Element>(&self, root: Rank, src: &[&[T]], dst: &mut [T]) -> Result<()> {
        self.rt.block_on(self.inner.scatter(root, src, dst))
    }

    pub fn scatter_tagged<T: Element>(
        &self,
        root: Rank,
        tag: Tag,
        src: &[&[T]],
        dst: &mut [T],
    ) -> Result<()> {
        self.rt
            .block_on(self.inner.scatter_tagged(root, tag, src, dst))
    }

    pub fn gather<T: Element>(&self, root: Rank, src: &[T], dst: &mut [&mut [T]]) -> Result<()> {
        self.rt.block_on(self.inner.gather(root, src, dst))
    }

    pub fn gather_tagged<T: Element>(
        &self,
        root: Rank,
        tag: Tag,
        src: &[T],
        dst: &mut [&mut [T]],
    ) -> Result<()> {
        self.rt
            .block_on(self.inner.gather_tagged(root, tag, src, dst))
    }

    pub fn all_gather<T: Element>(&self, src: &[T], dst: &mut [&mut [T]]) -> Result<()> {
        self.rt.block_on(self.inner.all_gather(src, dst))
    }

    pub fn all_gather_tagged<T: Element>(
        &self,
        tag: Tag,
        src: &[T],
        dst: &mut [&mut [T]],
    ) -> Result<()> {
        self.rt.block_on(self.inner.all_gather_tagged(tag, src, dst))
    }

    pub fn reduce<T: Element, O: Operator<T>>(
        &self,
        root: Rank,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        self.rt.block_on(self.inner.reduce(root, buf, op))
    }

    pub fn reduce_tagged<T: Element, O: Operator<T>>(
        &self,
        root: Rank,
        tag: Tag,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        self.rt
            .block_on(self.inner.reduce_tagged(root, tag, buf, op))
    }

    pub fn all_reduce<T: Element, O: Operator<T>>(&self, buf: &mut [T], op: &O) -> Result<()> {
        self.rt.block_on(self.inner.all_reduce(buf, op))
    }

    pub fn all_reduce_tagged<T: Element, O: Operator<T>>(
        &self,
        tag: Tag,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        self.rt.block_on(self.inner.all_reduce_tagged(tag, buf, op))
    }

    pub fn all_to_all<T: Element>(&self, src: &[&[T]], dst: &mut [&mut [T]]) -> Result<()> {
        self.rt.block_on(self.inner.all_to_all(src, dst))
    }

    pub fn all_to_all_tagged<T: Element>(
        &self,
        tag: Tag,
        src: &[&[T]],
        dst: &mut [&mut [T]],
    ) -> Result<()> {
        self.rt.block_on(self.inner.all_to_all_tagged(tag, src, dst))
    }

    pub fn scan<T: Element, O: Operator<T>>(&self, buf: &mut [T], op: &O) -> Result<()> {
        self.rt.block_on(self.inner.scan(buf, op))
    }

    pub fn scan_tagged<T: Element, O: Operator<T>>(
        &self,
        tag: Tag,
        buf: &mut [T],
        op: &O,
    ) -> Result<()> {
        self.rt.block_on(self.inner.scan_tagged(tag, buf, op))
    }

    pub fn exclusive_scan<T: Element, O: Operator<T>>(
        &self,
        buf: &mut [T],
        op: &O,
        initial: T,
    ) -> Result<()> {
        self.rt
            .block_on(self.inner.exclusive_scan(buf, op, initial))
    }

    pub fn exclusive_scan_tagged<T: Element, O: Operator<T>>(
        &self,
        tag: Tag,
        buf: &mut [T],
        op: &O,
        initial: T,
    ) -> Result<()> {
        self.rt
            .block_on(self.inner.exclusive_scan_tagged(tag, buf, op, initial))
    }

    pub fn barrier(&self) -> Result<()> {
        self.rt.block_on(self.inner.barrier())
    }

    pub fn barrier_tagged(&self, tag: Tag) -> Result<()> {
        self.rt.block_on(self.inner.barrier_tagged(tag))
    }

    /// Blocking [`Communicator::create_comm`]; the new communicator shares
    /// this one's runtime.
    pub fn create_comm(&self, participate: bool) -> Result<Option<SyncCommunicator>> {
        let created = self.rt.block_on(self.inner.create_comm(participate))?;
        Ok(created.map(|inner| Self {
            inner,
            rt: Arc::clone(&self.rt),
        }))
    }

    pub fn create_comm_tagged(
        &self,
        participate: bool,
        tag: Tag,
    ) -> Result<Option<SyncCommunicator>> {
        let created = self
            .rt
            .block_on(self.inner.create_comm_tagged(participate, tag))?;
        Ok(created.map(|inner| Self {
            inner,
            rt: Arc::clone(&self.rt),
        }))
    }

    fn wrap<'a>(&self, request: CommRequest<'a>) -> SyncRequest<'a> {
        SyncRequest {
            request,
            rt: Arc::clone(&self.rt),
        }
    }
}

impl std::fmt::Display for SyncCommunicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

/// A [`CommRequest`] whose `wait` blocks the calling thread.
#[must_use = "a request does nothing observable unless waited on"]
pub struct SyncRequest<'a> {
    request: CommRequest<'a>,
    rt: Arc<Runtime>,
}

impl SyncRequest<'_> {
    pub fn is_finished(&mut self) -> Result<bool> {
        self.request.is_finished()
    }

    pub fn wait(self) -> Result<Option<CommStatus>> {
        self.rt.block_on(self.request.wait())
    }
}
