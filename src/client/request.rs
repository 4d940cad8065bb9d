use crate::buffer::Buf;
use crate::error::{CommError, Result};
use crate::transport::SendCompletion;
use crate::transport::mailbox::{Delivery, Envelope};
use crate::types::{CommStatus, DataType, Rank};
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Moves a matched message into the caller's buffer.
pub(crate) type Stage<'a> = Box<dyn FnOnce(Envelope) -> Result<CommStatus> + Send + 'a>;

/// Sends spawned by a flood receive once its own message arrived.
pub(crate) type Forwards = oneshot::Receiver<Vec<SendCompletion>>;

fn abandoned() -> CommError {
    CommError::transport("request abandoned by the transport")
}

/// Stage that type-checks an envelope and unpacks it into `buf`.
pub(crate) fn stage_into<'a, B: Buf + ?Sized>(buf: &'a mut B) -> Stage<'a> {
    Box::new(move |env: Envelope| {
        let expected = buf.data_type();
        let actual = DataType::from_code(env.dtype).ok_or_else(|| {
            CommError::DecodeFailed(format!("unknown element type code {}", env.dtype))
        })?;
        if actual != expected {
            return Err(CommError::TypeMismatch { expected, actual });
        }
        buf.unpack(&env.payload, env.count);
        Ok(CommStatus {
            source: env.source,
            tag: env.tag,
            count: env.count,
        })
    })
}

struct PendingRecv<'a> {
    delivery: Delivery,
    stage: Option<Stage<'a>>,
    status: Option<CommStatus>,
    forwards: Option<Forwards>,
    forwarded: Vec<SendCompletion>,
}

impl PendingRecv<'_> {
    fn poll(&mut self) -> Result<bool> {
        if self.status.is_none() {
            match self.delivery.try_recv() {
                Ok(env) => {
                    let stage = self.stage.take().ok_or_else(abandoned)?;
                    self.status = Some(stage(env?)?);
                }
                Err(TryRecvError::Empty) => return Ok(false),
                Err(TryRecvError::Closed) => return Err(abandoned()),
            }
        }
        if let Some(forwards) = &mut self.forwards {
            match forwards.try_recv() {
                Ok(list) => {
                    self.forwarded.extend(list);
                    self.forwards = None;
                }
                Err(TryRecvError::Empty) => return Ok(false),
                Err(TryRecvError::Closed) => return Err(abandoned()),
            }
        }
        poll_sends(&mut self.forwarded)
    }

    async fn finish(mut self) -> Result<CommStatus> {
        let status = match self.status.take() {
            Some(status) => status,
            None => {
                let env = (&mut self.delivery).await.map_err(|_| abandoned())??;
                let stage = self.stage.take().ok_or_else(abandoned)?;
                stage(env)?
            }
        };
        if let Some(forwards) = self.forwards.take() {
            self.forwarded
                .extend(forwards.await.map_err(|_| abandoned())?);
        }
        for done in self.forwarded {
            await_send(done).await?;
        }
        Ok(status)
    }
}

fn poll_sends(sends: &mut Vec<SendCompletion>) -> Result<bool> {
    let mut i = 0;
    while i < sends.len() {
        match sends[i].try_recv() {
            Ok(result) => {
                sends.swap_remove(i);
                result?;
            }
            Err(TryRecvError::Empty) => i += 1,
            Err(TryRecvError::Closed) => return Err(abandoned()),
        }
    }
    Ok(sends.is_empty())
}

async fn await_send(done: SendCompletion) -> Result<()> {
    done.await.map_err(|_| abandoned())?
}

/// An in-flight send, receive, or both.
///
/// A receive request borrows its buffer for `'a`; the message is moved into
/// the buffer by whichever of [`is_finished`](Self::is_finished) or
/// [`wait`](Self::wait) first observes it. Dropping an unfinished receive
/// request discards any message already matched to it.
#[must_use = "a request does nothing observable unless waited on"]
pub struct CommRequest<'a> {
    sends: Vec<SendCompletion>,
    recv: Option<PendingRecv<'a>>,
}

impl<'a> CommRequest<'a> {
    pub(crate) fn for_send(done: SendCompletion) -> Self {
        Self {
            sends: vec![done],
            recv: None,
        }
    }

    pub(crate) fn for_receive(delivery: Delivery, stage: Stage<'a>) -> Self {
        Self {
            sends: Vec::new(),
            recv: Some(PendingRecv {
                delivery,
                stage: Some(stage),
                status: None,
                forwards: None,
                forwarded: Vec::new(),
            }),
        }
    }

    /// A receive that is only complete once the sends it forwards are.
    pub(crate) fn for_flood(delivery: Delivery, stage: Stage<'a>, forwards: Forwards) -> Self {
        let mut req = Self::for_receive(delivery, stage);
        if let Some(recv) = &mut req.recv {
            recv.forwards = Some(forwards);
        }
        req
    }

    /// Attach a send to this request.
    pub(crate) fn with_send(mut self, done: SendCompletion) -> Self {
        self.sends.push(done);
        self
    }

    /// Check whether every part of the request has completed, without blocking.
    ///
    /// A receive's data is in the buffer once this returns `Ok(true)`.
    pub fn is_finished(&mut self) -> Result<bool> {
        let recv_done = match &mut self.recv {
            Some(recv) => recv.poll()?,
            None => true,
        };
        let sends_done = poll_sends(&mut self.sends)?;
        Ok(recv_done && sends_done)
    }

    /// Wait for the request to complete.
    ///
    /// Returns the receive status, or `None` for a pure send. Every part is
    /// awaited even if one fails; the first error is returned.
    pub async fn wait(mut self) -> Result<Option<CommStatus>> {
        let mut first_err = None;
        let mut status = None;
        if let Some(recv) = self.recv.take() {
            match recv.finish().await {
                Ok(s) => status = Some(s),
                Err(e) => first_err = Some(e),
            }
        }
        for done in std::mem::take(&mut self.sends) {
            if let Err(e) = await_send(done).await
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(status),
        }
    }
}

impl CommRequest<'_> {
    /// Wait for a request that contains a receive.
    pub(crate) async fn wait_received(self) -> Result<CommStatus> {
        self.wait()
            .await?
            .ok_or_else(|| CommError::transport("receive finished without a status"))
    }
}

/// A set of requests that can be waited on together.
#[derive(Default)]
pub struct RequestGroup<'a> {
    requests: Vec<(Option<Rank>, CommRequest<'a>)>,
}

impl<'a> RequestGroup<'a> {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
        }
    }

    pub fn push(&mut self, request: CommRequest<'a>) {
        self.requests.push((None, request));
    }

    /// Add a request whose failure is attributed to `peer`.
    pub fn push_for(&mut self, peer: Rank, request: CommRequest<'a>) {
        self.requests.push((Some(peer), request));
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Wait for every request in the group.
    ///
    /// Returns the first error encountered, if any. All requests are awaited
    /// regardless of errors.
    pub async fn wait_all(self) -> Result<()> {
        self.wait_all_attributed().await.map_err(|(_, e)| e)
    }

    /// Like [`wait_all`](Self::wait_all), but the error comes with the peer
    /// its request was pushed for.
    pub async fn wait_all_attributed(
        self,
    ) -> std::result::Result<(), (Option<Rank>, CommError)> {
        let mut first_err = None;
        for (peer, request) in self.requests {
            if let Err(e) = request.wait().await
                && first_err.is_none()
            {
                first_err = Some((peer, e));
            }
        }
        match first_err {
            Some(failed) => Err(failed),
            None => Ok(()),
        }
    }
}
