use crate::error::{CommError, Result};
use crate::types::{Rank, Source, Tag, TagMatch};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// A data frame that arrived from some rank.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub source: Rank,
    pub tag: Tag,
    pub dtype: u8,
    pub count: usize,
    pub payload: Vec<u8>,
}

/// Resolves once a posted receive has been matched with an inbound message.
pub(crate) type Delivery = oneshot::Receiver<Result<Envelope>>;

struct Posted {
    source: Source,
    tag: TagMatch,
    tx: oneshot::Sender<Result<Envelope>>,
}

impl Posted {
    fn matches(&self, env: &Envelope) -> bool {
        self.source.matches(env.source) && self.tag.matches(env.tag)
    }
}

#[derive(Default)]
struct MailboxState {
    /// Messages nobody asked for yet, in arrival order.
    unexpected: VecDeque<Envelope>,
    /// Receives nobody answered yet, in post order.
    posted: VecDeque<Posted>,
    /// Peers whose stream ended, with the reason.
    closed: HashMap<Rank, String>,
}

/// Matches inbound messages from every channel of a communicator against
/// posted receives.
///
/// Each channel feeds this in stream order and both queues are scanned front
/// to back, so two messages from the same source under the same tag are
/// always consumed in the order they were sent.
#[derive(Default)]
pub(crate) struct Mailbox {
    state: Mutex<MailboxState>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand an inbound message to the oldest matching receive, or queue it.
    pub fn deliver(&self, env: Envelope) -> Result<()> {
        let mut st = self
            .state
            .lock()
            .map_err(|_| CommError::LockPoisoned("mailbox"))?;
        let mut env = env;
        while let Some(idx) = st.posted.iter().position(|p| p.matches(&env)) {
            let Some(posted) = st.posted.remove(idx) else {
                break;
            };
            match posted.tx.send(Ok(env)) {
                Ok(()) => return Ok(()),
                // The request behind this receive was dropped; try the next one.
                Err(Ok(back)) => env = back,
                Err(Err(_)) => return Ok(()),
            }
        }
        tracing::trace!(source = env.source, tag = env.tag, "queued unexpected message");
        st.unexpected.push_back(env);
        Ok(())
    }

    /// Register a receive and return the future side of its match.
    pub fn post(&self, source: Source, tag: TagMatch) -> Result<Delivery> {
        let (tx, rx) = oneshot::channel();
        let mut st = self
            .state
            .lock()
            .map_err(|_| CommError::LockPoisoned("mailbox"))?;
        let queued = st
            .unexpected
            .iter()
            .position(|env| source.matches(env.source) && tag.matches(env.tag));
        if let Some(env) = queued.and_then(|idx| st.unexpected.remove(idx)) {
            let _ = tx.send(Ok(env));
        } else if let Source::Rank(rank) = source
            && st.closed.contains_key(&rank)
        {
            let _ = tx.send(Err(CommError::PeerDisconnected { rank }));
        } else {
            // Receives whose request was dropped can never be answered.
            st.posted.retain(|p| !p.tx.is_closed());
            st.posted.push_back(Posted { source, tag, tx });
        }
        Ok(rx)
    }

    /// Fail every receive waiting on `rank` specifically, now and later.
    pub fn close_peer(&self, rank: Rank, reason: impl Into<String>) {
        let Ok(mut st) = self.state.lock() else {
            return;
        };
        st.closed.insert(rank, reason.into());
        let (failed, kept): (VecDeque<Posted>, VecDeque<Posted>) = std::mem::take(&mut st.posted)
            .into_iter()
            .partition(|p| p.source == Source::Rank(rank));
        st.posted = kept;
        drop(st);
        for posted in failed {
            let _ = posted.tx.send(Err(CommError::PeerDisconnected { rank }));
        }
    }

    #[cfg(test)]
    fn pending_counts(&self) -> (usize, usize) {
        let st = self.state.lock().unwrap();
        (st.unexpected.len(), st.posted.len())
    }
}
