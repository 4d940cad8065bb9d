use crate::collective::tree::BroadcastTree;
use crate::error::Result;
use crate::protocol::Handshake;
use crate::transport::Channel;
use crate::types::Rank;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use super::communicator::{CommInner, CommState};

impl CommInner {
    /// Return the channel to `peer`, establishing it if needed.
    ///
    /// If `peer` is higher than this rank the connection is opened here;
    /// otherwise this waits until `peer` has connected to us.
    pub(crate) async fn channel(&self, peer: Rank) -> Result<Arc<Channel>> {
        loop {
            // Registered before the table is checked so an install between
            // the check and the await is not missed.
            let installed = self.installed.notified();
            tokio::pin!(installed);
            installed.as_mut().enable();
            {
                let mut st = self.state.lock().await;
                if let Some(ch) = &st.channels[peer as usize] {
                    return Ok(Arc::clone(ch));
                }
                if self.rank < peer {
                    return self.connect_locked(&mut st, peer).await;
                }
            }
            tracing::trace!(rank = self.rank, peer, "waiting for peer to connect");
            installed.await;
        }
    }

    /// Make sure a connection to `peer` exists or is this side's to await.
    ///
    /// Opens the connection when this rank is the lower one; never waits
    /// for a lower-ranked peer.
    pub(crate) async fn ensure_channel(&self, peer: Rank) -> Result<()> {
        if self.rank >= peer {
            return Ok(());
        }
        let mut st = self.state.lock().await;
        if st.channels[peer as usize].is_none() {
            self.connect_locked(&mut st, peer).await?;
        }
        Ok(())
    }

    async fn connect_locked(&self, st: &mut CommState, peer: Rank) -> Result<Arc<Channel>> {
        let addr = self.addresses[peer as usize];
        let hello = Handshake::new(self.rank, self.size);
        let channel = Arc::new(self.group.connect(addr, peer, &hello).await?);
        st.channels[peer as usize] = Some(Arc::clone(&channel));
        Ok(channel)
    }

    /// Record a channel accepted from a lower rank and wake waiters.
    async fn install(&self, channel: Channel) {
        let peer = channel.far_rank();
        {
            let mut st = self.state.lock().await;
            let slot = &mut st.channels[peer as usize];
            if slot.is_some() {
                tracing::warn!(rank = self.rank, peer, "duplicate connection dropped");
                return;
            }
            *slot = Some(Arc::new(channel));
        }
        self.installed.notify_waiters();
    }

    /// Spanning tree rooted at `root`, computed once per root.
    pub(crate) async fn tree(&self, root: Rank) -> Arc<BroadcastTree> {
        let mut st = self.state.lock().await;
        let tree = st
            .trees
            .entry(root)
            .or_insert_with(|| Arc::new(BroadcastTree::compute(self.size, self.rank, root)));
        Arc::clone(tree)
    }
}

/// Accept connections from lower ranks for the lifetime of the communicator.
///
/// Each handshake runs in its own task; they are aborted with the loop.
pub(crate) async fn accept_loop(inner: Arc<CommInner>, listener: TcpListener) {
    let mut handshakes = JoinSet::new();
    loop {
        tokio::select! {
            accepted = inner.group.accept_stream(&listener) => match accepted {
                Ok((stream, peer_addr)) => {
                    let inner = Arc::clone(&inner);
                    handshakes.spawn(async move {
                        let accepted = inner
                            .group
                            .handshake(stream, peer_addr, inner.rank, inner.size)
                            .await;
                        match accepted {
                            Ok(channel) => inner.install(channel).await,
                            Err(e) => tracing::warn!(
                                rank = inner.rank,
                                %peer_addr,
                                "rejected incoming connection: {e}"
                            ),
                        }
                    });
                }
                Err(e) => tracing::warn!(rank = inner.rank, "accept failed: {e}"),
            },
            Some(_) = handshakes.join_next(), if !handshakes.is_empty() => {}
        }
    }
}
