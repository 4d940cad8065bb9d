use crate::config::CommConfig;
use crate::error::{CommError, Result};
use crate::protocol::{FrameHeader, FrameKind, Handshake, PROTOCOL_VERSION};
use crate::transport::channel::{Channel, read_frame, write_frame};
use crate::transport::mailbox::Mailbox;
use crate::types::Rank;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};

/// The transport instance behind one communicator: a bound listener, the
/// shared mailbox every channel feeds, and the connection parameters.
pub struct ChannelGroup {
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    mailbox: Arc<Mailbox>,
    config: CommConfig,
}

impl ChannelGroup {
    /// Bind a listener on `addr` (port 0 picks a free port).
    pub async fn bind(addr: SocketAddr, config: CommConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CommError::transport_with_source(format!("tcp listen on {addr}"), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| CommError::transport_with_source("tcp local_addr", e))?;
        tracing::debug!(%local_addr, "channel group listening");
        Ok(Self {
            listener: Mutex::new(Some(listener)),
            local_addr,
            mailbox: Arc::new(Mailbox::new()),
            config,
        })
    }

    /// Address peers connect to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &CommConfig {
        &self.config
    }

    pub(crate) fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Hand the listener to an accept loop. Returns `None` the second time.
    pub(crate) fn take_listener(&self) -> Result<Option<TcpListener>> {
        let mut slot = self
            .listener
            .lock()
            .map_err(|_| CommError::LockPoisoned("listener"))?;
        Ok(slot.take())
    }

    pub(crate) fn loopback(&self, rank: Rank) -> Channel {
        Channel::loopback(rank, Arc::clone(&self.mailbox))
    }

    /// Open a channel to `far_rank` at `addr`, declaring ourselves with `hello`.
    pub(crate) async fn connect(
        &self,
        addr: SocketAddr,
        far_rank: Rank,
        hello: &Handshake,
    ) -> Result<Channel> {
        let failed = |reason: String| CommError::ConnectionFailed {
            rank: far_rank,
            reason,
        };
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| failed(format!("connect to {addr}: {e}")))?;
        stream
            .set_nodelay(self.config.tcp_nodelay)
            .map_err(|e| failed(format!("set_nodelay: {e}")))?;
        let payload = hello.to_bytes()?;
        write_frame(&mut stream, &FrameHeader::control(payload.len()), &payload)
            .await
            .map_err(|e| failed(e.to_string()))?;
        tracing::debug!(rank = hello.rank, peer = far_rank, %addr, "connected");
        Ok(Channel::from_stream(
            stream,
            far_rank,
            Arc::clone(&self.mailbox),
            self.config.max_frame_bytes,
        ))
    }

    /// Accept one TCP connection. The handshake is read separately by
    /// [`handshake`](Self::handshake), so a silent client cannot hold up
    /// the next accept.
    pub(crate) async fn accept_stream(
        &self,
        listener: &TcpListener,
    ) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer_addr) = listener
            .accept()
            .await
            .map_err(|e| CommError::transport_with_source("tcp accept", e))?;
        stream
            .set_nodelay(self.config.tcp_nodelay)
            .map_err(|e| CommError::transport_with_source("tcp set_nodelay", e))?;
        Ok((stream, peer_addr))
    }

    /// Read the far end's handshake from an accepted stream.
    ///
    /// The declared rank must belong to a communicator of `size` ranks and
    /// be lower than `rank`, since only the lower rank of a pair initiates.
    /// A peer that stays silent for `handshake_timeout` is rejected.
    pub(crate) async fn handshake(
        &self,
        mut stream: TcpStream,
        peer_addr: SocketAddr,
        rank: Rank,
        size: u32,
    ) -> Result<Channel> {
        let (header, payload) = tokio::time::timeout(
            self.config.handshake_timeout,
            read_frame(&mut stream, self.config.max_frame_bytes),
        )
        .await
        .map_err(|_| {
            CommError::HandshakeRejected(format!(
                "{peer_addr} sent no handshake within {:?}",
                self.config.handshake_timeout
            ))
        })??;
        if header.kind != FrameKind::Control {
            return Err(CommError::HandshakeRejected(format!(
                "{peer_addr} sent data before its handshake"
            )));
        }
        let hello = Handshake::from_bytes(&payload)?;
        if hello.protocol_version != PROTOCOL_VERSION {
            return Err(CommError::ProtocolMismatch {
                local: PROTOCOL_VERSION,
                remote: hello.protocol_version,
            });
        }
        if hello.size != size {
            return Err(CommError::HandshakeRejected(format!(
                "{peer_addr} belongs to a communicator of size {}, expected {size}",
                hello.size
            )));
        }
        if hello.rank >= rank {
            return Err(CommError::HandshakeRejected(format!(
                "{peer_addr} declared rank {}, only ranks below {rank} connect here",
                hello.rank
            )));
        }
        tracing::debug!(rank, peer = hello.rank, %peer_addr, "accepted");
        Ok(Channel::from_stream(
            stream,
            hello.rank,
            Arc::clone(&self.mailbox),
            self.config.max_frame_bytes,
        ))
    }
}

impl std::fmt::Debug for ChannelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelGroup")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}
