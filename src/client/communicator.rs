use crate::collective::tree::BroadcastTree;
use crate::config::CommConfig;
use crate::error::{CommError, Result};
use crate::launch::LaunchInfo;
use crate::transport::{Channel, ChannelGroup};
use crate::types::Rank;
use std::collections::{BTreeMap, HashMap};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

/// Connection table and tree cache, guarded together by one lock.
pub(crate) struct CommState {
    /// `channels[r]` is the channel to rank `r`, once it exists.
    pub(crate) channels: Vec<Option<Arc<Channel>>>,
    pub(crate) trees: HashMap<Rank, Arc<BroadcastTree>>,
}

/// State shared between a communicator and its background tasks.
pub(crate) struct CommInner {
    pub(crate) size: u32,
    pub(crate) rank: Rank,
    pub(crate) host: String,
    pub(crate) size_pow2: u32,
    pub(crate) addresses: Vec<SocketAddr>,
    pub(crate) group: ChannelGroup,
    pub(crate) state: Mutex<CommState>,
    /// Signalled whenever the accept loop installs a channel.
    pub(crate) installed: Notify,
}

/// A rank bound to its peers.
///
/// Channels to peers are opened lazily on first use: of any two ranks the
/// lower one connects and the higher one waits for the connection to arrive,
/// so each pair ends up with exactly one channel. The own rank is served by
/// a loopback channel, which makes sending to oneself legal.
///
/// # Example
///
/// ```no_run
/// use meshcomm::{CommConfig, Communicator};
///
/// # async fn example() -> meshcomm::Result<()> {
/// let comms = Communicator::bootstrap_local(4, CommConfig::default()).await?;
/// assert_eq!(comms[2].rank(), 2);
/// assert_eq!(comms[2].size(), 4);
/// # Ok(())
/// # }
/// ```
pub struct Communicator {
    pub(crate) inner: Arc<CommInner>,
    accept_task: Option<JoinHandle<()>>,
}

/// Largest power of two not above `n` (`n > 0`).
pub(crate) fn largest_power_of_two(n: u32) -> u32 {
    1 << (u32::BITS - 1 - n.leading_zeros())
}

impl Communicator {
    /// Build a communicator over an already-bound channel group.
    ///
    /// `info.addresses[r]` is where rank `r` listens; the group must be bound
    /// to this rank's entry. Must be called inside a tokio runtime.
    pub fn new(info: LaunchInfo, group: ChannelGroup) -> Result<Self> {
        info.validate()?;
        let LaunchInfo {
            size,
            rank,
            host,
            addresses,
        } = info;

        let mut channels: Vec<Option<Arc<Channel>>> = vec![None; size as usize];
        channels[rank as usize] = Some(Arc::new(group.loopback(rank)));
        let listener = if size > 1 {
            Some(
                group
                    .take_listener()?
                    .ok_or_else(|| CommError::transport("channel group listener already in use"))?,
            )
        } else {
            None
        };

        let inner = Arc::new(CommInner {
            size,
            rank,
            host,
            size_pow2: largest_power_of_two(size),
            addresses,
            group,
            state: Mutex::new(CommState {
                channels,
                trees: HashMap::new(),
            }),
            installed: Notify::new(),
        });
        let accept_task =
            listener.map(|l| tokio::spawn(super::connections::accept_loop(Arc::clone(&inner), l)));

        tracing::debug!(rank, size, host = %inner.host, "communicator ready");
        Ok(Self { inner, accept_task })
    }

    /// Build the world communicator from the launch environment.
    ///
    /// Without launch information (see [`LaunchInfo::from_env`]) the process
    /// runs as a world of one rank listening on the loopback interface.
    pub async fn init(config: CommConfig) -> Result<Self> {
        match LaunchInfo::from_env()? {
            Some(info) => {
                let group = ChannelGroup::bind(info.own_address(), config).await?;
                Self::new(info, group)
            }
            None => {
                tracing::warn!("no launch information found, running as a single-rank world");
                let group =
                    ChannelGroup::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), config).await?;
                let info = LaunchInfo {
                    size: 1,
                    rank: 0,
                    host: "localhost".to_string(),
                    addresses: vec![group.local_addr()],
                };
                Self::new(info, group)
            }
        }
    }

    /// This process's rank (0-indexed).
    pub fn rank(&self) -> Rank {
        self.inner.rank
    }

    /// Number of ranks.
    pub fn size(&self) -> u32 {
        self.inner.size
    }

    /// Informational host name.
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Largest power of two not above [`size`](Self::size).
    pub fn size_power_of_2(&self) -> u32 {
        self.inner.size_pow2
    }

    /// Listen address of every rank, indexed by rank.
    pub fn addresses(&self) -> &[SocketAddr] {
        &self.inner.addresses
    }

    /// Listen address of this rank's channel group.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.group.local_addr()
    }

    pub(crate) fn config(&self) -> &CommConfig {
        self.inner.group.config()
    }

    pub(crate) fn check_rank(&self, rank: Rank) -> Result<()> {
        if rank >= self.inner.size {
            return Err(CommError::InvalidRank {
                rank,
                size: self.inner.size,
            });
        }
        Ok(())
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        if let Some(task) = &self.accept_task {
            task.abort();
        }
    }
}

impl std::fmt::Display for Communicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Communicator(size={}, rank={}, host={}, peers=[",
            self.inner.size, self.inner.rank, self.inner.host
        )?;
        for (i, addr) in self.inner.addresses.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{addr}")?;
        }
        f.write_str("])")
    }
}

/// Also lists the connected channels and the cached trees by root, unless
/// the state lock is held elsewhere at that moment.
impl std::fmt::Debug for Communicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Communicator");
        d.field("size", &self.inner.size)
            .field("rank", &self.inner.rank)
            .field("host", &self.inner.host)
            .field("addresses", &self.inner.addresses);
        match self.inner.state.try_lock() {
            Ok(st) => {
                let connected: Vec<Rank> = (0..)
                    .zip(&st.channels)
                    .filter_map(|(r, ch)| ch.as_ref().map(|_| r))
                    .collect();
                let trees: BTreeMap<Rank, &BroadcastTree> =
                    st.trees.iter().map(|(&root, t)| (root, &**t)).collect();
                d.field("connected", &connected).field("trees", &trees);
            }
            Err(_) => {
                d.field("state", &"<locked>");
            }
        }
        d.finish()
    }
}
