//! MPI-style message passing over a lazily built TCP mesh.
//!
//! A [`Communicator`] binds one rank to its peers. Channels open on first
//! use (the lower rank of each pair connects), point-to-point operations
//! match on source and tag, and the collectives are composed from them:
//! tree broadcast and reduce, star scatter and gather, ring all-gather,
//! butterfly all-reduce, all-to-all, recursive-doubling scans, barrier and
//! flood. [`SyncCommunicator`] offers the same operations as blocking calls.
//!
//! ```no_run
//! use meshcomm::{CommConfig, Communicator, ReduceOp};
//!
//! # async fn example() -> meshcomm::Result<()> {
//! let comm = Communicator::init(CommConfig::from_env()).await?;
//! let mut buf = vec![comm.rank() as i64; 4];
//! comm.all_reduce(&mut buf, &ReduceOp::Sum).await?;
//! comm.barrier().await?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod client;
pub mod collective;
pub mod config;
pub mod error;
pub mod launch;
pub mod protocol;
pub mod reduce;
pub mod transport;
pub mod types;

pub use buffer::{Buf, BufExt, ReductionView};
pub use client::{CommRequest, Communicator, RequestGroup, SyncCommunicator, SyncRequest};
pub use collective::BroadcastTree;
pub use config::CommConfig;
pub use error::{CommError, Result};
pub use launch::LaunchInfo;
pub use reduce::{Element, FnOp, Operator};
pub use transport::{Channel, ChannelGroup};
pub use types::{
    CommStatus, DEFAULT_TAG, DataType, Rank, ReduceOp, Source, Tag, TagMatch,
};
