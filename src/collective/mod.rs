//! Collective algorithms built on the communicator's point-to-point layer.
//!
//! | operation | pattern |
//! |---|---|
//! | broadcast, reduce | binomial tree rooted at the caller-chosen root |
//! | scatter, gather | star around the root |
//! | all-gather | ring, neighbour traffic only |
//! | all-reduce, barrier | butterfly with a fold for non-power-of-two sizes |
//! | all-to-all | `size - 1` concurrent send-receive pairs |
//! | scan, exclusive scan | recursive doubling |
//! | flood | send to rank 0, forwarded down the rank-0 tree |

mod allgather;
mod allreduce;
mod alltoall;
mod broadcast;
mod flood;
mod gather;
mod helpers;
mod reduce;
mod scan;
mod scatter;
pub mod tree;

pub(crate) use allgather::ring_allgather;
pub(crate) use allreduce::{barrier, butterfly_allreduce};
pub(crate) use alltoall::alltoall;
pub(crate) use broadcast::tree_broadcast;
pub(crate) use flood::flood_receive_nb;
pub(crate) use gather::gather;
pub(crate) use reduce::tree_reduce;
pub(crate) use scan::{exclusive_scan, inclusive_scan};
pub(crate) use scatter::scatter;
pub use tree::BroadcastTree;
