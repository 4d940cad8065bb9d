use crate::config::CommConfig;
use crate::error::{CommError, Result};
use crate::launch::LaunchInfo;
use crate::transport::ChannelGroup;
use futures::future::try_join_all;
use std::net::{Ipv4Addr, SocketAddr};

use super::Communicator;

impl Communicator {
    /// Build a complete world of `size` ranks inside this process.
    ///
    /// Every rank gets its own listener on 127.0.0.1; no connection is opened
    /// until the ranks start talking. Convenient for tests and demos where each
    /// rank runs as a tokio task.
    pub async fn bootstrap_local(size: u32, config: CommConfig) -> Result<Vec<Communicator>> {
        if size == 0 {
            return Err(CommError::Config("communicator size must be positive".into()));
        }
        let groups = try_join_all((0..size).map(|_| {
            ChannelGroup::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), config.clone())
        }))
        .await?;
        let addresses: Vec<SocketAddr> = groups.iter().map(ChannelGroup::local_addr).collect();

        groups
            .into_iter()
            .zip(0..size)
            .map(|(group, rank)| {
                let info = LaunchInfo {
                    size,
                    rank,
                    host: "localhost".to_string(),
                    addresses: addresses.clone(),
                };
                Communicator::new(info, group)
            })
            .collect()
    }
}
