//! World description handed over by whatever launched the process.

use crate::error::{CommError, Result};
use crate::types::Rank;
use std::net::SocketAddr;

/// Size, rank, host name and rank-indexed listen addresses of a world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchInfo {
    pub size: u32,
    pub rank: Rank,
    pub host: String,
    pub addresses: Vec<SocketAddr>,
}

impl LaunchInfo {
    /// Read the world description from the environment.
    ///
    /// Returns `Ok(None)` when `MESHCOMM_SIZE` is unset, meaning the process
    /// was started without a launcher. Recognized variables:
    /// - `MESHCOMM_SIZE`
    /// - `MESHCOMM_RANK`
    /// - `MESHCOMM_HOST` (defaults to `HOSTNAME`, then `localhost`)
    /// - `MESHCOMM_PEERS`: comma-separated `ip:port`, one per rank
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let Some(size) = lookup("MESHCOMM_SIZE") else {
            return Ok(None);
        };
        let size: u32 = parse_var("MESHCOMM_SIZE", &size)?;
        let rank: Rank = match lookup("MESHCOMM_RANK") {
            Some(v) => parse_var("MESHCOMM_RANK", &v)?,
            None => return Err(CommError::Config("MESHCOMM_RANK is not set".into())),
        };
        let host = lookup("MESHCOMM_HOST")
            .or_else(|| lookup("HOSTNAME"))
            .unwrap_or_else(|| "localhost".to_string());
        let peers = lookup("MESHCOMM_PEERS")
            .ok_or_else(|| CommError::Config("MESHCOMM_PEERS is not set".into()))?;
        let addresses = peers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_var::<SocketAddr>("MESHCOMM_PEERS", s))
            .collect::<Result<Vec<_>>>()?;

        let info = Self {
            size,
            rank,
            host,
            addresses,
        };
        info.validate()?;
        Ok(Some(info))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(CommError::Config("communicator size must be positive".into()));
        }
        if self.rank >= self.size {
            return Err(CommError::InvalidRank {
                rank: self.rank,
                size: self.size,
            });
        }
        if self.addresses.len() != self.size as usize {
            return Err(CommError::Config(format!(
                "{} peer addresses for a communicator of size {}",
                self.addresses.len(),
                self.size
            )));
        }
        Ok(())
    }

    /// Listen address of this rank.
    pub fn own_address(&self) -> SocketAddr {
        self.addresses[self.rank as usize]
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CommError::Config(format!("{name}={value:?}: {e}")))
}
