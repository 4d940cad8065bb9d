use crate::error::{CommError, Result};
use crate::launch::LaunchInfo;
use crate::transport::ChannelGroup;
use crate::types::{DEFAULT_TAG, Rank, Tag};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::Communicator;

/// `[family][port u16 LE][16 address bytes]`; family 0 marks a rank that
/// does not take part.
const RECORD_LEN: usize = 19;

const FAMILY_NONE: u8 = 0;
const FAMILY_V4: u8 = 4;
const FAMILY_V6: u8 = 6;

fn encode_record(addr: Option<SocketAddr>) -> [u8; RECORD_LEN] {
    let mut out = [0u8; RECORD_LEN];
    let Some(addr) = addr else {
        return out;
    };
    out[1..3].copy_from_slice(&addr.port().to_le_bytes());
    match addr.ip() {
        IpAddr::V4(ip) => {
            out[0] = FAMILY_V4;
            out[3..7].copy_from_slice(&ip.octets());
        }
        IpAddr::V6(ip) => {
            out[0] = FAMILY_V6;
            out[3..].copy_from_slice(&ip.octets());
        }
    }
    out
}

fn decode_record(record: &[u8]) -> Result<Option<SocketAddr>> {
    if record.len() != RECORD_LEN {
        return Err(CommError::DecodeFailed(format!(
            "address record of {} bytes, expected {RECORD_LEN}",
            record.len()
        )));
    }
    let port = u16::from_le_bytes([record[1], record[2]]);
    let ip = match record[0] {
        FAMILY_NONE => return Ok(None),
        FAMILY_V4 => IpAddr::V4(Ipv4Addr::new(record[3], record[4], record[5], record[6])),
        FAMILY_V6 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&record[3..]);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        other => {
            return Err(CommError::DecodeFailed(format!(
                "unknown address family {other}"
            )));
        }
    };
    Ok(Some(SocketAddr::new(ip, port)))
}

/// Drop the holes left by ranks that opted out, keeping relative order.
///
/// Returns the surviving addresses and `own`'s position among them.
fn compact(slots: Vec<Option<SocketAddr>>, own: Rank) -> (Vec<SocketAddr>, Option<Rank>) {
    let mut addresses = Vec::with_capacity(slots.len());
    let mut new_rank = None;
    for (old, slot) in (0..).zip(slots) {
        if let Some(addr) = slot {
            if old == own {
                new_rank = Some(addresses.len() as Rank);
            }
            addresses.push(addr);
        }
    }
    (addresses, new_rank)
}

impl Communicator {
    /// Split off a communicator made of the ranks that pass `participate = true`.
    ///
    /// Every rank must call this. Participants keep their relative order and
    /// get a communicator with fresh channels; the others get `None`. Fails
    /// with [`CommError::EmptyCommunicator`] on every rank if nobody takes part.
    pub async fn create_comm(&self, participate: bool) -> Result<Option<Communicator>> {
        self.create_comm_tagged(participate, DEFAULT_TAG).await
    }

    pub async fn create_comm_tagged(
        &self,
        participate: bool,
        tag: Tag,
    ) -> Result<Option<Communicator>> {
        let group = if participate {
            let bind = SocketAddr::new(self.local_addr().ip(), 0);
            Some(ChannelGroup::bind(bind, self.config().clone()).await?)
        } else {
            None
        };

        let own = encode_record(group.as_ref().map(ChannelGroup::local_addr));
        let mut records = vec![[0u8; RECORD_LEN]; self.size() as usize];
        {
            let mut slots: Vec<&mut [u8]> = records.iter_mut().map(|r| &mut r[..]).collect();
            self.all_gather_tagged(tag, &own, &mut slots).await?;
        }

        let slots = records
            .iter()
            .map(|r| decode_record(r))
            .collect::<Result<Vec<_>>>()?;
        let (addresses, new_rank) = compact(slots, self.rank());
        if addresses.is_empty() {
            return Err(CommError::EmptyCommunicator);
        }

        let (Some(group), Some(rank)) = (group, new_rank) else {
            return Ok(None);
        };
        tracing::debug!(
            old_rank = self.rank(),
            rank,
            size = addresses.len(),
            "created sub-communicator"
        );
        let info = LaunchInfo {
            size: addresses.len() as u32,
            rank,
            host: self.host().to_string(),
            addresses,
        };
        Communicator::new(info, group).map(Some)
    }
}
