use crate::error::{CommError, Result};
use crate::types::Rank;

/// Version carried in every handshake; peers with a different one are refused.
pub const PROTOCOL_VERSION: u16 = 1;

/// First frame on every connection, sent by the initiating (lower) rank.
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize, Debug, Clone, PartialEq)]
pub struct Handshake {
    pub protocol_version: u16,
    /// Declared rank of the connecting side.
    pub rank: Rank,
    /// Size of the communicator the connecting side belongs to.
    pub size: u32,
}

impl Handshake {
    pub fn new(rank: Rank, size: u32) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            rank,
            size,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|bytes| bytes.to_vec())
            .map_err(|e| CommError::EncodeFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rkyv::from_bytes::<Handshake, rkyv::rancor::Error>(bytes)
            .map_err(|e| CommError::DecodeFailed(e.to_string()))
    }
}
