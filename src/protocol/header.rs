//! Fixed-size frame header written before every payload on a TCP channel.
//!
//! Layout (24 bytes, little-endian):
//!
//! ```text
//! [0]      kind
//! [1]      element type code
//! [2..4]   reserved, zero
//! [4..8]   tag
//! [8..16]  item count
//! [16..24] payload length in bytes
//! ```

use crate::error::{CommError, Result};
use crate::types::Tag;

pub const HEADER_SIZE: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// Connection set-up message.
    Control = 0,
    /// Application data addressed by tag.
    Data = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: FrameKind,
    pub dtype: u8,
    pub tag: Tag,
    pub count: u64,
    pub len: u64,
}

impl FrameHeader {
    pub fn control(len: usize) -> Self {
        Self {
            kind: FrameKind::Control,
            dtype: 0,
            tag: 0,
            count: 0,
            len: len as u64,
        }
    }

    pub fn data(tag: Tag, dtype: u8, count: usize, len: usize) -> Self {
        Self {
            kind: FrameKind::Data,
            dtype,
            tag,
            count: count as u64,
            len: len as u64,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0] = self.kind as u8;
        out[1] = self.dtype;
        out[4..8].copy_from_slice(&self.tag.to_le_bytes());
        out[8..16].copy_from_slice(&self.count.to_le_bytes());
        out[16..24].copy_from_slice(&self.len.to_le_bytes());
        out
    }

    pub fn decode(raw: &[u8; HEADER_SIZE]) -> Result<Self> {
        let kind = match raw[0] {
            0 => FrameKind::Control,
            1 => FrameKind::Data,
            other => {
                return Err(CommError::DecodeFailed(format!(
                    "unknown frame kind {other}"
                )));
            }
        };
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&raw[4..8]);
        let mut count = [0u8; 8];
        count.copy_from_slice(&raw[8..16]);
        let mut len = [0u8; 8];
        len.copy_from_slice(&raw[16..24]);
        Ok(Self {
            kind,
            dtype: raw[1],
            tag: u32::from_le_bytes(tag),
            count: u64::from_le_bytes(count),
            len: u64::from_le_bytes(len),
        })
    }
}
