pub mod header;
pub mod message;

pub use header::{FrameHeader, FrameKind, HEADER_SIZE};
pub use message::{Handshake, PROTOCOL_VERSION};
