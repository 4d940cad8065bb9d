mod bootstrap;
mod collectives;
mod communicator;
mod connections;
mod create;
mod messaging;
mod request;
mod sync_client;

pub(crate) use communicator::CommInner;
pub use communicator::Communicator;
pub(crate) use request::stage_into;
pub use request::{CommRequest, RequestGroup};
pub use sync_client::{SyncCommunicator, SyncRequest};
