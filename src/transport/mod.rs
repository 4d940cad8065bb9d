mod channel;
mod group;
pub(crate) mod mailbox;

pub use channel::Channel;
pub(crate) use channel::SendCompletion;
pub use group::ChannelGroup;
