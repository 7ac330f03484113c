pub mod channel_store;
pub mod tag_index;

pub use channel_store::ChannelStore;
