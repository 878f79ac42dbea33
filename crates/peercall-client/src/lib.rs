pub mod channel;
pub mod pool;

pub use channel::{Channel, ChannelOptions};
pub use pool::{ChannelPool, PoolConfig};
