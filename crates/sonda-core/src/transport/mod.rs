pub(crate) mod keys;
mod rocksdb;
mod traits;

pub use self::rocksdb::RocksDbTransport;
pub use traits::{QueueTransport, SessionHandle};
