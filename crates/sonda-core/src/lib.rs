pub mod config;
pub mod error;
pub mod message;
pub mod metrics;
pub mod ops;
pub mod queue;
mod redrive;
pub mod scan;
pub mod telemetry;
pub mod transport;

pub use config::SondaConfig;
pub use error::{
    ConfigError, FindError, ListError, PublishError, RequeueError, SessionError, TransportError,
    TransportResult,
};
pub use message::{OutboundMessage, PeekedMessage, PropertyValue, SequenceNumber};
pub use ops::{Inspector, Publisher};
pub use queue::{QueueView, SubQueue};
pub use scan::LookupQuery;
pub use transport::{QueueTransport, RocksDbTransport};
