use super::*;
use crate::message::OutboundMessage;
use crate::queue::SubQueue;
use crate::scan::LookupQuery;
use crate::transport::RocksDbTransport;

mod common;
use common::*;

mod requeue;
mod session;
