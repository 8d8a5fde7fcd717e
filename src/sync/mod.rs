//! Real-time synchronization core.
//!
//! Tracks open connections, decodes client updates, and fans every accepted
//! update out to the other connections.

pub mod broadcast;
pub mod codec;
pub mod connection;
pub mod registry;

pub use broadcast::{AdmitError, BroadcastEngine, FanOut};
pub use codec::{CodecError, MessageCodec, SlotUpdate, UpdateFrame};
pub use connection::{Connection, ConnectionId, Outbox, SendError};
pub use registry::ConnectionRegistry;
