//! # bridge-core
//!
//! The Async Command Bridge: a fixed set of document operations exposed as
//! asynchronous request/response pairs over a callback channel, regardless
//! of which underlying engine calls are synchronous or asynchronous.
//!
//! # Architecture
//!
//! ```text
//! Caller → DocumentBridge → DocumentEngine (native SDK boundary)
//!               ↓
//!        CallbackChannel → delivery context (caller drains replies)
//! ```
//!
//! Every call goes through three stages:
//! 1. **Validation**: the document handle is revalidated and arguments are
//!    range/shape checked; failures produce a structured error without
//!    touching the engine.
//! 2. **Delegated execution**: heavy operations run on a background task,
//!    cheap ones execute inline on the calling task.
//! 3. **Response translation**: the engine's outcome becomes exactly one
//!    [`BridgeReply`](bridge_types::BridgeReply) on the callback channel.
//!
//! Teardown marks the channel inert: late engine results are dropped, never
//! delivered.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod channel;
pub mod engine;
pub mod events;
pub mod forms;

pub use bridge::{DocumentBridge, ExecutionClass, Operation};
pub use channel::{CallbackChannel, Delivery};
pub use engine::{DocumentEngine, EngineError, MockEngine};
pub use events::{EventForwarder, EventSink};
