//! Stream orchestration for resumable chat generations.
//!
//! A [`ChatEngine`] runs one provider generation per thread, fans its output out to the
//! original caller and to any number of resume observers, and keeps a durable checkpoint
//! so a stream can be replayed after the live generation has ended.

pub mod builder;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod frames;
pub mod hub;

pub use builder::ChatEngineBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{ChatEngine, FrameStream, SendRequest};
pub use error::{EngineError, Result};
pub use frames::{encode_sse, StreamFrame};
pub use hub::{LiveBroadcast, StreamHub};
