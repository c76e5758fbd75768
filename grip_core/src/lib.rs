#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Critical force assessment core (transport-agnostic).
//!
//! Readings reach the engine through `grip_traits::ForceSource`; nothing in
//! this crate knows about Bluetooth, files on a phone, or a UI.
//!
//! ## Architecture
//!
//! - **Engine**: the protocol state machine (`engine`, phases in `status`)
//! - **Metrics**: critical force and W′ over finished data (`metrics`)
//! - **Records**: samples, cycles, the saved assessment and max force test (`record`)
//! - **Runner**: actor thread that serializes samples and ticks (`runner`)
//! - **Sampler**: source polling and fan-out to sinks (`sampler`)
//! - **Storage**: repository trait, JSON file store, backups (`store`, `backup`)
//!
//! ## Protocol
//!
//! 24 cycles of 7 s work / 3 s rest. A work phase starts when force reaches
//! 5 kg while waiting; the end warning fires with 3 s left. Critical force is
//! the mean of the last 6 cycle averages, and W′ integrates force above it
//! over the whole session.

pub mod atomic;
pub mod backup;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod hw_error;
pub mod metrics;
pub mod mocks;
pub mod record;
pub mod runner;
pub mod sampler;
pub mod status;
pub mod store;
pub mod util;

pub use backup::Backup;
pub use config::{ProtocolCfg, RunParams, SamplingMode};
pub use engine::{Engine, EngineSnapshot};
pub use error::{BuildError, GripError, Report, Result};
pub use record::{AssessmentOutcome, AssessmentRecord, Cycle, Hand, MaxForceRecord, Sample};
pub use runner::{AssessmentHandle, Control};
pub use sampler::{Fanout, ForceReading, Sampler};
pub use status::{Phase, Signal};
pub use store::{AssessmentRepository, JsonFileRepository, MemoryRepository};
