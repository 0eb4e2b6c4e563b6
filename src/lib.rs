//! # odisi-stream
//!
//! A streaming TCP client for Luna ODiSI fiber-optic interrogators.
//!
//! ## Overview
//!
//! The ODiSI instrument software streams null-terminated JSON packets over
//! a single TCP connection, interleaving configuration ("metadata") packets
//! with high-rate measurement packets. This crate reconstructs packet
//! boundaries from the raw byte stream, tracks the instrument's status
//! transitions, validates measurement continuity, and accumulates a whole
//! measurement cycle (Start pressed to Stop pressed) into one in-memory
//! record ready for export.
//!
//! ## Key pieces
//!
//! * **[`FrameSplitter`]**: carries partial reads and yields complete packet
//!   payloads with their checksum lines
//! * **[`MetadataTracker`]**: instrument status state machine plus sensor
//!   layout (full fiber, gages, gages + segments)
//! * **[`MeasurementAccumulator`]**: sequence-checked, batch-buffered row
//!   accumulation with per-cycle position derivation
//! * **[`CycleRunner`]**: the blocking control loop tying them together over
//!   any `std::io::Read` transport
//!
//! ## Quick start
//!
//! ```no_run
//! use odisi_stream::{connect, save_csv, CycleRunner, Result};
//!
//! fn main() -> Result<()> {
//!     let stream = connect("169.254.151.199")?;
//!     let mut runner = CycleRunner::new(stream);
//!
//!     while let Some(cycle) = runner.run_cycle()? {
//!         println!("received {} samples", cycle.len());
//!         save_csv(&cycle, "run-01")?;
//!         // The operator may reconfigure the instrument between cycles.
//!         runner.reset_metadata();
//!     }
//!     Ok(())
//! }
//! ```
//!
//! One channel, one connection, one cycle at a time: the instrument is the
//! sole data source, so the whole pipeline is single-threaded and
//! synchronous. Cancellation is cooperative via
//! [`CycleRunner::cancel_handle`].

pub mod accumulator;
pub mod cycle;
pub mod error;
pub mod export;
pub mod framing;
pub mod message;
pub mod metadata;
pub mod transport;

// Re-export the main public API for user convenience.
pub use accumulator::{MeasurementAccumulator, MeasurementCycle};
pub use cycle::CycleRunner;
pub use error::{Error, Result};
pub use export::{save_csv, write_csv};
pub use framing::{FrameSplitter, RawFrame};
pub use message::{MeasurementPayload, Message, MetadataPayload};
pub use metadata::{MetadataTracker, SensorLayout, SystemStatus};
pub use transport::{connect, ODISI_PORT};
