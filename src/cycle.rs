//! The per-connection control loop: read, reassemble, dispatch, detect
//! cycle end.
//!
//! A measurement cycle spans the operator pressing Start to pressing Stop
//! in the instrument software. The runner blocks on the transport with no
//! timeout, relying on the instrument to eventually send the `stopped`
//! metadata packet (which can lag the physical stop by several seconds).
//! Cancellation is cooperative and only observed between reads.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::accumulator::{MeasurementAccumulator, MeasurementCycle};
use crate::error::{Error, Result};
use crate::framing::FrameSplitter;
use crate::message::Message;
use crate::metadata::{MetadataTracker, SystemStatus};

/// Transport read size. Several packets can arrive in one read at high
/// measurement rates.
const READ_CHUNK: usize = 4096;

/// Drives measurement cycles over a single instrument connection.
///
/// Generic over any blocking byte source, so tests run it over an
/// in-memory cursor and production runs it over a `TcpStream`.
pub struct CycleRunner<R: Read> {
    reader: R,
    splitter: FrameSplitter,
    tracker: MetadataTracker,
    cancel: Arc<AtomicBool>,
}

impl<R: Read> CycleRunner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            splitter: FrameSplitter::new(),
            tracker: MetadataTracker::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag for interrupting [`run_cycle`](Self::run_cycle) from
    /// another thread (e.g. a Ctrl-C handler). Checked only between
    /// transport reads; a read in progress cannot be preempted.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs one measurement cycle to completion.
    ///
    /// Returns `Ok(Some(cycle))` when the instrument reports `stopped`
    /// after measuring began, `Ok(None)` when cancelled, and an error on
    /// transport failure or a corrupt payload. Blocks indefinitely between
    /// packets.
    pub fn run_cycle(&mut self) -> Result<Option<MeasurementCycle>> {
        let mut accumulator = MeasurementAccumulator::new();
        let mut started = false;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::info!("cycle cancelled");
                return Ok(None);
            }

            let n = self.reader.read(&mut chunk)?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }

            for frame in self.splitter.push(&chunk[..n]) {
                match serde_json::from_str::<Message>(&frame.payload)? {
                    Message::Metadata(payload) => {
                        self.tracker
                            .process_metadata(frame.checksum.as_deref(), &payload, started);
                        if self.tracker.status() == SystemStatus::Stopped && started {
                            let cycle = accumulator.finish();
                            tracing::info!(samples = cycle.len(), "measurement cycle complete");
                            return Ok(Some(cycle));
                        }
                    }
                    Message::Measurement(payload) => {
                        // The instrument occasionally sends empty packets.
                        if payload.data.is_empty() {
                            continue;
                        }
                        if !started && self.tracker.status() == SystemStatus::Stopped {
                            started = true;
                            tracing::info!("acquiring measurement");
                        }
                        match accumulator.process(&payload, &self.tracker) {
                            Ok(()) => {}
                            // Gaps are rare and non-fatal; lose one row and
                            // keep acquiring.
                            Err(err @ Error::SequenceGap { .. }) => {
                                tracing::warn!(%err, "dropped measurement row");
                            }
                            Err(err) => return Err(err),
                        }
                    }
                    Message::Tare => {
                        // Defined on the wire, never observed in practice.
                    }
                    Message::Unknown => {}
                }
            }
        }
    }

    /// Forces the next metadata packet to re-apply configuration. Must be
    /// called between cycles, since the operator may reconfigure the
    /// instrument while it is disarmed.
    pub fn reset_metadata(&mut self) {
        self.tracker.reset_checksum();
    }

    /// Instrument state as of the last processed metadata packet.
    pub fn status(&self) -> SystemStatus {
        self.tracker.status()
    }

    /// Releases the transport.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
