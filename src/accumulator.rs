//! Accumulates one measurement cycle's readings with sequence checking.
//!
//! Measurement packets arrive at up to the instrument's full acquisition
//! rate, so rows are staged in a pre-sized buffer and moved into the
//! accumulated matrix in 1000-row batches. The batching is purely an
//! amortization of growth cost; the semantic result is identical to
//! appending one row at a time.

use crate::error::{Error, Result};
use crate::message::MeasurementPayload;
use crate::metadata::{MetadataTracker, SensorLayout, SystemStatus};

/// Rows staged before each batch append to the matrix.
const BUFFER_ROWS: usize = 1000;

/// A finished measurement cycle: a samples-by-points matrix, one timestamp
/// per row, and one position (with optional name) per column.
#[derive(Debug, Clone, Default)]
pub struct MeasurementCycle {
    pub rows: Vec<Vec<f64>>,
    pub timestamps: Vec<String>,
    /// Position in millimetres of each spatial point, one per column.
    pub positions: Vec<f64>,
    /// Gage/segment point names; empty for full-fiber layouts.
    pub position_names: Vec<String>,
}

impl MeasurementCycle {
    /// Number of samples in the cycle.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Accumulates measurement packets for a single cycle. Created at cycle
/// start, discarded after [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct MeasurementAccumulator {
    /// Fixed on the first accepted packet, from its reported point count.
    columns: usize,
    /// Last accepted sequence number; the first packet seeds it.
    cursor: Option<u64>,
    /// Accumulated matrix. Seeded with a zero placeholder row when storage
    /// is first allocated; `finish` removes it.
    matrix: Vec<Vec<f64>>,
    /// Staging buffer, flushed into the matrix every `BUFFER_ROWS` rows.
    buffer: Vec<Vec<f64>>,
    timestamps: Vec<String>,
    positions: Vec<f64>,
    position_names: Vec<String>,
}

impl MeasurementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one parsed measurement payload.
    ///
    /// Packets with no data, or arriving before the instrument is armed,
    /// are ignored. A sequence discontinuity drops exactly that packet's
    /// row: the cursor resyncs to the received number and
    /// [`Error::SequenceGap`] is returned for the caller to log and
    /// discard.
    pub fn process(
        &mut self,
        payload: &MeasurementPayload,
        tracker: &MetadataTracker,
    ) -> Result<()> {
        if payload.data.is_empty() || tracker.status() == SystemStatus::Init {
            return Ok(());
        }

        self.check_sequence(payload.sequence_number)?;

        if self.columns == 0 {
            self.columns = payload.number_of_gages;
            self.buffer = Vec::with_capacity(BUFFER_ROWS);
            // Placeholder row so batch appends always have a matrix to
            // extend; stripped by `finish`.
            self.matrix.push(vec![0.0; self.columns]);
        }

        // The position vector is derived once per cycle, on the first
        // accepted packet. Metadata cannot change mid-cycle, so it is never
        // recomputed.
        if self.positions.is_empty() {
            self.derive_positions(payload.number_of_gages, tracker);
        }

        self.timestamps.push(payload.timestamp());
        self.buffer.push(payload.data.clone());
        if self.buffer.len() == BUFFER_ROWS {
            self.matrix.append(&mut self.buffer);
        }
        Ok(())
    }

    fn check_sequence(&mut self, seq: u64) -> Result<()> {
        match self.cursor {
            None => {
                self.cursor = Some(seq);
                Ok(())
            }
            Some(last) if seq == last + 1 => {
                self.cursor = Some(seq);
                Ok(())
            }
            Some(last) => {
                // Resync so only the offending row is lost.
                self.cursor = Some(seq);
                Err(Error::sequence_gap(last + 1, seq))
            }
        }
    }

    fn derive_positions(&mut self, point_count: usize, tracker: &MetadataTracker) {
        let pitch = tracker.gage_pitch_mm();
        match tracker.layout() {
            SensorLayout::FullFiber => {
                // Points evenly spaced over [0, pitch * n], endpoint
                // included, matching the instrument software's export.
                let n = point_count;
                let span = pitch * n as f64;
                self.positions = (0..n)
                    .map(|i| {
                        if n > 1 {
                            round2(span * i as f64 / (n - 1) as f64)
                        } else {
                            0.0
                        }
                    })
                    .collect();
            }
            SensorLayout::Gages {
                locations, names, ..
            } => {
                self.positions = locations.clone();
                self.position_names = names.clone();
            }
            SensorLayout::GagesAndSegments {
                gage_locations,
                gage_names,
                segment_locations,
                segment_names,
                segment_sizes,
                ..
            } => {
                let mut positions: Vec<f64> =
                    gage_locations.iter().copied().map(round2).collect();
                let mut names = gage_names.clone();
                for ((&loc, name), &size) in segment_locations
                    .iter()
                    .zip(segment_names)
                    .zip(segment_sizes)
                {
                    for j in 0..size {
                        positions.push(round2(loc + pitch * j as f64));
                        names.push(format!("{name}[{j}]"));
                    }
                }
                self.positions = positions;
                self.position_names = names;
            }
        }
    }

    /// Moves any partially filled buffer into the matrix. Called once,
    /// unconditionally, at cycle end so no trailing rows are lost.
    pub fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.matrix.append(&mut self.buffer);
        }
    }

    /// Rows already moved into the accumulated matrix (placeholder excluded).
    pub fn accumulated_rows(&self) -> usize {
        self.matrix.len().saturating_sub(1)
    }

    /// Rows still staged in the buffer awaiting a flush.
    pub fn pending_rows(&self) -> usize {
        self.buffer.len()
    }

    /// Finalizes the cycle: flushes the buffer, strips the placeholder row,
    /// and hands the result off.
    pub fn finish(mut self) -> MeasurementCycle {
        self.flush();
        if !self.matrix.is_empty() {
            self.matrix.remove(0);
        }
        MeasurementCycle {
            rows: self.matrix,
            timestamps: self.timestamps,
            positions: self.positions,
            position_names: self.position_names,
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MetadataPayload;

    fn armed_tracker(json: serde_json::Value) -> MetadataTracker {
        let payload: MetadataPayload = serde_json::from_value(json).unwrap();
        let mut tracker = MetadataTracker::new();
        tracker.process_metadata(Some("AAAA"), &payload, false);
        assert_eq!(tracker.status(), SystemStatus::Stopped);
        tracker
    }

    fn full_fiber_tracker(pitch: f64) -> MetadataTracker {
        armed_tracker(serde_json::json!({
            "system status": "stopped",
            "measurement rate": 23.8,
            "sensors": [{
                "gage pitch (mm)": pitch,
                "length (m)": 2.0,
                "sensor type": "strain",
            }],
        }))
    }

    fn measurement(seq: u64, data: &[f64]) -> MeasurementPayload {
        serde_json::from_value(serde_json::json!({
            "sequence number": seq,
            "number of gages": data.len(),
            "data": data,
            "hours": 1, "minutes": 2, "seconds": 3,
            "milliseconds": 4, "microseconds": 5,
        }))
        .unwrap()
    }

    #[test]
    fn consecutive_sequence_numbers_all_accepted() {
        let tracker = full_fiber_tracker(1.0);
        let mut acc = MeasurementAccumulator::new();
        for seq in [5, 6, 7] {
            acc.process(&measurement(seq, &[1.0, 2.0]), &tracker).unwrap();
        }
        assert_eq!(acc.cursor, Some(7));
        let cycle = acc.finish();
        assert_eq!(cycle.len(), 3);
    }

    #[test]
    fn gap_drops_offending_row_and_resyncs() {
        let tracker = full_fiber_tracker(1.0);
        let mut acc = MeasurementAccumulator::new();
        acc.process(&measurement(5, &[1.0]), &tracker).unwrap();
        let err = acc.process(&measurement(7, &[2.0]), &tracker).unwrap_err();
        assert!(matches!(err, Error::SequenceGap { expected: 6, got: 7 }));
        // Cursor resynced: the stream continues from 8.
        acc.process(&measurement(8, &[3.0]), &tracker).unwrap();
        let cycle = acc.finish();
        assert_eq!(cycle.rows, vec![vec![1.0], vec![3.0]]);
    }

    #[test]
    fn empty_payload_and_init_status_are_ignored() {
        let tracker = full_fiber_tracker(1.0);
        let mut acc = MeasurementAccumulator::new();
        acc.process(&measurement(1, &[]), &tracker).unwrap();
        assert_eq!(acc.pending_rows(), 0);

        let idle = MetadataTracker::new();
        acc.process(&measurement(1, &[1.0]), &idle).unwrap();
        assert_eq!(acc.pending_rows(), 0);
    }

    #[test]
    fn full_fiber_positions_span_pitch_times_count() {
        let tracker = full_fiber_tracker(2.0);
        let mut acc = MeasurementAccumulator::new();
        acc.process(&measurement(1, &[0.0; 5]), &tracker).unwrap();
        // linspace(0, 2.0 * 5, 5): endpoint included.
        assert_eq!(acc.positions, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert!(acc.position_names.is_empty());
    }

    #[test]
    fn segment_expansion_names_and_positions() {
        let tracker = armed_tracker(serde_json::json!({
            "system status": "stopped",
            "measurement rate": 23.8,
            "sensors": [{
                "gage pitch (mm)": 2.0,
                "length (m)": 2.0,
                "sensor type": "strain",
                "gages": [{"location (mm)": 1.0, "index": 0, "gage name": "G1"}],
                "segments": [{"location (mm)": 10.0, "index": 1, "segment name": "S1", "size": 3}],
            }],
        }));
        let mut acc = MeasurementAccumulator::new();
        acc.process(&measurement(1, &[0.0; 4]), &tracker).unwrap();
        assert_eq!(acc.positions, vec![1.0, 10.0, 12.0, 14.0]);
        assert_eq!(acc.position_names, vec!["G1", "S1[0]", "S1[1]", "S1[2]"]);
    }

    #[test]
    fn buffer_flushes_every_thousand_rows() {
        let tracker = full_fiber_tracker(1.0);
        let mut acc = MeasurementAccumulator::new();
        for seq in 1..=1001u64 {
            acc.process(&measurement(seq, &[seq as f64]), &tracker).unwrap();
        }
        assert_eq!(acc.accumulated_rows(), 1000);
        assert_eq!(acc.pending_rows(), 1);

        acc.flush();
        assert_eq!(acc.accumulated_rows(), 1001);
        assert_eq!(acc.pending_rows(), 0);

        let cycle = acc.finish();
        assert_eq!(cycle.len(), 1001);
        assert_eq!(cycle.timestamps.len(), 1001);
        // Placeholder row is gone; row 0 is the first real sample.
        assert_eq!(cycle.rows[0], vec![1.0]);
    }
}
