//! Tracks instrument status and sensor configuration across a connection.
//!
//! The instrument interleaves metadata packets with measurement packets on
//! the same stream: one on connect (the welcome packet), one on every
//! arm/disarm transition, and a periodic heartbeat every few seconds while
//! measuring. The heartbeats carry a fresh checksum because the status
//! field changed, but the sensor configuration in them is unchanged, so
//! configuration is only re-applied while no measurement is in progress.

use crate::message::{MetadataPayload, SensorDescriptor};

/// Instrument status as reported in metadata packets.
///
/// `Init` is the disarmed/handshake state and is only ever entered via a
/// fresh connection; there is no transition back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemStatus {
    #[default]
    Init,
    Stopped,
    Measuring,
}

impl SystemStatus {
    fn from_raw(raw: &str) -> Self {
        match raw {
            "stopped" => Self::Stopped,
            "measuring" => Self::Measuring,
            // The welcome packet reports an empty status string.
            _ => Self::Init,
        }
    }
}

/// Spatial layout of the measurement points, one of three mutually
/// exclusive variants. Segments only ever accompany gages.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SensorLayout {
    /// No user-defined points; readings cover the whole fiber at gage pitch.
    #[default]
    FullFiber,
    /// User-defined named point locations.
    Gages {
        locations: Vec<f64>,
        indices: Vec<u32>,
        names: Vec<String>,
    },
    /// Named points plus named contiguous runs expanded at gage pitch.
    GagesAndSegments {
        gage_locations: Vec<f64>,
        gage_indices: Vec<u32>,
        gage_names: Vec<String>,
        segment_locations: Vec<f64>,
        segment_indices: Vec<u32>,
        segment_names: Vec<String>,
        segment_sizes: Vec<u32>,
    },
}

impl SensorLayout {
    /// Classifies a sensor descriptor into one of the three layout variants.
    ///
    /// A `segments` list whose first entry is named `default` is the
    /// instrument's way of spelling "no segments"; with no gages either,
    /// that is a full-fiber layout.
    fn derive(sensor: &SensorDescriptor) -> Self {
        let gages = sensor.gages.as_deref().unwrap_or_default();
        if gages.is_empty() {
            return Self::FullFiber;
        }

        let locations: Vec<f64> = gages.iter().map(|g| g.location_mm).collect();
        let indices: Vec<u32> = gages.iter().map(|g| g.index).collect();
        let names: Vec<String> = gages.iter().map(|g| g.name.clone()).collect();

        match sensor.segments.as_deref() {
            None | Some([]) => Self::Gages {
                locations,
                indices,
                names,
            },
            Some(segments) => Self::GagesAndSegments {
                gage_locations: locations,
                gage_indices: indices,
                gage_names: names,
                segment_locations: segments.iter().map(|s| s.location_mm).collect(),
                segment_indices: segments.iter().map(|s| s.index).collect(),
                segment_names: segments.iter().map(|s| s.name.clone()).collect(),
                segment_sizes: segments.iter().map(|s| s.size).collect(),
            },
        }
    }
}

/// Metadata state tracker: status state machine plus the last applied
/// sensor configuration. One per connection, owned by the control loop.
#[derive(Debug, Default)]
pub struct MetadataTracker {
    status: SystemStatus,
    /// Checksum of the last applied configuration; `None` forces the next
    /// packet to count as changed.
    applied_checksum: Option<String>,
    sensor_length_m: f64,
    sensor_type: String,
    gage_pitch_mm: f64,
    measurement_rate: f64,
    layout: SensorLayout,
}

impl MetadataTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one parsed metadata payload.
    ///
    /// `measurement_in_progress` gates configuration updates: the periodic
    /// heartbeat during a measurement carries a new checksum but must not
    /// re-derive the layout mid-cycle.
    pub fn process_metadata(
        &mut self,
        checksum: Option<&str>,
        payload: &MetadataPayload,
        measurement_in_progress: bool,
    ) {
        // A `measuring` report before any session was established is a
        // leftover packet from a previous session the instrument forgot to
        // clear; ignore it entirely.
        if self.status == SystemStatus::Init && payload.system_status == "measuring" {
            tracing::debug!("ignoring stale-session metadata");
            return;
        }

        self.status = SystemStatus::from_raw(&payload.system_status);
        if self.status == SystemStatus::Init {
            tracing::info!("connection established; waiting for instrument arm");
            return;
        }

        let changed = match checksum {
            Some(sum) => self.applied_checksum.as_deref() != Some(sum),
            // A packet whose checksum line was missing still applies.
            None => true,
        };
        if changed && !measurement_in_progress {
            self.apply_config(checksum, payload);
        } else {
            tracing::debug!(
                changed,
                measurement_in_progress,
                "metadata configuration not re-applied"
            );
        }
    }

    fn apply_config(&mut self, checksum: Option<&str>, payload: &MetadataPayload) {
        let Some(sensor) = payload.sensors.first() else {
            tracing::debug!("metadata packet carries no sensor descriptor");
            return;
        };
        self.gage_pitch_mm = sensor.gage_pitch_mm;
        self.sensor_length_m = sensor.length_m;
        self.sensor_type = sensor.sensor_type.clone();
        self.measurement_rate = payload.measurement_rate;
        self.layout = SensorLayout::derive(sensor);
        self.applied_checksum = checksum.map(str::to_owned);
        tracing::info!(
            sensor_type = %self.sensor_type,
            gage_pitch_mm = self.gage_pitch_mm,
            measurement_rate = self.measurement_rate,
            "metadata applied"
        );
    }

    /// Current instrument status; `Init` until a metadata packet arrives.
    pub fn status(&self) -> SystemStatus {
        self.status
    }

    /// Forces the next metadata packet to count as a configuration change.
    /// Called by the orchestrator between cycles, since the operator may
    /// have reconfigured the instrument while disarmed.
    pub fn reset_checksum(&mut self) {
        self.applied_checksum = None;
    }

    pub fn layout(&self) -> &SensorLayout {
        &self.layout
    }

    pub fn gage_pitch_mm(&self) -> f64 {
        self.gage_pitch_mm
    }

    pub fn sensor_length_m(&self) -> f64 {
        self.sensor_length_m
    }

    pub fn sensor_type(&self) -> &str {
        &self.sensor_type
    }

    pub fn measurement_rate(&self) -> f64 {
        self.measurement_rate
    }
}
