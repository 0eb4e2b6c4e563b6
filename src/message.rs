//! Serde schemas for the instrument's JSON wire payloads.
//!
//! Every packet is a JSON object carrying a `"message type"` discriminator.
//! The schemas below pin down the fields the client consumes, with the
//! instrument's exact key names (spaces included). A payload missing a
//! required field fails at parse time instead of somewhere downstream.

use serde::Deserialize;

/// A parsed wire payload, dispatched on the `"message type"` field.
///
/// Kinds the instrument emits beyond the known three deserialize into
/// `Unknown` and are ignored by the control loop.
#[derive(Debug, Deserialize)]
#[serde(tag = "message type")]
pub enum Message {
    #[serde(rename = "metadata")]
    Metadata(MetadataPayload),
    #[serde(rename = "measurement")]
    Measurement(MeasurementPayload),
    #[serde(rename = "tare")]
    Tare,
    #[serde(other)]
    Unknown,
}

/// Configuration/status packet. Sent on connect (the welcome packet, with an
/// empty status), on arm/disarm, and as a periodic heartbeat while measuring.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataPayload {
    #[serde(rename = "system status")]
    pub system_status: String,
    /// Absent from the welcome packet.
    #[serde(rename = "measurement rate", default)]
    pub measurement_rate: f64,
    /// One descriptor per channel; only channel 0 is supported.
    #[serde(default)]
    pub sensors: Vec<SensorDescriptor>,
}

/// Per-channel sensor description inside a metadata payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorDescriptor {
    #[serde(rename = "gage pitch (mm)")]
    pub gage_pitch_mm: f64,
    #[serde(rename = "length (m)")]
    pub length_m: f64,
    #[serde(rename = "sensor type")]
    pub sensor_type: String,
    pub gages: Option<Vec<GageDescriptor>>,
    pub segments: Option<Vec<SegmentDescriptor>>,
}

/// A single named measurement point along the fiber.
#[derive(Debug, Clone, Deserialize)]
pub struct GageDescriptor {
    #[serde(rename = "location (mm)")]
    pub location_mm: f64,
    pub index: u32,
    #[serde(rename = "gage name")]
    pub name: String,
}

/// A named contiguous run of evenly spaced points, expanded at gage pitch.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentDescriptor {
    #[serde(rename = "location (mm)")]
    pub location_mm: f64,
    pub index: u32,
    #[serde(rename = "segment name")]
    pub name: String,
    pub size: u32,
}

/// One row of readings, stamped with a sub-minute wall-clock time.
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementPayload {
    #[serde(rename = "sequence number")]
    pub sequence_number: u64,
    #[serde(rename = "number of gages")]
    pub number_of_gages: usize,
    pub data: Vec<f64>,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub milliseconds: u32,
    pub microseconds: u32,
}

impl MeasurementPayload {
    /// Timestamp string in the instrument's sub-minute form, e.g. `14:3:27.042117`.
    /// No date component; milliseconds and microseconds zero-padded to 3 digits.
    pub fn timestamp(&self) -> String {
        format!(
            "{}:{}:{}.{:03}{:03}",
            self.hours, self.minutes, self.seconds, self.milliseconds, self.microseconds
        )
    }
}
