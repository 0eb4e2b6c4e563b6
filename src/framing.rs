//! Reassembles null-terminated packets from an unstructured byte stream.
//!
//! The instrument writes each packet as UTF-8 JSON starting with `{`,
//! followed by a newline-delimited checksum line, terminated by a single
//! `0x00` byte. TCP gives no framing beyond that: a single read may carry
//! several packets, and a packet may span several reads. The splitter owns
//! the carry buffer between reads and yields complete frames only.

/// A complete packet payload extracted from the stream, paired with the
/// checksum string from its second line. Ephemeral; parsed immediately by
/// the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// The JSON text of the packet, trailing CR/LF and checksum stripped.
    pub payload: String,
    /// Opaque change-detection token; `None` when the packet had no second
    /// line. Tolerated, not an error.
    pub checksum: Option<String>,
}

/// Stateful frame reassembler. One per connection.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    carry: Vec<u8>,
}

const TERMINATOR: u8 = 0x00;

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one transport read into the splitter and returns every frame
    /// completed by it. Returns an empty vector when no terminator has
    /// arrived yet (pure buffering call).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        self.carry.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(end) = self.carry.iter().position(|&b| b == TERMINATOR) {
            let candidate: Vec<u8> = self.carry.drain(..=end).take(end).collect();
            match parse_candidate(&candidate) {
                Some(frame) => frames.push(frame),
                None => {
                    tracing::debug!(len = candidate.len(), "discarded non-packet candidate");
                }
            }
        }

        // A leftover that does not open a JSON object is line noise, not a
        // partial frame; the instrument always starts payloads with `{`.
        if !self.carry.first().is_some_and(|&b| b == b'{') {
            self.carry.clear();
        }

        frames
    }

    /// Bytes currently buffered awaiting a terminator.
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }
}

/// Validates and cleans one terminator-delimited candidate. `None` means the
/// candidate is framing noise (wrong prefix or undecodable) and is dropped
/// silently.
fn parse_candidate(candidate: &[u8]) -> Option<RawFrame> {
    if candidate.first() != Some(&b'{') {
        return None;
    }
    let text = std::str::from_utf8(candidate).ok()?;

    // Checksum is the second newline-delimited line, minus any stray
    // terminator remnants.
    let checksum = text
        .split('\n')
        .nth(1)
        .map(|line| line.replace('\0', ""))
        .filter(|line| !line.is_empty());

    // Trailing CR/LF and the checksum line are stripped as a character set,
    // which also cleans up malformed packets that duplicate the checksum at
    // the tail of the payload text. The `}` closing the JSON object bounds
    // the strip.
    let payload = match checksum.as_deref() {
        Some(sum) => text.trim_end_matches(|c| c == '\r' || c == '\n' || sum.contains(c)),
        None => text.trim_end_matches(['\r', '\n']),
    };

    Some(RawFrame {
        payload: payload.to_string(),
        checksum,
    })
}
