//! Thin TCP connection helper.
//!
//! Connection management is deliberately minimal: one instrument, one
//! connection, no reconnection. The control loop only needs a blocking
//! `Read` source; everything here exists so callers don't hard-code the
//! streaming port.

use std::io;
use std::net::TcpStream;

/// Well-known streaming port of the instrument software.
pub const ODISI_PORT: u16 = 50000;

/// Connects to the instrument's streaming endpoint.
///
/// The host is the address shown in the instrument software under
/// Settings → Streaming Properties. Nagle is disabled; measurement packets
/// are small and latency-sensitive.
pub fn connect(host: &str) -> io::Result<TcpStream> {
    tracing::info!(host, port = ODISI_PORT, "connecting to instrument");
    let stream = TcpStream::connect((host, ODISI_PORT))?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
