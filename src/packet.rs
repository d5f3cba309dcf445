// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Packet framing over the raw serial link.

use tracing::{debug, trace, warn};
use crate::engine::FrameSpec;
use crate::error::LinkError;
use crate::protocol::*;
use crate::serial::SerialPort;

/// Link behaviour fixed for the duration of a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Clear the eighth bit of every received byte.
    pub strip_parity: bool,
    /// Honour ^C^C^C outside a packet as an abort.
    pub remote: bool,
}

// ============================================================================
// Packet Receiver
// ============================================================================

/// Reads bytes until one packet is delimited and returns its content length.
///
/// Bytes before the start marker are discarded. A second start marker
/// restarts the packet. The content ends at the end marker or at a line feed
/// (sent by terminal emulators that cannot be told otherwise). Content longer
/// than the frame's maximum, or than `buf`, is fatal: nothing is truncated.
///
/// Blocks without a timeout until a packet or a fatal condition arrives.
pub fn read_packet(
    serial: &mut dyn SerialPort,
    frame: FrameSpec,
    buf: Option<&mut [u8]>,
    opts: LinkOptions,
) -> Result<usize, LinkError> {
    let Some(buf) = buf else {
        debug!("readpkt: no buffer");
        return Err(LinkError::NoBuffer);
    };

    let limit = frame.max_len.min(buf.len());
    let mut in_packet = false;
    let mut len = 0;
    let mut ctrl_c = 0;

    loop {
        let raw = serial.read_byte()?;
        let c = if opts.strip_parity { raw & PARITY_MASK } else { raw };

        if opts.remote && !in_packet && c == CTRL_C {
            ctrl_c += 1;
            if ctrl_c >= 3 {
                debug!("readpkt ^C^C^C");
                return Err(LinkError::Aborted);
            }
            continue;
        }
        ctrl_c = 0;

        if c == frame.start {
            in_packet = true;
            len = 0;
            continue;
        }
        if !in_packet {
            continue;
        }
        if c == frame.end || c == LF {
            trace!(len, packet = ?&buf[..len], "readpkt");
            return Ok(len);
        }
        if len >= limit {
            warn!(limit, "readpkt packet too long");
            return Err(LinkError::FrameTooLong { max: limit });
        }
        buf[len] = c;
        len += 1;
    }
}

// ============================================================================
// Packet Transmitter
// ============================================================================

/// Writes every byte of `data`, retrying partial writes a bounded number of
/// times. Running out of attempts or a write error is fatal.
pub fn send_all(serial: &mut dyn SerialPort, data: &[u8]) -> Result<(), LinkError> {
    let mut sent = 0;
    let mut attempts = 0;

    while sent < data.len() {
        if attempts == TX_ATTEMPTS {
            warn!(sent, len = data.len(), "tx_data gave up");
            return Err(LinkError::WriteIncomplete { sent, len: data.len(), attempts });
        }
        attempts += 1;
        match serial.write(&data[sent..]) {
            Ok(n) => sent += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    debug!(len = data.len(), attempts, "tx_data write");
    Ok(())
}

// ============================================================================
// Link Probe
// ============================================================================

/// Non-blocking check for pending input. A port that cannot answer is
/// reported as having nothing waiting.
pub fn input_waiting(serial: &mut dyn SerialPort) -> bool {
    match serial.bytes_available() {
        Ok(n) => n > 0,
        Err(e) => {
            debug!(error = %e, "inchk failed");
            false
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
