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

use std::io::{Read, Write};
use std::time::Duration;
use serialport::{SerialPort as SerialPortTrait, DataBits, Parity, StopBits};

// ============================================================================
// SerialPort Trait
// ============================================================================

/// Raw byte primitives of the serial link used by the packet layer.
pub trait SerialPort: Send {
    /// Blocks until one byte has arrived. There is no timeout; the only way
    /// out of a silent link is the in-band ^C^C^C convention.
    fn read_byte(&mut self) -> std::io::Result<u8>;

    /// Writes some prefix of `buf`, returning how many bytes went out.
    /// `Ok(0)` means nothing could be written this attempt.
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>;

    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> std::io::Result<u32>;
}

// ============================================================================
// Real Serial Port Implementation
// ============================================================================

/// Polling interval of the underlying port while a blocking read waits
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Real serial port implementation that wraps the serialport crate
pub struct RealSerialPort {
    port: Box<dyn SerialPortTrait>,
}

impl RealSerialPort {
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(POLL_INTERVAL)
            .open()?;

        Ok(RealSerialPort { port })
    }
}

impl SerialPort for RealSerialPort {
    fn read_byte(&mut self) -> std::io::Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.port.read(&mut buf) {
                Ok(1) => return Ok(buf[0]),
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = match self.port.write(buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
            Err(e) => return Err(e),
        };
        self.port.flush()?;
        Ok(n)
    }

    fn bytes_available(&mut self) -> std::io::Result<u32> {
        self.port.bytes_to_read().map_err(std::io::Error::other)
    }
}

// ============================================================================
// Mock Serial Port for Testing
// ============================================================================

#[cfg(test)]
pub struct MockSerialPort {
    // Bytes handed out by read_byte, in order
    read_buffer: Vec<u8>,
    read_pos: usize,
    // Track what was written
    write_log: Vec<u8>,
    // Expected writes for verification
    expected_writes: Vec<u8>,
    // Largest chunk a single write call accepts
    write_limit: usize,
    // Fail every write with an I/O error
    broken: bool,
}

#[cfg(test)]
impl MockSerialPort {
    pub fn new(responses: Vec<u8>, expected_writes: Vec<u8>) -> Self {
        MockSerialPort {
            read_buffer: responses,
            read_pos: 0,
            write_log: Vec::new(),
            expected_writes,
            write_limit: usize::MAX,
            broken: false,
        }
    }

    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = limit;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

#[cfg(test)]
impl SerialPort for MockSerialPort {
    fn read_byte(&mut self) -> std::io::Result<u8> {
        // Out of responses = the link went away
        if self.read_pos >= self.read_buffer.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Mock link closed"
            ));
        }
        let byte = self.read_buffer[self.read_pos];
        self.read_pos += 1;
        Ok(byte)
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.broken {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Mock write failure"
            ));
        }
        let n = buf.len().min(self.write_limit);
        self.write_log.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn bytes_available(&mut self) -> std::io::Result<u32> {
        Ok((self.read_buffer.len() - self.read_pos) as u32)
    }
}

#[cfg(test)]
impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        assert_eq!(
            self.read_pos,
            self.read_buffer.len(),
            "MockSerialPort dropped with {} unconsumed responses (read {} of {} bytes)",
            self.read_buffer.len() - self.read_pos,
            self.read_pos,
            self.read_buffer.len()
        );

        assert_eq!(
            &self.write_log,
            &self.expected_writes,
            "MockSerialPort write log mismatch!\nExpected {} bytes:\n{:02X?}\nGot {} bytes:\n{:02X?}",
            self.expected_writes.len(),
            self.expected_writes,
            self.write_log.len(),
            self.write_log
        );
    }
}
