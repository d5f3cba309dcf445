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

//! Boundary between this program and the Kermit protocol engine.
//!
//! The engine owns packet grammar, block checks, windowing and the
//! send/receive state machine. It reaches the outside world only through
//! [`Callbacks`], which it borrows for the duration of a single call.

use crate::error::{FileError, LinkError};
use crate::protocol::*;

// ============================================================================
// Engine Types
// ============================================================================

/// Result of every engine entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    InProgress,
    Done,
    Error,
}

/// Frame delimiters the engine expects on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    pub start: u8,
    pub end: u8,
    pub max_len: usize,
}

impl Default for FrameSpec {
    fn default() -> Self {
        FrameSpec { start: SOH, end: CR, max_len: P_PKTLEN }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParityMode {
    #[default]
    None,
    Even,
    Odd,
}

impl ParityMode {
    pub fn is_active(self) -> bool {
        self != ParityMode::None
    }
}

// Engine-facing: the linked engine chooses the variants it uses
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Binary,
}

/// How the engine wants a file's type determined by `file_info`.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Auto,
    Manual,
}

/// Opaque index of an engine-owned receive buffer.
pub type Slot = usize;

/// `open_file` mode: open an existing file for reading
pub const OPEN_READ: i32 = 1;
/// `open_file` mode: create or truncate a file for writing
pub const OPEN_WRITE: i32 = 2;
/// `close_file` mode: the input file
pub const CLOSE_INPUT: i32 = 1;
/// `close_file` modes: the output file
pub const CLOSE_OUTPUT: i32 = 2;
pub const CLOSE_OUTPUT_ERROR: i32 = 3;

/// Parameters of one engine invocation. Borrowed per call, never retained.
#[derive(Debug, Clone, Copy)]
pub struct Settings<'a> {
    pub parity: ParityMode,
    pub binary: bool,
    pub block_check: u8,
    pub force_block_check: bool,
    pub keep_incomplete: bool,
    pub remote: bool,
    pub files: &'a [String],
}

/// Snapshot of the transfer in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub filename: Option<String>,
    pub date: Option<String>,
    pub size: Option<u64>,
    pub state: i32,
    pub sofar: u64,
}

// ============================================================================
// Traits
// ============================================================================

/// Operations the engine may invoke on the link and the filesystem.
/// Only a linked engine calls them.
#[allow(dead_code)]
pub trait Callbacks {
    /// Reads one delimited packet body into `buf`. Blocks until a whole
    /// packet arrived; any error is fatal.
    fn receive_frame(&mut self, frame: FrameSpec, buf: Option<&mut [u8]>) -> Result<usize, LinkError>;

    /// Sends all of `data` or fails.
    fn transmit(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// True if at least one byte can be read without blocking.
    fn input_waiting(&mut self) -> bool;

    fn open_file(&mut self, path: &str, mode: i32) -> Result<(), FileError>;

    fn file_info(
        &mut self,
        path: &str,
        date: &mut [u8],
        kind: &mut FileKind,
        mode: TransferMode,
    ) -> Result<u64, FileError>;

    /// Next byte of the input file, `None` at end of file.
    fn read_byte(&mut self) -> Result<Option<u8>, FileError>;

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), FileError>;

    fn close_file(&mut self, status: u8, mode: i32) -> Result<(), FileError>;
}

/// Entry points of the protocol engine driven by the session.
pub trait ProtocolEngine: Send {
    fn version(&self) -> &str;

    fn init(&mut self, settings: &Settings<'_>, io: &mut dyn Callbacks) -> Status;

    fn begin_send(&mut self, settings: &Settings<'_>, io: &mut dyn Callbacks) -> Status;

    fn frame(&self) -> FrameSpec;

    /// Reserves a receive window slot, `None` if the window is full.
    fn request_slot(&mut self) -> Option<Slot>;

    fn slot_buffer(&mut self, slot: Slot) -> &mut [u8];

    fn release_slot(&mut self, slot: Slot);

    /// Processes whatever was read into `slot` (possibly nothing).
    fn step(&mut self, settings: &Settings<'_>, slot: Slot, len: usize, io: &mut dyn Callbacks) -> Status;

    fn progress(&self) -> Progress;
}

// ============================================================================
// Unlinked Engine
// ============================================================================

/// Stand-in used when no protocol engine is linked into the build.
/// Initialization always fails, which ends the session.
#[derive(Debug, Default)]
pub struct Unlinked;

impl ProtocolEngine for Unlinked {
    fn version(&self) -> &str {
        "unlinked"
    }

    fn init(&mut self, _settings: &Settings<'_>, _io: &mut dyn Callbacks) -> Status {
        tracing::error!("no protocol engine linked into this build");
        Status::Error
    }

    fn begin_send(&mut self, _settings: &Settings<'_>, _io: &mut dyn Callbacks) -> Status {
        Status::Error
    }

    fn frame(&self) -> FrameSpec {
        FrameSpec::default()
    }

    fn request_slot(&mut self) -> Option<Slot> {
        None
    }

    fn slot_buffer(&mut self, _slot: Slot) -> &mut [u8] {
        &mut []
    }

    fn release_slot(&mut self, _slot: Slot) {}

    fn step(&mut self, _settings: &Settings<'_>, _slot: Slot, _len: usize, _io: &mut dyn Callbacks) -> Status {
        Status::Error
    }

    fn progress(&self) -> Progress {
        Progress::default()
    }
}

// ============================================================================
// Scripted Engine for Testing
// ============================================================================

/// What the session asked of a `ScriptedEngine`.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct EngineLog {
    pub inits: usize,
    pub sends: usize,
    pub steps: Vec<usize>,
    pub releases: usize,
    pub files: Vec<String>,
}

/// Single-slot engine replaying a fixed status sequence.
#[cfg(test)]
pub struct ScriptedEngine {
    init_status: Status,
    statuses: std::collections::VecDeque<Status>,
    buffer: Vec<u8>,
    slot_busy: bool,
    log: std::sync::Arc<std::sync::Mutex<EngineLog>>,
}

#[cfg(test)]
impl ScriptedEngine {
    pub fn new(statuses: Vec<Status>) -> (Self, std::sync::Arc<std::sync::Mutex<EngineLog>>) {
        let log = std::sync::Arc::new(std::sync::Mutex::new(EngineLog::default()));
        let engine = ScriptedEngine {
            init_status: Status::InProgress,
            statuses: statuses.into(),
            buffer: vec![0; P_PKTLEN],
            slot_busy: false,
            log: log.clone(),
        };
        (engine, log)
    }

    pub fn failing_init(mut self) -> Self {
        self.init_status = Status::Error;
        self
    }
}

#[cfg(test)]
impl ProtocolEngine for ScriptedEngine {
    fn version(&self) -> &str {
        "scripted"
    }

    fn init(&mut self, _settings: &Settings<'_>, _io: &mut dyn Callbacks) -> Status {
        self.log.lock().unwrap().inits += 1;
        self.init_status
    }

    fn begin_send(&mut self, settings: &Settings<'_>, _io: &mut dyn Callbacks) -> Status {
        let mut log = self.log.lock().unwrap();
        log.sends += 1;
        log.files = settings.files.to_vec();
        Status::InProgress
    }

    fn frame(&self) -> FrameSpec {
        FrameSpec::default()
    }

    fn request_slot(&mut self) -> Option<Slot> {
        if self.slot_busy {
            return None;
        }
        self.slot_busy = true;
        Some(0)
    }

    fn slot_buffer(&mut self, _slot: Slot) -> &mut [u8] {
        &mut self.buffer
    }

    fn release_slot(&mut self, _slot: Slot) {
        self.log.lock().unwrap().releases += 1;
        self.slot_busy = false;
    }

    fn step(&mut self, _settings: &Settings<'_>, _slot: Slot, len: usize, _io: &mut dyn Callbacks) -> Status {
        self.log.lock().unwrap().steps.push(len);
        if len > 0 {
            self.slot_busy = false;
        }
        self.statuses.pop_front().unwrap_or(Status::Error)
    }

    fn progress(&self) -> Progress {
        Progress { filename: Some("SCRIPT".into()), state: 1, ..Progress::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame() {
        let frame = FrameSpec::default();
        assert_eq!(frame.start, SOH);
        assert_eq!(frame.end, CR);
        assert_eq!(frame.max_len, P_PKTLEN);
    }

    #[test]
    fn test_parity_active() {
        assert!(!ParityMode::None.is_active());
        assert!(ParityMode::Even.is_active());
        assert!(ParityMode::Odd.is_active());
    }

    #[test]
    fn test_unlinked_engine_never_starts() {
        let mut engine = Unlinked;
        assert_eq!(engine.request_slot(), None);
        assert!(engine.slot_buffer(0).is_empty());
        assert_eq!(engine.version(), "unlinked");
    }
}
