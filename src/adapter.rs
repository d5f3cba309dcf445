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

use crate::engine::{Callbacks, FileKind, FrameSpec, TransferMode};
use crate::error::{FileError, LinkError};
use crate::file_io::FileShim;
use crate::packet::{self, LinkOptions};
use crate::serial::SerialPort;

/// The link and the filesystem as seen by the protocol engine.
pub struct Adapter {
    serial: Box<dyn SerialPort>,
    files: FileShim,
    link: LinkOptions,
}

impl Adapter {
    pub fn new(serial: Box<dyn SerialPort>, files: FileShim) -> Self {
        Adapter { serial, files, link: LinkOptions::default() }
    }

    pub fn configure(&mut self, link: LinkOptions, binary: bool, keep_incomplete: bool) {
        self.link = link;
        self.files.configure(binary, keep_incomplete);
    }

    pub fn files(&mut self) -> &mut FileShim {
        &mut self.files
    }
}

impl Callbacks for Adapter {
    fn receive_frame(&mut self, frame: FrameSpec, buf: Option<&mut [u8]>) -> Result<usize, LinkError> {
        packet::read_packet(self.serial.as_mut(), frame, buf, self.link)
    }

    fn transmit(&mut self, data: &[u8]) -> Result<(), LinkError> {
        packet::send_all(self.serial.as_mut(), data)
    }

    fn input_waiting(&mut self) -> bool {
        packet::input_waiting(self.serial.as_mut())
    }

    fn open_file(&mut self, path: &str, mode: i32) -> Result<(), FileError> {
        self.files.open(path, mode)
    }

    fn file_info(
        &mut self,
        path: &str,
        date: &mut [u8],
        kind: &mut FileKind,
        mode: TransferMode,
    ) -> Result<u64, FileError> {
        self.files.stat(path, date, kind, mode)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, FileError> {
        self.files.read_byte()
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), FileError> {
        self.files.write(data)
    }

    fn close_file(&mut self, status: u8, mode: i32) -> Result<(), FileError> {
        self.files.close(status, mode)
    }
}
