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

//! File access on behalf of the protocol engine.
//!
//! One input file and one output file may be open at a time. Text mode
//! converts between local LF line endings and the CRLF convention used on
//! the wire; binary mode moves bytes untouched.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use crate::engine::{FileKind, TransferMode, CLOSE_INPUT, CLOSE_OUTPUT, CLOSE_OUTPUT_ERROR, OPEN_READ, OPEN_WRITE};
use crate::error::FileError;
use crate::protocol::*;

pub struct FileShim {
    root: PathBuf,
    binary: bool,
    keep_incomplete: bool,
    input: Option<BufReader<File>>,
    input_name: String,
    output: Option<File>,
    output_path: Option<PathBuf>,
    // Read-ahead buffer handed out one byte at a time
    inbuf: Vec<u8>,
    inpos: usize,
    incnt: usize,
}

impl FileShim {
    pub fn new(root: PathBuf) -> Self {
        FileShim {
            root,
            binary: true,
            keep_incomplete: false,
            input: None,
            input_name: String::new(),
            output: None,
            output_path: None,
            inbuf: vec![0; IBUFLEN],
            inpos: 0,
            incnt: 0,
        }
    }

    /// Applies the transfer mode and cleanup policy for the next batch.
    pub fn configure(&mut self, binary: bool, keep_incomplete: bool) {
        self.binary = binary;
        self.keep_incomplete = keep_incomplete;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `path` onto the root. Names that could climb out of the root
    /// (`..`, absolute paths, drive prefixes) are refused.
    fn resolve(&self, path: &str) -> Result<PathBuf, FileError> {
        let confined = Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !confined {
            warn!(path, "path escapes the transfer directory");
            return Err(FileError::InvalidArgument("path outside transfer directory"));
        }
        Ok(self.root.join(path))
    }

    // ========================================================================
    // Open
    // ========================================================================

    pub fn open(&mut self, path: &str, mode: i32) -> Result<(), FileError> {
        let full = self.resolve(path)?;
        match mode {
            OPEN_READ => {
                let file = File::open(&full).map_err(|e| {
                    debug!(path, error = %e, "openfile read failed");
                    FileError::io("open", &full, e)
                })?;
                let meta = file.metadata().map_err(|e| FileError::io("stat", &full, e))?;
                if !meta.is_file() {
                    debug!(path, "openfile read: not a regular file");
                    return Err(FileError::InvalidArgument("not a regular file"));
                }
                self.input = Some(BufReader::new(file));
                self.input_name = path.to_string();
                self.inpos = 0;
                self.incnt = 0;
                info!("openfile read {}", path);
                Ok(())
            }
            OPEN_WRITE => {
                // create() truncates an existing file and grants write-only access
                let file = File::create(&full).map_err(|e| {
                    debug!(path, error = %e, "openfile write failed");
                    FileError::io("create", &full, e)
                })?;
                self.output = Some(file);
                self.output_path = Some(full);
                info!("openfile write {}", path);
                Ok(())
            }
            _ => Err(FileError::InvalidArgument("open mode")),
        }
    }

    // ========================================================================
    // Stat
    // ========================================================================

    /// Returns the size of `path`. Dates are not available, so `date` is
    /// always cleared, and every file is reported as binary.
    pub fn stat(
        &mut self,
        path: &str,
        date: &mut [u8],
        kind: &mut FileKind,
        _mode: TransferMode,
    ) -> Result<u64, FileError> {
        if date.is_empty() {
            return Err(FileError::InvalidArgument("date buffer missing"));
        }
        date.fill(0);
        if date.len() < DATE_BUFLEN {
            return Err(FileError::InvalidArgument("date buffer too short"));
        }

        let full = self.resolve(path)?;
        let meta = std::fs::metadata(&full).map_err(|e| {
            debug!(path, error = %e, "fileinfo stat failed");
            FileError::io("stat", &full, e)
        })?;
        *kind = FileKind::Binary;
        Ok(meta.len())
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// Next byte of the input file, `None` once a refill comes back empty.
    pub fn read_byte(&mut self) -> Result<Option<u8>, FileError> {
        if self.incnt == 0 {
            self.refill()?;
            if self.incnt == 0 {
                return Ok(None);
            }
        }
        let byte = self.inbuf[self.inpos];
        self.inpos += 1;
        self.incnt -= 1;
        Ok(Some(byte))
    }

    fn refill(&mut self) -> Result<(), FileError> {
        let Some(reader) = self.input.as_mut() else {
            return Err(FileError::NotOpen("input"));
        };
        let name = &self.input_name;
        self.inpos = 0;
        self.incnt = 0;

        if self.binary {
            self.incnt = loop {
                match reader.read(&mut self.inbuf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(FileError::io("read", name, e)),
                }
            };
            debug!(zincnt = self.incnt, "readfile binary ok");
            return Ok(());
        }

        // Stop short of the end so an LF can always become CR LF
        let mut count = 0;
        let mut byte = [0u8; 1];
        while count < IBUFLEN - TEXT_HEADROOM {
            match reader.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FileError::io("read", name, e)),
            }
            if byte[0] == LF {
                self.inbuf[count] = CR;
                count += 1;
            }
            self.inbuf[count] = byte[0];
            count += 1;
        }
        self.incnt = count;
        debug!(zincnt = count, "readfile text ok");
        Ok(())
    }

    // ========================================================================
    // Write
    // ========================================================================

    pub fn write(&mut self, data: &[u8]) -> Result<(), FileError> {
        let Some(file) = self.output.as_mut() else {
            return Err(FileError::NotOpen("output"));
        };
        let path = self.output_path.as_deref().unwrap_or(Path::new(""));

        if self.binary {
            return write_segment(file, path, data);
        }
        for segment in data.split(|&b| b == CR) {
            if !segment.is_empty() {
                write_segment(file, path, segment)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Close
    // ========================================================================

    /// Closes the input (mode 1) or output (modes 2 and 3) file. Closing a
    /// file that is not open does nothing. An output file closed with the
    /// discard status is deleted unless incomplete files are kept.
    pub fn close(&mut self, status: u8, mode: i32) -> Result<(), FileError> {
        match mode {
            CLOSE_INPUT => {
                if self.input.take().is_some() {
                    info!("closefile (input) {}", self.input_name);
                }
                self.inpos = 0;
                self.incnt = 0;
                Ok(())
            }
            CLOSE_OUTPUT | CLOSE_OUTPUT_ERROR => {
                self.output = None;
                let Some(path) = self.output_path.take() else {
                    return Ok(());
                };
                info!("closefile (output) {}", path.display());
                debug!(keep = self.keep_incomplete, status = %(status as char), "closefile (output)");

                if !self.keep_incomplete && status == STATUS_DISCARD {
                    info!("closefile (delete incomplete) {}", path.display());
                    std::fs::remove_file(&path).map_err(|e| {
                        warn!(path = %path.display(), error = %e, "closefile delete failed");
                        FileError::io("delete", &path, e)
                    })?;
                }
                Ok(())
            }
            _ => Err(FileError::InvalidArgument("close mode")),
        }
    }

    /// Drops every open handle without applying the cleanup policy.
    pub fn close_all(&mut self) {
        self.input = None;
        self.output = None;
        self.output_path = None;
        self.incnt = 0;
    }
}

fn write_segment(file: &mut File, path: &Path, segment: &[u8]) -> Result<(), FileError> {
    let written = file.write(segment).map_err(|e| FileError::io("write", path, e))?;
    if written != segment.len() {
        warn!(written, len = segment.len(), "writefile short write");
        return Err(FileError::ShortWrite { written, len: segment.len() });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
