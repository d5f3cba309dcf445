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

//! Operator console and line editing.

use std::io::{Read, Write};
use crate::protocol::*;

// ============================================================================
// Console Trait
// ============================================================================

pub trait Console: Send {
    /// Blocks for the next keystroke.
    fn read_key(&mut self) -> std::io::Result<u8>;

    fn write_str(&mut self, s: &str) -> std::io::Result<()>;

    /// Echoes edited input. Terminals that echo on their own ignore this.
    fn echo(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    fn line(&mut self, s: &str) -> std::io::Result<()> {
        self.write_str(s)?;
        self.write_str("\n")
    }
}

// ============================================================================
// Standard Console
// ============================================================================

/// Console on the process's stdin/stdout. End of input reads as the abort
/// byte so a closed stdin ends the session.
pub struct StdConsole {
    stdin: std::io::Stdin,
    stdout: std::io::Stdout,
}

impl StdConsole {
    pub fn new() -> Self {
        StdConsole { stdin: std::io::stdin(), stdout: std::io::stdout() }
    }
}

impl Console for StdConsole {
    fn read_key(&mut self) -> std::io::Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.stdin.lock().read(&mut buf) {
                Ok(0) => return Ok(ABORT),
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        let mut out = self.stdout.lock();
        out.write_all(s.as_bytes())?;
        out.flush()
    }

    fn echo(&mut self, _bytes: &[u8]) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Line Editor
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    Cancel,
}

/// Bounded single-line editor. Printable characters beyond the capacity are
/// rejected with a bell; what was already typed is never altered.
pub struct LineEditor {
    buf: Vec<u8>,
    capacity: usize,
}

impl LineEditor {
    pub fn new(capacity: usize) -> Self {
        LineEditor { buf: Vec::with_capacity(capacity), capacity }
    }

    pub fn read_line(&mut self, console: &mut dyn Console) -> std::io::Result<Line> {
        self.buf.clear();
        loop {
            match console.read_key()? {
                ABORT => {
                    self.buf.clear();
                    console.echo(b"^C\n")?;
                    return Ok(Line::Cancel);
                }
                CR | LF => {
                    console.echo(b"\n")?;
                    return Ok(Line::Text(String::from_utf8_lossy(&self.buf).into_owned()));
                }
                BS | DEL => {
                    if self.buf.pop().is_some() {
                        console.echo(&[BS, b' ', BS])?;
                    }
                }
                c @ 0x20..=0x7E => {
                    if self.buf.len() < self.capacity {
                        self.buf.push(c);
                        console.echo(&[c])?;
                    } else {
                        console.echo(&[BEL])?;
                    }
                }
                _ => {}
            }
        }
    }
}

// ============================================================================
// Scripted Console for Testing
// ============================================================================

#[cfg(test)]
pub struct ScriptedConsole {
    keys: std::collections::VecDeque<u8>,
    output: std::sync::Arc<std::sync::Mutex<String>>,
}

#[cfg(test)]
impl ScriptedConsole {
    pub fn new(keys: &[u8]) -> (Self, std::sync::Arc<std::sync::Mutex<String>>) {
        let output = std::sync::Arc::new(std::sync::Mutex::new(String::new()));
        let console = ScriptedConsole { keys: keys.iter().copied().collect(), output: output.clone() };
        (console, output)
    }
}

#[cfg(test)]
impl Console for ScriptedConsole {
    fn read_key(&mut self) -> std::io::Result<u8> {
        self.keys.pop_front().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "Script exhausted")
        })
    }

    fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        self.output.lock().unwrap().push_str(s);
        Ok(())
    }

    fn echo(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.output.lock().unwrap().push_str(&String::from_utf8_lossy(bytes));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
