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

use std::path::PathBuf;

// ============================================================================
// Link Errors
// ============================================================================

/// Fatal conditions raised by the packet receiver and transmitter.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("no buffer to read packet into")]
    NoBuffer,

    #[error("packet too long: more than {max} bytes of content")]
    FrameTooLong { max: usize },

    #[error("aborted by ^C^C^C")]
    Aborted,

    #[error("transmit incomplete: {sent} of {len} bytes after {attempts} attempts")]
    WriteIncomplete { sent: usize, len: usize, attempts: usize },

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// File Errors
// ============================================================================

/// Failures reported back to the engine by the file access shim.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("no {0} file open")]
    NotOpen(&'static str),

    #[error("short write: {written} of {len} bytes")]
    ShortWrite { written: usize, len: usize },
}

impl FileError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileError::Io { op, path: path.into(), source }
    }
}

// ============================================================================
// Session Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Operator asked to quit; not a failure.
    #[error("session ended by operator")]
    Quit,

    #[error("link failure: {0}")]
    Link(#[from] LinkError),

    #[error("protocol engine initialization failed")]
    EngineInit,

    #[error("protocol engine reported an error")]
    Engine,

    #[error("console I/O error: {0}")]
    Console(#[from] std::io::Error),
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionError::Quit)
    }

    /// Status value announced before the process exits.
    pub fn exit_status(&self) -> u8 {
        match self {
            SessionError::Quit => 0,
            SessionError::Link(_) => 2,
            SessionError::EngineInit => 3,
            SessionError::Engine => 4,
            SessionError::Console(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_is_not_fatal() {
        assert!(!SessionError::Quit.is_fatal());
        assert_eq!(SessionError::Quit.exit_status(), 0);
        assert!(SessionError::Engine.is_fatal());
        assert!(SessionError::from(LinkError::Aborted).is_fatal());
    }

    #[test]
    fn test_file_error_display() {
        let e = FileError::io(
            "open",
            "A.TXT",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(e.to_string(), "open A.TXT: missing");

        let e = LinkError::FrameTooLong { max: 94 };
        assert_eq!(e.to_string(), "packet too long: more than 94 bytes of content");
    }
}
