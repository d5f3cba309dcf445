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

//! Diagnostic logging and the optional debug log file.
//!
//! Log levels:
//! - ERROR: fatal session errors
//! - WARN: link or file trouble that is reported back to the engine
//! - INFO: file opens/closes, engine start, transfer completion
//! - DEBUG: per-packet events and transfer progress
//! - TRACE: packet contents

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Open debug log; its end is recorded when dropped at exit.
pub struct DebugLog {
    path: PathBuf,
}

impl Drop for DebugLog {
    fn drop(&mut self) {
        info!(path = %self.path.display(), "debug log close");
    }
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Everything this program emits, and nothing from its dependencies.
fn file_filter() -> EnvFilter {
    EnvFilter::new("kermit_link=trace")
}

fn open_debug_log(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber: stderr at the `-v` level (`RUST_LOG`
/// overrides it), plus every event down to TRACE in the debug log file if
/// one was requested. Failing to open the file only loses the file.
pub fn init_logging(verbosity: u8, debug_log: Option<&Path>) -> Option<DebugLog> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kermit_link={}", level_for(verbosity))));

    let file = debug_log.and_then(|path| match open_debug_log(path) {
        Ok(file) => Some((file, path.to_path_buf())),
        Err(e) => {
            eprintln!("Unable to open debug log {}: {}", path.display(), e);
            None
        }
    });
    let (file, path) = match file {
        Some((file, path)) => (Some(file), Some(path)),
        None => (None, None),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_filter(file_filter())
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Logging unavailable: {}", e);
    }

    path.map(|path| {
        info!(path = %path.display(), "debug log open");
        DebugLog { path }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(3), "trace");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_file_filter_limited_to_this_crate() {
        let filter = file_filter();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(filter.to_string().starts_with("kermit_link="));
    }

    #[test]
    fn test_debug_log_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("KDEBUG.LOG");

        open_debug_log(&path).unwrap().write_all(b"first\n").unwrap();
        open_debug_log(&path).unwrap().write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_debug_log_in_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(open_debug_log(&dir.path().join("no/such/KDEBUG.LOG")).is_err());
    }
}
