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

// Kermit file transfer over a serial link
mod adapter;
mod console;
mod engine;
mod error;
mod file_io;
mod logging;
mod packet;
mod protocol;
mod serial;
mod session;

use clap::Parser;
use serialport::{DataBits, Parity, StopBits};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use adapter::Adapter;
use console::StdConsole;
use engine::{ParityMode, Unlinked};
use file_io::FileShim;
use serial::RealSerialPort;
use session::{Options, SessionFsm};

#[derive(Parser)]
#[command(name = "kermit-link")]
#[command(about = "Interactive Kermit file transfer over an RS-232 link", long_about = None)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyUSB0 or COM1)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "9600")]
    baud: u32,

    /// Data bits (5, 6, 7, or 8)
    #[arg(long, default_value = "8", value_name="BITS")]
    data_bits: u8,

    /// Parity (none, odd, or even)
    #[arg(long, default_value = "none")]
    parity: String,

    /// Stop bits (1 or 2)
    #[arg(long, default_value = "1", value_name="BITS")]
    stop_bits: u8,

    /// Block check type (1, 2, 3, or 5 to force type 3 on every packet)
    #[arg(long, default_value = "3", value_name = "TYPE")]
    block_check: u8,

    /// Transfer files as text (LF <-> CRLF) instead of binary
    #[arg(long)]
    text: bool,

    /// Keep incompletely received files
    #[arg(long)]
    keep: bool,

    /// Run as the local side (ignores ^C^C^C from the link)
    #[arg(long)]
    local: bool,

    /// Directory files are sent from and received into
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Append debug output to this file
    #[arg(long, value_name = "FILE")]
    debug_log: Option<PathBuf>,

    /// Increase console log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_data_bits(bits: u8) -> Result<DataBits, String> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        _ => Err(format!("Invalid data bits: {}. Must be 5, 6, 7, or 8", bits)),
    }
}

fn parse_parity(parity: &str) -> Result<ParityMode, String> {
    match parity.to_lowercase().as_str() {
        "none" => Ok(ParityMode::None),
        "odd" => Ok(ParityMode::Odd),
        "even" => Ok(ParityMode::Even),
        _ => Err(format!("Invalid parity: {}. Must be 'none', 'odd', or 'even'", parity)),
    }
}

fn port_parity(parity: ParityMode) -> Parity {
    match parity {
        ParityMode::None => Parity::None,
        ParityMode::Odd => Parity::Odd,
        ParityMode::Even => Parity::Even,
    }
}

fn parse_stop_bits(bits: u8) -> Result<StopBits, String> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        _ => Err(format!("Invalid stop bits: {}. Must be 1 or 2", bits)),
    }
}

/// Block check type and whether it is forced on every packet.
fn parse_block_check(check: u8) -> Result<(u8, bool), String> {
    match check {
        1..=3 => Ok((check, false)),
        5 => Ok((3, true)),
        _ => Err(format!("Invalid block check: {}. Must be 1, 2, 3, or 5", check)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _debug_log = logging::init_logging(cli.verbose, cli.debug_log.as_deref());

    let data_bits = match parse_data_bits(cli.data_bits) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let parity = match parse_parity(&cli.parity) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stop_bits = match parse_stop_bits(cli.stop_bits) {
        Ok(sb) => sb,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (block_check, force_block_check) = match parse_block_check(cli.block_check) {
        Ok(bc) => bc,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !cli.dir.is_dir() {
        eprintln!("Error: Directory not found: {}", cli.dir.display());
        return ExitCode::FAILURE;
    }

    println!("This is kermit-link {}", env!("CARGO_PKG_VERSION"));
    println!("Opening serial port: {}", cli.port);
    println!("Settings: {} baud, {:?}, {:?}, {:?}", cli.baud, data_bits, parity, stop_bits);

    let serial_port = match RealSerialPort::open(&cli.port, cli.baud, data_bits, port_parity(parity), stop_bits) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Failed to open serial port: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(baud = cli.baud, "Serial port speed");

    let options = Options {
        parity,
        binary: !cli.text,
        block_check,
        force_block_check,
        keep_incomplete: cli.keep,
        remote: !cli.local,
    };
    let adapter = Adapter::new(Box::new(serial_port), FileShim::new(cli.dir));
    let state = SessionFsm::new(Box::new(StdConsole::new()), Box::new(Unlinked), adapter, options);

    let status = match session::run(state) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Session failed: {}", e);
            e.exit_status()
        }
    };

    println!("exit status={}", status);
    println!("Session terminated");
    ExitCode::from(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_check() {
        assert_eq!(parse_block_check(1), Ok((1, false)));
        assert_eq!(parse_block_check(3), Ok((3, false)));
        assert_eq!(parse_block_check(5), Ok((3, true)));
        assert!(parse_block_check(0).is_err());
        assert!(parse_block_check(4).is_err());
    }

    #[test]
    fn test_parse_parity() {
        assert_eq!(parse_parity("NONE"), Ok(ParityMode::None));
        assert_eq!(parse_parity("even"), Ok(ParityMode::Even));
        assert_eq!(port_parity(ParityMode::Odd), Parity::Odd);
        assert!(parse_parity("mark").is_err());
    }

    #[test]
    fn test_parse_line_settings() {
        assert_eq!(parse_data_bits(7), Ok(DataBits::Seven));
        assert!(parse_data_bits(9).is_err());
        assert_eq!(parse_stop_bits(2), Ok(StopBits::Two));
        assert!(parse_stop_bits(3).is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["kermit-link", "--port", "/dev/ttyUSB0"]).unwrap();
        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.block_check, 3);
        assert!(!cli.text && !cli.keep && !cli.local);
        assert_eq!(cli.dir, PathBuf::from("."));
        assert!(cli.debug_log.is_none());
    }
}
