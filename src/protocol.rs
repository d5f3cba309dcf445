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

//! Kermit link constants

/// Start of header - default start-of-packet marker
pub const SOH: u8 = 0x01;

/// Control-C - in-band abort; three in a row end a remote session
pub const CTRL_C: u8 = 0x03;

/// Bell - echoed when the line editor rejects a keystroke
pub const BEL: u8 = 0x07;

/// Backspace - line editor rubout
pub const BS: u8 = 0x08;

/// Line feed - alternate packet terminator, text-mode line ending
pub const LF: u8 = 0x0A;

/// Carriage return - default end-of-packet marker
pub const CR: u8 = 0x0D;

/// Delete - line editor rubout (as sent by most terminals)
pub const DEL: u8 = 0x7F;

/// Abort byte recognised at the menu and in the line editor
pub const ABORT: u8 = CTRL_C;

/// Mask applied to received bytes when parity is in use
pub const PARITY_MASK: u8 = 0x7F;

/// Default maximum packet content length
pub const P_PKTLEN: usize = 94;

/// File input (read-ahead) buffer length
pub const IBUFLEN: usize = 1024;

/// Headroom kept free in the input buffer for CR insertion in text mode
pub const TEXT_HEADROOM: usize = 2;

/// Minimum length of the date buffer passed to `stat`
pub const DATE_BUFLEN: usize = 18;

/// Write attempts allowed before a partial transmit becomes fatal
pub const TX_ATTEMPTS: usize = 10;

/// Capacity of the send file list
pub const MAX_SEND_FILES: usize = 16;

/// Maximum length of a file name typed at the prompt
pub const MAX_NAME_LEN: usize = 64;

/// Close status character meaning the transfer was discarded midstream
pub const STATUS_DISCARD: u8 = b'D';

/// File-list prompt: finalize the list
pub const FINALIZE_MARK: u8 = b'>';

/// File-list prompt: show the directory
pub const DIRECTORY_MARK: u8 = b'.';
