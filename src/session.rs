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

//! Interactive session driver.
//!
//! `Idle` shows the menu. The send command moves to `BuildingSendList`,
//! which collects file names until the list is finalized. `Armed`
//! initializes the engine, and `Running` pumps received packets through it
//! until the batch is done, returning to `Idle` for the next one.

use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, error, info};
use crate::adapter::Adapter;
use crate::console::{Console, Line, LineEditor};
use crate::engine::{Callbacks, ParityMode, ProtocolEngine, Settings, Status, CLOSE_INPUT, OPEN_READ};
use crate::error::{LinkError, SessionError};
use crate::packet::LinkOptions;
use crate::protocol::*;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Send,
    Receive,
}

/// Options fixed for the whole run.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub parity: ParityMode,
    pub binary: bool,
    pub block_check: u8,
    pub force_block_check: bool,
    pub keep_incomplete: bool,
    pub remote: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            parity: ParityMode::None,
            binary: true,
            block_check: 3,
            force_block_check: false,
            keep_incomplete: false,
            remote: true,
        }
    }
}

/// Configuration of one interactive cycle.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub action: Action,
    pub options: Options,
}

impl SessionConfig {
    fn reset(options: Options) -> Self {
        SessionConfig { action: Action::None, options }
    }
}

// ============================================================================
// Send File List
// ============================================================================

#[derive(Debug)]
pub struct SendList {
    entries: Vec<String>,
    capacity: usize,
}

impl SendList {
    pub fn new(capacity: usize) -> Self {
        SendList { entries: Vec::with_capacity(capacity), capacity }
    }

    /// Appends `name`, refusing it once the list is full.
    pub fn push(&mut self, name: String) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(name);
        true
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }
}

fn settings<'a>(config: &SessionConfig, list: &'a SendList) -> Settings<'a> {
    let o = config.options;
    Settings {
        parity: o.parity,
        binary: o.binary,
        block_check: o.block_check,
        force_block_check: o.force_block_check,
        keep_incomplete: o.keep_incomplete,
        remote: o.remote,
        files: if config.action == Action::Send { list.as_slice() } else { &[] },
    }
}

// ============================================================================
// States
// ============================================================================

pub struct Idle;
pub struct BuildingSendList;
pub struct Armed;
pub struct Running;

// ============================================================================
// FSM Structure
// ============================================================================

pub struct SessionFsm<State> {
    state: PhantomData<State>,
    console: Box<dyn Console>,
    engine: Box<dyn ProtocolEngine>,
    adapter: Adapter,
    options: Options,
    config: SessionConfig,
    send_list: SendList,
    editor: LineEditor,
}

// ============================================================================
// Trait
// ============================================================================

pub trait SessionState: Send {
    fn step(self: Box<Self>) -> Result<Box<dyn SessionState>, SessionError>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// Helper to transition states
// ============================================================================

fn state_name<S>() -> &'static str {
    let type_name = std::any::type_name::<S>();
    type_name.split("::").last().unwrap_or(type_name)
}

impl<S> SessionFsm<S> {
    fn transition<T>(self) -> Box<SessionFsm<T>> {
        Box::new(SessionFsm {
            state: PhantomData,
            console: self.console,
            engine: self.engine,
            adapter: self.adapter,
            options: self.options,
            config: self.config,
            send_list: self.send_list,
            editor: self.editor,
        })
    }

    /// Orderly shutdown on a fatal error: every file is closed before the
    /// error propagates.
    fn fail(&mut self, e: SessionError) -> SessionError {
        error!(state = state_name::<S>(), error = %e, "fatal");
        self.adapter.files().close_all();
        e
    }

    /// Next keystroke that is not blank.
    fn read_choice(&mut self) -> std::io::Result<u8> {
        loop {
            match self.console.read_key()? {
                CR | LF | b' ' | b'\t' => continue,
                c => return Ok(c),
            }
        }
    }

    fn list_directory(&mut self) -> std::io::Result<()> {
        let root = self.adapter.files().root().to_path_buf();
        match directory_listing(&root) {
            Ok(lines) => {
                for line in lines {
                    self.console.line(&line)?;
                }
                Ok(())
            }
            Err(e) => self.console.line(&format!("Unable to list {}: {}", root.display(), e)),
        }
    }
}

/// Names and sizes of the entries in `dir`, sorted by name.
fn directory_listing(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, meta.is_dir(), meta.len()));
    }
    entries.sort();

    let mut lines = Vec::with_capacity(entries.len() + 1);
    for (name, is_dir, size) in &entries {
        if *is_dir {
            lines.push(format!("  {:<32} <DIR>", name));
        } else {
            lines.push(format!("  {:<32} {:>10}", name, size));
        }
    }
    lines.push(format!("{} entries", entries.len()));
    Ok(lines)
}

// ============================================================================
// State Implementations
// ============================================================================

impl SessionState for SessionFsm<Idle> {
    fn step(self: Box<Self>) -> Result<Box<dyn SessionState>, SessionError> {
        let mut fsm = *self;
        fsm.config = SessionConfig::reset(fsm.options);

        fsm.console.write_str("\nS)end R)eceive D)irectory Q)uit: ")?;
        let key = fsm.read_choice()?;
        fsm.console.line("")?;

        match key.to_ascii_uppercase() {
            b'S' => {
                fsm.send_list.clear();
                let next = fsm.transition::<BuildingSendList>();
                Ok(next as Box<dyn SessionState>)
            }
            b'R' => {
                fsm.config.action = Action::Receive;
                let next = fsm.transition::<Armed>();
                Ok(next as Box<dyn SessionState>)
            }
            b'D' => {
                fsm.list_directory()?;
                Ok(Box::new(fsm) as Box<dyn SessionState>)
            }
            b'Q' | ABORT => {
                info!("quit requested");
                Err(SessionError::Quit)
            }
            other => {
                debug!(key = other, "unknown menu command");
                fsm.console.line("Command not understood")?;
                Ok(Box::new(fsm) as Box<dyn SessionState>)
            }
        }
    }

    fn name(&self) -> &'static str {
        state_name::<Idle>()
    }
}

impl SessionFsm<BuildingSendList> {
    fn finalize(mut self) -> Result<Box<dyn SessionState>, SessionError> {
        if self.send_list.is_empty() {
            self.console.line("No files to send")?;
            let next = self.transition::<Idle>();
            return Ok(next as Box<dyn SessionState>);
        }

        self.console.write_str(&format!("Send {} file(s)? (Y/N) ", self.send_list.len()))?;
        let key = self.read_choice()?;
        self.console.line("")?;

        if key.eq_ignore_ascii_case(&b'Y') {
            self.config.action = Action::Send;
            let next = self.transition::<Armed>();
            Ok(next as Box<dyn SessionState>)
        } else {
            self.console.line("Cancelled")?;
            self.send_list.clear();
            let next = self.transition::<Idle>();
            Ok(next as Box<dyn SessionState>)
        }
    }
}

impl SessionState for SessionFsm<BuildingSendList> {
    fn step(self: Box<Self>) -> Result<Box<dyn SessionState>, SessionError> {
        let mut fsm = *self;

        fsm.console.write_str("File to send ('>' to finish, '.' for directory): ")?;
        let text = match fsm.editor.read_line(fsm.console.as_mut())? {
            Line::Cancel => {
                fsm.console.line("Cancelled")?;
                fsm.send_list.clear();
                let next = fsm.transition::<Idle>();
                return Ok(next as Box<dyn SessionState>);
            }
            Line::Text(text) => text,
        };

        let name = text.trim();
        match name.as_bytes().first() {
            None => Ok(Box::new(fsm) as Box<dyn SessionState>),
            Some(&FINALIZE_MARK) => fsm.finalize(),
            Some(&DIRECTORY_MARK) => {
                fsm.list_directory()?;
                Ok(Box::new(fsm) as Box<dyn SessionState>)
            }
            Some(_) => {
                // Admit only files that can actually be opened
                let checked = fsm.adapter.open_file(name, OPEN_READ);
                fsm.adapter.close_file(0, CLOSE_INPUT).ok();
                if let Err(e) = checked {
                    debug!(error = %e, "send list candidate rejected");
                    fsm.console.line(&format!("{}: unable to open", name))?;
                    return Ok(Box::new(fsm) as Box<dyn SessionState>);
                }

                fsm.send_list.push(name.to_string());
                fsm.console.line(&format!("Added {} ({}/{})", name, fsm.send_list.len(), MAX_SEND_FILES))?;

                if fsm.send_list.is_full() {
                    fsm.console.line("File list full")?;
                    return fsm.finalize();
                }
                Ok(Box::new(fsm) as Box<dyn SessionState>)
            }
        }
    }

    fn name(&self) -> &'static str {
        state_name::<BuildingSendList>()
    }
}

impl SessionState for SessionFsm<Armed> {
    fn step(self: Box<Self>) -> Result<Box<dyn SessionState>, SessionError> {
        let mut fsm = *self;
        let o = fsm.config.options;
        let link = LinkOptions { strip_parity: o.parity.is_active(), remote: o.remote };
        fsm.adapter.configure(link, o.binary, o.keep_incomplete);

        let status = fsm.engine.init(&settings(&fsm.config, &fsm.send_list), &mut fsm.adapter);
        debug!(?status, "init status");
        if status == Status::Error {
            return Err(fsm.fail(SessionError::EngineInit));
        }
        info!(version = fsm.engine.version(), "engine initialized");

        let status = if fsm.config.action == Action::Send {
            fsm.console.line(&format!("Sending {} file(s)...", fsm.send_list.len()))?;
            fsm.engine.begin_send(&settings(&fsm.config, &fsm.send_list), &mut fsm.adapter)
        } else {
            fsm.console.line("Waiting for files...")?;
            status
        };

        match status {
            Status::Error => Err(fsm.fail(SessionError::Engine)),
            Status::Done => {
                fsm.console.line("Transfer complete")?;
                let next = fsm.transition::<Idle>();
                Ok(next as Box<dyn SessionState>)
            }
            Status::InProgress => {
                let next = fsm.transition::<Running>();
                Ok(next as Box<dyn SessionState>)
            }
        }
    }

    fn name(&self) -> &'static str {
        state_name::<Armed>()
    }
}

impl SessionState for SessionFsm<Running> {
    fn step(self: Box<Self>) -> Result<Box<dyn SessionState>, SessionError> {
        let mut fsm = *self;

        // Blocks here until a packet arrives; a scheduler could poll
        // input_waiting() and do other work instead.
        let frame = fsm.engine.frame();
        let slot = fsm.engine.request_slot();
        let buf = match slot {
            Some(s) => Some(fsm.engine.slot_buffer(s)),
            None => None,
        };
        let result = fsm.adapter.receive_frame(frame, buf);
        let (slot, len) = match (slot, result) {
            (Some(slot), Ok(len)) => (slot, len),
            (_, Err(e)) => return Err(fsm.fail(e.into())),
            (None, Ok(_)) => return Err(fsm.fail(LinkError::NoBuffer.into())),
        };
        if len == 0 {
            fsm.engine.release_slot(slot);
        }

        let status = fsm.engine.step(&settings(&fsm.config, &fsm.send_list), slot, len, &mut fsm.adapter);
        match status {
            Status::InProgress => {
                let p = fsm.engine.progress();
                debug!(
                    name = p.filename.as_deref().unwrap_or("(NULL)"),
                    date = p.date.as_deref().unwrap_or("(NULL)"),
                    size = p.size,
                    state = p.state,
                    sofar = p.sofar,
                    "progress"
                );
                Ok(Box::new(fsm) as Box<dyn SessionState>)
            }
            Status::Done => {
                info!("transfer done");
                fsm.console.line("Transfer complete")?;
                let next = fsm.transition::<Idle>();
                Ok(next as Box<dyn SessionState>)
            }
            Status::Error => Err(fsm.fail(SessionError::Engine)),
        }
    }

    fn name(&self) -> &'static str {
        state_name::<Running>()
    }
}

// ============================================================================
// Constructor & Runner
// ============================================================================

impl SessionFsm<Idle> {
    pub fn new(
        console: Box<dyn Console>,
        engine: Box<dyn ProtocolEngine>,
        adapter: Adapter,
        options: Options,
    ) -> Box<dyn SessionState> {
        Box::new(SessionFsm {
            state: PhantomData::<Idle>,
            console,
            engine,
            adapter,
            options,
            config: SessionConfig::reset(options),
            send_list: SendList::new(MAX_SEND_FILES),
            editor: LineEditor::new(MAX_NAME_LEN),
        })
    }
}

/// Steps the session until the operator quits (`Ok`) or a fatal error ends it.
pub fn run(mut state: Box<dyn SessionState>) -> Result<(), SessionError> {
    loop {
        match state.step() {
            Ok(next) => state = next,
            Err(e) if !e.is_fatal() => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;
    use crate::engine::{EngineLog, ScriptedEngine};
    use crate::file_io::FileShim;
    use crate::serial::MockSerialPort;
    use std::sync::{Arc, Mutex};

    struct Harness {
        state: Box<dyn SessionState>,
        output: Arc<Mutex<String>>,
        log: Arc<Mutex<EngineLog>>,
    }

    fn harness(dir: &Path, keys: &[u8], link: Vec<u8>, engine: ScriptedEngine, log: Arc<Mutex<EngineLog>>) -> Harness {
        let (console, output) = ScriptedConsole::new(keys);
        let serial = Box::new(MockSerialPort::new(link, vec![]));
        let adapter = Adapter::new(serial, FileShim::new(dir.to_path_buf()));
        let state = SessionFsm::new(Box::new(console), Box::new(engine), adapter, Options::default());
        Harness { state, output, log }
    }

    fn packets(bodies: &[&[u8]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for body in bodies {
            bytes.push(SOH);
            bytes.extend_from_slice(body);
            bytes.push(CR);
        }
        bytes
    }

    fn keys(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn test_receive_batch_then_quit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![Status::InProgress, Status::InProgress, Status::Done]);
        let h = harness(dir.path(), b"RQ", packets(&[b"S", b"F", b"D"]), engine, log);

        run(h.state).expect("session should end by quitting");

        let log = h.log.lock().unwrap();
        assert_eq!(log.inits, 1);
        assert_eq!(log.sends, 0);
        assert_eq!(log.steps, vec![1, 1, 1]);
        assert!(log.files.is_empty());
        let output = h.output.lock().unwrap();
        assert!(output.contains("Transfer complete"));
        assert_eq!(output.matches("S)end R)eceive").count(), 2);
    }

    #[test]
    fn test_states_visited_during_receive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![Status::Done]);
        let h = harness(dir.path(), b"R", packets(&[b"x"]), engine, log);

        let mut state = h.state;
        let mut names = vec![state.name()];
        for _ in 0..3 {
            state = state.step().expect("step");
            names.push(state.name());
        }
        assert_eq!(names, vec!["Idle", "Armed", "Running", "Idle"]);
    }

    #[test]
    fn test_unreadable_file_disarms_send() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), &keys(&[b"S", b"A.TXT\r", b">\r", b"Q"]), vec![], engine, log);

        run(h.state).expect("session should end by quitting");

        assert_eq!(h.log.lock().unwrap().inits, 0);
        let output = h.output.lock().unwrap();
        assert!(output.contains("A.TXT: unable to open"));
        assert!(output.contains("No files to send"));
    }

    #[test]
    fn test_directory_name_not_admitted() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("SUBDIR")).unwrap();
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), &keys(&[b"S", b"SUBDIR\r", b">\r", b"Q"]), vec![], engine, log);

        run(h.state).expect("session should end by quitting");

        assert_eq!(h.log.lock().unwrap().inits, 0);
        let output = h.output.lock().unwrap();
        assert!(output.contains("SUBDIR: unable to open"));
        assert!(!output.contains("Added SUBDIR"));
        assert!(output.contains("No files to send"));
    }

    #[test]
    fn test_send_confirmed() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("A.TXT"), b"alpha").unwrap();
        std::fs::write(dir.path().join("B.BIN"), b"beta").unwrap();
        let (engine, log) = ScriptedEngine::new(vec![Status::InProgress, Status::Done]);
        let script = keys(&[b"s", b"A.TXT\r", b"MISSING\r", b"  B.BIN \r", b">\r", b"y", b"Q"]);
        let h = harness(dir.path(), &script, packets(&[b"Y", b"B"]), engine, log);

        run(h.state).expect("session should end by quitting");

        let log = h.log.lock().unwrap();
        assert_eq!(log.inits, 1);
        assert_eq!(log.sends, 1);
        assert_eq!(log.files, vec!["A.TXT".to_string(), "B.BIN".to_string()]);
        assert_eq!(log.steps, vec![1, 1]);
        let output = h.output.lock().unwrap();
        assert!(output.contains("Added A.TXT (1/16)"));
        assert!(output.contains("MISSING: unable to open"));
        assert!(output.contains("Send 2 file(s)?"));
    }

    #[test]
    fn test_send_declined() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("A.TXT"), b"alpha").unwrap();
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), &keys(&[b"S", b"A.TXT\r", b">\r", b"N", b"Q"]), vec![], engine, log);

        run(h.state).expect("session should end by quitting");

        assert_eq!(h.log.lock().unwrap().inits, 0);
        assert!(h.output.lock().unwrap().contains("Cancelled"));
    }

    #[test]
    fn test_cancel_while_building_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("A.TXT"), b"alpha").unwrap();
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), &keys(&[b"S", b"A.TXT\r", b"B", &[ABORT], b"Q"]), vec![], engine, log);

        run(h.state).expect("session should end by quitting");

        assert_eq!(h.log.lock().unwrap().inits, 0);
        assert!(h.output.lock().unwrap().contains("Cancelled"));
    }

    #[test]
    fn test_list_full_auto_finalizes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut script = vec![b'S'];
        for i in 0..MAX_SEND_FILES {
            let name = format!("F{:02}", i);
            std::fs::write(dir.path().join(&name), b"x").unwrap();
            script.extend_from_slice(name.as_bytes());
            script.push(CR);
        }
        script.extend_from_slice(b"NQ");
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), &script, vec![], engine, log);

        run(h.state).expect("session should end by quitting");

        let output = h.output.lock().unwrap();
        assert!(output.contains("File list full"));
        assert!(output.contains(&format!("Send {} file(s)?", MAX_SEND_FILES)));
    }

    #[test]
    fn test_directory_listing() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("HELLO.TXT"), b"12345").unwrap();
        std::fs::create_dir(dir.path().join("SUB")).unwrap();
        let (engine, log) = ScriptedEngine::new(vec![]);
        let script = keys(&[b"D", b"S", b".\r", &[ABORT], b"Q"]);
        let h = harness(dir.path(), &script, vec![], engine, log);

        run(h.state).expect("session should end by quitting");

        let output = h.output.lock().unwrap();
        assert_eq!(output.matches("HELLO.TXT").count(), 2);
        assert!(output.contains("<DIR>"));
        assert!(output.contains("2 entries"));
    }

    #[test]
    fn test_directory_listing_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("B"), b"").unwrap();
        std::fs::write(dir.path().join("A"), b"123").unwrap();

        let lines = directory_listing(dir.path()).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with('A'));
        assert!(lines[0].ends_with('3'));
        assert!(lines[1].trim_start().starts_with('B'));
    }

    #[test]
    fn test_unknown_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), b"X\nQ", vec![], engine, log);

        run(h.state).expect("session should end by quitting");

        assert!(h.output.lock().unwrap().contains("Command not understood"));
        assert_eq!(h.log.lock().unwrap().inits, 0);
    }

    #[test]
    fn test_abort_byte_quits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), &[ABORT], vec![], engine, log);

        assert!(run(h.state).is_ok());
    }

    #[test]
    fn test_engine_init_failure_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![]);
        let h = harness(dir.path(), b"R", vec![], engine.failing_init(), log);

        match run(h.state) {
            Err(SessionError::EngineInit) => {}
            other => panic!("expected EngineInit, got {:?}", other),
        }
        assert!(h.log.lock().unwrap().steps.is_empty());
    }

    #[test]
    fn test_engine_error_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![Status::InProgress, Status::Error]);
        let h = harness(dir.path(), b"R", packets(&[b"a", b"b"]), engine, log);

        match run(h.state) {
            Err(SessionError::Engine) => {}
            other => panic!("expected Engine, got {:?}", other),
        }
        assert_eq!(h.log.lock().unwrap().steps, vec![1, 1]);
    }

    #[test]
    fn test_empty_packet_releases_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![Status::InProgress, Status::Done]);
        let h = harness(dir.path(), b"RQ", packets(&[b"", b"a"]), engine, log);

        run(h.state).expect("session should end by quitting");

        let log = h.log.lock().unwrap();
        assert_eq!(log.steps, vec![0, 1]);
        assert_eq!(log.releases, 1);
    }

    #[test]
    fn test_link_failure_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![Status::InProgress]);
        let h = harness(dir.path(), b"R", packets(&[b"a"]), engine, log);

        match run(h.state) {
            Err(SessionError::Link(LinkError::Io(_))) => {}
            other => panic!("expected Link, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_batches() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (engine, log) = ScriptedEngine::new(vec![Status::Done, Status::InProgress, Status::Done]);
        let h = harness(dir.path(), b"RRQ", packets(&[b"1", b"2", b"3"]), engine, log);

        run(h.state).expect("session should end by quitting");

        let log = h.log.lock().unwrap();
        assert_eq!(log.inits, 2);
        assert_eq!(log.steps.len(), 3);
    }

    #[test]
    fn test_send_list_capacity() {
        let mut list = SendList::new(2);
        assert!(list.push("A".into()));
        assert!(list.push("B".into()));
        assert!(list.is_full());
        assert!(!list.push("C".into()));
        assert_eq!(list.as_slice(), &["A".to_string(), "B".to_string()]);
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_receive_settings_carry_no_files() {
        let mut list = SendList::new(2);
        list.push("A".into());
        let mut config = SessionConfig::reset(Options::default());

        config.action = Action::Receive;
        assert!(settings(&config, &list).files.is_empty());
        config.action = Action::Send;
        assert_eq!(settings(&config, &list).files.len(), 1);
    }
}
