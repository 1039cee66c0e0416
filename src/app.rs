use std::collections::{HashMap, VecDeque};
use std::fs::OpenOptions;
use std::io::{self, BufRead, IsTerminal, Read, Stdout, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use filtertabs::text::strip_formatting_codes;
use filtertabs::{Notifier, ScreenHost, Tab, TabManager, TabStore};
use tracing::{debug, info, warn};

use crate::render::{self, RenderState};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const BELL: &str = "\x07";

#[derive(Debug)]
enum InputMessage {
    Line(String),
    Closed,
    Error(String),
}

#[derive(Debug)]
enum UiMessage {
    NextTab,
    SelectVisible(usize),
    PreviousPage,
    NextPage,
    CycleGroup,
    DeleteActive,
    MouseLeftDown { column: u16, row: u16 },
    Quit,
    Error(String),
}

/// Lines each tab has accepted, keyed by group and tab name. Formatting
/// codes are dropped on the way in; ANSI styling is kept for the terminal.
#[derive(Debug, Default)]
pub struct Transcripts {
    limit: Option<usize>,
    lines: HashMap<(usize, String), VecDeque<String>>,
}

impl Transcripts {
    /// `limit` caps the lines kept per tab; `None` keeps everything.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            lines: HashMap::new(),
        }
    }

    pub fn lines(&self, group: usize, name: &str) -> Vec<&str> {
        self.lines
            .get(&(group, name.to_owned()))
            .map(|lines| lines.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl ScreenHost for Transcripts {
    fn show_line(&mut self, group: usize, tab: &Tab, line: &str) {
        let lines = self
            .lines
            .entry((group, tab.name().to_owned()))
            .or_default();
        lines.push_back(strip_formatting_codes(line));

        if let Some(limit) = self.limit {
            while lines.len() > limit.max(1) {
                let _ = lines.pop_front();
            }
        }
    }

    fn tab_removed(&mut self, group: usize, name: &str) {
        let _ = self.lines.remove(&(group, name.to_owned()));
    }
}

/// Rings the terminal bell on the next frame.
#[derive(Debug, Default)]
pub struct TerminalBell {
    pending: bool,
}

impl TerminalBell {
    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl Notifier for TerminalBell {
    fn notify(&mut self, tab: &Tab) {
        debug!(tab = tab.name(), "bell");
        self.pending = true;
    }
}

#[derive(Debug)]
enum InputParserState {
    Ground,
    Esc,
    Csi(Vec<u8>),
}

#[derive(Debug)]
struct InputParser {
    state: InputParserState,
}

impl InputParser {
    fn new() -> Self {
        Self {
            state: InputParserState::Ground,
        }
    }

    fn feed(&mut self, byte: u8) -> Option<UiMessage> {
        match &mut self.state {
            InputParserState::Ground => {
                if byte == 0x1b {
                    self.state = InputParserState::Esc;
                    return None;
                }
                key_message_from_byte(byte)
            }
            InputParserState::Esc => {
                if byte == b'[' {
                    self.state = InputParserState::Csi(Vec::new());
                } else {
                    self.state = InputParserState::Ground;
                }
                None
            }
            InputParserState::Csi(buf) => {
                buf.push(byte);
                if !(0x40..=0x7e).contains(&byte) {
                    return None;
                }

                let message = csi_message(buf);
                self.state = InputParserState::Ground;
                message
            }
        }
    }
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter(stdout: &mut Stdout) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, Show, DisableMouseCapture, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(tx: SyncSender<InputMessage>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut locked = stdin.lock();
        let mut buf = String::new();

        loop {
            buf.clear();
            match locked.read_line(&mut buf) {
                Ok(0) => {
                    let _ = tx.send(InputMessage::Closed);
                    break;
                }
                Ok(_) => {
                    let line = buf.trim_end_matches(['\n', '\r']).to_owned();
                    if tx.send(InputMessage::Line(line)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(InputMessage::Error(err.to_string()));
                    break;
                }
            }
        }
    });
}

fn spawn_ui_reader(tx: SyncSender<UiMessage>) -> io::Result<()> {
    let mut tty = OpenOptions::new().read(true).open("/dev/tty")?;

    thread::spawn(move || {
        let mut parser = InputParser::new();
        let mut buf = [0u8; 64];

        loop {
            match tty.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.send(UiMessage::Quit);
                    break;
                }
                Ok(n) => {
                    for byte in &buf[..n] {
                        if let Some(message) = parser.feed(*byte)
                            && tx.send(message).is_err()
                        {
                            return;
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    let _ = tx.send(UiMessage::Error(err.to_string()));
                    break;
                }
            }
        }
    });

    Ok(())
}

fn key_message_from_byte(byte: u8) -> Option<UiMessage> {
    match byte {
        b'\t' => Some(UiMessage::NextTab),
        b'1'..=b'5' => Some(UiMessage::SelectVisible((byte - b'1') as usize)),
        b'<' | b',' => Some(UiMessage::PreviousPage),
        b'>' | b'.' => Some(UiMessage::NextPage),
        b'g' | b'G' => Some(UiMessage::CycleGroup),
        b'x' | b'X' => Some(UiMessage::DeleteActive),
        b'q' | b'Q' | 0x03 => Some(UiMessage::Quit),
        _ => None,
    }
}

/// Arrow keys page through tabs; SGR mouse reports become clicks.
fn csi_message(sequence: &[u8]) -> Option<UiMessage> {
    match sequence {
        b"D" => Some(UiMessage::PreviousPage),
        b"C" => Some(UiMessage::NextPage),
        _ => try_parse_sgr_mouse_message(sequence),
    }
}

fn try_parse_sgr_mouse_message(sequence: &[u8]) -> Option<UiMessage> {
    let (final_byte, params) = sequence.split_last()?;
    if *final_byte != b'M' || !params.starts_with(b"<") {
        return None;
    }

    let payload = std::str::from_utf8(&params[1..]).ok()?;
    let mut parts = payload.split(';');
    let cb = parts.next()?.parse::<u16>().ok()?;
    let col = parts.next()?.parse::<u16>().ok()?;
    let row = parts.next()?.parse::<u16>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let is_left_button = (cb & 0b11) == 0;
    let is_motion = (cb & 0b0010_0000) != 0;
    let is_wheel = (cb & 0b0100_0000) != 0;
    if is_left_button && !is_motion && !is_wheel {
        return Some(UiMessage::MouseLeftDown {
            column: col.saturating_sub(1),
            row: row.saturating_sub(1),
        });
    }

    None
}

#[cfg(unix)]
fn terminate_pipeline_group_if_safe() {
    // Only when we lead our own process group, i.e. a job-control shell put
    // the pipeline there. SIGINT then stops producers like `tail -f`.
    unsafe {
        let my_pgid = libc::getpgrp();
        if my_pgid <= 0 {
            return;
        }

        let parent_pgid = libc::getpgid(libc::getppid());
        if parent_pgid == my_pgid {
            return;
        }

        let _ = libc::signal(libc::SIGINT, libc::SIG_IGN);
        let _ = libc::killpg(my_pgid, libc::SIGINT);
    }
}

#[cfg(not(unix))]
fn terminate_pipeline_group_if_safe() {}

type Screen = TabManager<Transcripts, TerminalBell>;

/// Applies one key or click. Returns false when the user asked to quit.
fn handle_ui(
    manager: &mut Screen,
    message: UiMessage,
    render_state: &RenderState,
) -> anyhow::Result<bool> {
    match message {
        UiMessage::NextTab => manager.next_tab(),
        UiMessage::SelectVisible(slot) => {
            let name = manager.visible_tabs().nth(slot).map(|tab| tab.name().to_owned());
            if let Some(name) = name {
                manager.make_tab_active(&name);
            }
        }
        UiMessage::PreviousPage => manager.previous_tab_page(),
        UiMessage::NextPage => manager.next_tab_page(),
        UiMessage::CycleGroup => {
            let before = manager.groups().len();
            manager.cycle_tab_group();
            if manager.groups().len() > before {
                manager.save_state();
            }
        }
        UiMessage::DeleteActive => {
            if let Some(name) = manager.active_chat().map(|tab| tab.name().to_owned()) {
                manager.delete_tab(&name);
                manager.save_state();
            }
        }
        UiMessage::MouseLeftDown { column, row } => {
            if let Some(name) = render::tab_name_at_position(render_state, column, row) {
                let name = name.to_owned();
                manager.make_tab_active(&name);
            }
        }
        UiMessage::Quit => return Ok(false),
        UiMessage::Error(err) => bail!("terminal input failed: {err}"),
    }
    Ok(true)
}

/// Runs the tab view until the user quits.
pub fn watch(store: TabStore, history: Option<usize>) -> anyhow::Result<()> {
    if !io::stdout().is_terminal() {
        bail!("stdout must be a TTY (run this in a terminal, not redirected)");
    }

    let mut manager = TabManager::new(store, Transcripts::new(history), TerminalBell::default());
    info!(
        groups = manager.groups().len(),
        save_file = %manager.store().path().display(),
        "watching stdin"
    );

    let (tx, rx): (SyncSender<InputMessage>, Receiver<InputMessage>) = mpsc::sync_channel(1024);
    spawn_input_reader(tx);
    let (ui_tx, ui_rx): (SyncSender<UiMessage>, Receiver<UiMessage>) = mpsc::sync_channel(128);
    spawn_ui_reader(ui_tx).context("cannot open /dev/tty for keyboard input")?;

    let mut stdout = io::stdout();
    {
        let _guard = TerminalGuard::enter(&mut stdout)?;

        let mut dirty = true;
        let mut last_size = terminal::size().unwrap_or((0, 0));
        let mut last_render_state = RenderState::default();

        'app: loop {
            while let Ok(message) = rx.try_recv() {
                match message {
                    InputMessage::Line(line) => {
                        manager.deliver(&line);
                        dirty = true;
                    }
                    InputMessage::Closed => {}
                    InputMessage::Error(err) => {
                        warn!(error = %err, "stdin failed");
                        bail!("reading stdin failed: {err}");
                    }
                }
            }

            while let Ok(message) = ui_rx.try_recv() {
                if !handle_ui(&mut manager, message, &last_render_state)? {
                    break 'app;
                }
                dirty = true;
            }

            if let Ok(current_size) = terminal::size()
                && current_size != last_size
            {
                last_size = current_size;
                dirty = true;
            }

            if dirty {
                last_render_state = render::draw(&mut stdout, &manager)?;
                dirty = false;
            }

            if manager.notifier_mut().take() {
                stdout.write_all(BELL.as_bytes())?;
                stdout.flush()?;
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    terminate_pipeline_group_if_safe();
    Ok(())
}
