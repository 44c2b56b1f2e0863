//! Key decoder for SSH terminal input
//!
//! Turns the raw byte stream of a PTY channel into key events:
//! - Printable ASCII and UTF-8 characters
//! - Control characters (Ctrl+A .. Ctrl+Z)
//! - CSI / SS3 sequences (arrows, Home/End, Delete, PageUp/PageDown)
//! - Alt combinations (ESC followed by a key)

use std::fmt;

/// A decoded key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Regular character input
    Char(char),
    /// Enter/Return key
    Enter,
    Backspace,
    Tab,
    /// Escape key (bare ESC, not part of a sequence)
    Escape,
    /// Arrow keys
    Up,
    Down,
    Left,
    Right,
    /// Navigation
    Home,
    End,
    Delete,
    PageUp,
    PageDown,
    /// Ctrl+Left / Alt+Left
    WordLeft,
    /// Ctrl+Right / Alt+Right
    WordRight,
    /// Control combination, stored as the lowercase letter
    Ctrl(char),
    /// Alt combination (ESC prefix)
    Alt(char),
    AltBackspace,
    /// Unknown or unhandled
    Unknown(u8),
}

impl Key {
    /// Canonical key name, e.g. `"enter"`, `"ctrl+c"`, `"a"`
    pub fn name(&self) -> String {
        match self {
            Key::Char(' ') => "space".to_string(),
            Key::Char(c) => c.to_string(),
            Key::Enter => "enter".to_string(),
            Key::Backspace => "backspace".to_string(),
            Key::Tab => "tab".to_string(),
            Key::Escape => "esc".to_string(),
            Key::Up => "up".to_string(),
            Key::Down => "down".to_string(),
            Key::Left => "left".to_string(),
            Key::Right => "right".to_string(),
            Key::Home => "home".to_string(),
            Key::End => "end".to_string(),
            Key::Delete => "delete".to_string(),
            Key::PageUp => "pgup".to_string(),
            Key::PageDown => "pgdown".to_string(),
            Key::WordLeft => "ctrl+left".to_string(),
            Key::WordRight => "ctrl+right".to_string(),
            Key::Ctrl(c) => format!("ctrl+{}", c),
            Key::Alt(c) => format!("alt+{}", c),
            Key::AltBackspace => "alt+backspace".to_string(),
            Key::Unknown(b) => format!("unknown({:#04x})", b),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Parser state for multi-byte input
#[derive(Debug, Default)]
pub struct KeyParser {
    state: ParseState,
    params: Vec<u8>,
    /// Pending bytes of a UTF-8 character
    utf8: Vec<u8>,
    /// Total length of the pending UTF-8 character
    utf8_len: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    #[default]
    Normal,
    /// Got ESC (0x1b)
    Escape,
    /// Got ESC [
    Csi,
    /// Got ESC O
    Ss3,
    /// Inside a multi-byte UTF-8 character
    Utf8,
}

impl KeyParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a whole packet of input.
    ///
    /// A lone ESC at the end of the packet is reported as [`Key::Escape`],
    /// since terminals send complete escape sequences in one write. A partial
    /// UTF-8 character or CSI sequence stays pending for the next packet.
    pub fn parse(&mut self, data: &[u8]) -> Vec<Key> {
        let mut keys: Vec<Key> = data.iter().filter_map(|&b| self.feed(b)).collect();
        keys.extend(self.flush());
        keys
    }

    /// Feed a byte and return the completed key, if any
    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        match self.state {
            ParseState::Normal => self.handle_normal(byte),
            ParseState::Escape => self.handle_escape(byte),
            ParseState::Csi => self.handle_csi(byte),
            ParseState::Ss3 => self.handle_ss3(byte),
            ParseState::Utf8 => self.handle_utf8(byte),
        }
    }

    /// Flush a dangling ESC.
    ///
    /// Returns Escape if we were waiting for a sequence that never came.
    /// Any other pending state is kept.
    pub fn flush(&mut self) -> Option<Key> {
        if self.state == ParseState::Escape {
            self.reset();
            Some(Key::Escape)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.state = ParseState::Normal;
        self.params.clear();
        self.utf8.clear();
        self.utf8_len = 0;
    }

    fn handle_normal(&mut self, byte: u8) -> Option<Key> {
        match byte {
            0x1b => {
                self.state = ParseState::Escape;
                None
            }
            0x0d | 0x0a => Some(Key::Enter),
            0x09 => Some(Key::Tab),
            0x7f | 0x08 => Some(Key::Backspace),
            // Ctrl+A .. Ctrl+Z
            0x01..=0x1a => Some(Key::Ctrl((b'a' + byte - 1) as char)),
            0x20..=0x7e => Some(Key::Char(byte as char)),
            0xc2..=0xf4 => {
                self.utf8_len = match byte {
                    0xc2..=0xdf => 2,
                    0xe0..=0xef => 3,
                    _ => 4,
                };
                self.utf8.clear();
                self.utf8.push(byte);
                self.state = ParseState::Utf8;
                None
            }
            _ => Some(Key::Unknown(byte)),
        }
    }

    fn handle_utf8(&mut self, byte: u8) -> Option<Key> {
        if byte & 0xc0 != 0x80 {
            // Broken sequence: drop it and decode this byte afresh
            self.reset();
            return self.handle_normal(byte);
        }

        self.utf8.push(byte);
        if self.utf8.len() < self.utf8_len {
            return None;
        }

        let key = std::str::from_utf8(&self.utf8)
            .ok()
            .and_then(|s| s.chars().next())
            .map(Key::Char)
            .unwrap_or(Key::Unknown(byte));
        self.reset();
        Some(key)
    }

    fn handle_escape(&mut self, byte: u8) -> Option<Key> {
        match byte {
            b'[' => {
                self.state = ParseState::Csi;
                self.params.clear();
                None
            }
            b'O' => {
                self.state = ParseState::Ss3;
                None
            }
            0x7f | 0x08 => {
                self.reset();
                Some(Key::AltBackspace)
            }
            // ESC ESC: report the first, keep waiting on the second
            0x1b => Some(Key::Escape),
            0x20..=0x7e => {
                self.reset();
                Some(Key::Alt(byte as char))
            }
            _ => {
                self.reset();
                Some(Key::Unknown(byte))
            }
        }
    }

    /// ESC O sequences (application cursor mode)
    fn handle_ss3(&mut self, byte: u8) -> Option<Key> {
        self.reset();
        Some(match byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            _ => Key::Unknown(byte),
        })
    }

    fn handle_csi(&mut self, byte: u8) -> Option<Key> {
        if matches!(byte, b'0'..=b'9' | b';') {
            self.params.push(byte);
            return None;
        }

        // Modifier parameter: ESC [ 1 ; m X (3 = alt, 5 = ctrl)
        let modified = self.params.ends_with(b";3") || self.params.ends_with(b";5");

        let key = match byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' if modified => Key::WordRight,
            b'D' if modified => Key::WordLeft,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            // Tilde sequences: ESC [ n ~
            b'~' => match self.params.as_slice() {
                b"1" | b"7" => Key::Home,
                b"3" => Key::Delete,
                b"4" | b"8" => Key::End,
                b"5" => Key::PageUp,
                b"6" => Key::PageDown,
                _ => Key::Unknown(b'~'),
            },
            _ => Key::Unknown(byte),
        };
        self.reset();
        Some(key)
    }
}
