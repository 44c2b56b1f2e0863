//! Single-line text field
//!
//! Editing is delegated to `tui_input::Input`; this widget adds focus,
//! placeholder text, a fixed display width with horizontal scrolling,
//! echo modes and a blinking cursor drawn in reverse video.

use crossterm::style::Stylize;
use tui_input::{Input, InputRequest};
use unicode_width::UnicodeWidthChar;

use crate::ansi::Key;

/// How typed characters are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    #[default]
    Normal,
    /// Show each character as the mask character
    Password(char),
    /// Show nothing
    Hidden,
}

/// Text field state
#[derive(Debug, Clone)]
pub struct TextInput {
    input: Input,
    /// Drawn before the value
    pub prompt: String,
    /// Shown dimmed while the value is empty
    pub placeholder: String,
    /// Display width of the value area in columns (0 = unlimited)
    pub width: usize,
    /// Maximum number of characters (0 = unlimited)
    pub char_limit: usize,
    pub echo_mode: EchoMode,
    focused: bool,
    /// Blink phase; the cursor is drawn only while this is set
    cursor_visible: bool,
    /// First visible character when the value is wider than `width`
    offset: usize,
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl TextInput {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            prompt: "> ".to_string(),
            placeholder: String::new(),
            width: 0,
            char_limit: 0,
            echo_mode: EchoMode::Normal,
            focused: false,
            cursor_visible: true,
            offset: 0,
        }
    }

    /// Give the field keyboard focus; blurred fields ignore keys
    pub fn focus(&mut self) {
        self.focused = true;
        self.cursor_visible = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    /// Get current input value
    pub fn value(&self) -> &str {
        self.input.value()
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.input.cursor()
    }

    /// Replace the value and move the cursor to the end
    pub fn set_value(&mut self, value: &str) {
        let value: String = if self.char_limit > 0 {
            value.chars().take(self.char_limit).collect()
        } else {
            value.to_string()
        };
        self.input = Input::new(value);
        self.handle_overflow();
    }

    pub fn reset(&mut self) {
        self.input.reset();
        self.offset = 0;
    }

    fn len(&self) -> usize {
        self.input.value().chars().count()
    }

    /// Handle a key press, returns true if value or cursor changed
    pub fn update(&mut self, key: &Key) -> bool {
        if !self.focused {
            return false;
        }

        // Typing keeps the cursor solid until the next blink
        self.cursor_visible = true;

        let before = (self.input.value().to_string(), self.input.cursor());

        match key {
            Key::Char(c) => {
                if self.char_limit == 0 || self.len() < self.char_limit {
                    self.input.handle(InputRequest::InsertChar(*c));
                }
            }
            Key::Backspace | Key::Ctrl('h') => {
                self.input.handle(InputRequest::DeletePrevChar);
            }
            Key::Delete | Key::Ctrl('d') => {
                self.input.handle(InputRequest::DeleteNextChar);
            }
            Key::Left | Key::Ctrl('b') => {
                self.input.handle(InputRequest::GoToPrevChar);
            }
            Key::Right | Key::Ctrl('f') => {
                self.input.handle(InputRequest::GoToNextChar);
            }
            Key::WordLeft | Key::Alt('b') => {
                self.input.handle(InputRequest::GoToPrevWord);
            }
            Key::WordRight | Key::Alt('f') => {
                self.input.handle(InputRequest::GoToNextWord);
            }
            Key::AltBackspace | Key::Ctrl('w') => {
                self.input.handle(InputRequest::DeletePrevWord);
            }
            Key::Alt('d') => {
                self.input.handle(InputRequest::DeleteNextWord);
            }
            Key::Home | Key::Ctrl('a') => {
                self.input.handle(InputRequest::GoToStart);
            }
            Key::End | Key::Ctrl('e') => {
                self.input.handle(InputRequest::GoToEnd);
            }
            Key::Ctrl('k') => {
                self.input.handle(InputRequest::DeleteTillEnd);
            }
            Key::Ctrl('u') => {
                for _ in 0..self.input.cursor() {
                    self.input.handle(InputRequest::DeletePrevChar);
                }
            }
            _ => {}
        }

        self.handle_overflow();
        (self.input.value(), self.input.cursor()) != (before.0.as_str(), before.1)
    }

    /// Toggle the cursor blink phase
    pub fn blink(&mut self) {
        if self.focused {
            self.cursor_visible = !self.cursor_visible;
        }
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Keep the cursor inside the visible window of `width` columns.
    ///
    /// The window only moves when the cursor would leave it.
    fn handle_overflow(&mut self) {
        let chars = self.display_chars();
        let cursor = self.input.cursor().min(chars.len());

        if self.width == 0 || columns(&chars) < self.width {
            self.offset = 0;
            return;
        }

        if cursor < self.offset {
            self.offset = cursor;
        }
        // One column is reserved for the cursor cell
        while self.offset < cursor && columns(&chars[self.offset..cursor]) + 1 > self.width {
            self.offset += 1;
        }
        // Pull the window back when the text behind it shrank
        while self.offset > 0 && columns(&chars[self.offset - 1..]) + 1 <= self.width {
            self.offset -= 1;
        }
    }

    /// Characters as they are echoed
    fn display_chars(&self) -> Vec<char> {
        match self.echo_mode {
            EchoMode::Normal => self.input.value().chars().collect(),
            EchoMode::Password(mask) => vec![mask; self.len()],
            EchoMode::Hidden => Vec::new(),
        }
    }

    fn draw_cursor(&self) -> bool {
        self.focused && self.cursor_visible
    }

    fn styled_cursor(&self, c: char) -> String {
        if self.draw_cursor() {
            c.to_string().reverse().to_string()
        } else {
            c.to_string()
        }
    }

    /// Render the field: prompt followed by the value or placeholder
    pub fn view(&self) -> String {
        if self.input.value().is_empty() && !self.placeholder.is_empty() {
            return self.placeholder_view();
        }

        let chars = self.display_chars();
        let cursor = match self.echo_mode {
            EchoMode::Hidden => 0,
            _ => self.input.cursor().min(chars.len()),
        };

        let mut out = self.prompt.clone();
        let mut used = 0;
        let mut cursor_drawn = false;

        for (i, &c) in chars.iter().enumerate().skip(self.offset) {
            let w = c.width().unwrap_or(0);
            if self.width > 0 && used + w > self.width {
                break;
            }
            used += w;
            if i == cursor {
                out.push_str(&self.styled_cursor(c));
                cursor_drawn = true;
            } else {
                out.push(c);
            }
        }

        // Cursor past the last character sits on a blank cell
        if !cursor_drawn && (self.width == 0 || used < self.width) {
            out.push_str(&self.styled_cursor(' '));
            used += 1;
        }

        if self.width > used {
            out.push_str(&" ".repeat(self.width - used));
        }
        out
    }

    fn placeholder_view(&self) -> String {
        let mut chars = self.placeholder.chars();
        let mut out = self.prompt.clone();

        let Some(first) = chars.next() else {
            return out;
        };
        out.push_str(&self.styled_cursor(first));

        let mut used = first.width().unwrap_or(0);
        let mut rest = String::new();
        for c in chars {
            let w = c.width().unwrap_or(0);
            if self.width > 0 && used + w > self.width {
                break;
            }
            used += w;
            rest.push(c);
        }
        if self.width > used {
            rest.push_str(&" ".repeat(self.width - used));
        }

        out.push_str(&rest.dark_grey().to_string());
        out
    }
}

/// Display width of a run of characters
fn columns(chars: &[char]) -> usize {
    chars.iter().map(|c| c.width().unwrap_or(0)).sum()
}
