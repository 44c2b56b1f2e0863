//! Terminal control sequences for SSH output
//!
//! Provides ANSI escape sequences as strings for terminal manipulation,
//! plus the frame builder used by the program renderer.

use crossterm::cursor;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::Command;
use unicode_width::UnicodeWidthChar;

fn ansi(command: impl Command) -> String {
    let mut buf = String::new();
    let _ = command.write_ansi(&mut buf);
    buf
}

/// Switch to the alternate screen buffer
pub fn enter_alt_screen() -> String {
    ansi(EnterAlternateScreen)
}

/// Return to the main screen buffer
pub fn leave_alt_screen() -> String {
    ansi(LeaveAlternateScreen)
}

pub fn hide_cursor() -> String {
    ansi(cursor::Hide)
}

pub fn show_cursor() -> String {
    ansi(cursor::Show)
}

/// Move cursor to the top-left corner
pub fn cursor_home() -> String {
    ansi(cursor::MoveTo(0, 0))
}

/// Clear from cursor to end of line
pub fn clear_to_eol() -> String {
    ansi(Clear(ClearType::UntilNewLine))
}

/// Clear from cursor to end of screen
pub fn clear_below() -> String {
    ansi(Clear(ClearType::FromCursorDown))
}

/// Clear screen
pub fn clear_screen() -> String {
    ansi(Clear(ClearType::All))
}

/// Carriage return + newline (for SSH terminals)
pub const CRLF: &str = "\r\n";

/// Build a full redraw of `view` for a `width` x `height` terminal.
///
/// Lines are clipped to the terminal size (a zero dimension
/// disables clipping) and every line is erased to its end, so a shorter frame fully
/// replaces a longer one.
pub fn render_frame(view: &str, width: u16, height: u16) -> String {
    let mut out = cursor_home();
    let eol = clear_to_eol();
    let rows = if height == 0 { usize::MAX } else { height as usize };

    for (i, line) in view.lines().take(rows).enumerate() {
        if i > 0 {
            out.push_str(CRLF);
        }
        if width == 0 {
            out.push_str(line);
        } else {
            out.push_str(&truncate(line, width as usize));
        }
        out.push_str(&eol);
    }

    out.push_str(&clear_below());
    out
}

/// Truncate a line to `width` display columns, keeping escape sequences.
pub fn truncate(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut used = 0;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Copy CSI sequences through untouched
            out.push(c);
            if chars.peek() == Some(&'[') {
                out.extend(chars.next());
                for next in chars.by_ref() {
                    out.push(next);
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }

        let w = c.width().unwrap_or(0);
        if used + w > width {
            // Drop the rest of the text but keep trailing style resets
            continue;
        }
        used += w;
        out.push(c);
    }

    out
}

/// Strip ANSI escape sequences, leaving the visible text
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_sequences() {
        assert_eq!(enter_alt_screen(), "\x1b[?1049h");
        assert_eq!(leave_alt_screen(), "\x1b[?1049l");
        assert!(!hide_cursor().is_empty());
        assert!(!clear_to_eol().is_empty());
    }

    #[test]
    fn test_truncate_plain() {
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hi", 5), "hi");
    }

    #[test]
    fn test_truncate_keeps_escapes() {
        let styled = "\x1b[7mab\x1b[0mcd";
        assert_eq!(truncate(styled, 3), "\x1b[7mab\x1b[0mc");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK char is two columns wide
        assert_eq!(truncate("日本語", 5), "日本");
    }

    #[test]
    fn test_render_frame_lines() {
        let frame = render_frame("Name?\n\n> bob", 80, 24);
        assert!(frame.starts_with(&cursor_home()));
        assert!(frame.ends_with(&clear_below()));
        assert_eq!(strip_ansi(&frame), "Name?\r\n\r\n> bob");
    }

    #[test]
    fn test_render_frame_clips_height() {
        let frame = render_frame("a\nb\nc", 80, 2);
        assert_eq!(strip_ansi(&frame), "a\r\nb");
    }

    #[test]
    fn test_render_frame_zero_width() {
        let frame = render_frame("Name?", 0, 24);
        assert_eq!(strip_ansi(&frame), "Name?");
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;36mhi\x1b[0m there"), "hi there");
    }
}
