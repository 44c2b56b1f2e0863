//! Per-session UI program
//!
//! A [`Model`] is driven by messages (keys, resizes, blink ticks) and
//! rendered after each one. The program task owns the model outright; the
//! SSH handler only feeds it messages through an unbounded mpsc channel,
//! so it never waits on the program while holding up the connection.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::ansi::Key;
use crate::terminal;

/// Cursor blink period
pub const BLINK_INTERVAL: Duration = Duration::from_millis(530);

/// Events delivered to a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Key(Key),
    Resize { width: u16, height: u16 },
    /// Cursor blink tick, only sent after a model asked for [`Command::Blink`]
    Blink,
}

/// What a model asks the program to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    /// End the program and the session
    Quit,
    /// Start delivering [`Message::Blink`] ticks
    Blink,
}

/// Terminal UI state machine
pub trait Model: Send + 'static {
    fn init(&mut self) -> Command;
    fn update(&mut self, msg: Message) -> Command;
    fn view(&self) -> String;
}

/// Display options chosen at session start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramOptions {
    /// Take over the whole terminal using the alternate screen
    pub alt_screen: bool,
}

/// Terminal information from the PTY request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyInfo {
    pub term: String,
    pub width: u16,
    pub height: u16,
}

/// Where the program writes its frames
pub trait Output: Send + 'static {
    /// Write raw bytes, returns false once the peer is gone
    fn write(&mut self, data: &[u8]) -> impl Future<Output = bool> + Send;
    /// Report the exit status and close the session
    fn exit(&mut self, status: u32) -> impl Future<Output = ()> + Send;
}

/// How a program ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The model returned [`Command::Quit`]
    Quit,
    /// The session went away first
    Disconnected,
}

/// Spawn a program task, returning the sender for its messages
pub fn spawn<M: Model, O: Output>(
    model: M,
    options: ProgramOptions,
    output: O,
    size: (u16, u16),
) -> mpsc::UnboundedSender<Message> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let outcome = run(model, options, output, rx, size).await;
        debug!(?outcome, "program finished");
    });
    tx
}

/// Run a model until it quits or its message channel closes
pub async fn run<M: Model, O: Output>(
    mut model: M,
    options: ProgramOptions,
    mut output: O,
    mut messages: mpsc::UnboundedReceiver<Message>,
    (mut width, mut height): (u16, u16),
) -> Outcome {
    let mut setup = String::new();
    if options.alt_screen {
        setup.push_str(&terminal::enter_alt_screen());
        setup.push_str(&terminal::clear_screen());
    }
    setup.push_str(&terminal::hide_cursor());
    if !output.write(setup.as_bytes()).await {
        return Outcome::Disconnected;
    }

    let mut next_blink: Option<Instant> = None;
    let mut last_frame = String::new();
    let mut command = model.init();

    loop {
        match command {
            Command::Quit => break,
            Command::Blink => next_blink = Some(Instant::now() + BLINK_INTERVAL),
            Command::None => {}
        }

        let frame = terminal::render_frame(&model.view(), width, height);
        if frame != last_frame {
            if !output.write(frame.as_bytes()).await {
                return Outcome::Disconnected;
            }
            last_frame = frame;
        }

        let blink_at = next_blink.unwrap_or_else(Instant::now);
        let msg = tokio::select! {
            msg = messages.recv() => match msg {
                Some(msg) => msg,
                None => return Outcome::Disconnected,
            },
            _ = sleep_until(blink_at), if next_blink.is_some() => {
                next_blink = Some(Instant::now() + BLINK_INTERVAL);
                Message::Blink
            }
        };

        match &msg {
            Message::Key(_) => {
                // Restart the blink period so the cursor stays solid while typing
                if next_blink.is_some() {
                    next_blink = Some(Instant::now() + BLINK_INTERVAL);
                }
            }
            Message::Resize { width: w, height: h } => {
                width = *w;
                height = *h;
                last_frame.clear();
            }
            Message::Blink => {}
        }

        command = model.update(msg);
    }

    let mut teardown = terminal::show_cursor();
    if options.alt_screen {
        teardown.push_str(&terminal::leave_alt_screen());
    }
    output.write(teardown.as_bytes()).await;
    output.exit(0).await;
    Outcome::Quit
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Counts keys, quits on 'q'
    struct Counter {
        keys: usize,
    }

    impl Model for Counter {
        fn init(&mut self) -> Command {
            Command::None
        }

        fn update(&mut self, msg: Message) -> Command {
            match msg {
                Message::Key(Key::Char('q')) => Command::Quit,
                Message::Key(_) => {
                    self.keys += 1;
                    Command::None
                }
                Message::Blink | Message::Resize { .. } => Command::None,
            }
        }

        fn view(&self) -> String {
            format!("keys={}", self.keys)
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        written: Arc<Mutex<Vec<u8>>>,
        exit: Arc<Mutex<Option<u32>>>,
    }

    impl Recorder {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.written.lock().unwrap()).into_owned()
        }
    }

    impl Output for Recorder {
        async fn write(&mut self, data: &[u8]) -> bool {
            self.written.lock().unwrap().extend_from_slice(data);
            true
        }

        async fn exit(&mut self, status: u32) {
            *self.exit.lock().unwrap() = Some(status);
        }
    }

    fn counter() -> Counter {
        Counter { keys: 0 }
    }

    #[tokio::test]
    async fn test_quit_restores_terminal() {
        let recorder = Recorder::default();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Message::Key(Key::Char('a'))).unwrap();
        tx.send(Message::Key(Key::Char('q'))).unwrap();

        let options = ProgramOptions { alt_screen: true };
        let outcome = run(counter(), options, recorder.clone(), rx, (80, 24)).await;

        assert_eq!(outcome, Outcome::Quit);
        assert_eq!(*recorder.exit.lock().unwrap(), Some(0));

        let text = recorder.text();
        assert!(text.starts_with(&terminal::enter_alt_screen()));
        assert!(text.ends_with(&terminal::leave_alt_screen()));
        assert!(terminal::strip_ansi(&text).contains("keys=1"));
    }

    #[tokio::test]
    async fn test_channel_close_is_disconnect() {
        let recorder = Recorder::default();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(tx);

        let outcome = run(counter(), ProgramOptions::default(), recorder.clone(), rx, (80, 24)).await;

        assert_eq!(outcome, Outcome::Disconnected);
        assert_eq!(*recorder.exit.lock().unwrap(), None);
    }

    #[tokio::test]
    async fn test_unchanged_frames_not_resent() {
        let recorder = Recorder::default();
        let (tx, rx) = mpsc::unbounded_channel();
        // Only the resize forces a second copy of the same view
        tx.send(Message::Resize { width: 40, height: 10 }).unwrap();
        tx.send(Message::Key(Key::Char('q'))).unwrap();

        run(counter(), ProgramOptions::default(), recorder.clone(), rx, (80, 24)).await;

        let frames = recorder.text().matches("keys=0").count();
        assert_eq!(frames, 2);
    }

    #[tokio::test]
    async fn test_large_burst_is_queued() {
        let recorder = Recorder::default();
        let (tx, rx) = mpsc::unbounded_channel();
        // A pasted line arrives as one packet, far more keys than any buffer
        for _ in 0..1000 {
            tx.send(Message::Key(Key::Char('a'))).unwrap();
        }
        tx.send(Message::Key(Key::Char('q'))).unwrap();

        let outcome = run(counter(), ProgramOptions::default(), recorder.clone(), rx, (80, 24)).await;

        assert_eq!(outcome, Outcome::Quit);
        assert!(terminal::strip_ansi(&recorder.text()).contains("keys=1000"));
    }

    struct Blinker(usize);

    impl Model for Blinker {
        fn init(&mut self) -> Command {
            Command::Blink
        }

        fn update(&mut self, msg: Message) -> Command {
            if msg == Message::Blink {
                self.0 += 1;
            }
            if self.0 >= 2 {
                Command::Quit
            } else {
                Command::None
            }
        }

        fn view(&self) -> String {
            format!("blinks={}", self.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_ticks() {
        let recorder = Recorder::default();
        let (_tx, rx) = mpsc::unbounded_channel::<Message>();

        let outcome = run(Blinker(0), ProgramOptions::default(), recorder.clone(), rx, (80, 24)).await;

        assert_eq!(outcome, Outcome::Quit);
        assert!(terminal::strip_ansi(&recorder.text()).contains("blinks=1"));
    }
}
