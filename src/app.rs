//! The name prompt shown to every session

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::Config;
use crate::output;
use crate::program::{Command, Message, Model, ProgramOptions, PtyInfo};
use crate::text_input::TextInput;

/// Per-session UI state: a heading and one focused text field
pub struct NamePrompt {
    title: String,
    input: TextInput,
    output_path: PathBuf,
}

impl NamePrompt {
    pub fn new(config: &Config) -> Self {
        let mut input = TextInput::new();
        input.focus();
        input.placeholder = config.placeholder.clone();
        // Placeholder only renders fully with a width set
        input.width = config.input_width;

        Self {
            title: config.title.clone(),
            input,
            output_path: config.output_path.clone(),
        }
    }

    /// Text entered so far
    pub fn value(&self) -> &str {
        self.input.value()
    }
}

impl Model for NamePrompt {
    fn init(&mut self) -> Command {
        Command::Blink
    }

    fn update(&mut self, msg: Message) -> Command {
        match msg {
            Message::Key(key) => match key.name().as_str() {
                "ctrl+c" => return Command::Quit,
                "enter" => {
                    if let Err(e) = output::save(&self.output_path, self.input.value()) {
                        warn!(error = %e, "could not save value");
                    }
                    return Command::Quit;
                }
                _ => {
                    self.input.update(&key);
                }
            },
            Message::Blink => self.input.blink(),
            Message::Resize { .. } => {}
        }
        Command::None
    }

    fn view(&self) -> String {
        format!("{}\n\n{}", self.title, self.input.view())
    }
}

/// Build the model and display options for a new session
pub fn session_entry(config: &Config, pty: &PtyInfo) -> (NamePrompt, ProgramOptions) {
    debug!(term = %pty.term, width = pty.width, height = pty.height, "starting name prompt");
    (NamePrompt::new(config), ProgramOptions { alt_screen: true })
}
