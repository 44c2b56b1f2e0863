//! nameprompt - an SSH server that asks for your name
//!
//! Every SSH session gets a full-screen prompt with one text field.
//! `Enter` saves the value to a file and ends the session, `Ctrl+C` ends
//! it without saving. The binary is in `main.rs`.

pub mod ansi;
pub mod app;
pub mod config;
pub mod host_key;
pub mod output;
pub mod program;
pub mod signal;
pub mod ssh;
pub mod terminal;
pub mod text_input;
