//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` so replies printed through the
//! `SharedWriter` never clobber the line being typed.

use std::fmt::Display;

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};
use tracing::debug;

/// Events produced by the input handler.
#[derive(Debug)]
pub enum InputEvent {
    /// User submitted a line.
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create a new chat input handler with the given initial prompt.
    ///
    /// Returns the input handler and a `SharedWriter` for output that must
    /// not interfere with the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    /// Update the prompt displayed to the user.
    pub fn update_prompt(&mut self, prompt: &str) {
        settle("update prompt", self.rl.update_prompt(prompt));
    }

    /// Read a line of input. Read errors are treated as EOF.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let trimmed = line.trim().to_string();
                if !trimmed.is_empty() {
                    self.rl.add_history_entry(trimmed.clone());
                }
                InputEvent::Message(trimmed)
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(e) => {
                debug!(error = %e, "readline failed, ending input");
                InputEvent::Eof
            }
        }
    }

    /// Write out anything queued on the shared writer.
    pub fn flush(&mut self) {
        settle("flush", self.rl.flush());
    }

    /// Clear the terminal screen.
    pub fn clear(&mut self) {
        settle("clear screen", self.rl.clear());
    }
}

/// Terminal housekeeping is best effort: failures are logged, not raised.
fn settle<E: Display>(action: &str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!(action, error = %e, "terminal operation failed");
            false
        }
    }
}
