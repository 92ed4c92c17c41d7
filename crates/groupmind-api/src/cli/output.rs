//! Shared terminal output: message tables, spinners and the console reply sink.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use groupmind_core::reply::dispatcher::{ReplySink, SinkError};
use groupmind_types::message::{Message, Role};

const PREVIEW_CHARS: usize = 80;

/// Spinner shown while waiting on the network.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Shorten `text` to `max` characters, adding `...` when cut.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Render messages as a table.
pub fn message_table(messages: &[Message]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Time"),
            Cell::new("Sender"),
            Cell::new("Content"),
        ]);

    for m in messages {
        let sender = match m.role {
            Role::Assistant => Cell::new("assistant").fg(Color::Magenta),
            Role::User => Cell::new(m.display_sender()),
        };
        table.add_row(vec![
            Cell::new(m.id),
            Cell::new(
                m.created_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            sender,
            Cell::new(preview(&m.content, PREVIEW_CHARS)),
        ]);
    }
    table
}

/// Print messages as a table, or as a JSON array with `json`.
pub fn print_messages(title: &str, messages: &[Message], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(messages)?);
        return Ok(());
    }

    println!();
    if messages.is_empty() {
        println!("  {} {}", style(title).bold(), style("(empty)").dim());
        println!();
        return Ok(());
    }
    println!("  {} {}", style(title).bold(), style(format!("({})", messages.len())).dim());
    println!();
    println!("{}", message_table(messages));
    println!();
    Ok(())
}

/// Format one delivered reply for the terminal.
pub fn format_reply(conversation_id: &str, text: &str, json: bool) -> String {
    if json {
        serde_json::json!({ "conversation_id": conversation_id, "reply": text }).to_string()
    } else {
        format!("  {} {}", style("bot >").cyan().bold(), text)
    }
}

/// Reply sink that writes replies to a terminal writer.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    json: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleSink {
    pub fn new(writer: Box<dyn Write + Send>, json: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            json,
            spinner: None,
        }
    }

    pub fn stdout(json: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), json)
    }

    /// Clear `spinner` before the first reply is written.
    pub fn with_spinner(mut self, spinner: ProgressBar) -> Self {
        self.spinner = Some(spinner);
        self
    }
}

impl ReplySink for ConsoleSink {
    async fn send_reply(&self, conversation_id: &str, text: &str) -> Result<(), SinkError> {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
        let line = format_reply(conversation_id, text, self.json);
        let mut writer = self.writer.lock().expect("console writer lock poisoned");
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| SinkError(e.to_string()))
    }
}
