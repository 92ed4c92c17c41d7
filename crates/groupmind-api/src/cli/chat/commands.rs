//! Slash command parsing for the console chat.
//!
//! Commands start with `/` and are handled locally; they never reach the
//! conversation log.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat.
    Exit,
    /// Show recent history, optionally with a limit.
    History(Option<usize>),
    /// Change the sender handle; `None` clears it.
    As(Option<String>),
    /// Toggle one-to-one mode.
    Private,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (trimmed.to_lowercase(), None),
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/history" => match arg.map(str::parse::<usize>) {
            None => ChatCommand::History(None),
            Some(Ok(limit)) => ChatCommand::History(Some(limit)),
            Some(Err(_)) => ChatCommand::Unknown("/history takes a number".to_string()),
        },
        "/as" => ChatCommand::As(arg.map(|h| h.trim_start_matches('@').to_string())),
        "/private" => ChatCommand::Private,
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat"),
        ("/history [N]", "Show the last N messages (default 20)"),
        ("/as [HANDLE]", "Speak as HANDLE, or anonymously without one"),
        ("/private", "Toggle one-to-one mode (always reply)"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (command, description) in rows {
        println!("  {:<14} {}", style(command).cyan(), description);
    }
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/QUIT"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_history() {
        assert_eq!(parse("/history"), Some(ChatCommand::History(None)));
        assert_eq!(parse("/history 5"), Some(ChatCommand::History(Some(5))));
        assert!(matches!(parse("/history many"), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_as() {
        assert_eq!(parse("/as @bob"), Some(ChatCommand::As(Some("bob".to_string()))));
        assert_eq!(parse("/as"), Some(ChatCommand::As(None)));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
