//! Welcome banner display for chat sessions.

use console::style;

/// Print the banner at the start of a console chat.
pub fn print_welcome_banner(conversation: &str, model: &str, storage: &str, trigger_on_mention: bool) {
    println!();
    println!("  {} {}", style("*").cyan(), style("groupmind").cyan().bold());
    println!();
    println!("  {}  {}", style("Conversation:").bold(), style(conversation).dim());
    println!("  {}         {}", style("Model:").bold(), style(model).dim());
    println!("  {}       {}", style("Storage:").bold(), style(storage).dim());
    if trigger_on_mention {
        println!(
            "  {}       {}",
            style("Trigger:").bold(),
            style("mentions and trigger words only").dim()
        );
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
