//! groupmind CLI entry point.
//!
//! Binary name: `gmind`
//!
//! Parses CLI arguments, initializes tracing, storage and the reply engine,
//! then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

/// Log filter used when `RUST_LOG` is unset.
fn default_log_directive(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,groupmind_core=debug,groupmind_infra=debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let enable_otel = std::env::var_os("GROUPMIND_OTEL").is_some();
    groupmind_observe::tracing_setup::init_tracing(enable_otel, default_log_directive(cli.verbose, cli.quiet))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "gmind", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.ephemeral).await?;
    let json = cli.json;

    let result = match cli.command {
        Commands::Chat {
            conversation,
            sender,
            private,
        } => cli::chat::run_chat_loop(&state, &conversation, sender, private, json).await,

        Commands::Reply {
            conversation,
            text,
            sender,
            private,
        } => cli::reply::reply(&state, &conversation, &text, sender.as_deref(), private, json).await,

        Commands::History {
            conversation,
            limit,
        } => cli::history::history(&state, &conversation, limit, json).await,

        Commands::Context { conversation, query } => {
            cli::context::context(&state, &conversation, &query, json).await
        }

        Commands::Reindex {
            conversation,
            window,
        } => cli::reindex::reindex(&state, &conversation, window, json).await,

        Commands::Web { action } => cli::web::handle_web_command(action, &state, json).await,

        Commands::Forget {
            conversation,
            force,
        } => cli::forget::forget(&state, &conversation, force, json).await,

        Commands::Completions { .. } => Ok(()),
    };

    groupmind_observe::tracing_setup::shutdown_tracing();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_and_verbose_levels() {
        assert_eq!(default_log_directive(0, true), "error");
        assert_eq!(default_log_directive(0, false), "warn");
        assert!(default_log_directive(1, false).contains("groupmind_core=debug"));
        assert_eq!(default_log_directive(3, true), "trace");
    }
}
