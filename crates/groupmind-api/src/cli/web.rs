//! `gmind web`: run the web tools directly.
//!
//! Output is exactly the text the model would receive as the tool result.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use super::output::spinner;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum WebCommand {
    /// Search the web.
    Search {
        /// Search query.
        query: String,

        /// Maximum results (1-10; defaults to `web.default_max_results`).
        #[arg(long)]
        max: Option<usize>,
    },

    /// Fetch a page.
    Fetch {
        /// Page URL.
        url: String,
    },
}

pub async fn handle_web_command(cmd: WebCommand, state: &AppState, json: bool) -> Result<()> {
    if !state.web.is_configured() && !json {
        eprintln!(
            "  {} No web API key. Set {} or web.api_key in config.toml.",
            style("!").yellow().bold(),
            groupmind_infra::config::WEB_API_KEY_ENV
        );
    }

    let (tool, target, result) = match cmd {
        WebCommand::Search { query, max } => {
            let max = max.unwrap_or(state.config.web.default_max_results);
            let progress = (!json).then(|| spinner("searching..."));
            let result = state.web.search(&query, max).await;
            if let Some(progress) = progress {
                progress.finish_and_clear();
            }
            ("web_search", query, result)
        }
        WebCommand::Fetch { url } => {
            let progress = (!json).then(|| spinner("fetching..."));
            let result = state.web.fetch(&url).await;
            if let Some(progress) = progress {
                progress.finish_and_clear();
            }
            ("web_fetch", url, result)
        }
    };

    if json {
        println!("{}", serde_json::json!({ "tool": tool, "input": target, "result": result }));
    } else {
        println!();
        println!("{result}");
        println!();
    }
    Ok(())
}
