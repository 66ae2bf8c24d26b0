use anyhow::Result;
use clap::{Parser, Subcommand};
use scenar_application::AppContext;
use scenar_execution::LogOptions;

mod commands;

#[derive(Parser)]
#[command(name = "scenar")]
#[command(about = "SCENAR CLI - scenario routing over reasoning heuristics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the heuristic catalog
    Heuristics {
        #[command(subcommand)]
        action: HeuristicsAction,
    },
    /// Route a scenario and print the decision as JSON (calls the oracle)
    Route {
        /// Scenario text; may start with a /<heuristic> shortcode
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Inspect stored simulation sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum HeuristicsAction {
    /// List heuristic ids and descriptions
    List,
    /// Show one heuristic in full
    Show { id: String },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List stored sessions, most recently updated first
    List,
    /// Delete a stored session
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    scenar_execution::init(LogOptions {
        default_level: Some("warn".to_string()),
        ..LogOptions::default()
    });

    let context = AppContext::resolve().await?;

    match cli.command {
        Commands::Heuristics { action } => match action {
            HeuristicsAction::List => commands::heuristics::list(&context).await?,
            HeuristicsAction::Show { id } => commands::heuristics::show(&context, &id).await?,
        },
        Commands::Route { text } => commands::route::run(&context, &text.join(" ")).await?,
        Commands::Sessions { action } => match action {
            SessionsAction::List => commands::sessions::list(&context).await?,
            SessionsAction::Delete { id } => commands::sessions::delete(&context, &id).await?,
        },
    }

    Ok(())
}
