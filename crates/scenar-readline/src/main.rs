mod helper;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use helper::ReplHelper;
use scenar_application::{AppContext, MessageOutcome, SimulationReply, SimulationService};
use scenar_core::conversation::MessageRole;
use scenar_core::error::ScenarError;
use scenar_core::scenario::RoutingDecision;
use scenar_core::session::SimulationPhase;
use scenar_execution::{LogOptions, PipelineEvent};

/// Interactive scenario simulation.
#[derive(Parser, Debug)]
#[command(name = "scenar-repl", version, about)]
struct Args {
    /// Resume (or create) the session with this id.
    #[arg(long)]
    session: Option<String>,

    /// Print routing and simulation progress as it happens.
    #[arg(long)]
    trace: bool,

    /// Emit log lines as JSON.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let events = scenar_execution::init(LogOptions {
        default_level: Some("warn".to_string()),
        json: args.json_logs,
        pipeline_events: args.trace,
    });
    if let Some(mut events) = events {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                print_event(&event);
            }
        });
    }

    let context = AppContext::resolve().await?;
    let service = context.simulation_service()?;
    let session_id = open_or_resume(&service, args.session).await?;

    let catalog = service.catalog().snapshot().await;
    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReplHelper::new(catalog.ids())));

    println!("{}", "=== SCENAR ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Session {session_id}. Describe a scenario, or start with /<heuristic>.")
            .bright_black()
    );
    println!(
        "{}",
        "Commands: /heuristics, /history, /reload, quit".bright_black()
    );
    println!();

    match service.phase(&session_id).await? {
        SimulationPhase::AwaitingConfirmation { decision } => print_decision(&decision),
        SimulationPhase::Active { decision } => println!(
            "{}",
            format!("Simulation running with '{}'.", decision.heuristic).bright_black()
        ),
        SimulationPhase::AwaitingScenario => {}
    }

    // Text offered back for editing after a routing failure or a cancel.
    let mut initial: Option<String> = None;

    loop {
        let phase = service.phase(&session_id).await?;
        let prompt = match phase {
            SimulationPhase::AwaitingConfirmation { .. } => "yes/no> ",
            _ => ">> ",
        };
        let readline = match initial.take() {
            Some(text) => rl.readline_with_initial(prompt, (text.as_str(), "")),
            None => rl.readline(prompt),
        };

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            println!("{}", "Goodbye!".bright_green());
            break;
        }
        let _ = rl.add_history_entry(trimmed);

        match trimmed {
            "/heuristics" => {
                let catalog = service.catalog().snapshot().await;
                for definition in catalog.definitions() {
                    println!(
                        "{} {}",
                        format!("/{}", definition.id).bright_cyan(),
                        definition.description.bright_black()
                    );
                }
                continue;
            }
            "/history" => {
                for message in service.history(&session_id).await? {
                    let label = match message.role {
                        MessageRole::User => "[user]".green(),
                        MessageRole::Assistant => "[simulator]".bright_magenta(),
                    };
                    println!("{label}");
                    println!("{}", message.content);
                }
                continue;
            }
            "/reload" => {
                match service.reload_catalog().await {
                    Ok(catalog) => {
                        if let Some(helper) = rl.helper_mut() {
                            helper.set_heuristics(catalog.ids());
                        }
                        println!(
                            "{}",
                            format!("Reloaded {} heuristics.", catalog.len()).bright_green()
                        );
                    }
                    Err(err) => print_error(&err),
                }
                continue;
            }
            _ => {}
        }

        if matches!(phase, SimulationPhase::AwaitingConfirmation { .. }) {
            match trimmed.to_lowercase().as_str() {
                "yes" | "y" => {
                    println!("{}", "Starting simulation...".bright_black());
                    match service.confirm_and_initialize(&session_id).await {
                        Ok(reply) => print_reply(&reply),
                        Err(err) => print_error(&err),
                    }
                }
                "no" | "n" => {
                    if let Some(decision) = service.cancel(&session_id).await? {
                        println!("{}", "Cancelled. Edit your scenario:".yellow());
                        initial = Some(decision.original_prompt);
                    }
                }
                _ => println!("{}", "Please answer yes or no.".yellow()),
            }
            continue;
        }

        match service.handle_message(&session_id, trimmed).await {
            Ok(MessageOutcome::Routed(decision)) => print_decision(&decision),
            Ok(MessageOutcome::Reply(reply)) => print_reply(&reply),
            Err(err) if err.is_retryable_input() => {
                print_error(&err);
                println!("{}", "Edit your scenario and try again.".yellow());
                initial = Some(trimmed.to_string());
            }
            Err(err) => print_error(&err),
        }
    }

    service.close_session(&session_id).await;
    Ok(())
}

async fn open_or_resume(service: &SimulationService, session: Option<String>) -> Result<String> {
    let Some(id) = session else {
        return Ok(service.open_session(None).await?);
    };
    match service.resume_session(&id).await {
        Ok(phase) => {
            tracing::info!(session_id = %id, %phase, "Resumed session");
            Ok(id)
        }
        Err(err) if err.is_not_found() => Ok(service.open_session(Some(id)).await?),
        Err(err) => Err(err.into()),
    }
}

fn print_decision(decision: &RoutingDecision) {
    println!(
        "{}",
        format!("Heuristic: {}", decision.heuristic).bright_yellow()
    );
    for line in decision.display_format.lines() {
        println!("{}", line.yellow());
    }
    println!("{}", "Proceed with this scenario? (yes/no)".bright_yellow());
}

fn print_reply(reply: &SimulationReply) {
    for line in reply.narrative.lines() {
        println!("{}", line.bright_blue());
    }
    if let Some(state) = &reply.state_update {
        println!();
        println!("{}", format!("State: {state}").bright_black());
    }
    if !reply.available_actions.is_empty() {
        println!();
        println!("{}", "Actions:".green());
        for action in &reply.available_actions {
            println!("{}", format!("  - {action}").green());
        }
    }
    println!();
}

fn print_error(err: &ScenarError) {
    eprintln!("{}", format!("Error: {err}").red());
}

fn print_event(event: &PipelineEvent) {
    let stage = event.stage().unwrap_or("-");
    let mut details: Vec<String> = event
        .fields
        .iter()
        .filter(|(key, _)| key.as_str() != "stage")
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    details.sort();
    println!(
        "{}",
        format!("[{stage}] {} {}", event.message, details.join(" ")).bright_black()
    );
}
