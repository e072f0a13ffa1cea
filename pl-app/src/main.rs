//! PromptLight main binary.

mod commands;
mod config;
mod init;
mod routes;
mod server;
mod telemetry;
mod wiring;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "promptlight", version, about = "PromptLight prompt optimization service")]
struct Cli {
    /// Config file; ~/.promptlight/config.toml when unset.
    #[arg(long, global = true, env = "PROMPTLIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Write ~/.promptlight/config.toml from the bundled template (idempotent).
    Init,
    /// Validate config and wire collaborators without serving.
    Doctor,
    /// Rewrite a single prompt and print the outcome as JSON.
    Optimize {
        #[arg(long)]
        category: String,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        task_id: Option<String>,
        /// Text scaffolding language: ko (default) or en.
        #[arg(long)]
        language: Option<String>,
    },
    /// Rank catalog templates for an input.
    Recommend {
        #[arg(long)]
        category: String,
        #[arg(long)]
        input: String,
        #[arg(long)]
        model: Option<String>,
    },
    /// Manage learned hints in the sqlite store.
    Learned {
        #[command(subcommand)]
        command: LearnedCommand,
    },
}

#[derive(Debug, Subcommand)]
enum LearnedCommand {
    /// Insert or replace the entry for (category, model).
    Put {
        #[arg(long)]
        category: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        /// JSON array of opaque patterns.
        #[arg(long)]
        patterns: Option<String>,
        #[arg(long, default_value_t = 0.5)]
        confidence: f64,
    },
    /// Print the exact entry for (category, model).
    Show {
        #[arg(long)]
        category: String,
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    telemetry::init_tracing()?;
    telemetry::install_panic_hook();
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }

    let cli = Cli::parse();
    let config_path = cli.config;

    let command = if let Some(command) = cli.command {
        command
    } else {
        Command::Serve
    };

    match command {
        Command::Serve => server::serve(config_path).await,
        Command::Init => {
            let report = init::initialize_default().await?;
            if report.created {
                println!("promptlight init: created {}", report.config_path.display());
            } else {
                println!(
                    "promptlight init: already initialized at {}",
                    report.config_path.display()
                );
            }
            Ok(())
        }
        Command::Doctor => server::doctor(config_path).await,
        Command::Optimize {
            category,
            prompt,
            model,
            task_id,
            language,
        } => {
            let outcome = commands::optimize(
                config_path,
                commands::OptimizeArgs {
                    category,
                    prompt,
                    model,
                    task_id,
                    language,
                },
            )
            .await?;
            print_json(&outcome)
        }
        Command::Recommend {
            category,
            input,
            model,
        } => {
            let recommendation =
                commands::recommend(config_path, &category, &input, model.as_deref()).await?;
            print_json(&recommendation)
        }
        Command::Learned { command } => {
            let output = match command {
                LearnedCommand::Put {
                    category,
                    model,
                    keywords,
                    patterns,
                    confidence,
                } => {
                    commands::learned_put(
                        config_path,
                        commands::LearnedPutArgs {
                            category,
                            model,
                            keywords,
                            patterns,
                            confidence,
                        },
                    )
                    .await?
                }
                LearnedCommand::Show { category, model } => {
                    commands::learned_show(config_path, &category, model.as_deref()).await?
                }
            };
            print_json(&output)
        }
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
