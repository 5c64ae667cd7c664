// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Solace - a conversational companion with long-term memory.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod runtime;
mod shell;
mod wav;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use solace_config::SolaceConfig;
use solace_core::error::SolaceError;
use solace_core::types::SessionKey;

/// Solace - a conversational companion with long-term memory.
#[derive(Parser, Debug)]
#[command(name = "solace", version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the standard search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Talk to the companion in an interactive session.
    Chat {
        #[arg(long, default_value = "local")]
        user: String,
        #[arg(long, default_value = "default")]
        thread: String,
        /// Wait for whole replies instead of streaming tokens.
        #[arg(long)]
        no_stream: bool,
        /// Speak replies through the TTS worker, writing one WAV file per turn here.
        #[arg(long, value_name = "DIR")]
        speak_to: Option<PathBuf>,
    },
    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Manage stored memories.
    Memory {
        #[command(subcommand)]
        action: MemoryCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate the configuration and print a summary.
    Check,
}

#[derive(Subcommand, Debug)]
enum MemoryCommands {
    /// Delete a user's long-term memories and the thread's history.
    Clear {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "default")]
        thread: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config {
        Some(ref path) => solace_config::load_and_validate_path(path),
        None => solace_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            solace_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Commands::Chat {
            user,
            thread,
            no_stream,
            speak_to,
        } => {
            let options = shell::ChatOptions {
                key: SessionKey::new(user, thread),
                stream: !no_stream,
                speak_to,
            };
            shell::run_chat(config, options).await
        }
        Commands::Config {
            action: ConfigCommands::Check,
        } => {
            print_config_summary(&config);
            Ok(())
        }
        Commands::Memory {
            action: MemoryCommands::Clear { user, thread },
        } => clear_memory(config, SessionKey::new(user, thread)).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn clear_memory(config: SolaceConfig, key: SessionKey) -> Result<(), SolaceError> {
    let runtime = runtime::Runtime::build(&config).await?;
    let summary = runtime
        .controller
        .orchestrator()
        .clear_all_memories(&key)
        .await?;
    if summary.long_term_cleared {
        println!("long-term memory cleared for user {}", key.user_id);
    } else {
        println!("no long-term memory stored for user {}", key.user_id);
    }
    runtime.shutdown().await;
    Ok(())
}

fn print_config_summary(config: &SolaceConfig) {
    println!("{}", "config ok".green().bold());
    println!("  agent:   {} (log level {})", config.agent.name, config.agent.log_level);
    println!("  model:   {} at {}", config.model.model, config.model.base_url);
    println!(
        "  budget:  {} context tokens, {} response tokens, overflow {:?}",
        config.context.max_context_tokens, config.model.max_tokens, config.context.overflow_policy
    );
    println!(
        "  memory:  stm_limit {}, eviction {:?}, top-{} above {}",
        config.memory.stm_limit,
        config.memory.eviction,
        config.memory.max_db_results,
        config.memory.score_threshold
    );
    match config.memory.store_path {
        Some(ref path) => println!("  store:   {}", path.display()),
        None => println!("  store:   in process only"),
    }
    println!(
        "  emotion: {}",
        if config.emotion.enabled { "enabled" } else { "disabled" }
    );
    match (config.speech.enabled, config.speech.command.as_deref()) {
        (true, Some(command)) => println!("  speech:  {command} {}", config.speech.args.join(" ")),
        _ => println!("  speech:  disabled"),
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("solace={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
