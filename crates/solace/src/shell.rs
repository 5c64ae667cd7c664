// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `solace chat` command implementation.
//!
//! Launches an interactive REPL with a colored prompt, streaming output and
//! readline history. Ctrl+C during a reply cancels that reply only.

use std::path::PathBuf;
use std::io::Write;

use colored::Colorize;
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use solace_agent::{TurnEvent, TurnOutcome};
use solace_config::SolaceConfig;
use solace_core::error::SolaceError;
use solace_core::types::SessionKey;
use tracing::{debug, info};

use crate::runtime::Runtime;

pub struct ChatOptions {
    pub key: SessionKey,
    pub stream: bool,
    /// Directory for spoken replies. Requires `[speech] enabled`.
    pub speak_to: Option<PathBuf>,
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    ClearShortTerm,
    ForgetAll,
    Say(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/clear" => Input::ClearShortTerm,
        "/forget" => Input::ForgetAll,
        text => Input::Say(text),
    }
}

/// Runs the `solace chat` interactive REPL.
pub async fn run_chat(config: SolaceConfig, options: ChatOptions) -> Result<(), SolaceError> {
    let runtime = Runtime::build(&config).await?;
    if options.speak_to.is_some() && !runtime.controller.has_speech() {
        return Err(SolaceError::Config(
            "--speak-to needs [speech] enabled = true and a worker command".into(),
        ));
    }
    if let Some(ref dir) = options.speak_to {
        tokio::fs::create_dir_all(dir).await.map_err(|e| SolaceError::Speech {
            message: format!("cannot create {}", dir.display()),
            source: Some(Box::new(e)),
        })?;
    }
    runtime.check_model().await;

    let mut rl = DefaultEditor::new()
        .map_err(|e| SolaceError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{} is listening", config.agent.name).bold().green());
    println!(
        "Type {} to forget this thread, {} to forget everything, {} to exit.\n",
        "/clear".yellow(),
        "/forget".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", options.key.user_id.green());
    let mut spoken = 0usize;
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::ClearShortTerm => {
                let removed = runtime
                    .controller
                    .orchestrator()
                    .clear_short_term_memory(&options.key)
                    .await?;
                println!("{}", format!("cleared {removed} messages").dimmed());
            }
            Input::ForgetAll => {
                let summary = runtime
                    .controller
                    .orchestrator()
                    .clear_all_memories(&options.key)
                    .await?;
                println!(
                    "{}",
                    format!(
                        "cleared {} messages, long-term memory {}",
                        summary.messages_removed,
                        if summary.long_term_cleared { "deleted" } else { "was empty" }
                    )
                    .dimmed()
                );
            }
            Input::Say(text) => {
                let _ = rl.add_history_entry(text);
                let result = match options.speak_to {
                    Some(ref dir) => {
                        spoken += 1;
                        speak_turn(&runtime, &options.key, text, &dir.join(format!("reply-{spoken}.wav"))).await
                    }
                    None if options.stream => stream_turn(&runtime, &options.key, text).await,
                    None => blocking_turn(&runtime, &options.key, text).await,
                };
                if let Err(e) = result {
                    eprintln!("{}: {e}", "error".red());
                }
            }
        }
    }

    runtime.shutdown().await;
    info!("chat session ended");
    Ok(())
}

async fn blocking_turn(runtime: &Runtime, key: &SessionKey, text: &str) -> Result<(), SolaceError> {
    match runtime.controller.orchestrator().run_turn(key, text).await? {
        TurnOutcome::Replied(message) => println!("{}\n", message.content),
        TurnOutcome::Skipped {
            prompt_tokens,
            limit,
        } => print_skipped(prompt_tokens, limit),
    }
    Ok(())
}

async fn stream_turn(runtime: &Runtime, key: &SessionKey, text: &str) -> Result<(), SolaceError> {
    let mut events = runtime.controller.start_text(key.clone(), text)?;
    let mut stdout = std::io::stdout();
    loop {
        let event = tokio::select! {
            event = events.next() => event,
            _ = tokio::signal::ctrl_c() => {
                runtime.controller.cancel(key);
                println!("\n{}", "(interrupted)".dimmed());
                return Ok(());
            }
        };
        match event {
            Some(TurnEvent::Token(token)) => {
                print!("{token}");
                let _ = stdout.flush();
            }
            Some(TurnEvent::Completed(message)) => {
                debug!(turn = message.turn, "reply committed");
                println!("\n");
            }
            Some(TurnEvent::Skipped {
                prompt_tokens,
                limit,
            }) => print_skipped(prompt_tokens, limit),
            Some(TurnEvent::Error(message)) => {
                println!();
                return Err(SolaceError::Internal(message));
            }
            None => return Ok(()),
        }
    }
}

async fn speak_turn(
    runtime: &Runtime,
    key: &SessionKey,
    text: &str,
    path: &std::path::Path,
) -> Result<(), SolaceError> {
    let mut audio = runtime.controller.start_audio(key.clone(), text)?;
    let mut wav = Vec::new();
    loop {
        let chunk = tokio::select! {
            chunk = audio.next() => chunk,
            _ = tokio::signal::ctrl_c() => {
                runtime.controller.cancel(key);
                println!("{}", "(interrupted)".dimmed());
                return Ok(());
            }
        };
        match chunk {
            Some(bytes) => wav.extend_from_slice(&bytes?),
            None => break,
        }
    }

    let history = runtime.controller.orchestrator().history(key).await;
    if let Some(reply) = history.last().filter(|m| m.role == solace_core::types::Role::Ai) {
        println!("{}\n", reply.content);
    }
    if wav.is_empty() {
        return Ok(());
    }
    let wav = crate::wav::merge_wavs(&wav)?;
    tokio::fs::write(path, &wav).await.map_err(|e| SolaceError::Speech {
        message: format!("failed to write {}", path.display()),
        source: Some(Box::new(e)),
    })?;
    println!("{}", format!("audio: {}", path.display()).dimmed());
    Ok(())
}

fn print_skipped(prompt_tokens: usize, limit: usize) {
    println!(
        "{}",
        format!("(that was too much for me to take in at once: {prompt_tokens} tokens, limit {limit})")
            .yellow()
    );
}
