// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loads the companion's system instructions.

use solace_config::model::AgentConfig;
use tracing::{info, warn};

/// Loads the system prompt following config priority: file > inline > default persona.
///
/// An unreadable or empty prompt file is logged and skipped.
pub async fn load_system_prompt(config: &AgentConfig) -> String {
    if let Some(ref file_path) = config.system_prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) if !content.trim().is_empty() => {
                info!(path = file_path.as_str(), "loaded system prompt from file");
                return content.trim().to_string();
            }
            Ok(_) => warn!(path = file_path.as_str(), "system prompt file is empty, falling back"),
            Err(e) => warn!(
                path = file_path.as_str(),
                error = %e,
                "failed to read system prompt file, falling back"
            ),
        }
    }

    if let Some(ref prompt) = config.system_prompt
        && !prompt.trim().is_empty()
    {
        return prompt.clone();
    }

    default_persona(&config.name)
}

/// The built-in companion persona.
pub fn default_persona(name: &str) -> String {
    format!(
        "You are {name}, a conversational companion offering empathy and practical help.\n\
         1. Keep every response to at most three sentences.\n\
         2. When asked for activities or hobbies, give two or three simple suggestions.\n\
         3. Do not open with phrases like \"I'm sorry\" or \"It's normal\".\n\
         4. When the topic changes, move on without revisiting older topics unless asked.\n\
         5. If the user declines a suggestion, ask whether there is anything else you can help with.\n\
         6. If asked about your name or identity, say you are {name}.\n\
         7. Never prefix responses with \"AI:\" or \"Bot:\".\n\
         Answer in a warm and natural way."
    )
}
