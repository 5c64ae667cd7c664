// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-term memory window selection.

use std::fmt;
use std::sync::Arc;

use solace_core::tokenizer::TokenCounter;
use solace_core::types::ChatMessage;

/// Selects the most recent messages presented to the model each turn.
///
/// Trimming is a pure function over the message log: the log itself is
/// never modified, only a suffix of it is returned.
#[derive(Clone)]
pub enum StmTrimmer {
    /// Keep the last `n` messages.
    Count(usize),
    /// Keep the longest suffix whose `"{Role}: {content}"` rendering fits the budget.
    ///
    /// The newest message is always kept, even if it alone exceeds the budget.
    Tokens {
        budget: usize,
        counter: Arc<dyn TokenCounter>,
    },
}

impl fmt::Debug for StmTrimmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmTrimmer::Count(n) => f.debug_tuple("Count").field(n).finish(),
            StmTrimmer::Tokens { budget, .. } => {
                f.debug_struct("Tokens").field("budget", budget).finish()
            }
        }
    }
}

impl StmTrimmer {
    /// Builds a trimmer from `memory.stm_limit` and `memory.stm_token_budget`.
    pub fn from_limits(
        stm_limit: usize,
        token_budget: Option<usize>,
        counter: Arc<dyn TokenCounter>,
    ) -> Self {
        match token_budget {
            Some(budget) => StmTrimmer::Tokens { budget, counter },
            None => StmTrimmer::Count(stm_limit),
        }
    }

    pub fn trim<'a>(&self, messages: &'a [ChatMessage]) -> &'a [ChatMessage] {
        match self {
            StmTrimmer::Count(limit) => {
                let start = messages.len().saturating_sub(*limit);
                &messages[start..]
            }
            StmTrimmer::Tokens { budget, counter } => {
                let mut used = 0usize;
                let mut start = messages.len();
                for (i, message) in messages.iter().enumerate().rev() {
                    let cost = counter.count(&message.labelled());
                    if used + cost > *budget && start < messages.len() {
                        break;
                    }
                    used += cost;
                    start = i;
                }
                &messages[start..]
            }
        }
    }
}
