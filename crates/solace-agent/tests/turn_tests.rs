// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking turns through the full pipeline over mock adapters.

use std::time::Duration;

use futures::StreamExt;
use solace_agent::{ClearSummary, TurnEvent, TurnOutcome};
use solace_config::model::OverflowPolicy;
use solace_core::error::SolaceError;
use solace_core::types::{Role, SessionKey};
use solace_test_utils::{MockEmotion, MockReply, TestHarness};
use tokio_util::sync::CancellationToken;

fn key() -> SessionKey {
    SessionKey::new("alice", "t1")
}

fn reply(outcome: TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Replied(msg) => msg.content,
        other => panic!("expected a reply, got {other:?}"),
    }
}

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

#[tokio::test]
async fn blocking_turn_appends_human_then_ai() {
    let h = TestHarness::builder()
        .with_mock_responses(["Nice to meet you, Alice."])
        .build();

    let out = reply(h.turn(&key(), "Hi, I'm Alice").await.unwrap());
    assert_eq!(out, "Nice to meet you, Alice.");

    let history = h.history(&key()).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::Human);
    assert_eq!(history[1].role, Role::Ai);
    assert_eq!(history[0].turn, history[1].turn);
    assert_eq!(h.orchestrator.last_output_tokens(&key()).await, Some(5));

    let request = h.provider.last_request().await.unwrap();
    assert!(!request.stream);
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, "user");
}

#[tokio::test]
async fn eviction_moves_one_turn_per_boundary_crossing() {
    let h = TestHarness::builder()
        .with_stm_limit(3)
        .with_mock_responses(["a1", "a2", "a3", "a4"])
        .build();

    h.turn(&key(), "q1").await.unwrap();
    h.turn(&key(), "q2").await.unwrap();
    assert!(h.store.adds().await.is_empty(), "4 messages after turn 2, nothing crossed yet");

    h.turn(&key(), "q3").await.unwrap();
    let adds = h.store.adds().await;
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0].text, "Human: q1\nAI: a1");
    assert_eq!(adds[0].namespace, "alice");
    assert_eq!(adds[0].metadata.get("session_id").map(String::as_str), Some("t1"));

    // The model only sees the last stm_limit messages.
    let request = h.provider.last_request().await.unwrap();
    let sent: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(sent, vec!["q2", "a2", "q3"]);

    h.turn(&key(), "q4").await.unwrap();
    let adds = h.store.adds().await;
    assert_eq!(adds.len(), 2);
    assert_eq!(adds[1].text, "Human: q2\nAI: a2");
    // The log itself is never shortened by eviction.
    assert_eq!(h.history(&key()).await.len(), 8);
}

#[tokio::test]
async fn no_eviction_while_under_limit() {
    let h = TestHarness::builder().build();
    for i in 0..3 {
        h.turn(&key(), &format!("q{i}")).await.unwrap();
    }
    assert_eq!(h.history(&key()).await.len(), 6);
    assert!(h.store.adds().await.is_empty());
}

#[tokio::test]
async fn oversized_prompt_skips_without_calling_model() {
    let h = TestHarness::builder()
        .with_config(|c| {
            c.context.max_context_tokens = 600;
            c.model.max_tokens = 512;
        })
        .build();

    match h.turn(&key(), &words(150)).await.unwrap() {
        TurnOutcome::Skipped {
            prompt_tokens,
            limit,
        } => {
            assert_eq!(limit, 88);
            assert!(prompt_tokens > limit);
        }
        other => panic!("expected skip, got {other:?}"),
    }
    assert_eq!(h.provider.call_count(), 0);
    // The utterance stays; no AI message is added.
    assert_eq!(h.history(&key()).await.len(), 1);

    let events: Vec<TurnEvent> = h.stream(&key(), &words(150)).await.unwrap();
    assert!(matches!(events.as_slice(), [TurnEvent::Skipped { .. }]));
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn error_policy_fails_the_turn() {
    let h = TestHarness::builder()
        .with_config(|c| {
            c.context.max_context_tokens = 600;
            c.model.max_tokens = 512;
            c.context.overflow_policy = OverflowPolicy::Error;
        })
        .build();

    let err = h.turn(&key(), &words(150)).await.unwrap_err();
    match err {
        SolaceError::Turn { thread_id, source } => {
            assert_eq!(thread_id, "t1");
            assert!(matches!(*source, SolaceError::ContextOverflow { limit: 88, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn truncate_policy_drops_recalled_memories_to_fit() {
    let long_answer = words(300);
    let h = TestHarness::builder()
        .with_stm_limit(1)
        .with_mock_responses([long_answer.as_str(), "short reply"])
        .with_config(|c| {
            c.context.max_context_tokens = 712;
            c.model.max_tokens = 512;
            c.context.overflow_policy = OverflowPolicy::TruncateMemories;
        })
        .build();

    h.turn(&key(), "tell me a story").await.unwrap();
    // Turn 1 is evicted and then recalled, which alone exceeds the budget.
    let out = reply(h.turn(&key(), "and then?").await.unwrap());
    assert_eq!(out, "short reply");
    assert_eq!(h.store.adds().await.len(), 1);

    let system = h.provider.last_request().await.unwrap().system_prompt.unwrap();
    assert!(!system.contains("word word"), "recalled memory should have been dropped");
}

#[tokio::test]
async fn memory_search_failure_degrades_to_no_memories() {
    let h = TestHarness::builder()
        .with_mock_responses(["still here"])
        .build();
    h.store.set_fail_search(true);

    assert_eq!(reply(h.turn(&key(), "hello").await.unwrap()), "still here");
    assert_eq!(h.store.queries().await.len(), 1);
}

#[tokio::test]
async fn recalled_memories_and_emotion_reach_the_system_prompt() {
    let h = TestHarness::builder()
        .with_stm_limit(1)
        .with_emotion(MockEmotion::new("joy"))
        .with_mock_responses(["We talked about the garden.", "Lovely."])
        .build();

    h.turn(&key(), "My tomatoes are growing").await.unwrap();
    h.turn(&key(), "Guess what happened").await.unwrap();

    let system = h.provider.last_request().await.unwrap().system_prompt.unwrap();
    assert!(system.starts_with("You are a test companion."));
    assert!(system.contains("Human: My tomatoes are growing\nAI: We talked about the garden."));
    assert!(system.contains("detected as 'joy'"));
    assert!(system.contains(&h.config.emotion.guidance["joy"]));
}

#[tokio::test]
async fn emotion_failure_falls_back_to_neutral() {
    let h = TestHarness::builder()
        .with_emotion(MockEmotion::failing())
        .build();

    h.turn(&key(), "hello").await.unwrap();
    assert_eq!(h.emotion.call_count(), 1);
    let system = h.provider.last_request().await.unwrap().system_prompt.unwrap();
    assert!(system.contains("detected as 'neutral'"));
}

#[tokio::test]
async fn store_write_failure_aborts_turn_without_ai_message() {
    let h = TestHarness::builder()
        .with_stm_limit(1)
        .with_mock_responses(["a1", "a2"])
        .build();
    h.turn(&key(), "q1").await.unwrap();

    h.store.set_fail_writes(true);
    let err = h.turn(&key(), "q2").await.unwrap_err();
    assert!(err.to_string().starts_with("failed to process input for thread t1"), "{err}");
    assert_eq!(h.provider.call_count(), 1);

    let history = h.history(&key()).await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].role, Role::Human);

    // The next turn evicts whatever now crosses the boundary: the
    // unanswered q2.
    h.store.set_fail_writes(false);
    h.turn(&key(), "q3").await.unwrap();
    let adds = h.store.adds().await;
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0].text, "Human: q2");
}

#[tokio::test]
async fn provider_failure_is_reported_with_thread_id() {
    let h = TestHarness::builder().build();
    h.provider.push_failure("model not loaded").await;

    let err = h.turn(&key(), "hello").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("thread t1"), "{text}");
    assert!(text.contains("model not loaded"), "{text}");
    assert_eq!(h.history(&key()).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_model_call_times_out() {
    let h = TestHarness::builder()
        .with_config(|c| c.model.request_timeout_secs = 2)
        .build();
    h.provider.push(MockReply::Hang).await;

    let err = h.turn(&key(), "hello").await.unwrap_err();
    assert!(err.is_timeout(), "{err}");
    assert_eq!(h.history(&key()).await.len(), 1);
}

#[tokio::test]
async fn summarizer_condenses_evicted_ai_messages() {
    let h = TestHarness::builder()
        .with_stm_limit(1)
        .with_summarizer()
        .with_mock_responses(["a very long winded answer", "short", "a2"])
        .build();

    h.turn(&key(), "q1").await.unwrap();
    assert_eq!(reply(h.turn(&key(), "q2").await.unwrap()), "a2");

    let adds = h.store.adds().await;
    assert_eq!(adds[0].text, "Human: q1\nAI: short");
    let requests = h.provider.requests().await;
    assert!(requests[1].messages[0].content.starts_with("Summarize the following AI message"));
}

#[tokio::test]
async fn clear_all_memories_is_one_shot() {
    let h = TestHarness::builder().with_stm_limit(1).build();
    h.turn(&key(), "q1").await.unwrap();
    h.turn(&key(), "q2").await.unwrap();
    assert_eq!(h.store.adds().await.len(), 1);

    let first = h.orchestrator.clear_all_memories(&key()).await.unwrap();
    assert_eq!(
        first,
        ClearSummary {
            messages_removed: 4,
            long_term_cleared: true
        }
    );
    let second = h.orchestrator.clear_all_memories(&key()).await.unwrap();
    assert_eq!(
        second,
        ClearSummary {
            messages_removed: 0,
            long_term_cleared: false
        }
    );
    assert_eq!(h.store.delete_count(), 1);
    assert!(h.history(&key()).await.is_empty());
    assert_eq!(h.orchestrator.last_output_tokens(&key()).await, None);
}

#[tokio::test]
async fn clearing_short_term_memory_keeps_long_term() {
    let h = TestHarness::builder().with_stm_limit(1).build();
    h.turn(&key(), "q1").await.unwrap();
    h.turn(&key(), "q2").await.unwrap();

    assert_eq!(h.orchestrator.clear_short_term_memory(&key()).await.unwrap(), 4);
    assert_eq!(h.store.delete_count(), 0);
    assert_eq!(
        h.orchestrator
            .clear_short_term_memory(&SessionKey::new("nobody", "none"))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn threads_do_not_share_history() {
    let h = TestHarness::builder().build();
    let other = SessionKey::new("alice", "t2");
    h.turn(&key(), "in t1").await.unwrap();
    h.turn(&other, "in t2").await.unwrap();
    h.turn(&other, "again t2").await.unwrap();

    assert_eq!(h.history(&key()).await.len(), 2);
    assert_eq!(h.history(&other).await.len(), 4);
    assert_eq!(h.orchestrator.registry().len(), 2);
}

#[tokio::test]
async fn turns_on_one_thread_never_interleave() {
    let h = TestHarness::builder()
        .with_chunk_delay(Duration::from_millis(5))
        .with_mock_responses(["first answer", "second answer"])
        .build();

    let a = h
        .orchestrator
        .stream_turn(key(), "first".into(), CancellationToken::new());
    let b = h
        .orchestrator
        .stream_turn(key(), "second".into(), CancellationToken::new());
    let (ea, eb) = tokio::join!(a.collect::<Vec<_>>(), b.collect::<Vec<_>>());
    assert!(matches!(ea.last(), Some(TurnEvent::Completed(_))));
    assert!(matches!(eb.last(), Some(TurnEvent::Completed(_))));

    let history = h.history(&key()).await;
    let shape: Vec<(Role, u64)> = history.iter().map(|m| (m.role, m.turn)).collect();
    assert_eq!(
        shape,
        vec![(Role::Human, 1), (Role::Ai, 1), (Role::Human, 2), (Role::Ai, 2)]
    );
    assert_eq!(history[1].content, "first answer");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn failed_turn_is_logged_with_thread_id() {
    let h = TestHarness::builder().build();
    h.provider.push_failure("boom").await;

    assert!(h.turn(&key(), "hello").await.is_err());
    assert!(logs_contain("turn failed"));
    assert!(logs_contain("thread_id=t1"));
}
