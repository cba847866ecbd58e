mod helpers;

use helpers::{store, summarizer, ScriptedLlm};
use recollect::llm::{Entry, LlmError, Role};
use recollect::memory::json_store::write_json;
use recollect::memory::summarizer::COUNTER_FILE;
use recollect::memory::types::CounterState;
use recollect::memory::CycleOutcome;

fn save_round(store: &recollect::memory::ConversationStore, i: usize) {
    store
        .save(&[Entry::user(format!("question {i}")), Entry::assistant(format!("answer {i}"))])
        .unwrap();
}

#[tokio::test]
async fn counter_climbs_to_cycle_length_before_summarizing() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = store(tmp.path());
    let llm = ScriptedLlm::replying(&["Three questions were asked and answered."]);
    let summarizer = summarizer(tmp.path(), llm.clone(), 3);

    for i in 1..=3u32 {
        save_round(&store, i as usize);
        let outcome = summarizer.run_cycle(&format!("question {i}"), &store).await.unwrap();
        assert_eq!(outcome, CycleOutcome::Counted(i));
        assert_eq!(summarizer.get_counter(), i);
        assert!(summarizer.load(None).unwrap().is_empty());
    }
    assert_eq!(llm.calls(), 0);

    save_round(&store, 4);
    let outcome = summarizer.run_cycle("question 4", &store).await.unwrap();
    let CycleOutcome::Summarized(record) = outcome else {
        panic!("round after the counter reached the cycle should summarize");
    };
    assert_eq!(record.summary, "Three questions were asked and answered.");
    assert_eq!(summarizer.get_counter(), 0);
    assert_eq!(summarizer.load(None).unwrap(), vec![record]);
    assert_eq!(summarizer.index().len().unwrap(), 1);
}

#[tokio::test]
async fn counter_one_below_cycle_only_counts() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = store(tmp.path());
    let llm = ScriptedLlm::replying(&["unused"]);
    let summarizer = summarizer(tmp.path(), llm.clone(), 2);
    save_round(&store, 0);
    summarizer.increment_counter().unwrap();

    let outcome = summarizer.run_cycle("question 0", &store).await.unwrap();
    assert_eq!(outcome, CycleOutcome::Counted(2));
    assert_eq!(summarizer.get_counter(), 2);
    assert_eq!(llm.calls(), 0);
    assert!(summarizer.load(None).unwrap().is_empty());
}

#[tokio::test]
async fn counter_past_a_shortened_cycle_still_summarizes() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = store(tmp.path());
    let summarizer = summarizer(tmp.path(), ScriptedLlm::replying(&["caught up"]), 2);
    save_round(&store, 0);
    write_json(&tmp.path().join(COUNTER_FILE), &CounterState { count: 5 }).unwrap();

    let outcome = summarizer.run_cycle("question 0", &store).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Summarized(_)));
    assert_eq!(summarizer.get_counter(), 0);
}

#[tokio::test]
async fn summary_request_carries_instruction_and_recent_turns() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = store(tmp.path());
    let llm = ScriptedLlm::replying(&["summary"]);
    let summarizer = summarizer(tmp.path(), llm.clone(), 2);

    for i in 0..3 {
        save_round(&store, i);
    }
    summarizer.increment_counter().unwrap();
    summarizer.increment_counter().unwrap();
    summarizer.run_cycle("question 2", &store).await.unwrap();

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0].messages;
    assert!(matches!(
        &messages[0],
        Entry::Message { role: Role::System, content } if content.contains("3 to 5 sentences")
    ));
    let Entry::Message { content: transcript, .. } = &messages[1] else {
        panic!("expected the transcript as a user message");
    };
    // only the last cycle_length turns
    assert!(!transcript.contains("question 0"));
    assert!(transcript.contains("User: question 1"));
    assert!(transcript.contains("Assistant: answer 2"));
}

#[tokio::test]
async fn failed_summary_keeps_counter_for_retry() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = store(tmp.path());
    let llm = ScriptedLlm::new(vec![
        Err(LlmError::Api {
            status: 503,
            body: "overloaded".into(),
        }),
        Ok(recollect::llm::CompletionResponse::text("recovered summary")),
    ]);
    let summarizer = summarizer(tmp.path(), llm, 1);
    save_round(&store, 0);

    assert_eq!(
        summarizer.run_cycle("question 0", &store).await.unwrap(),
        CycleOutcome::Counted(1)
    );

    assert!(summarizer.run_cycle("question 0", &store).await.is_err());
    assert_eq!(summarizer.get_counter(), 1);
    assert!(summarizer.load(None).unwrap().is_empty());

    let outcome = summarizer.run_cycle("question 0", &store).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Summarized(_)));
    assert_eq!(summarizer.get_counter(), 0);
}

#[tokio::test]
async fn summaries_are_keyed_by_triggering_prompt() {
    let tmp = tempfile::TempDir::new().unwrap();
    let summarizer = summarizer(tmp.path(), ScriptedLlm::replying(&["kittens summary"]), 2);
    let record = summarizer
        .create_summary("tell me about kittens", "User: tell me about kittens")
        .await
        .unwrap();

    let hits = summarizer.search("kittens", 3, 0.3).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.summary_id, record.summary_id);
    assert!(hits[0].score.unwrap() > 0.3);
}
