use std::time::{Duration, Instant};

use mdrich::pending::{GateOptions, DEFAULT_MAX_WAIT};
use mdrich::{ChartOutcome, StreamDecision, StreamingGate, evaluate_chart, looks_incomplete};

mod support;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn table_without_rows_is_incomplete() {
    assert!(looks_incomplete("| Month | Revenue |\n|---|---|"));
    assert!(!looks_incomplete("| Month | Revenue |\n|---|---|\n| Jan | 1200 |"));
}

#[test]
fn table_header_without_separator_is_incomplete() {
    assert!(looks_incomplete("| Month | Rev"));
}

#[test]
fn short_last_row_is_incomplete() {
    let text = "| a | b | c |\n|---|---|---|\n| 1 | 2 | 3 |\n| 4 |";
    assert!(looks_incomplete(text));
    assert!(!looks_incomplete("| a | b | c |\n|---|---|---|\n| 1 | 2 | 3 |\n| 4 | 5 |"));
}

#[test]
fn unbalanced_brackets_and_bare_keys() {
    assert!(looks_incomplete("{\"data\": [1, 2"));
    assert!(looks_incomplete("type: bar\ndata:"));
    assert!(!looks_incomplete("type: bar\ntitle: Sales"));
    assert!(!looks_incomplete(""));
}

#[test]
fn gate_waits_then_settles() {
    let t0 = Instant::now();
    let mut gate = StreamingGate::new();

    assert_eq!(gate.observe("data: [1", t0), StreamDecision::Waiting);
    assert_eq!(gate.observe("data: [1, 2", t0 + ms(50)), StreamDecision::RapidUpdate);
    assert_eq!(gate.observe("data: [1, 2", t0 + ms(100)), StreamDecision::Waiting);
    assert_eq!(gate.observe("data: [1, 2", t0 + ms(450)), StreamDecision::Complete);
}

#[test]
fn gate_gives_up_after_max_wait() {
    let t0 = Instant::now();
    let mut gate = StreamingGate::new();
    let mut last = StreamDecision::Waiting;
    for i in 0..=50u32 {
        let text = format!("data: [{}", "1,".repeat(i as usize));
        last = gate.observe(&text, t0 + ms(100) * i);
        if i > 0 && i < 50 {
            assert_eq!(last, StreamDecision::RapidUpdate, "step {i}");
        }
    }
    assert_eq!(ms(100) * 50, DEFAULT_MAX_WAIT);
    assert_eq!(last, StreamDecision::Complete);
}

#[test]
fn complete_looking_text_is_complete_immediately() {
    let mut gate = StreamingGate::new();
    assert_eq!(
        gate.observe("type: bar\ndata: [1]", Instant::now()),
        StreamDecision::Complete
    );
}

#[test]
fn reset_forgets_history() {
    let t0 = Instant::now();
    let mut gate = StreamingGate::with_options(GateOptions {
        stable_for: ms(100),
        ..GateOptions::default()
    });
    gate.observe("data: [1", t0);
    gate.observe("data: [1", t0 + ms(20));
    gate.reset();
    assert_eq!(gate.options().stable_for, ms(100));
    assert_eq!(gate.observe("data: [1", t0 + ms(120)), StreamDecision::Waiting);
    assert_eq!(gate.observe("data: [1", t0 + ms(220)), StreamDecision::Complete);
}

#[test]
fn truncated_json_is_pending_until_it_settles() {
    let t0 = Instant::now();
    let mut gate = StreamingGate::new();
    let text = r#"{"type": "bar", "data": [{"a": 1}"#;

    assert_eq!(evaluate_chart(text, "chart-json", &mut gate, t0), ChartOutcome::Pending);
    assert_eq!(
        evaluate_chart(text, "chart-json", &mut gate, t0 + ms(400)),
        ChartOutcome::Failed {
            reason: "Failed to parse chart configuration".to_string()
        }
    );
}

#[test]
fn finished_but_invalid_block_fails_at_once() {
    let mut gate = StreamingGate::new();
    let outcome = evaluate_chart(
        "| a | b |\n|---|---|\n| 1 | 2 |",
        "chart",
        &mut gate,
        Instant::now(),
    );
    assert_eq!(
        outcome,
        ChartOutcome::Failed {
            reason: "Chart type is required (bar, line, pie, area, scatter, composed)".to_string()
        }
    );
}

#[test]
fn json_prefixes_never_fail_while_streaming() {
    let full = r#"{"type": "bar", "data": [{"m": "Jan", "v": 1}, {"m": "Feb", "v": 2}]}"#;
    let t0 = Instant::now();
    let mut gate = StreamingGate::new();

    for (i, prefix) in support::prefixes(full).into_iter().enumerate() {
        let now = t0 + ms(10) * i as u32;
        let outcome = evaluate_chart(prefix, "chart-json", &mut gate, now);
        assert_eq!(outcome, ChartOutcome::Pending, "prefix {prefix:?}");
    }

    let done = t0 + ms(10) * full.len() as u32;
    match evaluate_chart(full, "chart-json", &mut gate, done) {
        ChartOutcome::Ready(config) => assert_eq!(config.data.len(), 2),
        other => panic!("expected a ready chart, got {other:?}"),
    }
}
