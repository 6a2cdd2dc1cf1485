#![cfg(feature = "pulldown")]

use mdrich::Options;
use mdrich::adapters::pulldown::{PulldownAdapterOptions, fenced_blocks, parse_events};
use pulldown_cmark::{Event, Options as PulldownOptions};

mod support;

fn paragraph_text(events: &[Event<'_>]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Text(t) => Some(&**t),
            _ => None,
        })
        .collect()
}

#[test]
fn currency_is_text_and_math_is_math() {
    let events = parse_events("Costs $5 and $x$ here.", &PulldownAdapterOptions::default());
    assert!(
        events
            .iter()
            .any(|e| matches!(e, Event::InlineMath(m) if &**m == "x"))
    );
    assert!(paragraph_text(&events).contains("$5"));
}

#[test]
fn fenced_blocks_keep_their_dollars() {
    let input = format!("Intro\n\n{}", support::fenced("mermaid", "A[$1] --> B"));
    let events = parse_events(&input, &PulldownAdapterOptions::default());
    let blocks = fenced_blocks(&events);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].language.as_deref(), Some("mermaid"));
    assert_eq!(blocks[0].code, "A[$1] --> B");
    assert_eq!(blocks[0].as_block().language, Some("mermaid"));
}

#[test]
fn disabling_math_skips_preprocessing() {
    let opts = PulldownAdapterOptions::from_options(&Options {
        math: false,
        ..Options::default()
    });
    assert!(opts.skip_preprocess);
    assert!(!opts.pulldown.contains(PulldownOptions::ENABLE_MATH));

    let events = parse_events("$x$", &opts);
    assert!(!events.iter().any(|e| matches!(e, Event::InlineMath(_))));
}
