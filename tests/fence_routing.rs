use std::time::Instant;

use mdrich::{
    ChartOutcome, ChartTag, Collaborators, DEFAULT_PLANTUML_SERVER, DiagramKind, FenceBlock,
    FenceError, FenceOutput, FenceRoute, InitGuard, Options, StreamingGate, Theme, render_fence,
    route_fence,
};

mod support;

use support::{FakeSanitizer, RecordingRenderer};

fn render(
    language: Option<&str>,
    code: &str,
    options: &Options,
    sanitizer: &FakeSanitizer,
    renderer: &RecordingRenderer,
    init: &InitGuard,
) -> Result<FenceOutput, FenceError> {
    let collaborators = Collaborators {
        sanitizer,
        diagrams: renderer,
        init,
    };
    let mut gate = StreamingGate::new();
    render_fence(
        FenceBlock { language, code },
        options,
        &collaborators,
        &mut gate,
        Instant::now(),
    )
}

#[test]
fn routes_by_language() {
    let options = Options::default();
    assert_eq!(route_fence(Some("chart-json"), &options), FenceRoute::Chart(ChartTag::ChartJson));
    assert_eq!(route_fence(Some("Chart"), &options), FenceRoute::Chart(ChartTag::Chart));
    assert_eq!(route_fence(Some("Mermaid"), &options), FenceRoute::Mermaid);
    assert_eq!(route_fence(Some("puml"), &options), FenceRoute::PlantUml);
    assert_eq!(route_fence(Some("svg"), &options), FenceRoute::Svg);
    assert_eq!(route_fence(Some("abc"), &options), FenceRoute::Music);
    assert_eq!(
        route_fence(Some("rust"), &options),
        FenceRoute::Highlighted {
            language: "rust".to_string(),
            theme: Theme::Dark
        }
    );
    assert_eq!(route_fence(None, &options), FenceRoute::Plain);
    assert_eq!(route_fence(Some("  "), &options), FenceRoute::Plain);
}

#[test]
fn disabled_features_fall_through_to_highlighting() {
    let options = Options {
        graphs: false,
        charts: false,
        ..Options::default()
    };
    assert_eq!(
        route_fence(Some("mermaid"), &options),
        FenceRoute::Highlighted {
            language: "mermaid".to_string(),
            theme: Theme::Dark
        }
    );
    assert!(matches!(
        route_fence(Some("chart"), &options),
        FenceRoute::Highlighted { .. }
    ));

    let bare = Options {
        syntax_highlighting: false,
        ..options
    };
    assert_eq!(route_fence(Some("mermaid"), &bare), FenceRoute::Plain);
}

#[test]
fn mermaid_engine_is_initialized_once() {
    let options = Options::default();
    let sanitizer = FakeSanitizer::default();
    let renderer = RecordingRenderer::default();
    let init = InitGuard::new();

    for _ in 0..2 {
        let out = render(Some("mermaid"), "graph TD\nA-->B\n", &options, &sanitizer, &renderer, &init)
            .unwrap();
        assert_eq!(
            out,
            FenceOutput::Diagram {
                kind: DiagramKind::Mermaid,
                image: "img:mermaid:14".to_string()
            }
        );
    }
    assert_eq!(renderer.init_calls.get(), 1);
    assert!(init.is_initialized());
    assert_eq!(renderer.requests.borrow().len(), 2);
}

#[test]
fn init_guard_reports_first_run() {
    let guard = InitGuard::new();
    assert!(guard.ensure_initialized(|| {}));
    assert!(!guard.ensure_initialized(|| panic!("ran twice")));
}

#[test]
fn plantuml_needs_start_and_end_tags() {
    let options = Options::default();
    let sanitizer = FakeSanitizer::default();
    let renderer = RecordingRenderer::default();
    let init = InitGuard::new();

    let err = render(Some("plantuml"), "A -> B", &options, &sanitizer, &renderer, &init).unwrap_err();
    assert!(matches!(err, FenceError::MissingPlantUmlStart));

    let err = render(Some("plantuml"), "@startuml\nA -> B", &options, &sanitizer, &renderer, &init)
        .unwrap_err();
    assert!(matches!(err, FenceError::MissingPlantUmlEnd));

    render(Some("plantuml"), "@StartUML\nA -> B\n@enduml", &options, &sanitizer, &renderer, &init)
        .unwrap();
    let requests = renderer.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, DiagramKind::PlantUml);
    assert_eq!(requests[0].1.as_deref(), Some(DEFAULT_PLANTUML_SERVER));
}

#[test]
fn plantuml_server_can_be_overridden() {
    let options = Options {
        plantuml_server_url: Some("https://uml.example.test".to_string()),
        theme: Theme::Light,
        ..Options::default()
    };
    let renderer = RecordingRenderer::default();
    render(
        Some("puml"),
        "@startmindmap\n* root\n@endmindmap",
        &options,
        &FakeSanitizer::default(),
        &renderer,
        &InitGuard::new(),
    )
    .unwrap();
    let requests = renderer.requests.borrow();
    assert_eq!(requests[0].1.as_deref(), Some("https://uml.example.test"));
    assert_eq!(requests[0].2, Theme::Light);
}

#[test]
fn music_needs_abc_headers() {
    let options = Options::default();
    let sanitizer = FakeSanitizer::default();
    let renderer = RecordingRenderer::default();
    let init = InitGuard::new();

    let err = render(Some("abc"), "CDEF GABc", &options, &sanitizer, &renderer, &init).unwrap_err();
    assert!(matches!(err, FenceError::MissingAbcHeaders));

    let out = render(Some("music"), "X:1\nT:Scale\nK:C\nCDEF GABc", &options, &sanitizer, &renderer, &init)
        .unwrap();
    assert!(matches!(out, FenceOutput::Diagram { kind: DiagramKind::Music, .. }));
}

#[test]
fn renderer_failures_name_the_engine() {
    let renderer = RecordingRenderer {
        fail_with: Some("syntax error".to_string()),
        ..RecordingRenderer::default()
    };
    let err = render(
        Some("mermaid"),
        "graph",
        &Options::default(),
        &FakeSanitizer::default(),
        &renderer,
        &InitGuard::new(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "mermaid renderer failed: syntax error");
}

#[test]
fn svg_is_sanitized_and_empty_results_are_errors() {
    let options = Options::default();
    let renderer = RecordingRenderer::default();
    let init = InitGuard::new();

    let out = render(
        Some("svg"),
        "<svg><script>x()</script></svg>",
        &options,
        &FakeSanitizer::default(),
        &renderer,
        &init,
    )
    .unwrap();
    assert_eq!(out, FenceOutput::Svg("<svg>x()</svg>".to_string()));

    let reject = FakeSanitizer { reject_all: true };
    let err = render(Some("svg"), "<svg/>", &options, &reject, &renderer, &init).unwrap_err();
    assert!(matches!(err, FenceError::EmptySvg));
}

#[test]
fn code_loses_one_trailing_newline() {
    let options = Options::default();
    let out = render(
        Some("rust"),
        "fn main() {}\n\n",
        &options,
        &FakeSanitizer::default(),
        &RecordingRenderer::default(),
        &InitGuard::new(),
    )
    .unwrap();
    assert_eq!(
        out,
        FenceOutput::Highlighted {
            language: "rust".to_string(),
            theme: Theme::Dark,
            code: "fn main() {}\n".to_string()
        }
    );

    let out = render(
        None,
        "plain\n",
        &options,
        &FakeSanitizer::default(),
        &RecordingRenderer::default(),
        &InitGuard::new(),
    )
    .unwrap();
    assert_eq!(out, FenceOutput::Plain("plain".to_string()));
}

#[test]
fn chart_blocks_go_through_the_gate() {
    let out = render(
        Some("chart"),
        "type: bar\ndata: [1, 2]\n",
        &Options::default(),
        &FakeSanitizer::default(),
        &RecordingRenderer::default(),
        &InitGuard::new(),
    )
    .unwrap();
    match out {
        FenceOutput::Chart(ChartOutcome::Ready(config)) => assert_eq!(config.data.len(), 2),
        other => panic!("expected a ready chart, got {other:?}"),
    }
}

#[test]
fn options_deserialize_with_defaults() {
    let options: Options = serde_json::from_str(
        r#"{"mermaid": false, "theme": "light", "plantumlServerUrl": "https://uml.example.test"}"#,
    )
    .unwrap();
    assert!(!options.mermaid);
    assert!(options.math && options.charts && options.syntax_highlighting);
    assert_eq!(options.theme, Theme::Light);
    assert_eq!(options.plantuml_server(), "https://uml.example.test");
    assert_eq!(Options::default().plantuml_server(), DEFAULT_PLANTUML_SERVER);
}
