//! Routing fenced blocks to the collaborator that renders them.

use std::time::Instant;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tracing::debug;

use crate::chart::is_chart_tag;
use crate::error::{FenceError, FenceResult};
use crate::options::{Options, Theme};
use crate::pending::{ChartOutcome, StreamingGate, evaluate_chart};

static PLANTUML_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)@start\w+").unwrap());
static PLANTUML_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)@end\w+").unwrap());
static ABC_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[XMTLK]:").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTag {
    Chart,
    ChartJson,
    ChartTable,
}

impl ChartTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartTag::Chart => "chart",
            ChartTag::ChartJson => "chart-json",
            ChartTag::ChartTable => "chart-table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceRoute {
    Chart(ChartTag),
    Mermaid,
    PlantUml,
    Svg,
    Music,
    Highlighted { language: String, theme: Theme },
    Plain,
}

/// Decides how a fenced block with the given info-string language is rendered.
pub fn route_fence(language: Option<&str>, options: &Options) -> FenceRoute {
    let Some(lang) = language.map(str::trim).filter(|l| !l.is_empty()) else {
        return FenceRoute::Plain;
    };
    let l = lang.to_ascii_lowercase();

    if options.charts && is_chart_tag(&l) {
        let tag = match l.as_str() {
            "chart-json" => ChartTag::ChartJson,
            "chart-table" => ChartTag::ChartTable,
            _ => ChartTag::Chart,
        };
        return FenceRoute::Chart(tag);
    }
    if options.graphs {
        match l.as_str() {
            "mermaid" if options.mermaid => return FenceRoute::Mermaid,
            "plantuml" | "puml" if options.plantuml => return FenceRoute::PlantUml,
            "svg" if options.svg => return FenceRoute::Svg,
            _ => {}
        }
    }
    if options.music && matches!(l.as_str(), "abc" | "music") {
        return FenceRoute::Music;
    }
    if options.syntax_highlighting {
        return FenceRoute::Highlighted {
            language: l,
            theme: options.theme,
        };
    }
    FenceRoute::Plain
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    Mermaid,
    PlantUml,
    Music,
}

impl DiagramKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagramKind::Mermaid => "mermaid",
            DiagramKind::PlantUml => "plantuml",
            DiagramKind::Music => "music",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramRequest<'a> {
    pub kind: DiagramKind,
    pub source: &'a str,
    pub theme: Theme,
    /// Base URL of the diagram server, for kinds rendered remotely.
    pub server_url: Option<&'a str>,
}

/// Makes untrusted markup safe to embed.
pub trait Sanitizer {
    fn sanitize(&self, html: &str) -> String;
}

/// Turns diagram source into something displayable (an image URL, inline SVG, ...).
pub trait DiagramRenderer {
    /// One-time engine setup; run at most once per [`InitGuard`].
    fn initialize(&self, _theme: Theme) {}

    fn render(&self, request: &DiagramRequest<'_>) -> Result<String, String>;
}

/// Process-scoped "already initialized" flag for a diagram engine.
#[derive(Debug, Default)]
pub struct InitGuard {
    cell: OnceCell<()>,
}

impl InitGuard {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Runs `init` the first time only. Returns whether it ran on this call.
    pub fn ensure_initialized(&self, init: impl FnOnce()) -> bool {
        let mut ran = false;
        self.cell.get_or_init(|| {
            init();
            ran = true;
        });
        ran
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

pub struct Collaborators<'a> {
    pub sanitizer: &'a dyn Sanitizer,
    pub diagrams: &'a dyn DiagramRenderer,
    pub init: &'a InitGuard,
}

/// One fenced block as handed over by the markdown renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceBlock<'a> {
    pub language: Option<&'a str>,
    pub code: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FenceOutput {
    Chart(ChartOutcome),
    Diagram { kind: DiagramKind, image: String },
    Svg(String),
    Highlighted {
        language: String,
        theme: Theme,
        code: String,
    },
    Plain(String),
}

/// Renders one fenced block according to [`route_fence`].
///
/// Chart blocks consult `gate` so failures are held back while the block is still streaming;
/// the caller owns the gate and resets it when the block identity changes.
pub fn render_fence(
    block: FenceBlock<'_>,
    options: &Options,
    collaborators: &Collaborators<'_>,
    gate: &mut StreamingGate,
    now: Instant,
) -> FenceResult<FenceOutput> {
    let code = block.code.strip_suffix('\n').unwrap_or(block.code);
    let route = route_fence(block.language, options);
    debug!(?route, len = code.len(), "rendering fenced block");

    match route {
        FenceRoute::Chart(tag) => Ok(FenceOutput::Chart(evaluate_chart(
            code,
            tag.as_str(),
            gate,
            now,
        ))),
        FenceRoute::Svg => {
            let safe = collaborators.sanitizer.sanitize(code);
            if safe.trim().is_empty() {
                return Err(FenceError::EmptySvg);
            }
            Ok(FenceOutput::Svg(safe))
        }
        FenceRoute::Mermaid => {
            collaborators
                .init
                .ensure_initialized(|| collaborators.diagrams.initialize(options.theme));
            render_diagram(DiagramKind::Mermaid, code, options, collaborators, None)
        }
        FenceRoute::PlantUml => {
            let source = code.trim();
            if !PLANTUML_START.is_match(source) {
                return Err(FenceError::MissingPlantUmlStart);
            }
            if !PLANTUML_END.is_match(source) {
                return Err(FenceError::MissingPlantUmlEnd);
            }
            let server = options.plantuml_server();
            render_diagram(DiagramKind::PlantUml, code, options, collaborators, Some(server))
        }
        FenceRoute::Music => {
            if !ABC_HEADER.is_match(code.trim()) {
                return Err(FenceError::MissingAbcHeaders);
            }
            render_diagram(DiagramKind::Music, code, options, collaborators, None)
        }
        FenceRoute::Highlighted { language, theme } => Ok(FenceOutput::Highlighted {
            language,
            theme,
            code: code.to_string(),
        }),
        FenceRoute::Plain => Ok(FenceOutput::Plain(code.to_string())),
    }
}

fn render_diagram(
    kind: DiagramKind,
    source: &str,
    options: &Options,
    collaborators: &Collaborators<'_>,
    server_url: Option<&str>,
) -> FenceResult<FenceOutput> {
    let request = DiagramRequest {
        kind,
        source,
        theme: options.theme,
        server_url,
    };
    collaborators
        .diagrams
        .render(&request)
        .map(|image| FenceOutput::Diagram { kind, image })
        .map_err(|message| FenceError::Renderer {
            kind: kind.as_str(),
            message,
        })
}
