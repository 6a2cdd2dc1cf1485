use serde::{Deserialize, Serialize};

pub const DEFAULT_PLANTUML_SERVER: &str = "https://www.plantuml.com/plantuml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    /// Resolved by the host (for example from the surrounding document's color scheme).
    Auto,
}

/// Which fenced-block kinds get rich treatment, and how.
///
/// Every toggle defaults to enabled. Missing fields in serialized form take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub math: bool,
    /// Master switch for mermaid, PlantUML and SVG blocks.
    pub graphs: bool,
    pub mermaid: bool,
    pub plantuml: bool,
    pub svg: bool,
    pub charts: bool,
    pub music: bool,
    pub syntax_highlighting: bool,
    pub plantuml_server_url: Option<String>,
    pub theme: Theme,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            math: true,
            graphs: true,
            mermaid: true,
            plantuml: true,
            svg: true,
            charts: true,
            music: true,
            syntax_highlighting: true,
            plantuml_server_url: None,
            theme: Theme::default(),
        }
    }
}

impl Options {
    pub fn plantuml_server(&self) -> &str {
        self.plantuml_server_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_PLANTUML_SERVER)
    }
}
