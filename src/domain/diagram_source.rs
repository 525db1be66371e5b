use std::fmt;

use serde::Serialize;

use super::GenerationError;

/// Mermaid diagram types accepted from model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    Graph,
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelationship,
    Gantt,
    Pie,
    GitGraph,
    Mindmap,
    Timeline,
    QuadrantChart,
    ZenUml,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 13] = [
        Self::Graph,
        Self::Flowchart,
        Self::Sequence,
        Self::Class,
        Self::State,
        Self::EntityRelationship,
        Self::Gantt,
        Self::Pie,
        Self::GitGraph,
        Self::Mindmap,
        Self::Timeline,
        Self::QuadrantChart,
        Self::ZenUml,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequenceDiagram",
            Self::Class => "classDiagram",
            Self::State => "stateDiagram",
            Self::EntityRelationship => "erDiagram",
            Self::Gantt => "gantt",
            Self::Pie => "pie",
            Self::GitGraph => "gitGraph",
            Self::Mindmap => "mindmap",
            Self::Timeline => "timeline",
            Self::QuadrantChart => "quadrantChart",
            Self::ZenUml => "zenuml",
        }
    }

    /// Returns the kind whose keyword `text` starts with. Matching is case-sensitive,
    /// the same way the renderer treats diagram headers.
    pub fn detect(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| text.starts_with(kind.keyword()))
    }
}

/// Diagram text that passed the keyword check and can go straight to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramSource {
    kind: DiagramKind,
    text: String,
}

impl DiagramSource {
    pub fn validate(text: impl Into<String>) -> Result<Self, GenerationError> {
        let text = text.into();
        let kind = DiagramKind::detect(&text).ok_or(GenerationError::InvalidDiagramFormat)?;
        Ok(Self { kind, text })
    }

    pub(crate) fn from_parts(kind: DiagramKind, text: String) -> Self {
        debug_assert!(text.starts_with(kind.keyword()));
        Self { kind, text }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for DiagramSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagramKind, DiagramSource};
    use crate::domain::GenerationError;

    #[test]
    fn validate_accepts_every_recognized_keyword() {
        for kind in DiagramKind::ALL {
            let text = format!("{}\n  A --> B", kind.keyword());
            let source = DiagramSource::validate(text.clone())
                .unwrap_or_else(|error| panic!("{} should validate: {error}", kind.keyword()));

            assert_eq!(source.kind(), kind);
            assert_eq!(source.as_str(), text);
        }
    }

    #[test]
    fn validate_accepts_versioned_state_diagram_header() {
        let source = DiagramSource::validate("stateDiagram-v2\n  [*] --> Idle")
            .expect("stateDiagram-v2 should validate");

        assert_eq!(source.kind(), DiagramKind::State);
    }

    #[test]
    fn validate_rejects_prose_and_wrong_case() {
        assert_eq!(
            DiagramSource::validate("Here is your diagram:\ngraph TD"),
            Err(GenerationError::InvalidDiagramFormat)
        );
        assert_eq!(
            DiagramSource::validate("ClassDiagram\n  class Foo"),
            Err(GenerationError::InvalidDiagramFormat)
        );
        assert_eq!(
            DiagramSource::validate(""),
            Err(GenerationError::InvalidDiagramFormat)
        );
    }

    #[test]
    fn detect_matches_versioned_headers_by_prefix() {
        assert_eq!(DiagramKind::detect("stateDiagram-v2"), Some(DiagramKind::State));
        assert_eq!(DiagramKind::detect("classDiagram-v2"), Some(DiagramKind::Class));
        assert_eq!(DiagramKind::detect("mermaid"), None);
    }
}
