use crate::domain::{DiagramKind, DiagramSource};

const PROMPT_PREVIEW_CHARS: usize = 20;

const FLOWCHART: &str = "flowchart TD
    A[Start] --> B{Is it raining?}
    B -->|Yes| C[Take umbrella]
    B -->|No| D[Enjoy the sun]
    C --> E[Go outside]
    D --> E
    E --> F[End]";

const SEQUENCE: &str = "sequenceDiagram
    participant User
    participant System
    participant Database

    User->>System: Request data
    System->>Database: Query data
    Database-->>System: Return results
    System-->>User: Display results";

const CLASS: &str = "classDiagram
    class Animal {
      +name: string
      +age: int
      +makeSound(): void
    }
    class Dog {
      +breed: string
      +fetch(): void
    }
    class Cat {
      +color: string
      +climb(): void
    }
    Animal <|-- Dog
    Animal <|-- Cat";

/// Canned diagram for offline use, picked by keyword. Never touches the network.
///
/// Matching is case-insensitive and checked in order: "flowchart", "sequence",
/// "class". Anything else gets a small graph labelled with the prompt.
pub fn placeholder_diagram(prompt: &str) -> DiagramSource {
    let lowered = prompt.to_lowercase();

    if lowered.contains("flowchart") {
        DiagramSource::from_parts(DiagramKind::Flowchart, FLOWCHART.to_string())
    } else if lowered.contains("sequence") {
        DiagramSource::from_parts(DiagramKind::Sequence, SEQUENCE.to_string())
    } else if lowered.contains("class") {
        DiagramSource::from_parts(DiagramKind::Class, CLASS.to_string())
    } else {
        let preview = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect::<String>();
        DiagramSource::from_parts(
            DiagramKind::Graph,
            format!(
                "graph TD
    A[{preview}...] --> B[Generated]
    B --> C[Diagram]
    C --> D[Example]"
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::placeholder_diagram;
    use crate::domain::{DiagramKind, DiagramSource};

    #[test]
    fn flowchart_keyword_wins_over_later_keywords() {
        let diagram = placeholder_diagram("Flowchart of a class sequence");

        assert_eq!(diagram.kind(), DiagramKind::Flowchart);
        assert!(diagram.as_str().starts_with("flowchart TD"));
    }

    #[test]
    fn sequence_and_class_match_case_insensitively() {
        assert_eq!(
            placeholder_diagram("SEQUENCE of API calls").kind(),
            DiagramKind::Sequence
        );
        assert_eq!(
            placeholder_diagram("a Classroom seating plan").kind(),
            DiagramKind::Class
        );
    }

    #[test]
    fn fallback_graph_uses_first_twenty_characters() {
        let diagram = placeholder_diagram("Onboarding journey for new employees");

        assert_eq!(diagram.kind(), DiagramKind::Graph);
        assert_eq!(
            diagram.as_str(),
            "graph TD
    A[Onboarding journey f...] --> B[Generated]
    B --> C[Diagram]
    C --> D[Example]"
        );
    }

    #[test]
    fn fallback_graph_keeps_leading_whitespace_in_preview() {
        let diagram = placeholder_diagram("   Onboarding journey for new employees");

        assert!(
            diagram
                .as_str()
                .starts_with("graph TD\n    A[   Onboarding journe...]")
        );
    }

    #[test]
    fn fallback_graph_truncates_on_character_boundaries() {
        let diagram = placeholder_diagram("ダイアグラムを作成してくださいお願いしますありがとう");

        assert!(
            diagram
                .as_str()
                .starts_with("graph TD\n    A[ダイアグラムを作成してくださいお願いしま...]")
        );
    }

    #[test]
    fn every_placeholder_passes_diagram_validation() {
        for prompt in ["flowchart", "sequence", "class", "anything else"] {
            let diagram = placeholder_diagram(prompt);
            let validated =
                DiagramSource::validate(diagram.as_str()).expect("placeholder should validate");

            assert_eq!(validated, diagram);
        }
    }
}
