const SYSTEM_PROMPT: &str = "You are a diagram expert specializing in creating Mermaid syntax diagrams.

STRICT INSTRUCTIONS:
- Respond ONLY with valid, complete Mermaid code.
- Do NOT include explanations, markdown code blocks, or any extra text.
- The response MUST start with a valid Mermaid diagram type (e.g., graph, flowchart, sequenceDiagram, classDiagram, stateDiagram, erDiagram, gantt, pie, gitGraph, mindmap, timeline, quadrantChart, zenuml).
- Do NOT wrap the code in triple backticks or any markdown.
- Ensure the diagram is clean, well-organized, and correctly formatted.
- If the prompt is ambiguous, make reasonable assumptions and generate a best-effort diagram.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
}

impl BuiltPrompt {
    /// Single-message form for providers whose request body has no system role.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.system, self.user)
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(prompt: &str) -> BuiltPrompt {
        let prompt = prompt.trim();

        BuiltPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user: format!("Create a Mermaid diagram based on this description: {prompt}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PromptBuilder;
    use crate::domain::DiagramKind;

    #[test]
    fn build_wraps_user_prompt() {
        let prompt = PromptBuilder::build("  checkout flow for a web shop \n");

        assert_eq!(
            prompt.user,
            "Create a Mermaid diagram based on this description: checkout flow for a web shop"
        );
    }

    #[test]
    fn system_prompt_lists_every_accepted_diagram_keyword() {
        let prompt = PromptBuilder::build("anything");

        for kind in DiagramKind::ALL {
            assert!(
                prompt.system.contains(kind.keyword()),
                "system prompt should mention {}",
                kind.keyword()
            );
        }
        assert!(prompt.system.contains("Do NOT wrap the code in triple backticks"));
    }

    #[test]
    fn combined_places_instructions_before_request() {
        let prompt = PromptBuilder::build("a pie chart of pets");
        let combined = prompt.combined();

        assert!(combined.starts_with("You are a diagram expert"));
        assert!(combined.ends_with("based on this description: a pie chart of pets"));
    }
}
