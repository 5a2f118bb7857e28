//! Extraction goals handed to the agent.

use guidecraft_shared::SourceCategory;

const SCHEMA_HINT: &str = r#"Return ONLY a JSON object with these fields:
{
  "overview": "2-4 sentence summary",
  "coreConcepts": ["concept", ...],
  "apis": [{"name": "", "description": "", "signature": ""}],
  "examples": [{"title": "", "language": "", "code": "", "explanation": ""}],
  "commonIssues": [{"issue": "", "fix": ""}],
  "bestPractices": ["practice", ...],
  "resources": [{"title": "", "url": "", "note": ""}],
  "rawText": "the most relevant page text, condensed"
}
Use empty arrays for anything the page does not cover. Do not invent content."#;

/// Build the instruction for scraping one source about `topic`.
pub fn build_goal(topic: &str, category: SourceCategory) -> String {
    let focus = match category {
        SourceCategory::Documentation => format!(
            "This is official or reference documentation for {topic}. Read the main content, \
             follow at most one link to a getting-started or API reference page, and capture \
             the key concepts, API names with signatures, and runnable examples."
        ),
        SourceCategory::CodeHost => format!(
            "This is a code repository or code-host page related to {topic}. Read the README \
             and, if present, open one issue or discussion page. Capture usage examples, \
             configuration snippets, and frequently reported problems with their fixes."
        ),
        SourceCategory::QAndA => format!(
            "This is a Q&A page about {topic}. Read the question and the highest voted or \
             accepted answers. Capture each problem as an issue with its fix, plus any code \
             that demonstrates the solution."
        ),
        SourceCategory::Blog => format!(
            "This is a tutorial or blog post about {topic}. Read the article body, skipping \
             navigation and comments. Capture the step-by-step examples, best practices, and \
             pitfalls the author warns about."
        ),
    };
    format!("{focus}\n\n{SCHEMA_HINT}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_names_topic_and_schema() {
        for category in SourceCategory::ALL {
            let goal = build_goal("Docker", category);
            assert!(goal.contains("Docker"), "{category}: {goal}");
            assert!(goal.contains("\"coreConcepts\""));
            assert!(goal.contains("\"rawText\""));
        }
    }

    #[test]
    fn goal_wording_differs_per_category() {
        let docs = build_goal("Rust", SourceCategory::Documentation);
        let qa = build_goal("Rust", SourceCategory::QAndA);
        assert_ne!(docs, qa);
        assert!(qa.contains("accepted answers"));
    }
}
