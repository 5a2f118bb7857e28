//! Merge successful extractions into a markdown guide.
//!
//! The output is a fixed sequence of sections. Every list is de-duplicated
//! and capped so the guide stays bounded no matter how many sources succeed.

use chrono::{DateTime, Utc};

use guidecraft_extraction::NO_OVERVIEW;
use guidecraft_shared::{
    ApiReference, CommonIssue, PracticalExample, ResourceLink, ScrapeSuccess, dedup_by_key,
    dedup_strings,
};

const MAX_OVERVIEWS: usize = 4;
const MAX_CONCEPTS: usize = 14;
const MAX_APIS: usize = 14;
const MAX_PRACTICES: usize = 10;
const MAX_EXAMPLES: usize = 8;
const MAX_ISSUES: usize = 12;
const MAX_RESOURCES: usize = 40;

const NO_RELIABLE_OVERVIEW: &str =
    "No reliable overview could be assembled from the scraped sources.";
const NO_CONCEPTS: &str = "The sources did not name any distinct core concepts.";
const NO_EXPLANATION: &str = "No explanation was provided for this example.";
const NO_EXAMPLES: &str =
    "No code examples were extracted. See the resources below for hands-on material.";
const NO_ISSUES: &str =
    "No common issues were reported. Check the Q&A resources below when troubleshooting.";
const NO_FIX: &str = "No fix was documented.";
const NO_RESOURCES: &str = "No resources were collected.";

/// The synthesized guide as ordered, independently renderable sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideBuildResult {
    pub sections: Vec<String>,
}

impl GuideBuildResult {
    /// Full guide text, trimmed.
    pub fn guide(&self) -> String {
        self.sections.join("\n\n").trim().to_string()
    }

    /// Sections with separators attached; concatenation equals [`Self::guide`].
    pub fn chunks(&self) -> Vec<String> {
        let last = self.sections.len().saturating_sub(1);
        self.sections
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let mut chunk = section.clone();
                if i == 0 {
                    chunk = chunk.trim_start().to_string();
                }
                if i == last {
                    chunk = chunk.trim_end().to_string();
                } else {
                    chunk.push_str("\n\n");
                }
                chunk
            })
            .collect()
    }
}

/// Build the guide for `topic` from successful scrapes, in source order.
///
/// Deterministic for a fixed input and `generated_at`.
pub fn synthesize(
    topic: &str,
    successes: &[ScrapeSuccess],
    generated_at: DateTime<Utc>,
) -> GuideBuildResult {
    let sections = vec![
        header(topic, successes.len(), generated_at),
        overview(successes),
        concepts(successes),
        examples(successes),
        issues(successes),
        resources(successes),
    ];
    GuideBuildResult {
        sections: sections
            .into_iter()
            .map(|s| s.trim_end().to_string())
            .collect(),
    }
}

fn header(topic: &str, count: usize, generated_at: DateTime<Utc>) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!(
        "# {topic}: Technical Guide\n\n\
         > Generated {} from {count} successfully scraped source{plural}.",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

fn overview(successes: &[ScrapeSuccess]) -> String {
    let overviews = dedup_strings(
        successes
            .iter()
            .map(|s| s.extracted.overview.clone())
            .filter(|o| o != NO_OVERVIEW),
        MAX_OVERVIEWS,
    );

    let mut out = String::from("## Overview\n\n");
    if overviews.is_empty() {
        out.push_str(NO_RELIABLE_OVERVIEW);
    } else {
        out.push_str(&bullets(&overviews));
    }
    out
}

fn concepts(successes: &[ScrapeSuccess]) -> String {
    let concepts = dedup_strings(
        successes
            .iter()
            .flat_map(|s| s.extracted.core_concepts.iter().cloned()),
        MAX_CONCEPTS,
    );
    let apis: Vec<(&ApiReference, &str)> = dedup_by_key(
        successes.iter().flat_map(|s| {
            s.extracted
                .apis
                .iter()
                .map(move |api| (api, s.source.title.as_str()))
        }),
        MAX_APIS,
        |(api, _): &(&ApiReference, &str)| api.name.to_lowercase(),
    );
    let practices = dedup_strings(
        successes
            .iter()
            .flat_map(|s| s.extracted.best_practices.iter().cloned()),
        MAX_PRACTICES,
    );

    let mut out = String::from("## Core Concepts\n\n");
    if concepts.is_empty() {
        out.push_str(NO_CONCEPTS);
    } else {
        out.push_str(&bullets(&concepts));
    }

    if !apis.is_empty() {
        out.push_str("\n\n### API Reference\n\n");
        out.push_str("| Name | Description | Signature |\n");
        out.push_str("| --- | --- | --- |");
        for (api, source_title) in &apis {
            let description = if api.description.is_empty() {
                format!("*({source_title})*")
            } else {
                format!("{} *({source_title})*", api.description)
            };
            let signature = match &api.signature {
                Some(sig) => format!("`{}`", table_cell(sig)),
                None => "n/a".to_string(),
            };
            out.push_str(&format!(
                "\n| `{}` | {} | {} |",
                table_cell(&api.name),
                table_cell(&description),
                signature
            ));
        }
    }

    if !practices.is_empty() {
        out.push_str("\n\n### Best Practices\n\n");
        out.push_str(&bullets(&practices));
    }
    out
}

fn examples(successes: &[ScrapeSuccess]) -> String {
    let examples: Vec<(&PracticalExample, &ScrapeSuccess)> = successes
        .iter()
        .flat_map(|s| s.extracted.examples.iter().map(move |ex| (ex, s)))
        .take(MAX_EXAMPLES)
        .collect();

    let mut out = String::from("## Practical Examples");
    if examples.is_empty() {
        out.push_str("\n\n");
        out.push_str(NO_EXAMPLES);
        return out;
    }

    for (example, success) in examples {
        let fence = fence_for(&example.code);
        let language = example.language.as_deref().unwrap_or("text");
        out.push_str(&format!(
            "\n\n### {}\n\n{fence}{language}\n{}\n{fence}\n\n{}\n\n_Source: [{}]({})_",
            heading(&example.title),
            example.code.trim_end(),
            example.explanation.as_deref().unwrap_or(NO_EXPLANATION),
            success.source.title,
            success.source.url,
        ));
    }
    out
}

fn issues(successes: &[ScrapeSuccess]) -> String {
    let issues: Vec<&CommonIssue> = dedup_by_key(
        successes.iter().flat_map(|s| s.extracted.common_issues.iter()),
        MAX_ISSUES,
        |issue: &&CommonIssue| issue.issue.to_lowercase(),
    );

    let mut out = String::from("## Common Gotchas\n\n");
    if issues.is_empty() {
        out.push_str(NO_ISSUES);
        return out;
    }
    let lines: Vec<String> = issues
        .iter()
        .map(|i| {
            format!(
                "- **{}**\n  - Fix: {}",
                single_line(&i.issue),
                i.fix.as_deref().unwrap_or(NO_FIX)
            )
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

fn resources(successes: &[ScrapeSuccess]) -> String {
    let links: Vec<&ResourceLink> = dedup_by_key(
        successes.iter().flat_map(|s| s.extracted.resources.iter()),
        MAX_RESOURCES,
        |link: &&ResourceLink| link.url.to_lowercase(),
    );

    let mut out = String::from("## Resources\n\n");
    if links.is_empty() {
        out.push_str(NO_RESOURCES);
        return out;
    }
    let lines: Vec<String> = links
        .iter()
        .map(|link| match &link.note {
            Some(note) => format!("- [{}]({}) - {note}", link.title, link.url),
            None => format!("- [{}]({})", link.title, link.url),
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep a table row on one line and its column count intact.
fn table_cell(text: &str) -> String {
    single_line(text).replace('|', "\\|")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Heading text that cannot spill past its own line.
fn heading(title: &str) -> String {
    let title = single_line(title);
    if title.is_empty() {
        "Example".to_string()
    } else {
        title
    }
}

/// A backtick fence longer than any run inside the code.
fn fence_for(code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}
