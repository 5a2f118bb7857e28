//! Normalization of scrape-agent payloads into [`StructuredExtraction`].
//!
//! The agent is asked to return a fixed JSON schema, but what arrives may be
//! a plain object, a fenced JSON string, free text, or something else
//! entirely. [`normalize`] accepts all of it and always produces a usable
//! record: missing fields become empty lists, alternate key names are
//! resolved through alias tables, and unparseable input falls back to a
//! text-only extraction.

mod alias;
mod entities;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use guidecraft_shared::{
    ApiReference, CommonIssue, DiscoveredSource, ResourceLink, StructuredExtraction, dedup_by_key,
    dedup_strings,
};

use crate::alias::{first_list, first_text};

/// Maximum characters kept when deriving an overview from raw text.
pub const OVERVIEW_CHARS: usize = 360;

/// Overview used when no text is available at all.
pub const NO_OVERVIEW: &str = "No overview could be extracted from this source.";

const MAX_CONCEPTS: usize = 20;
const MAX_PRACTICES: usize = 20;
const MAX_RESOURCES: usize = 20;
const MAX_APIS: usize = 20;
const MAX_ISSUES: usize = 20;
const MAX_EXAMPLES: usize = 10;

const RAW_TEXT_KEYS: &[&str] = &[
    "rawText",
    "raw_text",
    "content",
    "body",
    "markdown",
    "notes",
    "text",
];
const OVERVIEW_KEYS: &[&str] = &["overview", "summary", "intro", "introduction", "description"];
const CONCEPT_KEYS: &[&str] = &[
    "coreConcepts",
    "core_concepts",
    "concepts",
    "keyConcepts",
    "key_concepts",
];
const API_KEYS: &[&str] = &["apis", "apiReference", "api_reference", "api", "methods", "functions"];
const EXAMPLE_KEYS: &[&str] = &[
    "examples",
    "codeExamples",
    "code_examples",
    "practicalExamples",
    "snippets",
];
const ISSUE_KEYS: &[&str] = &[
    "commonIssues",
    "common_issues",
    "issues",
    "gotchas",
    "pitfalls",
    "problems",
];
const PRACTICE_KEYS: &[&str] = &[
    "bestPractices",
    "best_practices",
    "practices",
    "tips",
    "recommendations",
];
const RESOURCE_KEYS: &[&str] = &["resources", "links", "references", "sources", "furtherReading"];

/// Matches a payload wrapped in a ```json (or bare ```) fence.
static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\n?\s*```\s*$").expect("code fence regex")
});

/// Normalize whatever the agent returned into a [`StructuredExtraction`].
///
/// Never fails. The result's `resources` always contain the source's own link.
pub fn normalize(raw: &Value, source: &DiscoveredSource) -> StructuredExtraction {
    match raw {
        Value::Object(obj) => from_object(obj, raw_dump(raw), source),
        Value::String(text) => match parse_embedded_object(text) {
            Some(obj) => from_object(&obj, text.clone(), source),
            None => {
                debug!(source_id = %source.id, "payload is not a JSON object, using text path");
                text_only(text.clone(), source)
            }
        },
        Value::Null => text_only(String::new(), source),
        other => text_only(raw_dump(other), source),
    }
}

/// Parse a (possibly fenced) string into a JSON object.
fn parse_embedded_object(text: &str) -> Option<Map<String, Value>> {
    let body = strip_code_fence(text);
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Remove a surrounding ```json / ``` fence if present.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE_RE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text,
    }
}

/// Text-only extraction: overview from the text, every list empty except
/// the source's own resource link.
fn text_only(raw_text: String, source: &DiscoveredSource) -> StructuredExtraction {
    StructuredExtraction {
        overview: derive_overview(&raw_text),
        resources: vec![ResourceLink::for_source(source)],
        raw_text,
        ..Default::default()
    }
}

fn from_object(
    obj: &Map<String, Value>,
    fallback_raw: String,
    source: &DiscoveredSource,
) -> StructuredExtraction {
    let raw_text = first_text(obj, RAW_TEXT_KEYS).unwrap_or(fallback_raw);
    let overview = first_text(obj, OVERVIEW_KEYS).unwrap_or_else(|| derive_overview(&raw_text));

    let core_concepts = dedup_strings(
        first_list(obj, CONCEPT_KEYS).iter().filter_map(entities::concept),
        MAX_CONCEPTS,
    );
    let best_practices = dedup_strings(
        first_list(obj, PRACTICE_KEYS).iter().filter_map(entities::practice),
        MAX_PRACTICES,
    );
    let apis = dedup_by_key(
        first_list(obj, API_KEYS).iter().filter_map(entities::api),
        MAX_APIS,
        |a: &ApiReference| a.name.to_lowercase(),
    );
    let common_issues = dedup_by_key(
        first_list(obj, ISSUE_KEYS).iter().filter_map(entities::issue),
        MAX_ISSUES,
        |i: &CommonIssue| i.issue.to_lowercase(),
    );
    let examples = first_list(obj, EXAMPLE_KEYS)
        .iter()
        .filter_map(entities::example)
        .take(MAX_EXAMPLES)
        .collect();

    // The source's own link goes last so an explicit entry for the same URL wins.
    let resources = dedup_by_key(
        first_list(obj, RESOURCE_KEYS)
            .iter()
            .filter_map(entities::resource)
            .chain(std::iter::once(ResourceLink::for_source(source))),
        usize::MAX,
        |r: &ResourceLink| r.url.to_lowercase(),
    );
    let resources = cap_keeping_source(resources, &source.url, MAX_RESOURCES);

    StructuredExtraction {
        overview,
        core_concepts,
        apis,
        examples,
        common_issues,
        best_practices,
        resources,
        raw_text,
    }
}

/// Cap a de-duplicated resource list while guaranteeing the source's own
/// URL survives the cut.
fn cap_keeping_source(
    mut resources: Vec<ResourceLink>,
    source_url: &str,
    limit: usize,
) -> Vec<ResourceLink> {
    if resources.len() <= limit {
        return resources;
    }
    let source_key = source_url.to_lowercase();
    let own = resources
        .iter()
        .position(|r| r.url.to_lowercase() == source_key)
        .map(|idx| resources.remove(idx));
    match own {
        Some(own) => {
            resources.truncate(limit.saturating_sub(1));
            resources.push(own);
        }
        None => resources.truncate(limit),
    }
    resources
}

/// First [`OVERVIEW_CHARS`] characters of the whitespace-collapsed text.
pub fn derive_overview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return NO_OVERVIEW.to_string();
    }
    collapsed.chars().take(OVERVIEW_CHARS).collect()
}

fn raw_dump(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidecraft_shared::SourceCategory;
    use serde_json::json;

    fn source() -> DiscoveredSource {
        DiscoveredSource {
            id: "code-host-deadbeef-1".into(),
            category: SourceCategory::CodeHost,
            title: "docker/awesome-compose".into(),
            url: "https://github.com/docker/awesome-compose".into(),
            reason: "Curated Compose samples".into(),
            query: "Docker site:github.com".into(),
        }
    }

    fn has_own_link(e: &StructuredExtraction) -> bool {
        e.resources
            .iter()
            .any(|r| r.url == "https://github.com/docker/awesome-compose")
    }

    #[test]
    fn bare_prose_takes_text_path() {
        let e = normalize(&json!("Some prose with no JSON."), &source());
        assert_eq!(e.overview, "Some prose with no JSON.");
        assert!(e.core_concepts.is_empty());
        assert!(e.apis.is_empty());
        assert!(e.examples.is_empty());
        assert!(e.common_issues.is_empty());
        assert!(e.best_practices.is_empty());
        assert_eq!(e.resources.len(), 1);
        assert_eq!(e.resources[0].url, "https://github.com/docker/awesome-compose");
        assert_eq!(e.raw_text, "Some prose with no JSON.");
    }

    #[test]
    fn overview_is_truncated_and_collapsed() {
        let long = format!("  first\n\n  {}", "word ".repeat(200));
        let e = normalize(&Value::String(long), &source());
        assert_eq!(e.overview.chars().count(), OVERVIEW_CHARS);
        assert!(e.overview.starts_with("first word word"));
    }

    #[test]
    fn null_and_scalars_never_fail() {
        let e = normalize(&Value::Null, &source());
        assert_eq!(e.overview, NO_OVERVIEW);
        assert!(e.raw_text.is_empty());
        assert!(has_own_link(&e));

        let e = normalize(&json!(17), &source());
        assert_eq!(e.raw_text, "17");
        assert!(has_own_link(&e));

        let e = normalize(&json!([1, 2, 3]), &source());
        assert!(e.core_concepts.is_empty());
        assert!(has_own_link(&e));
    }

    #[test]
    fn fenced_json_string_is_parsed() {
        let payload = "```json\n{\"summary\": \"Compose samples\", \"concepts\": [\"services\"]}\n```";
        let e = normalize(&Value::String(payload.into()), &source());
        assert_eq!(e.overview, "Compose samples");
        assert_eq!(e.core_concepts, vec!["services"]);
        // No raw-text alias present, so the original string is kept.
        assert_eq!(e.raw_text, payload);
    }

    #[test]
    fn object_missing_every_key() {
        let e = normalize(&json!({ "unrelated": true }), &source());
        assert!(e.raw_text.contains("unrelated"));
        assert!(e.overview.contains("unrelated"));
        assert!(e.core_concepts.is_empty());
        assert!(has_own_link(&e));
    }

    #[test]
    fn aliases_and_mixed_entries() {
        let payload = json!({
            "intro": "Docker packages apps into containers.",
            "content": "Long scraped body text",
            "key_concepts": ["Images", "images", { "name": "Volumes" }, { "bogus": 1 }],
            "methods": [{ "method": "docker build", "explanation": "Build an image" }, "docker ps"],
            "gotchas": [{ "symptom": "Cannot connect to daemon", "workaround": "Start dockerd" }],
            "tips": ["Use multi-stage builds", "use multi-stage builds"],
            "codeExamples": [{ "title": "Run nginx", "code": "docker run nginx", "language": "bash" }],
            "links": [{ "url": "https://docs.docker.com", "title": "Docs" }, { "title": "no url" }]
        });
        let e = normalize(&payload, &source());
        assert_eq!(e.overview, "Docker packages apps into containers.");
        assert_eq!(e.raw_text, "Long scraped body text");
        assert_eq!(e.core_concepts, vec!["Images", "Volumes"]);
        assert_eq!(e.apis.len(), 2);
        assert_eq!(e.apis[0].description, "Build an image");
        assert_eq!(e.common_issues[0].fix.as_deref(), Some("Start dockerd"));
        assert_eq!(e.best_practices, vec!["Use multi-stage builds"]);
        assert_eq!(e.examples[0].language.as_deref(), Some("bash"));
        assert_eq!(e.resources.len(), 2);
        assert_eq!(e.resources[0].title, "Docs");
        assert!(has_own_link(&e));
    }

    #[test]
    fn explicit_resource_for_source_url_wins() {
        let payload = json!({
            "resources": [{ "url": "https://GITHUB.com/docker/awesome-compose", "title": "Explicit" }]
        });
        let e = normalize(&payload, &source());
        assert_eq!(e.resources.len(), 1);
        assert_eq!(e.resources[0].title, "Explicit");
    }

    #[test]
    fn resources_capped_but_keep_source() {
        let links: Vec<Value> = (0..40)
            .map(|i| json!({ "url": format!("https://example.com/{i}") }))
            .collect();
        let e = normalize(&json!({ "resources": links }), &source());
        assert_eq!(e.resources.len(), MAX_RESOURCES);
        assert!(has_own_link(&e));
    }

    #[test]
    fn concepts_are_capped() {
        let concepts: Vec<String> = (0..30).map(|i| format!("concept {i}")).collect();
        let e = normalize(&json!({ "coreConcepts": concepts }), &source());
        assert_eq!(e.core_concepts.len(), MAX_CONCEPTS);
    }

    #[test]
    fn every_list_is_capped_in_first_seen_order() {
        let practices: Vec<String> = (0..30).map(|i| format!("practice {i}")).collect();
        let apis: Vec<Value> = (0..30)
            .map(|i| json!({ "name": format!("fn_{i}"), "description": "d" }))
            .collect();
        let issues: Vec<Value> = (0..30)
            .map(|i| json!({ "issue": format!("issue {i}"), "fix": "f" }))
            .collect();
        let examples: Vec<Value> = (0..15)
            .map(|i| json!({ "title": format!("ex {i}"), "code": "x" }))
            .collect();

        let e = normalize(
            &json!({
                "bestPractices": practices,
                "apis": apis,
                "commonIssues": issues,
                "examples": examples,
            }),
            &source(),
        );

        assert_eq!(e.best_practices.len(), 20);
        assert_eq!(e.best_practices[19], "practice 19");
        assert_eq!(e.apis.len(), 20);
        assert_eq!(e.apis[19].name, "fn_19");
        assert_eq!(e.common_issues.len(), 20);
        assert_eq!(e.common_issues[19].issue, "issue 19");
        assert_eq!(e.examples.len(), 10);
        assert_eq!(e.examples[9].title, "ex 9");
    }

    #[test]
    fn apis_and_issues_dedup_case_insensitively() {
        let e = normalize(
            &json!({
                "apis": [{ "name": "Run" }, { "name": "run" }, "RUN", "build"],
                "commonIssues": ["Port in use", { "issue": "PORT IN USE", "fix": "x" }],
            }),
            &source(),
        );
        let names: Vec<&str> = e.apis.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Run", "build"]);
        assert_eq!(e.common_issues.len(), 1);
        assert_eq!(e.common_issues[0].fix, None);
    }

    #[test]
    fn strip_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }
}
