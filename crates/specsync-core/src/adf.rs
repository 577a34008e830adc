//! Atlassian Document Format bodies for tracker issues.

use crate::tasks_doc::StorySpec;
use serde_json::{json, Value};

fn doc(content: Vec<Value>) -> Value {
    json!({ "type": "doc", "version": 1, "content": content })
}

fn text(s: &str) -> Value {
    json!({ "type": "text", "text": s })
}

fn paragraph(s: &str) -> Value {
    json!({ "type": "paragraph", "content": [text(s)] })
}

fn heading(s: &str) -> Value {
    json!({ "type": "heading", "attrs": { "level": 2 }, "content": [text(s)] })
}

fn bullet_list(items: &[String]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|item| json!({ "type": "listItem", "content": [paragraph(item)] }))
        .collect();
    json!({ "type": "bulletList", "content": items })
}

fn labelled(label: &str, value: Value) -> Value {
    json!({
        "type": "paragraph",
        "content": [
            { "type": "text", "text": format!("{label}: "), "marks": [{ "type": "strong" }] },
            value
        ]
    })
}

/// One paragraph per non-empty line.
pub fn text_to_adf(s: &str) -> Value {
    let paragraphs: Vec<Value> = s
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(paragraph)
        .collect();
    doc(paragraphs)
}

/// Description for a story: its details, then a footer with the phase label
/// and a link back to the source document.
pub fn story_description(story: &StorySpec, source_url: &str) -> Value {
    let mut content = Vec::new();

    if let Some(description) = story.description.as_deref() {
        content.push(heading("Description"));
        content.push(paragraph(description));
    }

    let mut metadata = vec![format!("Priority: {}", story.priority)];
    if let Some(v) = &story.estimate {
        metadata.push(format!("Estimate: {v}"));
    }
    if let Some(v) = &story.assignee {
        metadata.push(format!("Assignee: {v}"));
    }
    if let Some(v) = &story.dependencies {
        metadata.push(format!("Dependencies: {v}"));
    }
    if let Some(v) = story.due_date {
        metadata.push(format!("Due: {v}"));
    }
    content.push(heading("Details"));
    content.extend(metadata.iter().map(|m| paragraph(m)));

    if !story.acceptance_criteria.is_empty() {
        content.push(heading("Acceptance Criteria"));
        content.push(bullet_list(&story.acceptance_criteria));
    }
    if !story.subtasks.is_empty() {
        content.push(heading("Subtasks"));
        content.push(bullet_list(&story.subtasks));
    }

    content.push(json!({ "type": "rule" }));
    content.push(labelled("Phase", text(&story.phase_label)));
    content.push(labelled(
        "GitHub",
        json!({
            "type": "text",
            "text": source_url,
            "marks": [{ "type": "link", "attrs": { "href": source_url } }]
        }),
    ));

    doc(content)
}
