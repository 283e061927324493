//! Splits one block of free text into an item list and a step list.
//!
//! This is a best-effort heuristic. Users are told the result is
//! auto-organized and should be reviewed before publishing.

use crate::models::PostType;
use regex::Regex;
use std::sync::LazyLock;

static ORDINAL_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s").unwrap());

// Unanchored, so inflections ("Mixing", "baked") and compounds ("Preheat") count.
static ACTION_VERB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&ACTION_VERBS.join("|")).unwrap());

const ACTION_VERBS: &[&str] = &[
    "mix", "add", "pour", "bake", "cook", "heat", "stir", "combine", "cut", "chop", "assemble",
    "attach", "glue", "paint", "drill", "screw", "nail", "measure",
];

const MAX_FALLBACK_ITEMS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitContent {
    pub post_type: PostType,
    pub items: Vec<String>,
    pub steps: Vec<String>,
}

impl SplitContent {
    pub fn item_label(&self) -> &'static str {
        match self.post_type {
            PostType::Recipe => "Ingredients",
            PostType::Diy => "Materials",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.steps.is_empty()
    }
}

fn starts_step_section(line: &str) -> bool {
    if ORDINAL_MARKER.is_match(line) {
        return true;
    }
    let lower = line.to_lowercase();
    lower.contains("step") || ACTION_VERB.is_match(&lower)
}

fn is_item_heading(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("ingredient") || lower.contains("material")
}

fn is_step_heading(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("step") || lower.contains("instruction")
}

/// Splits `text` into items (ingredients or materials) and ordered steps.
///
/// Never fails: an empty result only comes from empty input, and callers
/// are expected to reject a submission without steps.
pub fn split_content(text: &str, post_type: PostType) -> SplitContent {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let split_at = lines
        .iter()
        .position(|line| starts_step_section(line))
        .unwrap_or(lines.len() / 2);

    let (head, tail) = lines.split_at(split_at);
    let mut items: Vec<String> = head
        .iter()
        .filter(|line| !is_item_heading(line))
        .map(|line| line.to_string())
        .collect();
    let mut steps: Vec<String> = tail
        .iter()
        .filter(|line| !is_step_heading(line))
        .map(|line| line.to_string())
        .collect();

    if items.is_empty() && lines.len() > 1 {
        let take = MAX_FALLBACK_ITEMS.min(lines.len() / 2);
        items = lines[..take].iter().map(|line| line.to_string()).collect();
        steps = lines[take..].iter().map(|line| line.to_string()).collect();
    }

    if steps.is_empty() {
        steps = lines.iter().map(|line| line.to_string()).collect();
    }

    tracing::debug!(
        lines = lines.len(),
        split_at,
        items = items.len(),
        steps = steps.len(),
        "Split freeform content"
    );

    SplitContent {
        post_type,
        items,
        steps,
    }
}
