//! Markdown Section Parser
//!
//! Splits a document into keyed sections on a fixed vocabulary of H2
//! headings and puts it back together. Everything that is not a recognized
//! heading, including other headings, stays inside the surrounding section
//! so untouched content survives a parse/merge cycle.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::types::{SectionKey, SectionSlot};

/// Heading text used for the whole-document pseudo-section
pub const FULL_DOCUMENT_HEADING: &str = "Document";

// =============================================================================
// Line Scanner
// =============================================================================

/// Text of a level-2 ATX heading (`## Title`), without the markers
pub fn recognize_heading(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }

    let rest = line[indent..].strip_prefix("##")?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    // Optional closing sequence: "## Title ##"
    let text = rest.trim();
    let text = match text.trim_end_matches('#') {
        stripped if stripped.len() < text.len() && stripped.ends_with([' ', '\t']) => {
            stripped.trim_end()
        }
        _ => text,
    };

    (!text.is_empty()).then_some(text)
}

/// Tracks fenced code blocks so headings inside them are ignored
#[derive(Debug, Default)]
struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed one line; returns true when the line is inside (or delimits) a fence
    fn observe(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let fence = ['`', '~'].into_iter().find_map(|c| {
            let run = trimmed.len() - trimmed.trim_start_matches(c).len();
            (run >= 3).then_some((c, run))
        });

        match (self.open, fence) {
            (None, Some(opening)) => {
                self.open = Some(opening);
                true
            }
            (Some((c, len)), Some((fc, flen))) if c == fc && flen >= len => {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        }
    }
}

/// Drop leading blank lines and trailing whitespace
fn trim_blank_lines(text: &str) -> String {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            start += line.len();
        } else {
            break;
        }
    }
    text[start..].trim_end().to_string()
}

// =============================================================================
// Parsed Document
// =============================================================================

/// A document split into recognized sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Text before the first recognized heading
    pub preamble: String,
    /// Slots in document order, without duplicates
    pub order: Vec<SectionSlot>,
    pub sections: HashMap<SectionSlot, String>,
    /// Original heading text of each slot
    pub headings: HashMap<SectionSlot, String>,
}

impl ParsedDocument {
    /// Parse `content` into recognized sections
    pub fn parse(content: &str) -> Self {
        let mut fences = FenceTracker::default();
        let mut preamble: Vec<&str> = Vec::new();
        let mut order: Vec<SectionSlot> = Vec::new();
        let mut headings: HashMap<SectionSlot, String> = HashMap::new();
        let mut bodies: HashMap<SectionSlot, Vec<&str>> = HashMap::new();
        let mut current: Option<SectionSlot> = None;

        for line in content.lines() {
            let in_fence = fences.observe(line);

            if !in_fence
                && let Some(text) = recognize_heading(line)
                && let Some(key) = SectionKey::from_heading(text)
            {
                let slot = SectionSlot::Known(key);
                // A repeated heading stays in the section it appears in
                if !headings.contains_key(&slot) {
                    order.push(slot);
                    headings.insert(slot, text.to_string());
                    bodies.insert(slot, Vec::new());
                    current = Some(slot);
                    continue;
                }
            }

            match current.and_then(|slot| bodies.get_mut(&slot)) {
                Some(body) => body.push(line),
                None => preamble.push(line),
            }
        }

        if order.is_empty() {
            let slot = SectionSlot::Full;
            return Self {
                preamble: String::new(),
                order: vec![slot],
                sections: HashMap::from([(slot, content.trim().to_string())]),
                headings: HashMap::from([(slot, FULL_DOCUMENT_HEADING.to_string())]),
            };
        }

        let sections = bodies
            .into_iter()
            .map(|(slot, lines)| (slot, trim_blank_lines(&lines.join("\n"))))
            .collect();

        Self {
            preamble: trim_blank_lines(&preamble.join("\n")),
            order,
            sections,
            headings,
        }
    }

    /// True when no recognized heading was found
    pub fn is_unsectioned(&self) -> bool {
        self.order == [SectionSlot::Full]
    }

    pub fn body(&self, key: SectionKey) -> Option<&str> {
        self.sections
            .get(&SectionSlot::Known(key))
            .map(String::as_str)
    }

    pub fn contains(&self, key: SectionKey) -> bool {
        self.sections.contains_key(&SectionSlot::Known(key))
    }

    /// Recognized keys in document order
    pub fn keys(&self) -> Vec<SectionKey> {
        self.order.iter().filter_map(|slot| slot.key()).collect()
    }

    /// Reassemble the document, substituting `updated` bodies.
    ///
    /// Sections keep their original heading text and order. Updated keys
    /// the document does not have yet are appended with canonical headings
    /// when their body is non-empty.
    pub fn merge(&self, updated: &BTreeMap<SectionKey, String>) -> String {
        let mut blocks: Vec<String> = Vec::with_capacity(self.order.len() + 1);

        if !self.preamble.trim().is_empty() {
            blocks.push(self.preamble.trim_end().to_string());
        }

        for slot in &self.order {
            let original = self.sections.get(slot).map(String::as_str).unwrap_or("");
            match slot {
                SectionSlot::Full => {
                    if !original.trim().is_empty() {
                        blocks.push(original.trim().to_string());
                    }
                }
                SectionSlot::Known(key) => {
                    let body = updated.get(key).map(String::as_str).unwrap_or(original);
                    let heading = self
                        .headings
                        .get(slot)
                        .map(String::as_str)
                        .unwrap_or(key.canonical_heading());
                    blocks.push(render_block(heading, body));
                }
            }
        }

        for (key, body) in updated {
            if !self.contains(*key) && !body.trim().is_empty() {
                blocks.push(render_block(key.canonical_heading(), body));
            }
        }

        blocks.join("\n\n")
    }

    /// Summary of the parsed layout, for display
    pub fn outline(&self) -> Vec<SectionOutline> {
        self.order
            .iter()
            .map(|slot| SectionOutline {
                slot: slot.to_string(),
                heading: self.headings.get(slot).cloned().unwrap_or_default(),
                chars: self
                    .sections
                    .get(slot)
                    .map(|body| body.chars().count())
                    .unwrap_or(0),
            })
            .collect()
    }
}

fn render_block(heading: &str, body: &str) -> String {
    let body = trim_blank_lines(body);
    if body.is_empty() {
        format!("## {}", heading)
    } else {
        format!("## {}\n{}", heading, body)
    }
}

/// One row of [`ParsedDocument::outline`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionOutline {
    pub slot: String,
    pub heading: String,
    pub chars: usize,
}
