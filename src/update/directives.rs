//! Edit directive scanner
//!
//! Generated patch text carries inline directives:
//!
//! ```text
//! [DELETE: exact text to remove]
//! [UPDATE: exact existing text] / replacement
//! [ADD] new text
//! ```
//!
//! A payload runs until the next directive tag or the end of input. Text
//! outside any payload is kept as free text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditDirective {
    Delete(String),
    Update { target: String, replacement: String },
    Add(String),
}

/// One piece of scanned generator output, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Directive(EditDirective),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Delete,
    Update,
    Add,
}

impl Tag {
    const ALL: [Tag; 3] = [Tag::Delete, Tag::Update, Tag::Add];

    fn opener(self) -> &'static str {
        match self {
            Tag::Delete => "[DELETE:",
            Tag::Update => "[UPDATE:",
            Tag::Add => "[ADD]",
        }
    }

    /// DELETE and UPDATE carry a bracketed target
    fn has_target(self) -> bool {
        !matches!(self, Tag::Add)
    }
}

/// Earliest directive tag at or after `from`. `upper` is the ASCII-uppercased input.
fn next_tag(upper: &str, from: usize) -> Option<(usize, Tag)> {
    Tag::ALL
        .into_iter()
        .filter_map(|tag| upper[from..].find(tag.opener()).map(|i| (from + i, tag)))
        .min_by_key(|(pos, _)| *pos)
}

fn push_text(fragments: &mut Vec<Fragment>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        fragments.push(Fragment::Text(text.to_string()));
    }
}

/// Split generator output into directives and free text
pub fn scan(text: &str) -> Vec<Fragment> {
    // ASCII uppercasing keeps byte offsets aligned with `text`
    let upper = text.to_ascii_uppercase();
    let mut fragments = Vec::new();
    let mut cursor = 0;

    while let Some((start, tag)) = next_tag(&upper, cursor) {
        push_text(&mut fragments, &text[cursor..start]);

        let mut body_start = start + tag.opener().len();
        let mut target = "";
        if tag.has_target() {
            let close = text[body_start..]
                .find(']')
                .map(|i| body_start + i)
                .unwrap_or(text.len());
            target = text[body_start..close].trim();
            body_start = (close + 1).min(text.len());
        }

        let body_end = next_tag(&upper, body_start)
            .map(|(pos, _)| pos)
            .unwrap_or(text.len());
        let payload = &text[body_start..body_end];

        match tag {
            Tag::Delete => {
                if !target.is_empty() {
                    fragments.push(Fragment::Directive(EditDirective::Delete(
                        target.to_string(),
                    )));
                }
                push_text(&mut fragments, payload);
            }
            Tag::Update => {
                let replacement = payload.trim();
                let replacement = replacement.strip_prefix('/').unwrap_or(replacement).trim();
                if !target.is_empty() {
                    fragments.push(Fragment::Directive(EditDirective::Update {
                        target: target.to_string(),
                        replacement: replacement.to_string(),
                    }));
                }
            }
            Tag::Add => {
                fragments.push(Fragment::Directive(EditDirective::Add(
                    payload.trim().to_string(),
                )));
            }
        }

        cursor = body_end;
    }

    push_text(&mut fragments, &text[cursor..]);
    fragments
}

/// Directives only, in source order
pub fn directives(fragments: &[Fragment]) -> impl Iterator<Item = &EditDirective> {
    fragments.iter().filter_map(|f| match f {
        Fragment::Directive(d) => Some(d),
        Fragment::Text(_) => None,
    })
}

/// Output with directive tags removed: free text, replacements and additions
pub fn strip_tags(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .filter_map(|f| match f {
            Fragment::Text(text) => Some(text.as_str()),
            Fragment::Directive(EditDirective::Update { replacement, .. }) => {
                Some(replacement.as_str())
            }
            Fragment::Directive(EditDirective::Add(text)) => Some(text.as_str()),
            Fragment::Directive(EditDirective::Delete(_)) => None,
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
