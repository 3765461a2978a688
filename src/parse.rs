//! Directive parser: markdown with fenced `scene` blocks -> raw descriptors.
//!
//! A scene is declared with a fenced block whose info string is `scene`:
//!
//! ````text
//! ```scene
//! kind: split
//! direction: vertical
//! ratio: 0.3
//! duration: 3
//! left.content: fn main() {}
//! right.content: Hello
//! ```
//! ````
//!
//! Inside a block each non-blank line is `key: value`. A `---` line ends the
//! attribute list; everything after it is the block body and becomes the
//! `content` attribute. Everything outside fences is narrative markdown and is
//! ignored.
//!
//! Parsing never fails the document: every malformed construct degrades to a
//! diagnostic plus a best-effort descriptor list, because the user is actively
//! typing while preview recompiles.

use std::collections::BTreeMap;

use crate::{
    diag::{Diagnostic, SourceSpan},
    model::SceneDescriptor,
};

pub const SCENE_KINDS: &[&str] = &["split", "code", "text", "image"];

const KNOWN_KEYS: &[&str] = &[
    "kind",
    "start",
    "duration",
    "background",
    "direction",
    "ratio",
    "content",
    "color",
    "source",
    "left.background",
    "left.content",
    "right.background",
    "right.content",
];

/// Parse a whole document into ordered descriptors plus diagnostics.
pub fn parse_document(source: &str) -> (Vec<SceneDescriptor>, Vec<Diagnostic>) {
    let mut descriptors = Vec::new();
    let mut diags = Vec::new();

    let lines: Vec<&str> = source.lines().collect();
    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i].trim();
        if !is_scene_fence_open(line) {
            i += 1;
            continue;
        }

        let open_line = i + 1; // 1-based
        let mut end = i + 1;
        let mut terminated = false;
        while end < lines.len() {
            if lines[end].trim() == "```" {
                terminated = true;
                break;
            }
            end += 1;
        }

        let close_line = if terminated { end + 1 } else { lines.len() };
        let span = SourceSpan::lines(open_line, close_line);
        if !terminated {
            diags.push(Diagnostic::warning(
                "unterminated scene block; parsing to end of document",
                span,
            ));
        }

        if let Some(desc) = parse_block(&lines[i + 1..end], open_line, span, &mut diags) {
            descriptors.push(desc);
        }

        i = if terminated { end + 1 } else { end };
    }

    (descriptors, diags)
}

fn is_scene_fence_open(trimmed: &str) -> bool {
    trimmed
        .strip_prefix("```")
        .is_some_and(|info| info.trim() == "scene")
}

/// Parse the interior lines of one scene block. `first_line` is the 1-based
/// document line of the opening fence (interior line k lives at
/// `first_line + 1 + k`).
fn parse_block(
    body: &[&str],
    first_line: usize,
    span: SourceSpan,
    diags: &mut Vec<Diagnostic>,
) -> Option<SceneDescriptor> {
    let mut attrs = BTreeMap::<String, String>::new();
    let mut content_body: Option<String> = None;

    let mut k = 0usize;
    while k < body.len() {
        let doc_line = first_line + 1 + k;
        let line = body[k];
        let trimmed = line.trim();

        if trimmed == "---" {
            // Remainder is the body, kept verbatim (code scenes need exact
            // whitespace).
            let rest = &body[k + 1..];
            content_body = Some(rest.join("\n"));
            break;
        }

        if trimmed.is_empty() {
            k += 1;
            continue;
        }

        match trimmed.split_once(':') {
            Some((key, value)) => {
                let key = key.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    diags.push(Diagnostic::warning(
                        format!("unknown attribute '{key}'"),
                        SourceSpan::line(doc_line),
                    ));
                }
                if attrs.insert(key.clone(), value).is_some() {
                    diags.push(Diagnostic::warning(
                        format!("attribute '{key}' given more than once; last value wins"),
                        SourceSpan::line(doc_line),
                    ));
                }
            }
            None => {
                diags.push(Diagnostic::warning(
                    format!("expected 'key: value', got '{trimmed}'"),
                    SourceSpan::line(doc_line),
                ));
            }
        }
        k += 1;
    }

    if let Some(body_text) = content_body {
        if attrs.contains_key("content") {
            diags.push(Diagnostic::warning(
                "block has both a 'content' attribute and a body; the body wins",
                span,
            ));
        }
        attrs.insert("content".to_string(), body_text);
    }

    let kind = match attrs.remove("kind") {
        Some(k) => k.trim().to_ascii_lowercase(),
        None => {
            diags.push(Diagnostic::error(
                "scene block is missing a 'kind' attribute; block dropped",
                span,
            ));
            return None;
        }
    };

    if !SCENE_KINDS.contains(&kind.as_str()) {
        // Non-fatal: one malformed block must not block preview of the rest.
        diags.push(Diagnostic::error(
            format!("unknown scene kind '{kind}'; block dropped"),
            span,
        ));
        return None;
    }

    let start = take_number(&mut attrs, "start", span, diags);
    let duration = take_number(&mut attrs, "duration", span, diags);

    Some(SceneDescriptor {
        kind,
        attrs,
        start,
        duration,
        span,
    })
}

fn take_number(
    attrs: &mut BTreeMap<String, String>,
    key: &str,
    span: SourceSpan,
    diags: &mut Vec<Diagnostic>,
) -> Option<f64> {
    let raw = attrs.remove(key)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            diags.push(Diagnostic::warning(
                format!("attribute '{key}' is not a number ('{raw}'); ignored"),
                span,
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;

    #[test]
    fn prose_only_document_yields_nothing() {
        let (descs, diags) = parse_document("# Title\n\nJust some prose.\n");
        assert!(descs.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn parses_attributes_and_span() {
        let src = "intro\n```scene\nkind: text\nduration: 2\ncontent: hi\n```\nafter\n";
        let (descs, diags) = parse_document(src);
        assert!(diags.is_empty());
        assert_eq!(descs.len(), 1);
        let d = &descs[0];
        assert_eq!(d.kind, "text");
        assert_eq!(d.duration, Some(2.0));
        assert_eq!(d.attrs.get("content").map(String::as_str), Some("hi"));
        assert_eq!(d.span, SourceSpan::lines(2, 6));
    }

    #[test]
    fn unknown_kind_is_dropped_with_diagnostic() {
        let src = "```scene\nkind: hologram\n```\n```scene\nkind: text\ncontent: ok\n```\n";
        let (descs, diags) = parse_document(src);
        assert_eq!(descs.len(), 1);
        assert_eq!(descs[0].kind, "text");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert!(diags[0].message.contains("hologram"));
    }

    #[test]
    fn missing_kind_is_dropped_with_diagnostic() {
        let (descs, diags) = parse_document("```scene\nduration: 2\n```\n");
        assert!(descs.is_empty());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("kind"));
    }

    #[test]
    fn body_after_separator_becomes_content() {
        let src = "```scene\nkind: code\n---\nfn main() {\n    println!(\"hi\");\n}\n```\n";
        let (descs, diags) = parse_document(src);
        assert!(diags.is_empty());
        assert_eq!(
            descs[0].attrs.get("content").map(String::as_str),
            Some("fn main() {\n    println!(\"hi\");\n}")
        );
    }

    #[test]
    fn body_wins_over_content_attribute_with_warning() {
        let src = "```scene\nkind: text\ncontent: attr\n---\nbody\n```\n";
        let (descs, diags) = parse_document(src);
        assert_eq!(descs[0].attrs.get("content").map(String::as_str), Some("body"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn bad_number_and_unknown_key_degrade_to_warnings() {
        let src = "```scene\nkind: text\nduration: soon\nsparkle: yes\ncontent: x\n```\n";
        let (descs, diags) = parse_document(src);
        assert_eq!(descs.len(), 1);
        assert_eq!(descs[0].duration, None);
        assert!(descs[0].attrs.contains_key("sparkle"));
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn unterminated_fence_parses_to_eof() {
        let src = "```scene\nkind: text\ncontent: trailing\n";
        let (descs, diags) = parse_document(src);
        assert_eq!(descs.len(), 1);
        assert_eq!(
            descs[0].attrs.get("content").map(String::as_str),
            Some("trailing")
        );
        assert!(diags.iter().any(|d| d.message.contains("unterminated")));
    }

    #[test]
    fn non_scene_fences_are_ignored() {
        let src = "```rust\nkind: text\n```\n";
        let (descs, diags) = parse_document(src);
        assert!(descs.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn duplicate_attribute_warns_and_keeps_last() {
        let src = "```scene\nkind: text\ncontent: a\ncontent: b\n```\n";
        let (descs, diags) = parse_document(src);
        assert_eq!(descs[0].attrs.get("content").map(String::as_str), Some("b"));
        assert_eq!(diags.len(), 1);
    }
}
