//! Scene compiler: descriptors -> an immutable [`Timeline`].
//!
//! Placement is cumulative: scene *i* starts where scene *i-1* ends unless an
//! explicit `start` overrides it. Explicit starts may overlap the previous
//! scene; the overlapped window `[next.start, prev.end]` becomes a cross-fade
//! (see [`crate::clock`]). Compilation never fails: invalid values degrade to
//! defaults plus diagnostics.

use std::collections::BTreeMap;

use crate::{
    diag::{Diagnostic, SourceSpan},
    model::{
        DEFAULT_BACKGROUND, DEFAULT_SCENE_DURATION_SECS, DEFAULT_SPLIT_RATIO, DEFAULT_TEXT_COLOR,
        Direction, MIN_SCENE_DURATION_SECS, Panel, RATIO_MAX, RATIO_MIN, Scene, SceneDescriptor,
        ScenePayload, Timeline,
    },
    parse::parse_document,
};

/// Parse and compile a markdown document in one step.
pub fn compile_source(source: &str) -> (Timeline, Vec<Diagnostic>) {
    let (descriptors, mut diags) = parse_document(source);
    let (timeline, compile_diags) = compile(&descriptors);
    diags.extend(compile_diags);
    (timeline, diags)
}

/// Compile descriptors into a timeline. Always returns a best-effort timeline;
/// problems surface as diagnostics.
#[tracing::instrument(skip(descriptors), fields(count = descriptors.len()))]
pub fn compile(descriptors: &[SceneDescriptor]) -> (Timeline, Vec<Diagnostic>) {
    let mut diags = Vec::new();
    let mut scenes = Vec::with_capacity(descriptors.len());

    let mut cursor = 0.0_f64;
    for (z, desc) in descriptors.iter().enumerate() {
        let start = match desc.start {
            Some(s) if s < 0.0 => {
                diags.push(Diagnostic::warning(
                    format!("start {s} is negative; clamped to 0"),
                    desc.span,
                ));
                0.0
            }
            Some(s) => s,
            None => cursor,
        };

        let duration = match desc.duration {
            Some(d) if d <= 0.0 => {
                diags.push(Diagnostic::warning(
                    format!("duration {d} is not positive; clamped to {MIN_SCENE_DURATION_SECS}"),
                    desc.span,
                ));
                MIN_SCENE_DURATION_SECS
            }
            Some(d) => d,
            None => DEFAULT_SCENE_DURATION_SECS,
        };

        let Some(payload) = compile_payload(desc, &mut diags) else {
            continue;
        };
        cursor = start + duration;

        scenes.push(Scene {
            id: format!("s{z}"),
            start,
            duration,
            z,
            payload,
        });
    }

    // Stable sort keeps declaration order among equal starts; z records the
    // declaration index so authoring order survives the sort.
    scenes.sort_by(|a, b| a.start.total_cmp(&b.start));

    (Timeline::new(scenes), diags)
}

fn compile_payload(desc: &SceneDescriptor, diags: &mut Vec<Diagnostic>) -> Option<ScenePayload> {
    let attrs = &desc.attrs;
    let payload = match desc.kind.as_str() {
        "split" => {
            let direction = compile_direction(attrs, desc.span, diags);
            let ratio = compile_ratio(attrs, desc.span, diags);
            ScenePayload::Split {
                direction,
                ratio,
                first: Panel {
                    background: color_attr(attrs, "left.background", DEFAULT_BACKGROUND, desc.span, diags),
                    content: attrs.get("left.content").cloned().unwrap_or_default(),
                },
                second: Panel {
                    background: color_attr(attrs, "right.background", DEFAULT_BACKGROUND, desc.span, diags),
                    content: attrs.get("right.content").cloned().unwrap_or_default(),
                },
            }
        }
        "code" => ScenePayload::Code {
            content: required_content(desc, diags),
            background: color_attr(attrs, "background", DEFAULT_BACKGROUND, desc.span, diags),
            color: color_attr(attrs, "color", DEFAULT_TEXT_COLOR, desc.span, diags),
        },
        "text" => ScenePayload::Text {
            content: required_content(desc, diags),
            background: color_attr(attrs, "background", DEFAULT_BACKGROUND, desc.span, diags),
            color: color_attr(attrs, "color", DEFAULT_TEXT_COLOR, desc.span, diags),
        },
        "image" => {
            let source = match attrs.get("source") {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => {
                    diags.push(Diagnostic::warning(
                        "image scene is missing 'source'; a placeholder will render",
                        desc.span,
                    ));
                    String::new()
                }
            };
            ScenePayload::Image {
                source,
                background: color_attr(attrs, "background", DEFAULT_BACKGROUND, desc.span, diags),
            }
        }
        // The parser only forwards known kinds, but descriptors can also be
        // built by hand; degrade the same way the parser does.
        other => {
            diags.push(Diagnostic::error(
                format!("unknown scene kind '{other}'; block dropped"),
                desc.span,
            ));
            return None;
        }
    };
    Some(payload)
}

fn required_content(desc: &SceneDescriptor, diags: &mut Vec<Diagnostic>) -> String {
    match desc.attrs.get("content") {
        Some(c) => c.clone(),
        None => {
            diags.push(Diagnostic::warning(
                format!("{} scene is missing 'content'; defaulting to empty", desc.kind),
                desc.span,
            ));
            String::new()
        }
    }
}

fn compile_direction(
    attrs: &BTreeMap<String, String>,
    span: SourceSpan,
    diags: &mut Vec<Diagnostic>,
) -> Direction {
    match attrs.get("direction").map(|s| s.trim().to_ascii_lowercase()) {
        Some(s) if s == "horizontal" => Direction::Horizontal,
        Some(s) if s == "vertical" => Direction::Vertical,
        Some(other) => {
            diags.push(Diagnostic::warning(
                format!("unknown direction '{other}'; defaulting to vertical"),
                span,
            ));
            Direction::Vertical
        }
        None => {
            diags.push(Diagnostic::warning(
                "split scene is missing 'direction'; defaulting to vertical",
                span,
            ));
            Direction::Vertical
        }
    }
}

fn compile_ratio(
    attrs: &BTreeMap<String, String>,
    span: SourceSpan,
    diags: &mut Vec<Diagnostic>,
) -> f64 {
    let raw = match attrs.get("ratio") {
        Some(r) => r,
        None => {
            diags.push(Diagnostic::warning(
                format!("split scene is missing 'ratio'; defaulting to {DEFAULT_SPLIT_RATIO}"),
                span,
            ));
            return DEFAULT_SPLIT_RATIO;
        }
    };

    let value = match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            diags.push(Diagnostic::warning(
                format!("ratio '{raw}' is not a number; defaulting to {DEFAULT_SPLIT_RATIO}"),
                span,
            ));
            return DEFAULT_SPLIT_RATIO;
        }
    };

    if value <= 0.0 || value >= 1.0 {
        let clamped = value.clamp(RATIO_MIN, RATIO_MAX);
        diags.push(Diagnostic::warning(
            format!("ratio {value} is outside (0, 1); clamped to {clamped}"),
            span,
        ));
        return clamped;
    }
    value
}

fn color_attr(
    attrs: &BTreeMap<String, String>,
    key: &str,
    default: [u8; 4],
    span: SourceSpan,
    diags: &mut Vec<Diagnostic>,
) -> [u8; 4] {
    let Some(raw) = attrs.get(key) else {
        return default;
    };
    match parse_hex_color(raw) {
        Some(c) => c,
        None => {
            diags.push(Diagnostic::warning(
                format!("'{key}' value '{raw}' is not a #rgb/#rrggbb color; ignored"),
                span,
            ));
            default
        }
    }
}

/// `#rgb` or `#rrggbb`, case-insensitive. Alpha is always 255.
pub(crate) fn parse_hex_color(raw: &str) -> Option<[u8; 4]> {
    let hex = raw.trim().strip_prefix('#')?;
    let nibble = |c: char| c.to_digit(16).map(|d| d as u8);
    match hex.len() {
        3 => {
            let mut it = hex.chars();
            let (r, g, b) = (nibble(it.next()?)?, nibble(it.next()?)?, nibble(it.next()?)?);
            Some([r * 17, g * 17, b * 17, 255])
        }
        6 => {
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            Some([byte(0)?, byte(2)?, byte(4)?, 255])
        }
        _ => None,
    }
}
