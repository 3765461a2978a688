use std::collections::BTreeMap;

use crate::diag::SourceSpan;

/// Duration substituted when a directive omits one.
pub const DEFAULT_SCENE_DURATION_SECS: f64 = 5.0;

/// Positive epsilon substituted for `duration <= 0`, so progress ratios never
/// divide by zero.
pub const MIN_SCENE_DURATION_SECS: f64 = 0.001;

/// Fixed dark value used when a background is unset.
pub const DEFAULT_BACKGROUND: [u8; 4] = [18, 20, 28, 255];

pub const DEFAULT_TEXT_COLOR: [u8; 4] = [235, 237, 243, 255];

pub const DEFAULT_SPLIT_RATIO: f64 = 0.5;

/// `ratio` is clamped into this closed range; the bounds keep it strictly
/// inside (0, 1).
pub const RATIO_MIN: f64 = 0.01;
pub const RATIO_MAX: f64 = 0.99;

/// Raw scene block as produced by the parser: the kind tag, the unparsed
/// attribute map, and the numeric timing attributes the parser recognized.
/// Consumed once by the compiler.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneDescriptor {
    pub kind: String,
    pub attrs: BTreeMap<String, String>,
    pub start: Option<f64>,
    pub duration: Option<f64>,
    pub span: SourceSpan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    /// Horizontal divider: panels stacked top/bottom.
    Horizontal,
    /// Vertical divider: panels side by side.
    Vertical,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Panel {
    pub background: [u8; 4],
    pub content: String,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            content: String::new(),
        }
    }
}

/// Kind-specific scene payload. Closed set: adding a kind is a compile-checked
/// extension point (every `match` on this enum is exhaustive).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ScenePayload {
    Split {
        direction: Direction,
        ratio: f64,
        first: Panel,
        second: Panel,
    },
    Code {
        content: String,
        background: [u8; 4],
        color: [u8; 4],
    },
    Text {
        content: String,
        background: [u8; 4],
        color: [u8; 4],
    },
    Image {
        source: String,
        background: [u8; 4],
    },
}

impl ScenePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ScenePayload::Split { .. } => "split",
            ScenePayload::Code { .. } => "code",
            ScenePayload::Text { .. } => "text",
            ScenePayload::Image { .. } => "image",
        }
    }
}

/// One timed unit of video content.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub id: String,
    /// Absolute start, seconds, >= 0.
    pub start: f64,
    /// Seconds, always > 0 after compilation.
    pub duration: f64,
    /// Declaration index, preserved through the start-ordered sort so the
    /// authoring order stays recoverable. Overlap compositing is a symmetric
    /// cross-fade and does not consult `z`.
    pub z: usize,
    pub payload: ScenePayload,
}

impl Scene {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// The compiled, immutable, time-ordered scene sequence for one document.
///
/// A new edit produces a wholly new `Timeline`; there is no in-place patching.
/// Fields are private so the sorted order and the cached totals cannot drift.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    scenes: Vec<Scene>,
    total_duration: f64,
    /// Index of the scene that ends last (the scene held at its final frame
    /// when querying at or past `total_duration`). 0 for an empty timeline.
    last_scene: usize,
}

impl Timeline {
    /// Build from scenes sorted by `start` ascending (the compiler's output
    /// order). Totals are derived here once.
    pub(crate) fn new(scenes: Vec<Scene>) -> Self {
        debug_assert!(scenes.windows(2).all(|w| w[0].start <= w[1].start));

        let mut total_duration = 0.0_f64;
        let mut last_scene = 0usize;
        for (i, scene) in scenes.iter().enumerate() {
            if scene.end() >= total_duration {
                total_duration = scene.end();
                last_scene = i;
            }
        }

        Self {
            scenes,
            total_duration,
            last_scene,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn last_scene_index(&self) -> usize {
        self.last_scene
    }
}
