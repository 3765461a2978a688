//! Scene renderer dispatch: `(Scene, local_time) -> pixels`, pure.
//!
//! `local_time` is the only time-varying input; identical arguments always
//! produce byte-identical frames, which the export driver depends on. Dispatch
//! is exhaustive over [`ScenePayload`], so a new scene kind is a
//! compile-checked extension point.
//!
//! Text and code content renders as deterministic monospaced glyph cells (a
//! greeked column layout) with a typing reveal; real font shaping is out of
//! scope for the core engine.

use crate::{
    assets::PreparedAssets,
    clock::{self, ClockSample},
    core::Canvas,
    model::{DEFAULT_BACKGROUND, Direction, Panel, Scene, ScenePayload, Timeline},
    raster::{self, PremulRgba8, RectPx},
};

pub const DIVIDER_COLOR: [u8; 4] = [90, 94, 110, 255];

/// Typing reveal speed for text/code content.
pub const TYPE_CHARS_PER_SEC: f64 = 30.0;

/// Image entrance fade length, seconds.
const IMAGE_FADE_SECS: f64 = 0.3;

const CELL_W: i32 = 8;
const CELL_H: i32 = 14;
const GLYPH_W: i32 = 6;
const GLYPH_H: i32 = 9;
const PADDING: i32 = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn solid(canvas: Canvas, color: PremulRgba8) -> Self {
        let px_count = (canvas.width as usize) * (canvas.height as usize);
        let mut data = Vec::with_capacity(px_count * 4);
        for _ in 0..px_count {
            data.extend_from_slice(&color);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
            premultiplied: true,
        }
    }
}

/// Render the timeline at absolute time `t`: clock sample, per-scene render,
/// cross-fade compositing. An empty timeline renders the default background.
pub fn render_time(
    timeline: &Timeline,
    t: f64,
    canvas: Canvas,
    assets: &PreparedAssets,
) -> FrameRGBA {
    match clock::sample(timeline, t) {
        Some(sample) => render_sample(timeline, &sample, canvas, assets),
        None => FrameRGBA::solid(canvas, DEFAULT_BACKGROUND),
    }
}

/// Render a clock sample. Inside a cross-fade window the outgoing and incoming
/// scenes are rendered independently and blended by `crossfade_alpha` (the
/// incoming scene's weight).
pub fn render_sample(
    timeline: &Timeline,
    sample: &ClockSample,
    canvas: Canvas,
    assets: &PreparedAssets,
) -> FrameRGBA {
    let scenes = timeline.scenes();
    let active = &scenes[sample.active.index];
    let mut frame = render_scene(active, sample.active.local_time, canvas, assets);

    if let Some(outgoing) = sample.outgoing {
        let out_frame = render_scene(&scenes[outgoing.index], outgoing.local_time, canvas, assets);
        let mut blended = out_frame;
        raster::crossfade_in_place(
            &mut blended.data,
            &frame.data,
            sample.crossfade_alpha as f32,
        );
        frame = blended;
    }

    frame
}

/// Render one scene at its local time. Pure and infallible: a missing image
/// renders a placeholder rather than failing mid-preview.
pub fn render_scene(
    scene: &Scene,
    local_time: f64,
    canvas: Canvas,
    assets: &PreparedAssets,
) -> FrameRGBA {
    let local_time = local_time.clamp(0.0, scene.duration);
    match &scene.payload {
        ScenePayload::Split {
            direction,
            ratio,
            first,
            second,
        } => render_split(canvas, *direction, *ratio, first, second, local_time),
        ScenePayload::Text {
            content,
            background,
            color,
        } => render_text_like(canvas, content, *background, *color, local_time, true),
        ScenePayload::Code {
            content,
            background,
            color,
        } => render_text_like(canvas, content, *background, *color, local_time, false),
        ScenePayload::Image { source, background } => {
            render_image(canvas, source, *background, local_time, assets)
        }
    }
}

/// Panel rectangles for a split scene: `(first, divider, second)`. The two
/// panels plus the 1px hairline always sum exactly to the container dimension.
pub(crate) fn split_rects(
    canvas: Canvas,
    direction: Direction,
    ratio: f64,
) -> (RectPx, RectPx, RectPx) {
    let w = canvas.width as i32;
    let h = canvas.height as i32;
    match direction {
        Direction::Vertical => {
            let first_w = (f64::from(w - 1) * ratio).round() as i32;
            (
                RectPx::new(0, 0, first_w, h),
                RectPx::new(first_w, 0, 1, h),
                RectPx::new(first_w + 1, 0, w - first_w - 1, h),
            )
        }
        Direction::Horizontal => {
            let first_h = (f64::from(h - 1) * ratio).round() as i32;
            (
                RectPx::new(0, 0, w, first_h),
                RectPx::new(0, first_h, w, 1),
                RectPx::new(0, first_h + 1, w, h - first_h - 1),
            )
        }
    }
}

fn render_split(
    canvas: Canvas,
    direction: Direction,
    ratio: f64,
    first: &Panel,
    second: &Panel,
    local_time: f64,
) -> FrameRGBA {
    let mut frame = FrameRGBA::solid(canvas, DEFAULT_BACKGROUND);
    let (first_rect, divider, second_rect) = split_rects(canvas, direction, ratio);

    for (rect, panel) in [(first_rect, first), (second_rect, second)] {
        raster::fill_rect(&mut frame.data, frame.width, frame.height, rect, panel.background);
        // Each region is independently clipped; content cannot bleed across
        // the divider or outside the container.
        let clip = rect.inset(PADDING).intersect(rect);
        draw_typing(
            &mut frame,
            clip,
            &panel.content,
            local_time,
            crate::model::DEFAULT_TEXT_COLOR,
        );
    }

    raster::fill_rect(&mut frame.data, frame.width, frame.height, divider, DIVIDER_COLOR);
    frame
}

fn render_text_like(
    canvas: Canvas,
    content: &str,
    background: [u8; 4],
    color: [u8; 4],
    local_time: f64,
    centered: bool,
) -> FrameRGBA {
    let mut frame = FrameRGBA::solid(canvas, background);
    let full = RectPx::of_canvas(canvas.width, canvas.height);
    let clip = full.inset(PADDING).intersect(full);

    let clip = if centered {
        center_block(clip, content)
    } else {
        clip
    };
    draw_typing(&mut frame, clip, content, local_time, color);
    frame
}

/// Vertically center the text block inside `clip` based on its line count.
fn center_block(clip: RectPx, content: &str) -> RectPx {
    let lines = content.lines().count().max(1) as i32;
    let block_h = lines * CELL_H;
    if block_h >= clip.h {
        return clip;
    }
    RectPx::new(clip.x, clip.y + (clip.h - block_h) / 2, clip.w, clip.h - (clip.h - block_h) / 2)
}

fn render_image(
    canvas: Canvas,
    source: &str,
    background: [u8; 4],
    local_time: f64,
    assets: &PreparedAssets,
) -> FrameRGBA {
    let mut frame = FrameRGBA::solid(canvas, background);
    let full = RectPx::of_canvas(canvas.width, canvas.height);
    let opacity = (local_time / IMAGE_FADE_SECS).clamp(0.0, 1.0) as f32;

    match assets.image(source) {
        Some(img) => {
            let dst_x = (canvas.width as i32 - img.width as i32) / 2;
            let dst_y = (canvas.height as i32 - img.height as i32) / 2;
            raster::blit(
                &mut frame.data,
                frame.width,
                frame.height,
                full,
                &img.data,
                img.width,
                img.height,
                dst_x,
                dst_y,
                opacity,
            );
        }
        None => {
            // Placeholder: a muted centered block where the image would be.
            let rect = full.inset((full.w.min(full.h)) / 6);
            let placeholder = raster::over(
                [background[0], background[1], background[2], background[3]],
                raster::premultiply([120, 124, 140, (opacity * 255.0) as u8]),
                1.0,
            );
            raster::fill_rect(&mut frame.data, frame.width, frame.height, rect, placeholder);
        }
    }
    frame
}

/// Typing reveal: `floor(local_time * TYPE_CHARS_PER_SEC)` characters are
/// visible. Glyphs are greeked cells on a monospaced grid, wrapped at the clip
/// width; a steady cursor block marks the reveal point while typing.
fn draw_typing(frame: &mut FrameRGBA, clip: RectPx, text: &str, local_time: f64, color: [u8; 4]) {
    if clip.is_empty() || text.is_empty() {
        return;
    }

    let total = text.chars().count();
    let revealed = ((local_time * TYPE_CHARS_PER_SEC).floor() as usize).min(total);
    let cols = (clip.w / CELL_W).max(1);

    let mut col = 0i32;
    let mut row = 0i32;
    for (i, ch) in text.chars().enumerate() {
        if i >= revealed {
            break;
        }
        if ch == '\n' {
            col = 0;
            row += 1;
            continue;
        }
        if col >= cols {
            col = 0;
            row += 1;
        }
        if clip.y + row * CELL_H >= clip.y + clip.h {
            return;
        }
        if !ch.is_whitespace() {
            draw_glyph_cell(frame, clip, col, row, ch, color);
        }
        col += 1;
    }

    if revealed < total {
        if col >= cols {
            col = 0;
            row += 1;
        }
        let cursor = RectPx::new(
            clip.x + col * CELL_W,
            clip.y + row * CELL_H + (CELL_H - GLYPH_H) / 2 - 1,
            GLYPH_W + 1,
            GLYPH_H + 2,
        )
        .intersect(clip);
        raster::fill_rect(&mut frame.data, frame.width, frame.height, cursor, color);
    }
}

fn draw_glyph_cell(frame: &mut FrameRGBA, clip: RectPx, col: i32, row: i32, ch: char, color: [u8; 4]) {
    // Deterministic per-character height variation reads as greeked text.
    let drop = (ch as u32 % 3) as i32;
    let rect = RectPx::new(
        clip.x + col * CELL_W,
        clip.y + row * CELL_H + (CELL_H - GLYPH_H) / 2 + drop,
        GLYPH_W,
        GLYPH_H - drop,
    )
    .intersect(clip);
    raster::fill_rect(&mut frame.data, frame.width, frame.height, rect, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_source;

    fn canvas() -> Canvas {
        Canvas {
            width: 64,
            height: 48,
        }
    }

    fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
        let o = ((y * frame.width + x) * 4) as usize;
        [
            frame.data[o],
            frame.data[o + 1],
            frame.data[o + 2],
            frame.data[o + 3],
        ]
    }

    #[test]
    fn split_panels_plus_divider_sum_to_container() {
        let c = canvas();
        for ratio in [0.01, 0.1, 0.3, 0.5, 0.7, 0.99] {
            let (a, d, b) = split_rects(c, Direction::Vertical, ratio);
            assert_eq!(a.w + d.w + b.w, c.width as i32, "ratio={ratio}");
            assert_eq!(a.h, c.height as i32);

            let (a, d, b) = split_rects(c, Direction::Horizontal, ratio);
            assert_eq!(a.h + d.h + b.h, c.height as i32, "ratio={ratio}");
            assert_eq!(a.w, c.width as i32);
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let (tl, _) = compile_source(
            "```scene\nkind: split\ndirection: vertical\nratio: 0.3\nduration: 3\nleft.content: abc\nright.content: def\n```\n",
        );
        let assets = PreparedAssets::empty();
        let a = render_time(&tl, 1.25, canvas(), &assets);
        let b = render_time(&tl, 1.25, canvas(), &assets);
        assert_eq!(a, b);
        assert!(a.premultiplied);
        assert_eq!(a.data.len(), 64 * 48 * 4);
    }

    #[test]
    fn panel_backgrounds_and_divider_land_where_expected() {
        let src = "```scene\nkind: split\ndirection: vertical\nratio: 0.5\nduration: 1\nleft.background: #ff0000\nright.background: #0000ff\n```\n";
        let (tl, diags) = compile_source(src);
        assert!(diags.is_empty());
        let frame = render_time(&tl, 0.0, canvas(), &PreparedAssets::empty());

        let (a, d, b) = split_rects(canvas(), Direction::Vertical, 0.5);
        assert_eq!(px(&frame, 1, 1), [255, 0, 0, 255]);
        assert_eq!(px(&frame, d.x as u32, 1), DIVIDER_COLOR);
        assert_eq!(px(&frame, (b.x + 1) as u32, 1), [0, 0, 255, 255]);
        assert!(a.w > 0 && b.w > 0);
    }

    #[test]
    fn panel_content_is_clipped_to_its_region() {
        // Long left content at full reveal; nothing may cross the divider.
        let src = "```scene\nkind: split\ndirection: vertical\nratio: 0.5\nduration: 100\nleft.background: #000000\nright.background: #0000ff\nleft.content: xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx\n```\n";
        let (tl, _) = compile_source(src);
        let frame = render_time(&tl, 99.0, canvas(), &PreparedAssets::empty());

        let (_, d, b) = split_rects(canvas(), Direction::Vertical, 0.5);
        for y in 0..frame.height {
            for x in (b.x as u32)..frame.width {
                assert_eq!(px(&frame, x, y), [0, 0, 255, 255], "bleed at ({x},{y})");
            }
            assert_eq!(px(&frame, d.x as u32, y), DIVIDER_COLOR);
        }
    }

    #[test]
    fn typing_reveal_advances_with_local_time() {
        let (tl, _) = compile_source("```scene\nkind: text\nduration: 10\ncontent: hello world\n```\n");
        let assets = PreparedAssets::empty();
        // Wide enough that the whole line fits on one visible glyph row.
        let big = Canvas {
            width: 128,
            height: 96,
        };
        let t0 = render_time(&tl, 0.0, big, &assets);
        let t1 = render_time(&tl, 0.2, big, &assets);
        let t2 = render_time(&tl, 5.0, big, &assets);
        assert_ne!(t0.data, t1.data);
        assert_ne!(t1.data, t2.data);
        // Fully revealed: stable from here on.
        let t3 = render_time(&tl, 6.0, big, &assets);
        assert_eq!(t2.data, t3.data);
    }

    #[test]
    fn missing_image_renders_placeholder_not_error() {
        let (tl, _) = compile_source("```scene\nkind: image\nsource: absent.png\nduration: 2\n```\n");
        let frame = render_time(&tl, 1.0, canvas(), &PreparedAssets::empty());
        let bg = FrameRGBA::solid(canvas(), DEFAULT_BACKGROUND);
        assert_ne!(frame.data, bg.data);
    }

    #[test]
    fn crossfade_blends_between_scene_frames() {
        let src = "\
```scene
kind: text
duration: 4
background: #ff0000
content:
```
```scene
kind: text
duration: 4
start: 2
background: #0000ff
content:
```
";
        let (tl, _) = compile_source(src);
        let assets = PreparedAssets::empty();

        // Mid-window: equal blend of the two backgrounds.
        let frame = render_time(&tl, 3.0, canvas(), &assets);
        let p = px(&frame, 40, 40);
        assert!(p[0] > 100 && p[0] < 155, "r={}", p[0]);
        assert!(p[2] > 100 && p[2] < 155, "b={}", p[2]);

        // Outside the window: pure scene colors.
        assert_eq!(px(&render_time(&tl, 1.0, canvas(), &assets), 40, 40), [255, 0, 0, 255]);
        assert_eq!(px(&render_time(&tl, 5.0, canvas(), &assets), 40, 40), [0, 0, 255, 255]);
    }
}
