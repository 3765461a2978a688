//! # Scenemark guide
//!
//! This module is a standalone, end-to-end walkthrough of Scenemark's architecture and public API.
//! It is intentionally detailed so future phases (and external integrations) can build on a shared
//! mental model of what "compiling a document" means in this codebase.
//!
//! If you are looking for copy/paste commands, start with the repository `README.md`.
//! If you are implementing new features, start here.
//!
//! ---
//!
//! ## Core concepts
//!
//! - a **document**: markdown text containing fenced ` ```scene ` directive blocks
//! - [`SceneDescriptor`](crate::SceneDescriptor): one parsed directive, not yet validated
//! - [`Timeline`](crate::Timeline): the immutable compiled artifact (sorted [`Scene`](crate::Scene)s)
//! - [`ClockSample`](crate::ClockSample): what is on screen at a point in time
//! - [`FrameRGBA`](crate::FrameRGBA): the output pixels (RGBA8, premultiplied alpha)
//! - [`FrameSink`](crate::FrameSink): the encoder seam driven by [`export`](crate::export::export)
//! - [`PreparedAssets`](crate::PreparedAssets): the only place render inputs touch the filesystem
//!
//! The pipeline is explicitly staged:
//!
//! 1. Parse directives: [`parse_document`](crate::parse_document)
//! 2. Compile a timeline: [`compile`](crate::compile::compile) (or
//!    [`compile_source`](crate::compile_source) for both steps)
//! 3. Sample the clock: [`clock::sample`](crate::clock::sample)
//! 4. Render pixels: [`render_time`](crate::render_time)
//! 5. Export frames: [`export`](crate::export::export) into a [`FrameSink`](crate::FrameSink)
//!
//! ---
//!
//! ## Diagnostics, never failures
//!
//! Parsing and compilation accept **any** text. Malformed directives degrade:
//! a bad attribute falls back to its default with a [`Diagnostic`](crate::Diagnostic),
//! an unknown scene kind drops that scene with a diagnostic, and the rest of the
//! document still compiles. This keeps live preview responsive while the user
//! is mid-edit; an editor shows the diagnostics list alongside the preview.
//!
//! Hard errors ([`ScenemarkError`](crate::ScenemarkError)) are reserved for the
//! edges: asset IO, encoding, and the project store.
//!
//! ---
//!
//! ## Time model
//!
//! Scenes are placed cursor-style: each scene starts where the previous one
//! ended unless it declares an explicit `start`. Explicit starts may overlap
//! the previous scene; the overlap window becomes a crossfade. The clock
//! ([`clock::sample`](crate::clock::sample)) is a pure function of
//! `(timeline, time)`:
//!
//! - before the first scene it clamps to the first scene at local time `0`
//! - at or past the total duration it clamps to the final frame of the
//!   last-ending scene
//! - inside an overlap it reports the outgoing scene and a crossfade weight
//!
//! Export calls the clock at `t = frame / fps` for
//! `ceil(total_duration * fps)` frames, so a preview scrubbed to time `t` and
//! the exported frame nearest `t` show the same composition.
//!
//! ---
//!
//! ## Premultiplied alpha (the pixel contract)
//!
//! The internal and output pixel convention is **premultiplied RGBA8**:
//!
//! - decoded images are premultiplied at ingest ([`PreparedAssets::prepare`](crate::PreparedAssets::prepare))
//! - [`render_time`](crate::render_time) outputs premultiplied pixels in [`FrameRGBA`](crate::FrameRGBA)
//! - CPU compositing (source-over, crossfade) assumes premultiplied alpha
//! - MP4 encoding flattens alpha over a background color
//!
//! Treat `FrameRGBA.data` as premultiplied unless explicitly stated otherwise.
//!
//! ---
//!
//! ## Compiling and rendering a document
//!
//! ```rust
//! use scenemark::{Canvas, PreparedAssets, compile_source, render_time};
//!
//! let (timeline, diagnostics) = compile_source(
//!     "```scene\n\
//!      kind: code\n\
//!      duration: 4\n\
//!      ---\n\
//!      fn main() {}\n\
//!      ```\n",
//! );
//! assert!(diagnostics.is_empty());
//! assert_eq!(timeline.len(), 1);
//!
//! let canvas = Canvas { width: 640, height: 360 };
//! let frame = render_time(&timeline, 1.5, canvas, &PreparedAssets::empty());
//! assert_eq!(frame.data.len(), 640 * 360 * 4);
//! assert!(frame.premultiplied);
//! ```
//!
//! ---
//!
//! ## Image sources and validation
//!
//! `image` scenes reference files through their `source` attribute. Path rules
//! are enforced when assets are prepared:
//!
//! - **relative** paths (no leading `/`)
//! - `/` separators only
//! - no `..` components
//!
//! Decoding happens once, up front, in [`PreparedAssets::prepare`](crate::PreparedAssets::prepare);
//! renderers never perform IO, which keeps every frame reproducible.
//!
//! ---
//!
//! ## MP4 encoding: `ffmpeg` as a runtime prerequisite
//!
//! Scenemark intentionally does not ship a built-in MP4 encoder. Instead,
//! [`FfmpegSink`](crate::FfmpegSink) wraps the system `ffmpeg` binary and
//! streams raw frames to its stdin. `ffmpeg` must be installed and on `PATH`;
//! if it is not available, `begin` returns a structured error and there is no
//! silent fallback. [`InMemorySink`](crate::InMemorySink) exists for tests and
//! tools that want frames without encoding.
//!
//! ---
//!
//! ## Sessions and the project store
//!
//! [`EditSession`](crate::EditSession) owns one document and its compiled
//! timeline behind an `Arc`. Edits recompile in full and swap the `Arc`
//! atomically, so an export or preview loop holding the previous timeline is
//! never left mid-mutation. [`ProjectStore`](crate::ProjectStore) persists
//! source text only (timelines are recompiled on load), with a 7-day TTL
//! ([`PROJECT_TTL`](crate::PROJECT_TTL)).
