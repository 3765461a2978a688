#![forbid(unsafe_code)]

pub mod assets;
pub mod clock;
pub mod compile;
pub mod core;
pub mod diag;
pub mod encode_ffmpeg;
pub mod error;
pub mod export;
pub mod guide;
pub mod model;
pub mod parse;
pub mod playback;
pub mod raster;
pub mod render;
pub mod session;
pub mod store;

pub use assets::{PreparedAssets, PreparedImage};
pub use clock::{ActiveScene, ClockSample};
pub use compile::compile_source;
pub use core::{Canvas, Fps};
pub use diag::{Diagnostic, Severity, SourceSpan};
pub use encode_ffmpeg::{FfmpegConfig, FfmpegSink, is_ffmpeg_on_path};
pub use error::{ScenemarkError, ScenemarkResult};
pub use export::{
    CancelToken, ExportConfig, ExportOpts, ExportStats, FrameSink, InMemorySink, SinkConfig,
};
pub use model::{
    Direction, Panel, Scene, SceneDescriptor, ScenePayload, Timeline, DEFAULT_BACKGROUND,
    DEFAULT_SCENE_DURATION_SECS,
};
pub use parse::parse_document;
pub use playback::{PlaybackEvent, PlaybackState, step};
pub use render::{FrameRGBA, render_time};
pub use session::EditSession;
pub use store::{
    IdGenerator, MemoryProjectStore, PROJECT_TTL, ProjectStore, SystemIdGenerator,
};
