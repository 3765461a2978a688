//! Export driver: steps the clock at a fixed frame rate and streams rendered
//! frames to an encoder sink.
//!
//! Frames are produced for `f in 0..ceil(total_duration * fps)` at
//! `t = f / fps` and submitted in strictly increasing time order. A bounded
//! channel between the render loop and the encoder thread is the sole
//! backpressure mechanism: a saturated encoder blocks the loop, it never drops
//! or reorders frames.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc,
};

use crate::{
    assets::PreparedAssets,
    core::{Canvas, Fps},
    error::{ScenemarkError, ScenemarkResult},
    model::Timeline,
    render::{self, FrameRGBA},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

/// Encoder collaborator contract. `Send` because the export driver runs the
/// sink on its encoder thread.
///
/// Ordering: `push_frame` is called with strictly increasing timestamps. A
/// returned error is terminal for the export run; the driver never retries.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> ScenemarkResult<()>;
    fn push_frame(&mut self, timestamp_secs: f64, frame: &FrameRGBA) -> ScenemarkResult<()>;
    fn end(&mut self) -> ScenemarkResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    ended: bool,
    /// Frames in submission order.
    pub frames: Vec<(f64, FrameRGBA)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ScenemarkResult<()> {
        self.cfg = Some(cfg);
        self.ended = false;
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, timestamp_secs: f64, frame: &FrameRGBA) -> ScenemarkResult<()> {
        self.frames.push((timestamp_secs, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ScenemarkResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Cooperative cancellation, checked between frames. The in-flight frame
/// completes; already-submitted frames are not rolled back.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ExportConfig {
    pub canvas: Canvas,
    pub fps: Fps,
}

#[derive(Clone, Copy, Debug)]
pub struct ExportOpts {
    /// Bounded channel capacity between the render loop and the encoder
    /// thread.
    pub channel_capacity: usize,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            channel_capacity: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub frames_total: u64,
    pub frames_submitted: u64,
    pub cancelled: bool,
}

struct FrameMsg {
    timestamp_secs: f64,
    frame: FrameRGBA,
}

/// Run a full export. The timeline is read-only and may be shared with a
/// concurrently running preview loop.
#[tracing::instrument(skip_all, fields(fps = cfg.fps.as_f64(), duration = timeline.total_duration()))]
pub fn export(
    timeline: &Timeline,
    assets: &PreparedAssets,
    cfg: ExportConfig,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
    opts: ExportOpts,
) -> ScenemarkResult<ExportStats> {
    cfg.canvas.validate()?;

    let frames_total = cfg.fps.frame_count(timeline.total_duration());
    let cap = opts.channel_capacity.max(1);
    let sink_cfg = SinkConfig {
        width: cfg.canvas.width,
        height: cfg.canvas.height,
        fps: cfg.fps,
    };

    std::thread::scope(|scope| -> ScenemarkResult<ExportStats> {
        let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
        let sink_ref: &mut dyn FrameSink = sink;

        let enc = scope.spawn(move || -> ScenemarkResult<()> {
            sink_ref.begin(sink_cfg)?;
            while let Ok(msg) = rx.recv() {
                sink_ref.push_frame(msg.timestamp_secs, &msg.frame)?;
            }
            sink_ref.end()
        });

        let mut submitted = 0u64;
        let mut cancelled = false;
        let mut produce_err: Option<ScenemarkError> = None;
        for f in 0..frames_total {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let t = cfg.fps.frame_to_secs(f);
            let frame = render::render_time(timeline, t, cfg.canvas, assets);
            if tx
                .send(FrameMsg {
                    timestamp_secs: t,
                    frame,
                })
                .is_err()
            {
                // Receiver gone: the sink failed; surface its error below.
                produce_err = Some(ScenemarkError::encode("encoder is not accepting frames"));
                break;
            }
            submitted += 1;
        }

        drop(tx);
        let enc_res = enc
            .join()
            .map_err(|_| ScenemarkError::encode("encoder thread panicked"))?;
        enc_res?;
        if let Some(e) = produce_err {
            return Err(e);
        }

        Ok(ExportStats {
            frames_total,
            frames_submitted: submitted,
            cancelled,
        })
    })
}
