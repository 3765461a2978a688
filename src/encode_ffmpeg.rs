//! MP4 encoding via a piped system `ffmpeg` process.
//!
//! Frames arrive as premultiplied RGBA8, get flattened over an opaque
//! background, and are streamed to ffmpeg's stdin as rawvideo. The sink
//! targets libx264 / yuv420p output, which requires even dimensions.

use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    error::{ScenemarkError, ScenemarkResult},
    export::{FrameSink, SinkConfig},
    model::DEFAULT_BACKGROUND,
    render::FrameRGBA,
};

#[derive(Clone, Debug)]
pub struct FfmpegConfig {
    pub out_path: PathBuf,
    pub overwrite: bool,
    /// Opaque background every frame is flattened over before encoding.
    pub flatten_background: [u8; 4],
}

impl FfmpegConfig {
    pub fn mp4(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            flatten_background: DEFAULT_BACKGROUND,
        }
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ScenemarkResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn validate_sink_config(cfg: SinkConfig) -> ScenemarkResult<()> {
    if cfg.width == 0 || cfg.height == 0 {
        return Err(ScenemarkError::validation(
            "encode width/height must be non-zero",
        ));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(ScenemarkError::validation(
            "encode width/height must be even (required for yuv420p mp4 output)",
        ));
    }
    Ok(())
}

/// [`FrameSink`] that spawns `ffmpeg` on `begin` and pipes rawvideo frames to
/// its stdin. `end` closes stdin and waits for the process to exit.
pub struct FfmpegSink {
    cfg: FfmpegConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegSink {
    pub fn new(cfg: FfmpegConfig) -> Self {
        Self {
            cfg,
            child: None,
            stdin: None,
            scratch: Vec::new(),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ScenemarkResult<()> {
        validate_sink_config(cfg)?;
        ensure_parent_dir(&self.cfg.out_path)?;

        if !self.cfg.overwrite && self.cfg.out_path.exists() {
            return Err(ScenemarkError::validation(format!(
                "output file '{}' already exists",
                self.cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(ScenemarkError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        // We intentionally use the system `ffmpeg` binary rather than `ffmpeg-next` to avoid
        // native FFmpeg dev header/lib requirements.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ScenemarkError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScenemarkError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        self.scratch = vec![0u8; (cfg.width * cfg.height * 4) as usize];
        self.child = Some(child);
        self.stdin = Some(stdin);
        Ok(())
    }

    fn push_frame(&mut self, _timestamp_secs: f64, frame: &FrameRGBA) -> ScenemarkResult<()> {
        if frame.data.len() != self.scratch.len() {
            return Err(ScenemarkError::validation(format!(
                "frame size mismatch: got {}x{}, expected {} rgba bytes",
                frame.width,
                frame.height,
                self.scratch.len()
            )));
        }

        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.cfg.flatten_background,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ScenemarkError::encode("ffmpeg sink is not started"));
        };

        stdin.write_all(&self.scratch).map_err(|e| {
            ScenemarkError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    fn end(&mut self) -> ScenemarkResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Ok(());
        };

        let output = child.wait_with_output().map_err(|e| {
            ScenemarkError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScenemarkError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> ScenemarkResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ScenemarkError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }

        let inv = 255u16 - a;

        let (r, g, b) = if src_is_premul {
            (
                s[0] as u16 + mul_div255(bg_r, inv),
                s[1] as u16 + mul_div255(bg_g, inv),
                s[2] as u16 + mul_div255(bg_b, inv),
            )
        } else {
            (
                mul_div255(s[0] as u16, a) + mul_div255(bg_r, inv),
                mul_div255(s[1] as u16, a) + mul_div255(bg_g, inv),
                mul_div255(s[2] as u16, a) + mul_div255(bg_b, inv),
            )
        };

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Fps;

    fn sink_cfg(width: u32, height: u32) -> SinkConfig {
        SinkConfig {
            width,
            height,
            fps: Fps::new(30, 1).unwrap(),
        }
    }

    #[test]
    fn config_validation_catches_bad_dimensions() {
        assert!(validate_sink_config(sink_cfg(0, 10)).is_err());
        assert!(validate_sink_config(sink_cfg(11, 10)).is_err());
        assert!(validate_sink_config(sink_cfg(10, 11)).is_err());
        assert!(validate_sink_config(sink_cfg(640, 360)).is_ok());
    }

    #[test]
    fn flatten_premul_over_black_produces_expected_rgb() {
        // Premultiplied red @ 50% alpha => rgb is 128,0,0 when premul.
        let src = vec![128u8, 0u8, 0u8, 128u8];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, true, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
    }

    #[test]
    fn flatten_straight_over_black_produces_expected_rgb() {
        // Straight red @ 50% alpha => rgb becomes 128,0,0 over black.
        let src = vec![255u8, 0u8, 0u8, 128u8];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, false, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
    }

    #[test]
    fn opaque_pixels_pass_through() {
        let src = vec![10u8, 20u8, 30u8, 255u8];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, true, [99, 99, 99, 255]).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn push_before_begin_is_an_error() {
        let mut sink = FfmpegSink::new(FfmpegConfig::mp4("out/test.mp4"));
        let frame = FrameRGBA::solid(
            crate::core::Canvas {
                width: 2,
                height: 2,
            },
            [0, 0, 0, 255],
        );
        // scratch is empty before begin, so the size check fires first.
        assert!(sink.push_frame(0.0, &frame).is_err());
    }
}
