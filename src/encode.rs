use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::{Canvas, FrameIndex, Fps},
    error::{GaugeError, GaugeResult},
    render::FrameRGBA,
};

#[derive(Clone, Copy, Debug)]
pub struct SinkConfig {
    pub canvas: Canvas,
    pub fps: Fps,
}

impl SinkConfig {
    pub fn validate(&self) -> GaugeResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(GaugeError::validation("sink width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            // We target yuv420p output for maximum player compatibility.
            return Err(GaugeError::validation(
                "sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps.den != 1 {
            return Err(GaugeError::validation(
                "mp4 encoding currently requires integer fps (fps.den == 1)",
            ));
        }
        Ok(())
    }
}

/// Consumes rendered frames in strictly increasing [`FrameIndex`] order and
/// encodes them into a single output stream.
///
/// `open` must fail fast when the destination cannot be created; `close`
/// finalizes the stream; `abort` releases the underlying resource without
/// finalizing (the fate of a partial output file is the caller's decision).
pub trait VideoSink {
    fn open(&mut self, cfg: SinkConfig) -> GaugeResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> GaugeResult<()>;
    fn close(&mut self) -> GaugeResult<()>;
    fn abort(&mut self) {}
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

pub fn ensure_parent_dir(path: &Path) -> GaugeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            GaugeError::sink_open(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// MP4 sink backed by the system `ffmpeg` binary.
///
/// Raw RGBA frames are piped to ffmpeg stdin and encoded as
/// libx264/yuv420p with faststart. Using the system binary avoids native
/// FFmpeg dev header/lib requirements.
pub struct FfmpegSink {
    out_path: PathBuf,
    overwrite: bool,
    cfg: Option<SinkConfig>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    next_frame: u64,
}

impl FfmpegSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            cfg: None,
            child: None,
            stdin: None,
            next_frame: 0,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn out_path(&self) -> &Path {
        &self.out_path
    }
}

impl VideoSink for FfmpegSink {
    fn open(&mut self, cfg: SinkConfig) -> GaugeResult<()> {
        cfg.validate()?;
        ensure_parent_dir(&self.out_path)?;

        if !self.overwrite && self.out_path.exists() {
            return Err(GaugeError::sink_open(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(GaugeError::sink_open(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &cfg.fps.num.to_string(),
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
        .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            GaugeError::sink_open(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GaugeError::sink_open("failed to open ffmpeg stdin (unexpected)"))?;

        self.cfg = Some(cfg);
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.next_frame = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> GaugeResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(GaugeError::sink_write("sink is not open"));
        };
        if idx.0 != self.next_frame {
            return Err(GaugeError::sink_write(format!(
                "frames must arrive in order: got {}, expected {}",
                idx.0, self.next_frame
            )));
        }
        if frame.width != cfg.canvas.width || frame.height != cfg.canvas.height {
            return Err(GaugeError::sink_write(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }
        if frame.data.len() != (frame.width as usize) * (frame.height as usize) * 4 {
            return Err(GaugeError::sink_write(
                "frame data size mismatch with width*height*4",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(GaugeError::sink_write("sink is already finalized"));
        };
        use std::io::Write as _;
        stdin
            .write_all(&frame.data)
            .map_err(|e| GaugeError::sink_write(format!("failed to write frame to ffmpeg: {e}")))?;
        self.next_frame += 1;
        Ok(())
    }

    fn close(&mut self) -> GaugeResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Err(GaugeError::sink_write("sink is not open"));
        };
        let output = child
            .wait_with_output()
            .map_err(|e| GaugeError::sink_write(format!("failed to wait for ffmpeg: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GaugeError::sink_write(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Reap the child if the sink was neither closed nor aborted.
        self.abort();
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    closed: bool,
    /// Frames in timeline order.
    pub frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl VideoSink for InMemorySink {
    fn open(&mut self, cfg: SinkConfig) -> GaugeResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.closed = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> GaugeResult<()> {
        if self.cfg.is_none() {
            return Err(GaugeError::sink_write("sink is not open"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx.0 != last.0 + 1
        {
            return Err(GaugeError::sink_write(format!(
                "frames must arrive in order: got {}, expected {}",
                idx.0,
                last.0 + 1
            )));
        }
        if self.frames.is_empty() && idx.0 != 0 {
            return Err(GaugeError::sink_write(format!(
                "frames must start at 0: got {}",
                idx.0
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn close(&mut self) -> GaugeResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(w: u32, h: u32, fps: u32) -> SinkConfig {
        SinkConfig {
            canvas: Canvas {
                width: w,
                height: h,
            },
            fps: Fps { num: fps, den: 1 },
        }
    }

    fn frame(w: u32, h: u32) -> FrameRGBA {
        FrameRGBA {
            width: w,
            height: h,
            data: vec![0u8; (w * h * 4) as usize],
        }
    }

    #[test]
    fn sink_config_validation_catches_bad_values() {
        assert!(cfg(0, 10, 30).validate().is_err());
        assert!(cfg(11, 10, 30).validate().is_err());
        assert!(cfg(10, 10, 30).validate().is_ok());
        assert!(
            SinkConfig {
                canvas: Canvas {
                    width: 10,
                    height: 10
                },
                fps: Fps { num: 30, den: 2 },
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn in_memory_sink_records_ordered_frames() {
        let mut sink = InMemorySink::new();
        sink.open(cfg(4, 4, 30)).unwrap();
        sink.push_frame(FrameIndex(0), &frame(4, 4)).unwrap();
        sink.push_frame(FrameIndex(1), &frame(4, 4)).unwrap();
        sink.close().unwrap();
        assert_eq!(sink.frames.len(), 2);
        assert!(sink.is_closed());
    }

    #[test]
    fn in_memory_sink_rejects_out_of_order_frames() {
        let mut sink = InMemorySink::new();
        sink.open(cfg(4, 4, 30)).unwrap();
        assert!(matches!(
            sink.push_frame(FrameIndex(1), &frame(4, 4)),
            Err(GaugeError::SinkWrite(_))
        ));
        sink.push_frame(FrameIndex(0), &frame(4, 4)).unwrap();
        assert!(matches!(
            sink.push_frame(FrameIndex(2), &frame(4, 4)),
            Err(GaugeError::SinkWrite(_))
        ));
    }

    #[test]
    fn pushing_before_open_is_rejected() {
        let mut sink = InMemorySink::new();
        assert!(sink.push_frame(FrameIndex(0), &frame(4, 4)).is_err());

        let mut ffmpeg = FfmpegSink::new("out.mp4");
        assert!(matches!(
            ffmpeg.push_frame(FrameIndex(0), &frame(4, 4)),
            Err(GaugeError::SinkWrite(_))
        ));
    }

    #[test]
    fn ffmpeg_open_rejects_existing_file_without_overwrite() {
        let path = std::env::temp_dir().join(format!(
            "gaugecast_sink_exists_{}.mp4",
            std::process::id()
        ));
        std::fs::write(&path, b"placeholder").unwrap();
        let mut sink = FfmpegSink::new(&path).overwrite(false);
        let err = sink.open(cfg(4, 4, 30)).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, GaugeError::SinkOpen(_)));
    }
}
