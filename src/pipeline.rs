use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    config::GaugeConfig,
    encode::{SinkConfig, VideoSink},
    error::{GaugeError, GaugeResult},
    render::GaugeRenderer,
    resample::resample_series,
    telemetry::{TimeSeries, Trackpoint},
    window::TimeWindow,
};

/// Receives pipeline progress updates.
///
/// Implementations may forward to a UI, a log, or nowhere; they may be
/// invoked from a background worker and must not block the pipeline.
pub trait ProgressSink {
    fn report(&self, percentage: u8, message: &str);
}

/// Reporter that swallows all updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percentage: u8, _message: &str) {}
}

/// Deletes the guarded file when dropped, on every exit path.
pub struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    pub fn path(&self) -> Option<&Path> {
        self.0.as_deref()
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Persist the sliced series as a transient JSON artifact (one record per
/// point, RFC 3339 timestamps) in the system temp directory.
///
/// The artifact only exists to decouple the resampler/renderer from the
/// slicer in process-separated deployments; the returned guard removes it
/// when dropped, success or failure.
pub fn write_slice_artifact(points: &[Trackpoint]) -> GaugeResult<TempFileGuard> {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let path = std::env::temp_dir().join(format!(
        "gaugecast_slice_{}_{nanos}.json",
        std::process::id()
    ));
    let json = serde_json::to_vec_pretty(points)
        .map_err(|e| GaugeError::validation(format!("failed to serialize sliced series: {e}")))?;
    std::fs::write(&path, json).map_err(|e| {
        GaugeError::validation(format!(
            "failed to write sliced series to '{}': {e}",
            path.display()
        ))
    })?;
    tracing::debug!(path = %path.display(), "sliced series persisted");
    Ok(TempFileGuard(Some(path)))
}

/// Run the full generation pipeline: slice, resample, render, encode.
///
/// Ordering of the fatal checks: an empty slice fails with
/// [`GaugeError::NoDataInRange`] before any rendering state exists; assets
/// load (and may fail) before the sink opens; the sink opens before the
/// first frame is rendered. On any failure mid-stream the sink resource is
/// released (`abort`) before the error propagates, and the transient
/// artifact is removed on every exit path.
#[tracing::instrument(skip_all)]
pub fn generate_video(
    series: &TimeSeries,
    window: &TimeWindow,
    config: &GaugeConfig,
    sink: &mut dyn VideoSink,
    progress: &dyn ProgressSink,
    cancel: &AtomicBool,
) -> GaugeResult<()> {
    progress.report(10, "Slicing telemetry data...");
    let slice = series.slice(window);
    if slice.is_empty() {
        return Err(GaugeError::NoDataInRange);
    }
    tracing::info!(points = slice.len(), "sliced series");
    let _artifact = write_slice_artifact(slice)?;

    let frames = resample_series(slice, config.fps, config.body_weight_kg)?;
    progress.report(20, "Rendering gauge frames...");

    let mut renderer = GaugeRenderer::load(config.clone())?;
    sink.open(SinkConfig {
        canvas: config.canvas,
        fps: config.fps,
    })?;

    let result = (|| -> GaugeResult<()> {
        let total = frames.len();
        // A couple of updates per second of output is plenty.
        let report_every = (config.fps.num as usize * 2).max(1);
        for (i, frame) in frames.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return Err(GaugeError::Cancelled);
            }
            let raster = renderer.render_frame(frame)?;
            sink.push_frame(frame.frame_index, &raster)?;
            if (i + 1).is_multiple_of(report_every) {
                // Render progress occupies the 20-95 band.
                let pct = 20 + ((i + 1) * 75 / total) as u8;
                progress.report(pct, &format!("Rendering frame {}/{total}", i + 1));
            }
        }
        sink.close()
    })();

    if let Err(err) = result {
        sink.abort();
        return Err(err);
    }

    tracing::info!(frames = frames.len(), "video generation finished");
    progress.report(100, "Video generation complete.");
    Ok(())
}
