//! gaugecast turns a time-stamped cycling telemetry series into an MP4 with
//! an animated metrics gauge, synchronized to real time.
//!
//! Pipeline: raw samples -> [`TimeSeries`] -> slice by [`TimeWindow`] ->
//! [`resample_series`] -> [`GaugeRenderer`] per frame -> [`VideoSink`].

#![forbid(unsafe_code)]

pub mod assets;
pub mod composite;
pub mod config;
pub mod core;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod resample;
pub mod telemetry;
pub mod text;
pub mod window;

pub use assets::{GaugeAssets, PreparedIcon};
pub use config::{GaugeConfig, GaugeLayout, Rgba};
pub use crate::core::{Canvas, FrameIndex, Fps};
pub use encode::{FfmpegSink, InMemorySink, SinkConfig, VideoSink, is_ffmpeg_on_path};
pub use error::{GaugeError, GaugeResult};
pub use pipeline::{NoProgress, ProgressSink, generate_video, write_slice_artifact};
pub use render::{FrameRGBA, GaugeKey, GaugeRenderer, heart_scale};
pub use resample::{ResampledFrame, resample_series};
pub use telemetry::{RawSample, TimeSeries, Trackpoint};
pub use window::{TimeWindow, WindowBound};
