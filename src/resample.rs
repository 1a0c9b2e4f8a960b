use serde::{Deserialize, Serialize};

use crate::{
    core::{FrameIndex, Fps},
    error::{GaugeError, GaugeResult},
    telemetry::{Trackpoint, seconds_between},
};

/// Metric values for one output video frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResampledFrame {
    pub frame_index: FrameIndex,
    pub power: f64,
    pub heart_rate: f64,
    pub watts_per_kg: f64,
}

/// Resample a sliced series to per-frame metric values.
///
/// The frame count is `round(duration_secs * fps)`, minimum 1. Power and
/// heart rate are linearly interpolated over the sample index axis, with the
/// target axis spanning the full index range end-inclusive, so the first and
/// last frames reproduce the first and last samples exactly (no
/// extrapolation). Watts-per-kilogram uses the fixed configured body weight;
/// a non-positive weight yields 0 for every frame.
///
/// The result is fully materialized: memory is bounded by video length times
/// a few floats per frame, which is fine for single workout segments.
pub fn resample_series(
    points: &[Trackpoint],
    fps: Fps,
    body_weight_kg: f64,
) -> GaugeResult<Vec<ResampledFrame>> {
    if points.is_empty() {
        return Err(GaugeError::validation(
            "resample requires a non-empty series slice",
        ));
    }

    let duration = seconds_between(points[0].time, points[points.len() - 1].time);
    let frame_count = ((duration * fps.as_f64()).round() as u64).max(1);

    let power: Vec<f64> = points.iter().map(|p| f64::from(p.power)).collect();
    let heart_rate: Vec<f64> = points.iter().map(|p| f64::from(p.heart_rate)).collect();

    let mut frames = Vec::with_capacity(frame_count as usize);
    for k in 0..frame_count {
        // Evenly spaced positions over [0, len-1], end-inclusive.
        let pos = if frame_count > 1 {
            (points.len() - 1) as f64 * k as f64 / (frame_count - 1) as f64
        } else {
            0.0
        };
        let p = lerp_at(&power, pos);
        frames.push(ResampledFrame {
            frame_index: FrameIndex(k),
            power: p,
            heart_rate: lerp_at(&heart_rate, pos),
            watts_per_kg: if body_weight_kg > 0.0 {
                p / body_weight_kg
            } else {
                0.0
            },
        });
    }
    Ok(frames)
}

// Piecewise-linear sample of `values` at fractional index `pos`, clamped to
// the axis ends.
fn lerp_at(values: &[f64], pos: f64) -> f64 {
    let last = values.len() - 1;
    if pos <= 0.0 {
        return values[0];
    }
    if pos >= last as f64 {
        return values[last];
    }
    let i = pos.floor() as usize;
    let frac = pos - i as f64;
    values[i] + (values[i + 1] - values[i]) * frac
}
