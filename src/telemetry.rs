use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{GaugeError, GaugeResult},
    window::TimeWindow,
};

/// One sample as extracted from the source container.
///
/// The container format itself (TCX, FIT, ...) is parsed by a collaborator;
/// this crate only consumes the extracted scalar fields. Every field except
/// the timestamp is optional and defaults to zero (distance stays absent).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawSample {
    pub time: Option<String>,
    pub power: Option<u32>,
    #[serde(alias = "hr")]
    pub heart_rate: Option<u32>,
    pub cadence: Option<u32>,
    pub distance: Option<f64>,
}

/// One normalized telemetry sample.
///
/// `speed` is derived from consecutive distance readings, never read from
/// the source. Timestamps are UTC from the moment of ingestion onward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trackpoint {
    pub time: DateTime<Utc>,
    pub power: u32,
    pub heart_rate: u32,
    pub cadence: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub distance: Option<f64>,
    /// Meters per second, derived (see [`TimeSeries::build`]).
    pub speed: f64,
}

// Source timestamps carry a literal `Z` suffix, with or without a
// sub-second fraction. Anything else is skipped, not fatal.
const TS_WITH_FRACTION: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const TS_WHOLE_SECONDS: &str = "%Y-%m-%dT%H:%M:%SZ";

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    for fmt in [TS_WITH_FRACTION, TS_WHOLE_SECONDS] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

pub(crate) fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}

/// An ordered, validated telemetry series.
///
/// Construction guarantees at least one point and non-decreasing timestamps
/// (ties allowed). The sequence is immutable once built.
#[derive(Clone, Debug)]
pub struct TimeSeries {
    points: Vec<Trackpoint>,
}

impl TimeSeries {
    /// Build a series from raw samples.
    ///
    /// Samples whose timestamp is absent, unparsable, or earlier than the
    /// previously accepted sample are skipped with a warning. Fails with
    /// [`GaugeError::EmptySeries`] when nothing survives.
    pub fn build(samples: &[RawSample]) -> GaugeResult<Self> {
        let mut points: Vec<Trackpoint> = Vec::with_capacity(samples.len());

        for sample in samples {
            let Some(raw_time) = sample.time.as_deref() else {
                tracing::warn!("skipping sample without a timestamp");
                continue;
            };
            let Some(time) = parse_timestamp(raw_time) else {
                tracing::warn!(timestamp = raw_time, "skipping sample with unparsable timestamp");
                continue;
            };
            if let Some(prev) = points.last()
                && time < prev.time
            {
                tracing::warn!(timestamp = raw_time, "skipping out-of-order sample");
                continue;
            }

            points.push(Trackpoint {
                time,
                power: sample.power.unwrap_or(0),
                heart_rate: sample.heart_rate.unwrap_or(0),
                cadence: sample.cadence.unwrap_or(0),
                distance: sample.distance,
                speed: 0.0,
            });
        }

        if points.is_empty() {
            return Err(GaugeError::EmptySeries);
        }

        derive_speed(&mut points);
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Trackpoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// First sample timestamp (the series is never empty).
    pub fn start(&self) -> DateTime<Utc> {
        self.points[0].time
    }

    /// Last sample timestamp.
    pub fn end(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].time
    }

    /// The contiguous subsequence with `window.start() <= time <= window.end()`,
    /// inclusive on both ends. Empty when no point falls inside; callers that
    /// need data must treat that as fatal before resampling.
    pub fn slice(&self, window: &TimeWindow) -> &[Trackpoint] {
        let start = self.points.partition_point(|p| p.time < window.start());
        let end = self.points.partition_point(|p| p.time <= window.end());
        &self.points[start..end]
    }
}

// Single forward pass: each point's speed depends only on its predecessor.
fn derive_speed(points: &mut [Trackpoint]) {
    let mut prev_speed = 0.0;
    let mut prev: Option<(DateTime<Utc>, Option<f64>)> = None;

    for point in points.iter_mut() {
        let speed = match prev {
            None => 0.0,
            Some((prev_time, prev_dist)) => match (prev_dist, point.distance) {
                (Some(d0), Some(d1)) => {
                    let dt = seconds_between(prev_time, point.time);
                    if dt > 0.0 { (d1 - d0) / dt } else { prev_speed }
                }
                _ => prev_speed,
            },
        };
        point.speed = speed;
        prev_speed = speed;
        prev = Some((point.time, point.distance));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: &str, power: u32, hr: u32, distance: Option<f64>) -> RawSample {
        RawSample {
            time: Some(time.to_string()),
            power: Some(power),
            heart_rate: Some(hr),
            cadence: Some(0),
            distance,
        }
    }

    #[test]
    fn parses_both_timestamp_formats() {
        assert!(parse_timestamp("2023-05-01T06:30:00Z").is_some());
        assert!(parse_timestamp("2023-05-01T06:30:00.250Z").is_some());
    }

    #[test]
    fn rejects_offset_and_garbage_timestamps() {
        assert!(parse_timestamp("2023-05-01T06:30:00+02:00").is_none());
        assert!(parse_timestamp("2023-05-01 06:30:00").is_none());
        assert!(parse_timestamp("not a time").is_none());
    }

    #[test]
    fn build_skips_unparsable_and_keeps_the_rest() {
        let samples = vec![
            sample("2023-05-01T06:30:00Z", 100, 120, None),
            RawSample {
                time: Some("yesterday-ish".to_string()),
                ..Default::default()
            },
            RawSample::default(),
            sample("2023-05-01T06:30:01Z", 110, 121, None),
        ];
        let series = TimeSeries::build(&samples).unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.len() <= samples.len());
    }

    #[test]
    fn build_fails_with_empty_series_when_nothing_survives() {
        let samples = vec![
            RawSample {
                time: Some("bogus".to_string()),
                ..Default::default()
            },
            RawSample::default(),
        ];
        assert!(matches!(
            TimeSeries::build(&samples),
            Err(GaugeError::EmptySeries)
        ));
    }

    #[test]
    fn build_skips_out_of_order_samples() {
        let samples = vec![
            sample("2023-05-01T06:30:05Z", 100, 120, None),
            sample("2023-05-01T06:30:01Z", 110, 121, None),
            sample("2023-05-01T06:30:06Z", 120, 122, None),
        ];
        let series = TimeSeries::build(&samples).unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.start() <= series.end());
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let samples = vec![RawSample {
            time: Some("2023-05-01T06:30:00Z".to_string()),
            ..Default::default()
        }];
        let series = TimeSeries::build(&samples).unwrap();
        let p = &series.points()[0];
        assert_eq!((p.power, p.heart_rate, p.cadence), (0, 0, 0));
        assert_eq!(p.distance, None);
        assert_eq!(p.speed, 0.0);
    }

    #[test]
    fn speed_is_one_meter_per_second_on_uniform_distance() {
        let samples: Vec<RawSample> = (0..5)
            .map(|i| sample(&format!("2023-05-01T06:30:0{i}Z"), 0, 0, Some(i as f64)))
            .collect();
        let series = TimeSeries::build(&samples).unwrap();
        assert_eq!(series.points()[0].speed, 0.0);
        for p in &series.points()[1..] {
            assert!((p.speed - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn speed_inherits_on_missing_distance_and_zero_dt() {
        let samples = vec![
            sample("2023-05-01T06:30:00Z", 0, 0, Some(0.0)),
            sample("2023-05-01T06:30:02Z", 0, 0, Some(4.0)),
            sample("2023-05-01T06:30:03Z", 0, 0, None),
            sample("2023-05-01T06:30:03Z", 0, 0, Some(6.0)),
        ];
        let series = TimeSeries::build(&samples).unwrap();
        let speeds: Vec<f64> = series.points().iter().map(|p| p.speed).collect();
        assert_eq!(speeds[0], 0.0);
        assert!((speeds[1] - 2.0).abs() < 1e-9);
        // missing distance inherits
        assert!((speeds[2] - 2.0).abs() < 1e-9);
        // zero time delta inherits
        assert!((speeds[3] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn slice_is_inclusive_and_idempotent() {
        let samples: Vec<RawSample> = (0..6)
            .map(|i| sample(&format!("2023-05-01T06:30:0{i}Z"), i, 100 + i, None))
            .collect();
        let series = TimeSeries::build(&samples).unwrap();

        let window = TimeWindow::from_utc(
            parse_timestamp("2023-05-01T06:30:01Z").unwrap(),
            parse_timestamp("2023-05-01T06:30:04Z").unwrap(),
        )
        .unwrap();

        let first = series.slice(&window);
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].power, 1);
        assert_eq!(first[3].power, 4);

        // Rebuilding from the slice and slicing again yields the same points.
        let rebuilt = TimeSeries {
            points: first.to_vec(),
        };
        assert_eq!(rebuilt.slice(&window), first);
    }

    #[test]
    fn slice_outside_the_series_is_empty() {
        let samples = vec![sample("2023-05-01T06:30:00Z", 1, 2, None)];
        let series = TimeSeries::build(&samples).unwrap();
        let window = TimeWindow::from_utc(
            parse_timestamp("2024-01-01T00:00:00Z").unwrap(),
            parse_timestamp("2024-01-01T01:00:00Z").unwrap(),
        )
        .unwrap();
        assert!(series.slice(&window).is_empty());
    }

    #[test]
    fn trackpoint_serializes_rfc3339_times() {
        let series = TimeSeries::build(&[sample("2023-05-01T06:30:00Z", 7, 8, Some(1.5))]).unwrap();
        let json = serde_json::to_string(&series.points()[0]).unwrap();
        assert!(json.contains("2023-05-01T06:30:00Z"));
        let back: Trackpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series.points()[0]);
    }
}
