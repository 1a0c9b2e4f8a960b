use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};

use crate::error::{GaugeError, GaugeResult};

/// One window endpoint as supplied by a caller, in whatever zone form it
/// arrived. [`TimeWindow::new`] normalizes it to UTC exactly once.
#[derive(Clone, Copy, Debug)]
pub enum WindowBound {
    Utc(DateTime<Utc>),
    FixedOffset(DateTime<FixedOffset>),
    /// Interpreted in the caller's local zone.
    NaiveLocal(NaiveDateTime),
}

impl WindowBound {
    fn to_utc(self) -> GaugeResult<DateTime<Utc>> {
        match self {
            Self::Utc(dt) => Ok(dt),
            Self::FixedOffset(dt) => Ok(dt.with_timezone(&Utc)),
            Self::NaiveLocal(naive) => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| {
                    GaugeError::invalid_window(format!(
                        "'{naive}' does not exist in the local zone"
                    ))
                }),
        }
    }
}

impl FromStr for WindowBound {
    type Err = GaugeError;

    /// Accepts RFC 3339 (zone-aware) or a naive local `YYYY-MM-DDTHH:MM:SS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::FixedOffset(dt));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::NaiveLocal(naive));
        }
        Err(GaugeError::invalid_window(format!(
            "unrecognized timestamp '{s}' (expected RFC 3339 or YYYY-MM-DDTHH:MM:SS)"
        )))
    }
}

/// A request window with both ends normalized to UTC; slicing treats both
/// ends as inclusive.
///
/// The series itself is stored in UTC, so every constructor converts its
/// inputs once, up front; comparisons never mix zones. `start < end` is
/// enforced here rather than left as a caller precondition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Normalize both bounds to UTC, then validate `start < end`.
    pub fn new(start: WindowBound, end: WindowBound) -> GaugeResult<Self> {
        Self::validated(start.to_utc()?, end.to_utc()?)
    }

    pub fn from_utc(start: DateTime<Utc>, end: DateTime<Utc>) -> GaugeResult<Self> {
        Self::validated(start, end)
    }

    /// Zone-aware bounds in any fixed offset are converted directly.
    pub fn from_fixed_offset(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> GaugeResult<Self> {
        Self::validated(start.with_timezone(&Utc), end.with_timezone(&Utc))
    }

    /// Naive bounds are interpreted in the caller's local zone, then converted.
    pub fn from_naive_local(start: NaiveDateTime, end: NaiveDateTime) -> GaugeResult<Self> {
        Self::new(WindowBound::NaiveLocal(start), WindowBound::NaiveLocal(end))
    }

    fn validated(start: DateTime<Utc>, end: DateTime<Utc>) -> GaugeResult<Self> {
        if start >= end {
            return Err(GaugeError::invalid_window(format!(
                "start ({start}) must be before end ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}
