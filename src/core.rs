use crate::error::{GaugeError, GaugeResult};

/// Zero-based index of a frame in the output video.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> GaugeResult<Self> {
        if den == 0 {
            return Err(GaugeError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(GaugeError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_terms() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
    }

    #[test]
    fn fps_seconds_conversions() {
        let fps = Fps::new(30, 1).unwrap();
        assert_eq!(fps.as_f64(), 30.0);
        assert_eq!(fps.frames_to_secs(60), 2.0);
        assert!((fps.frame_duration_secs() - 1.0 / 30.0).abs() < 1e-12);
    }
}
