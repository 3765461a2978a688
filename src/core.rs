use crate::error::{ScenemarkError, ScenemarkResult};

/// Frames per second as an exact rational (e.g. 30000/1001 for NTSC rates).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> ScenemarkResult<Self> {
        if num == 0 {
            return Err(ScenemarkError::validation("Fps num must be > 0"));
        }
        if den == 0 {
            return Err(ScenemarkError::validation("Fps den must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frame_to_secs(self, frame: u64) -> f64 {
        (frame as f64) * self.frame_duration_secs()
    }

    /// Number of frames covering `duration_secs`: `ceil(duration * fps)`.
    pub fn frame_count(self, duration_secs: f64) -> u64 {
        if duration_secs <= 0.0 {
            return 0;
        }
        (duration_secs * self.as_f64()).ceil() as u64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn validate(self) -> ScenemarkResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScenemarkError::validation(
                "canvas width/height must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
    }

    #[test]
    fn frame_count_is_ceil() {
        let fps = Fps::new(30, 1).unwrap();
        assert_eq!(fps.frame_count(1.0), 30);
        assert_eq!(fps.frame_count(1.01), 31);
        assert_eq!(fps.frame_count(0.0), 0);
        assert_eq!(fps.frame_count(-2.0), 0);
    }

    #[test]
    fn frame_to_secs_is_exact_for_integral_rates() {
        let fps = Fps::new(25, 1).unwrap();
        assert_eq!(fps.frame_to_secs(50), 2.0);
    }

    #[test]
    fn canvas_validation() {
        assert!(
            Canvas {
                width: 0,
                height: 10
            }
            .validate()
            .is_err()
        );
        assert!(
            Canvas {
                width: 640,
                height: 360
            }
            .validate()
            .is_ok()
        );
    }
}
