use crate::foundation::error::{CppnError, CppnResult};

/// Absolute 0-based frame index within a clip.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> CppnResult<Self> {
        if den == 0 {
            return Err(CppnError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(CppnError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Clip length in frames for a duration in seconds.
    ///
    /// Rounds to the nearest frame and never returns fewer than two frames, so every clip has a
    /// distinct loop point.
    pub fn frames_for_secs(self, secs: f64) -> u64 {
        let n = (secs * self.as_f64()).round();
        if n.is_finite() && n > 2.0 { n as u64 } else { 2 }
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Square canvas.
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }

    /// Pixel count.
    pub fn pixels(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of one packed RGB8 frame.
    pub fn rgb_len(self) -> usize {
        self.pixels() * 3
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
