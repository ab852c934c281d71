use serde::{Deserialize, Serialize};

/// Maps linear time progress onto transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    /// Accelerates through the first half and decelerates through the second.
    #[default]
    QuadraticInOut,
}

impl Easing {
    /// `t` is clamped into `[0, 1]`; the result always lies in `[0, 1]` with
    /// `apply(0) == 0` and `apply(1) == 1`.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}
