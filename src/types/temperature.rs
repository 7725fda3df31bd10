use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A sampling temperature in the closed range `[0.0, 2.0]`.
///
/// Values outside the range, and NaN, are rejected by [`Temperature::new`]; use
/// [`Temperature::clamped`] to pull an arbitrary value into range instead.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Temperature(f32);

impl Temperature {
    /// Lowest accepted temperature.
    pub const MIN: f32 = 0.0;
    /// Highest accepted temperature.
    pub const MAX: f32 = 2.0;
    /// Slider granularity of the settings panel.
    pub const STEP: f32 = 0.1;

    /// Validates `value` and wraps it.
    pub fn new(value: f32) -> Result<Self> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::validation(
                format!(
                    "temperature must be between {} and {}, got {value}",
                    Self::MIN,
                    Self::MAX
                ),
                Some("temperature".to_string()),
            ))
        }
    }

    /// Pulls `value` into range; NaN becomes the default.
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            Self::default()
        } else {
            Self(value.clamp(Self::MIN, Self::MAX))
        }
    }

    /// The raw value.
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self(0.7)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl TryFrom<f32> for Temperature {
    type Error = Error;

    fn try_from(value: f32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Temperature> for f32 {
    fn from(temperature: Temperature) -> Self {
        temperature.0
    }
}
