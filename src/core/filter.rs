//! Windowed-sinc FIR lowpass filter.
//!
//! Coefficients follow the classic design: an ideal lowpass impulse
//! response `c * sinc(c * m)` (with `c` the cutoff as a fraction of the
//! Nyquist frequency and `m` the distance from the centre tap), multiplied
//! by a symmetric window and scaled to unity gain at DC.
//!
//! Filtering is a "same"-length convolution with implicit zero padding, so
//! the output lines up index for index with the input. The first and last
//! `tap_length` samples are affected by the padding.

use crate::core::alignment::Window;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when a filter cannot be designed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(f64),
    #[error("tap length must be odd and non-zero, got {0}")]
    InvalidTapLength(usize),
    #[error("cutoff {cutoff} Hz must lie strictly between 0 and the Nyquist frequency {nyquist} Hz")]
    CutoffOutOfRange { cutoff: f64, nyquist: f64 },
    #[error("unknown window function '{0}'")]
    UnknownWindow(String),
}

/// Window applied to the ideal impulse response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    Boxcar,
    #[default]
    Hamming,
    Hann,
    Blackman,
    Bartlett,
}

impl WindowFunction {
    pub fn name(&self) -> &'static str {
        match self {
            WindowFunction::Boxcar => "boxcar",
            WindowFunction::Hamming => "hamming",
            WindowFunction::Hann => "hann",
            WindowFunction::Blackman => "blackman",
            WindowFunction::Bartlett => "bartlett",
        }
    }

    /// Symmetric window of `length` points.
    pub fn weights(&self, length: usize) -> Vec<f64> {
        if length <= 1 {
            return vec![1.0; length];
        }
        let span = (length - 1) as f64;
        (0..length)
            .map(|n| {
                let x = n as f64 / span;
                match self {
                    WindowFunction::Boxcar => 1.0,
                    WindowFunction::Hamming => 0.54 - 0.46 * (2.0 * PI * x).cos(),
                    WindowFunction::Hann => 0.5 - 0.5 * (2.0 * PI * x).cos(),
                    WindowFunction::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
                    }
                    WindowFunction::Bartlett => 1.0 - (2.0 * x - 1.0).abs(),
                }
            })
            .collect()
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowFunction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "boxcar" | "rectangular" | "rect" => Ok(WindowFunction::Boxcar),
            "hamming" => Ok(WindowFunction::Hamming),
            "hann" | "hanning" => Ok(WindowFunction::Hann),
            "blackman" => Ok(WindowFunction::Blackman),
            "bartlett" | "triangle" => Ok(WindowFunction::Bartlett),
            other => Err(FilterError::UnknownWindow(other.to_string())),
        }
    }
}

/// Filter design parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub sample_rate_hz: f64,
    /// Number of coefficients; odd so the filter has a centre tap
    pub tap_length: usize,
    pub cutoff_hz: f64,
    pub window: WindowFunction,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            sample_rate_hz: 100.0,
            tap_length: 21,
            cutoff_hz: 5.0,
            window: WindowFunction::Hamming,
        }
    }
}

impl FilterSpec {
    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz / 2.0
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(FilterError::InvalidSampleRate(self.sample_rate_hz));
        }
        if self.tap_length % 2 == 0 {
            return Err(FilterError::InvalidTapLength(self.tap_length));
        }
        let nyquist = self.nyquist_hz();
        if !(self.cutoff_hz > 0.0 && self.cutoff_hz < nyquist) {
            return Err(FilterError::CutoffOutOfRange {
                cutoff: self.cutoff_hz,
                nyquist,
            });
        }
        Ok(())
    }
}

/// Normalised sinc, `sin(pi x) / (pi x)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Design lowpass coefficients for a validated spec.
fn firwin(spec: &FilterSpec) -> Vec<f64> {
    let cutoff = spec.cutoff_hz / spec.nyquist_hz();
    let centre = (spec.tap_length - 1) as f64 / 2.0;

    let mut taps: Vec<f64> = spec
        .window
        .weights(spec.tap_length)
        .into_iter()
        .enumerate()
        .map(|(n, weight)| cutoff * sinc(cutoff * (n as f64 - centre)) * weight)
        .collect();

    let gain: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= gain;
    }
    taps
}

/// A designed lowpass filter.
#[derive(Debug, Clone, PartialEq)]
pub struct LowPassFilter {
    spec: FilterSpec,
    coefficients: Vec<f64>,
}

impl LowPassFilter {
    pub fn new(spec: FilterSpec) -> Result<Self, FilterError> {
        spec.validate()?;
        let coefficients = firwin(&spec);
        Ok(Self { spec, coefficients })
    }

    /// Build from individual parameters, parsing the window by name.
    pub fn design(
        sample_rate_hz: f64,
        tap_length: usize,
        cutoff_hz: f64,
        window: &str,
    ) -> Result<Self, FilterError> {
        Self::new(FilterSpec {
            sample_rate_hz,
            tap_length,
            cutoff_hz,
            window: window.parse()?,
        })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Samples at each end of an output that the zero padding affects.
    pub fn boundary(&self) -> usize {
        self.spec.tap_length
    }

    /// Convolve `series` with the coefficients, keeping the input length.
    pub fn apply(&self, series: &[f64]) -> Vec<f64> {
        let taps = self.coefficients.len();
        let offset = (taps - 1) / 2;
        let len = series.len();

        (0..len)
            .map(|i| {
                // Output i is full-convolution index i + offset.
                let full = i + offset;
                let first = full.saturating_sub(len - 1);
                let last = full.min(taps - 1);
                (first..=last)
                    .map(|k| self.coefficients[k] * series[full - k])
                    .sum()
            })
            .collect()
    }

    /// Filter the values of a window, keeping its times.
    pub fn apply_window(&self, window: &Window) -> Window {
        Window {
            relative_times: window.relative_times.clone(),
            values: self.apply(&window.values),
        }
    }

    /// Drop the boundary-affected samples from both ends of a window.
    /// Windows no longer than twice the boundary come back empty.
    pub fn trim_boundary(&self, window: &Window) -> Window {
        let boundary = self.boundary();
        if window.len() <= 2 * boundary {
            return Window::default();
        }
        let range = boundary..window.len() - boundary;
        Window {
            relative_times: window.relative_times[range.clone()].to_vec(),
            values: window.values[range].to_vec(),
        }
    }
}
