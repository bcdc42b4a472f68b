//! Band-pass filtering of a slice.
//!
//! The preview engine only sees the [`SignalFilter`] trait; the spectral
//! implementation here is the one the viewer ships with.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Optional high-pass (`low_hz`) and low-pass (`high_hz`) cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub low_hz: Option<f64>,
    pub high_hz: Option<f64>,
}

impl FilterSpec {
    /// Build a spec, rejecting non-finite, non-positive and inverted cutoffs.
    pub fn new(low_hz: Option<f64>, high_hz: Option<f64>) -> Result<Self, FilterError> {
        for cutoff in low_hz.iter().chain(high_hz.iter()) {
            if !cutoff.is_finite() || *cutoff <= 0.0 {
                return Err(FilterError::NonFinite);
            }
        }
        if let (Some(low), Some(high)) = (low_hz, high_hz) {
            if low >= high {
                return Err(FilterError::InvalidBand { low, high });
            }
        }
        Ok(Self { low_hz, high_hz })
    }

    pub fn band(low_hz: f64, high_hz: f64) -> Result<Self, FilterError> {
        Self::new(Some(low_hz), Some(high_hz))
    }

    /// Neither cutoff set: the unfiltered slice is the result.
    pub fn is_passthrough(&self) -> bool {
        self.low_hz.is_none() && self.high_hz.is_none()
    }

    /// Check cutoffs against the Nyquist frequency of `sample_rate`.
    pub fn check_nyquist(&self, sample_rate: f64) -> Result<(), FilterError> {
        let nyquist = sample_rate / 2.0;
        for cutoff in self.low_hz.iter().chain(self.high_hz.iter()) {
            if *cutoff >= nyquist {
                return Err(FilterError::AboveNyquist {
                    cutoff: *cutoff,
                    nyquist,
                });
            }
        }
        Ok(())
    }

    /// Short label such as `1-40 Hz` for the status line.
    pub fn label(&self) -> String {
        match (self.low_hz, self.high_hz) {
            (Some(l), Some(h)) => format!("{l}-{h} Hz"),
            (Some(l), None) => format!(">{l} Hz"),
            (None, Some(h)) => format!("<{h} Hz"),
            (None, None) => "off".to_string(),
        }
    }
}

/// Computes a filtered copy of a per-channel sample matrix.
///
/// Called from worker threads; must not touch viewer state.
pub trait SignalFilter: Send + Sync {
    fn apply(
        &self,
        data: &[Vec<f64>],
        sample_rate: f64,
        spec: &FilterSpec,
    ) -> Result<Vec<Vec<f64>>, FilterError>;
}

/// Zero-phase FFT band-pass with a raised-cosine transition band.
#[derive(Debug, Clone)]
pub struct SpectralFilter {
    transition_hz: f64,
}

impl SpectralFilter {
    pub fn new(transition_hz: f64) -> Self {
        Self {
            transition_hz: transition_hz.max(0.0),
        }
    }

    /// Gain at `freq` for the given spec.
    pub fn gain(&self, freq: f64, spec: &FilterSpec) -> f64 {
        let half = self.transition_hz / 2.0;
        let mut g = 1.0;
        if let Some(low) = spec.low_hz {
            g *= rising_edge(freq, low - half, low + half);
        }
        if let Some(high) = spec.high_hz {
            g *= 1.0 - rising_edge(freq, high - half, high + half);
        }
        g
    }
}

impl Default for SpectralFilter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// 0 below `from`, 1 above `to`, raised cosine in between.
fn rising_edge(freq: f64, from: f64, to: f64) -> f64 {
    if freq <= from {
        0.0
    } else if freq >= to {
        1.0
    } else {
        0.5 - 0.5 * (PI * (freq - from) / (to - from)).cos()
    }
}

impl SignalFilter for SpectralFilter {
    fn apply(
        &self,
        data: &[Vec<f64>],
        sample_rate: f64,
        spec: &FilterSpec,
    ) -> Result<Vec<Vec<f64>>, FilterError> {
        if !(sample_rate > 0.0) {
            return Err(FilterError::Compute(format!(
                "invalid sample rate {sample_rate}"
            )));
        }
        spec.check_nyquist(sample_rate)?;
        if spec.is_passthrough() {
            return Ok(data.to_vec());
        }
        let n = data.first().map_or(0, Vec::len);
        if n == 0 {
            return Ok(data.to_vec());
        }

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);
        let gains: Vec<f64> = (0..n)
            .map(|k| {
                let bin = if k <= n / 2 { k } else { n - k };
                self.gain(bin as f64 * sample_rate / n as f64, spec)
            })
            .collect();

        let mut out = Vec::with_capacity(data.len());
        for row in data {
            if row.len() != n {
                return Err(FilterError::Compute(format!(
                    "ragged slice: expected {n} samples, got {}",
                    row.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(FilterError::NonFinite);
            }
            let mut buf: Vec<Complex<f64>> =
                row.iter().map(|&re| Complex { re, im: 0.0 }).collect();
            forward.process(&mut buf);
            for (c, g) in buf.iter_mut().zip(&gains) {
                *c *= *g;
            }
            inverse.process(&mut buf);
            let norm = 1.0 / n as f64;
            out.push(buf.iter().map(|c| c.re * norm).collect());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sr).sin())
            .collect()
    }

    fn rms(v: &[f64]) -> f64 {
        (v.iter().map(|x| x * x).sum::<f64>() / v.len() as f64).sqrt()
    }

    #[test]
    fn inverted_band_is_rejected() {
        assert_eq!(
            FilterSpec::band(40.0, 1.0),
            Err(FilterError::InvalidBand {
                low: 40.0,
                high: 1.0
            })
        );
    }

    #[test]
    fn low_pass_removes_high_tone() {
        let sr = 256.0;
        let n = 512;
        let low: Vec<f64> = sine(4.0, sr, n);
        let high = sine(60.0, sr, n);
        let mixed: Vec<f64> = low.iter().zip(&high).map(|(a, b)| a + b).collect();
        let spec = FilterSpec::new(None, Some(20.0)).unwrap();
        let out = SpectralFilter::default()
            .apply(&[mixed], sr, &spec)
            .unwrap();
        let residual: Vec<f64> = out[0].iter().zip(&low).map(|(a, b)| a - b).collect();
        assert!(rms(&residual) < 1e-6);
    }

    #[test]
    fn cutoff_above_nyquist_fails() {
        let spec = FilterSpec::new(None, Some(200.0)).unwrap();
        let err = SpectralFilter::default()
            .apply(&[vec![0.0; 8]], 100.0, &spec)
            .unwrap_err();
        assert!(matches!(err, FilterError::AboveNyquist { .. }));
    }

    #[test]
    fn high_pass_removes_offset() {
        let spec = FilterSpec::new(Some(1.0), None).unwrap();
        let out = SpectralFilter::default()
            .apply(&[vec![5.0; 64]], 64.0, &spec)
            .unwrap();
        assert!(out[0].iter().all(|v| v.abs() < 1e-9));
    }
}
