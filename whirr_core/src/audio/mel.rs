//! Power mel spectrogram with a Hamming-windowed, centred STFT.
//!
//! Frames are produced time-major: the returned matrix has shape
//! `(n_frames, n_mels)`.

use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::{Array2, Axis};
use rustfft::{Fft, FftPlanner, num_complex::Complex};

/// Floor applied before taking the logarithm in [`power_to_db`].
pub const AMIN: f32 = 1e-10;
/// Dynamic range kept below the loudest bin by [`power_to_db`].
pub const TOP_DB: f32 = 80.0;

/// Mel spectrogram extractor with a precomputed filterbank and FFT plan.
pub struct MelSpectrogram {
    n_fft: usize,
    hop_length: usize,
    /// Shape `(n_mels, n_fft / 2 + 1)`
    mel_basis: Array2<f32>,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl MelSpectrogram {
    pub fn new(sample_rate: u32, n_fft: usize, hop_length: usize, n_mels: usize) -> Self {
        let mel_basis = mel_filterbank(sample_rate, n_fft, n_mels);
        let window = hamming_window(n_fft);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

        Self {
            n_fft,
            hop_length,
            mel_basis,
            window,
            fft,
        }
    }

    pub fn n_mels(&self) -> usize {
        self.mel_basis.nrows()
    }

    /// Number of centred frames produced for `num_samples` input samples.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        let padded = num_samples + 2 * (self.n_fft / 2);
        1 + (padded - self.n_fft) / self.hop_length
    }

    /// Power mel spectrogram, shape `(n_frames, n_mels)`.
    pub fn compute(&self, samples: &[f32]) -> Array2<f32> {
        let power = self.power_spectrogram(samples);
        power.dot(&self.mel_basis.t())
    }

    /// `|STFT|^2`, shape `(n_frames, n_fft / 2 + 1)`.
    fn power_spectrogram(&self, samples: &[f32]) -> Array2<f32> {
        let n_fft = self.n_fft;
        let pad = n_fft / 2;
        let n_bins = n_fft / 2 + 1;

        // zero padding on both sides, frames centred on t * hop
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let n_frames = self.num_frames(samples.len());
        let mut power = Array2::<f32>::zeros((n_frames, n_bins));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for (t, mut row) in power.axis_iter_mut(Axis(0)).enumerate() {
            let start = t * self.hop_length;
            let frame = &padded[start..start + n_fft];
            for ((slot, &x), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(x * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (p, c) in row.iter_mut().zip(&buffer[..n_bins]) {
                *p = c.norm_sqr();
            }
        }

        power
    }
}

/// Convert a power spectrogram to decibels (reference 1.0), clipped to
/// [`TOP_DB`] below its maximum.
pub fn power_to_db(power: &Array2<f32>) -> Array2<f32> {
    let mut db = power.mapv(|p| 10.0 * p.max(AMIN).log10());
    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let floor = peak - TOP_DB;
    db.mapv_inplace(|v| v.max(floor));
    db
}

/// Periodic Hamming window of length `n`.
pub fn hamming_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (0.54 - 0.46 * (2.0 * PI * i as f64 / n as f64).cos()) as f32)
        .collect()
}

fn hz_to_mel(f: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;
    let logstep = 6.4f64.ln() / 27.0;

    if f >= MIN_LOG_HZ {
        MIN_LOG_MEL + (f / MIN_LOG_HZ).ln() / logstep
    } else {
        f / F_SP
    }
}

fn mel_to_hz(m: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;
    let logstep = 6.4f64.ln() / 27.0;

    if m >= MIN_LOG_MEL {
        MIN_LOG_HZ * (logstep * (m - MIN_LOG_MEL)).exp()
    } else {
        F_SP * m
    }
}

/// Slaney-scale, area-normalised triangular filterbank from 0 Hz to Nyquist.
///
/// Returns shape `(n_mels, n_fft / 2 + 1)`.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    let n_bins = n_fft / 2 + 1;
    let sr = sample_rate as f64;

    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(sr / 2.0);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();
    let fft_freqs: Vec<f64> = (0..n_bins).map(|k| k as f64 * sr / n_fft as f64).collect();

    let mut weights = Array2::<f32>::zeros((n_mels, n_bins));
    for (i, mut row) in weights.axis_iter_mut(Axis(0)).enumerate() {
        let lower_width = mel_f[i + 1] - mel_f[i];
        let upper_width = mel_f[i + 2] - mel_f[i + 1];
        let enorm = 2.0 / (mel_f[i + 2] - mel_f[i]);

        for (w, &f) in row.iter_mut().zip(&fft_freqs) {
            let lower = (f - mel_f[i]) / lower_width;
            let upper = (mel_f[i + 2] - f) / upper_width;
            *w = (lower.min(upper).max(0.0) * enorm) as f32;
        }
    }
    weights
}
