use std::path::Path;

use ndarray::Array2;

use crate::audio::{MelSpectrogram, decode_mono, power_to_db};
use crate::error::{Error, Result};
use crate::features::cepstrum::{dct_basis, stack_with_deltas};
use crate::features::params::{DELTA_WIDTH, FeatureParams, N_MELS, SAMPLE_RATE};

/// Turns recordings into time-major `[mfcc | delta | delta2]` matrices.
///
/// Construction precomputes the mel filterbank, window, FFT plan and DCT
/// basis, so one extractor should be reused for a whole batch.
pub struct FeatureExtractor {
    params: FeatureParams,
    mel: MelSpectrogram,
    dct: Array2<f32>,
}

impl FeatureExtractor {
    pub fn new(params: FeatureParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            mel: MelSpectrogram::new(SAMPLE_RATE, params.n_fft, params.hop_length, N_MELS),
            dct: dct_basis(params.n_mfcc, N_MELS),
        })
    }

    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    /// Rows produced for a recording of `num_samples` samples at 16 kHz.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        self.mel.num_frames(num_samples)
    }

    /// Features for mono samples already at [`SAMPLE_RATE`].
    ///
    /// Output shape is `(num_frames(samples.len()), 3 * n_mfcc)`.
    pub fn extract(&self, samples: &[f32]) -> Result<Array2<f32>> {
        let mel = self.mel.compute(samples);
        let log_mel = power_to_db(&mel);
        let coeffs = log_mel.dot(&self.dct.t());
        stack_with_deltas(&coeffs, DELTA_WIDTH)
    }

    /// Decode `path` to 16 kHz mono and extract its features.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Array2<f32>> {
        let path = path.as_ref();
        let samples = decode_mono(path, SAMPLE_RATE).map_err(|e| Error::Decode {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        self.extract(&samples)
    }
}
