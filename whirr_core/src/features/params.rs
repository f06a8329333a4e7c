use crate::error::{Error, Result};

/// Rate every recording is resampled to before analysis.
pub const SAMPLE_RATE: u32 = 16_000;
/// Mel bands in the intermediate spectrogram.
pub const N_MELS: usize = 128;
/// Frames spanned by the delta filter.
pub const DELTA_WIDTH: usize = 9;

/// STFT and cepstrum settings for one feature configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureParams {
    /// FFT size, also the analysis window length
    pub n_fft: usize,
    /// Samples between successive frames
    pub hop_length: usize,
    /// Cepstral coefficients kept per frame
    pub n_mfcc: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeatureParams {
    /// 150 ms window, 37.5 ms hop, 40 coefficients. Used by both dataset builders.
    pub const fn standard() -> Self {
        Self {
            n_fft: 2400,
            hop_length: 600,
            n_mfcc: 40,
        }
    }

    /// 200 ms window, 50 ms hop, 40 coefficients.
    pub const fn wide() -> Self {
        Self {
            n_fft: 3200,
            hop_length: 800,
            n_mfcc: 40,
        }
    }

    /// Columns of the stacked feature matrix: coefficients, deltas and delta-deltas.
    pub fn channels(&self) -> usize {
        3 * self.n_mfcc
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_fft < 2 || self.n_fft % 2 != 0 {
            return Err(Error::InvalidParams(format!(
                "n_fft must be even and at least 2, got {}",
                self.n_fft
            )));
        }
        if self.hop_length == 0 {
            return Err(Error::InvalidParams("hop_length must be positive".into()));
        }
        if self.n_mfcc == 0 || self.n_mfcc > N_MELS {
            return Err(Error::InvalidParams(format!(
                "n_mfcc must be in 1..={N_MELS}, got {}",
                self.n_mfcc
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(FeatureParams::default(), FeatureParams::standard());
        assert_eq!(FeatureParams::standard().channels(), 120);
        assert_eq!(FeatureParams::wide().n_fft, 3200);
        assert_eq!(FeatureParams::wide().hop_length, 800);
        assert!(FeatureParams::standard().validate().is_ok());
        assert!(FeatureParams::wide().validate().is_ok());
    }

    #[test]
    fn rejects_bad_params() {
        let odd = FeatureParams {
            n_fft: 2401,
            ..FeatureParams::standard()
        };
        let no_hop = FeatureParams {
            hop_length: 0,
            ..FeatureParams::standard()
        };
        let too_many = FeatureParams {
            n_mfcc: 129,
            ..FeatureParams::standard()
        };
        for params in [odd, no_hop, too_many] {
            assert!(matches!(params.validate(), Err(Error::InvalidParams(_))));
        }
    }
}
