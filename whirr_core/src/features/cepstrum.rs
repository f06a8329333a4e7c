//! Cepstral transform and time derivatives over time-major matrices.

use std::f64::consts::PI;

use ndarray::{Array2, Axis};

use crate::error::{Error, Result};

/// Orthonormal DCT-II basis, shape `(n_coeffs, n_inputs)`.
///
/// `log_mel.dot(&basis.t())` yields the first `n_coeffs` cepstral
/// coefficients of every frame.
pub fn dct_basis(n_coeffs: usize, n_inputs: usize) -> Array2<f32> {
    let n = n_inputs as f64;
    Array2::from_shape_fn((n_coeffs, n_inputs), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        (scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()) as f32
    })
}

/// Savitzky-Golay derivative taps for a window of `width` frames, with the
/// polynomial order equal to the derivative order.
fn derivative_taps(order: usize, width: usize) -> Result<Vec<f64>> {
    if width < 3 || width % 2 == 0 {
        return Err(Error::InvalidParams(format!(
            "delta width must be odd and at least 3, got {width}"
        )));
    }
    let half = (width / 2) as i64;
    let offsets = (-half..=half).map(|n| n as f64);

    match order {
        1 => {
            let norm: f64 = offsets.clone().map(|n| n * n).sum();
            Ok(offsets.map(|n| n / norm).collect())
        }
        2 => {
            let mean_sq = offsets.clone().map(|n| n * n).sum::<f64>() / width as f64;
            let norm: f64 = offsets.clone().map(|n| (n * n - mean_sq).powi(2)).sum();
            Ok(offsets.map(|n| 2.0 * (n * n - mean_sq) / norm).collect())
        }
        _ => Err(Error::InvalidParams(format!(
            "delta order must be 1 or 2, got {order}"
        ))),
    }
}

/// Local derivative of each column along the time axis (axis 0).
///
/// Edge frames without a full window take the value of the nearest fully
/// covered frame, which is what fitting the polynomial to the first and last
/// windows gives when polynomial order equals derivative order.
pub fn delta(features: &Array2<f32>, order: usize, width: usize) -> Result<Array2<f32>> {
    let taps = derivative_taps(order, width)?;
    let frames = features.nrows();
    if frames < width {
        return Err(Error::TooShort { frames, width });
    }

    let half = width / 2;
    let mut out = Array2::<f32>::zeros(features.raw_dim());

    for t in half..frames - half {
        let window = features.slice(ndarray::s![t - half..=t + half, ..]);
        let mut row = out.row_mut(t);
        for (c, slot) in row.iter_mut().enumerate() {
            let acc: f64 = window
                .column(c)
                .iter()
                .zip(&taps)
                .map(|(&x, &k)| x as f64 * k)
                .sum();
            *slot = acc as f32;
        }
    }

    let first = out.row(half).to_owned();
    let last = out.row(frames - 1 - half).to_owned();
    for t in 0..half {
        out.row_mut(t).assign(&first);
        out.row_mut(frames - 1 - t).assign(&last);
    }

    Ok(out)
}

/// Place coefficients, deltas and delta-deltas side by side.
pub fn stack_with_deltas(coeffs: &Array2<f32>, width: usize) -> Result<Array2<f32>> {
    let d1 = delta(coeffs, 1, width)?;
    let d2 = delta(coeffs, 2, width)?;
    ndarray::concatenate(Axis(1), &[coeffs.view(), d1.view(), d2.view()])
        .map_err(|e| Error::InvalidParams(e.to_string()))
}
