//! Recursive radix-2 FFT over complex sample buffers.

use crate::error::TransformError;
use num_complex::Complex;
use std::f64::consts::PI;

/// Forward discrete Fourier transform.
///
/// Classic recursive decimation-in-time: the even- and odd-indexed halves are
/// transformed separately and recombined with a butterfly. Runs in
/// O(N log N) time and allocates O(N log N) in total, which is fine for the
/// ~2048-sample windows rendered per frame.
///
/// The length must be an exact power of two; nothing is padded.
pub fn transform(samples: &[Complex<f64>]) -> Result<Vec<Complex<f64>>, TransformError> {
    let n = samples.len();
    if !n.is_power_of_two() {
        return Err(TransformError::InvalidLength(n));
    }
    Ok(radix2(samples))
}

/// Inverse transform, scaled by 1/N so that `inverse(transform(x)) == x`
pub fn inverse_transform(spectrum: &[Complex<f64>]) -> Result<Vec<Complex<f64>>, TransformError> {
    let conjugated: Vec<Complex<f64>> = spectrum.iter().map(|c| c.conj()).collect();
    let scale = 1.0 / spectrum.len() as f64;
    Ok(transform(&conjugated)?
        .into_iter()
        .map(|c| c.conj() * scale)
        .collect())
}

fn radix2(samples: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let n = samples.len();
    if n <= 1 {
        return samples.to_vec();
    }

    let even: Vec<Complex<f64>> = samples.iter().step_by(2).copied().collect();
    let odd: Vec<Complex<f64>> = samples.iter().skip(1).step_by(2).copied().collect();
    let even = radix2(&even);
    let odd = radix2(&odd);

    let half = n / 2;
    let mut out = vec![Complex::new(0.0, 0.0); n];
    for k in 0..half {
        let twiddle = Complex::from_polar(1.0, -2.0 * PI * k as f64 / n as f64) * odd[k];
        out[k] = even[k] + twiddle;
        out[k + half] = even[k] - twiddle;
    }
    out
}

pub fn real_to_complex(samples: &[f64]) -> Vec<Complex<f64>> {
    samples.iter().map(|&s| Complex::new(s, 0.0)).collect()
}

/// Natural-log magnitude of the first N/2 bins (DC up to, not including, Nyquist).
///
/// Empty bins come out as negative infinity; the bucketizer floors them at 0.
pub fn log_magnitudes(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum[..spectrum.len() / 2]
        .iter()
        .map(|c| c.norm().ln())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn sine_at_bin(k: usize, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * k as f64 * i as f64 / n as f64).sin())
            .collect()
    }

    #[test]
    fn rejects_non_power_of_two() {
        let input = vec![Complex::new(1.0, 0.0); 6];
        assert_eq!(transform(&input), Err(TransformError::InvalidLength(6)));
        assert_eq!(transform(&[]), Err(TransformError::InvalidLength(0)));
    }

    #[test]
    fn zero_window_stays_zero() {
        for shift in 0..=11 {
            let n = 1usize << shift;
            let out = transform(&vec![Complex::new(0.0, 0.0); n]).unwrap();
            assert_eq!(out.len(), n);
            assert!(out.iter().all(|c| c.norm() == 0.0), "non-zero output for N={}", n);
        }
    }

    #[test]
    fn single_sample_is_identity() {
        let input = [Complex::new(3.5, -1.0)];
        assert_eq!(transform(&input).unwrap(), input.to_vec());
    }

    #[test]
    fn impulse_is_flat() {
        let mut input = vec![Complex::new(0.0, 0.0); 16];
        input[0] = Complex::new(1.0, 0.0);
        for bin in transform(&input).unwrap() {
            assert!((bin - Complex::new(1.0, 0.0)).norm() < EPS);
        }
    }

    #[test]
    fn inverse_reconstructs_window() {
        let samples: Vec<f64> = (0..256)
            .map(|i| (i as f64 * 0.37).sin() + 0.25 * (i as f64 * 1.3).cos())
            .collect();
        let input = real_to_complex(&samples);
        let back = inverse_transform(&transform(&input).unwrap()).unwrap();
        for (a, b) in input.iter().zip(&back) {
            assert!((a - b).norm() < EPS);
        }
    }

    #[test]
    fn sinusoid_energy_at_k_and_mirror() {
        let (n, k) = (64, 5);
        let out = transform(&real_to_complex(&sine_at_bin(k, n))).unwrap();
        for (i, bin) in out.iter().enumerate() {
            if i == k || i == n - k {
                assert!((bin.norm() - n as f64 / 2.0).abs() < 1e-6, "bin {} = {}", i, bin.norm());
            } else {
                assert!(bin.norm() < 1e-6, "leak at bin {}: {}", i, bin.norm());
            }
        }
    }

    #[test]
    fn matches_rustfft() {
        use rustfft::FftPlanner;

        let n = 2048;
        let samples: Vec<f64> = (0..n).map(|i| ((i * 7919) % 1000) as f64 / 500.0 - 1.0).collect();
        let ours = transform(&real_to_complex(&samples)).unwrap();

        let mut reference: Vec<rustfft::num_complex::Complex<f64>> = samples
            .iter()
            .map(|&s| rustfft::num_complex::Complex::new(s, 0.0))
            .collect();
        FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut reference);

        for (a, b) in ours.iter().zip(&reference) {
            assert!((a.re - b.re).abs() < 1e-6 && (a.im - b.im).abs() < 1e-6);
        }
    }

    #[test]
    fn log_magnitudes_cover_half_the_bins() {
        let spectrum = transform(&real_to_complex(&sine_at_bin(3, 32))).unwrap();
        let logs = log_magnitudes(&spectrum);
        assert_eq!(logs.len(), 16);
        assert!((logs[3] - 16.0f64.ln()).abs() < 1e-6);
    }
}
