//! Anti-aliasing FIR design for integer-factor decimation.
//!
//! A single stage by `q` uses a Hamming-windowed sinc lowpass with
//! `20·q + 1` taps and cutoff at `Nyquist / q`, normalised to unit DC gain.
//! Odd length keeps the filter linear-phase so the application stage can
//! compensate the group delay exactly.
use std::f64::consts::PI;

/// Number of taps for a stage of factor `q`: `20·q + 1` (always odd).
pub fn antialias_len(q: usize) -> usize {
    20 * q + 1
}

/// Design the anti-aliasing lowpass for one decimation stage of factor `q`.
///
/// Returns the impulse response `h` with `antialias_len(q)` taps and unit
/// DC gain. `q = 1` needs no filtering and is handled by the caller.
pub fn antialias_fir(q: usize) -> Vec<f64> {
    debug_assert!(q >= 2, "no anti-aliasing needed for factor {q}");
    // Cutoff as a fraction of Nyquist: keep everything below the new rate's
    // Nyquist, reject everything that would fold back.
    firwin(antialias_len(q), 1.0 / q as f64)
}

/// Lowpass windowed-sinc design (`scipy.signal.firwin` with a Hamming window).
///
/// `fc` is the cutoff as a fraction of Nyquist, in `(0, 1)`. `n` must be odd
/// for a linear-phase type-I filter. The result is normalised to sum to 1.
pub fn firwin(n: usize, fc: f64) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    assert!(fc > 0.0 && fc < 1.0, "cutoff must be in (0, 1), got {fc}");
    let alpha = (n - 1) as f64 / 2.0;
    let win = hamming(n);

    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // sin(π·fc·x)/(π·x), with the x→0 limit fc.
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_count_is_odd() {
        for q in 2..=16 {
            assert!(antialias_len(q) % 2 == 1, "q={q}");
        }
    }

    #[test]
    fn lowpass_dc_gain_unity() {
        for q in [2usize, 4, 8] {
            let h = antialias_fir(q);
            let dc: f64 = h.iter().sum();
            approx::assert_abs_diff_eq!(dc, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn lowpass_is_symmetric() {
        let h = antialias_fir(8);
        let n = h.len();
        for i in 0..n / 2 {
            approx::assert_abs_diff_eq!(h[i], h[n - 1 - i], epsilon = 1e-15);
        }
    }

    #[test]
    fn stopband_rejects_nyquist() {
        // Response at Nyquist = alternating-sign sum; must be deep in the
        // stopband for any usable stage factor.
        for q in [2usize, 8] {
            let h = antialias_fir(q);
            let at_nyq: f64 = h
                .iter()
                .enumerate()
                .map(|(i, &v)| if i % 2 == 0 { v } else { -v })
                .sum();
            assert!(at_nyq.abs() < 1e-3, "q={q}: |H(Nyquist)| = {}", at_nyq.abs());
        }
    }
}
