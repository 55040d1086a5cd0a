//! Zero-phase FIR decimation of one chunk.
//!
//! The chunk is padded with reflect-limited samples so the linear-phase
//! group delay can be compensated without transient edges, convolved with
//! the anti-aliasing filter via FFT overlap-add, and sampled at every
//! `q`-th point. Output length is `⌈n/q⌉`.
use rustfft::{num_complex::Complex, FftPlanner};

/// Run one decimation stage: lowpass `x` with `h` (odd length, symmetric),
/// then keep every `q`-th filtered sample starting at index 0.
pub fn decimate_stage(x: &[f64], h: &[f64], q: usize) -> Vec<f64> {
    debug_assert!(h.len() % 2 == 1, "stage filter must have odd length");
    debug_assert!(q >= 1);
    let n = x.len();
    if n == 0 {
        return vec![];
    }

    // Pad by the group delay on each side; the valid part of the convolution
    // then lines up sample-for-sample with the input (zero phase).
    let shift = (h.len() - 1) / 2;
    let x_pad = reflect_limited_pad(x, shift, shift);
    let filtered = convolve_valid(&x_pad, h, n);

    filtered.into_iter().step_by(q).collect()
}

/// Reflect-limited padding: odd reflection about the edge sample.
///
/// Left:  `2·x[0] − x[i]`, right: `2·x[last] − x[last−i]`. Requests longer
/// than the signal are filled with zeros, so short chunks stay well-defined.
fn reflect_limited_pad(x: &[f64], n_l: usize, n_r: usize) -> Vec<f64> {
    let n = x.len();
    let take_l = n_l.min(n - 1);
    let take_r = n_r.min(n - 1);

    let mut out = Vec::with_capacity(n_l + n + n_r);
    out.resize(n_l - take_l, 0.0);
    for i in (1..=take_l).rev() {
        out.push(2.0 * x[0] - x[i]);
    }
    out.extend_from_slice(x);
    let last = x[n - 1];
    for i in 1..=take_r {
        out.push(2.0 * last - x[n - 1 - i]);
    }
    out.resize(n_l + n + n_r, 0.0);
    out
}

/// FFT overlap-add convolution of `x_pad` with `h`, returning the `n_out`
/// samples of the valid region (offset `h.len() − 1` into the full product).
fn convolve_valid(x_pad: &[f64], h: &[f64], n_out: usize) -> Vec<f64> {
    let n_x = x_pad.len();
    let n_h = h.len();
    let n_full = n_x + n_h - 1;

    let n_fft = choose_fft_len(n_h, n_x);
    let n_seg = n_fft - n_h + 1;

    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft_fwd = planner.plan_fft_forward(n_fft);
    let fft_inv = planner.plan_fft_inverse(n_fft);
    let inv_scale = 1.0 / n_fft as f64;

    // Spectrum of h, zero-padded to the block size.
    let mut h_fft: Vec<Complex<f64>> = h
        .iter()
        .map(|&v| Complex { re: v, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n_fft)
        .collect();
    fft_fwd.process(&mut h_fft);

    let mut full = vec![0.0_f64; n_full];
    let mut seg_start = 0;
    while seg_start < n_x {
        let seg_stop = (seg_start + n_seg).min(n_x);
        let mut buf: Vec<Complex<f64>> = x_pad[seg_start..seg_stop]
            .iter()
            .map(|&v| Complex { re: v, im: 0.0 })
            .chain(std::iter::repeat(Complex::default()))
            .take(n_fft)
            .collect();

        fft_fwd.process(&mut buf);
        for (b, &hf) in buf.iter_mut().zip(h_fft.iter()) {
            *b *= hf;
        }
        fft_inv.process(&mut buf);

        for (i, c) in buf.iter().enumerate() {
            let k = seg_start + i;
            if k < n_full {
                full[k] += c.re * inv_scale;
            }
        }
        seg_start = seg_stop;
    }

    full[n_h - 1..n_h - 1 + n_out].to_vec()
}

/// Power-of-two FFT block size minimising the overlap-add operation count.
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let min_pow = usize::BITS - (min_fft - 1).leading_zeros();
    let max_pow = (usize::BITS - n_x.leading_zeros()).max(min_pow);

    let mut best_n = 1_usize << max_pow;
    let mut best_cost = f64::INFINITY;
    for pow in min_pow..=max_pow {
        let n = 1_usize << pow;
        let n_seg = (n - n_h + 1) as f64;
        let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0);
        if cost < best_cost {
            best_cost = cost;
            best_n = n;
        }
    }
    best_n
}
