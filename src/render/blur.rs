use resvg::tiny_skia::Pixmap;

use crate::assets::decode::pixmap_from_premul;
use crate::foundation::error::{PuffsError, PuffsResult};

/// Gaussian-blur a premultiplied pixmap with a separable q16 kernel.
///
/// Edges clamp, so a constant image stays constant.
pub fn blur_pixmap(src: &Pixmap, radius: u32, sigma: f32) -> PuffsResult<Pixmap> {
    if radius == 0 {
        return Ok(src.clone());
    }
    let (width, height) = (src.width(), src.height());
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; src.data().len()];
    let mut out = vec![0u8; src.data().len()];

    convolve(src.data(), &mut tmp, width, height, &kernel, false);
    convolve(&tmp, &mut out, width, height, &kernel, true);
    pixmap_from_premul(out, width, height)
}

/// Radius covering about three standard deviations.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> PuffsResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PuffsError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(PuffsError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push rounding error into the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

/// One 1D convolution along rows (`vertical == false`) or columns.
fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], vertical: bool) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    let (len, lanes) = if vertical { (h, w) } else { (w, h) };
    let offset = |lane: i64, i: i64| -> usize {
        let (x, y) = if vertical { (lane, i) } else { (i, lane) };
        ((y * w + x) as usize) * 4
    };

    for lane in 0..lanes {
        for i in 0..len {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let at = offset(lane, (i + ki as i64 - radius).clamp(0, len - 1));
                for (a, &v) in acc.iter_mut().zip(&src[at..at + 4]) {
                    *a += u64::from(kw) * u64::from(v);
                }
            }
            let at = offset(lane, i);
            for (d, a) in dst[at..at + 4].iter_mut().zip(acc) {
                *d = q16_to_u8(a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}
