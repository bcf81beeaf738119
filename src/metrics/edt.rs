//! Exact Euclidean distance transform on anisotropic grids.
//!
//! Separable lower-envelope-of-parabolas algorithm (Felzenszwalb &
//! Huttenlocher), one pass per axis with the axis spacing folded into the
//! sample positions, so the result is in squared physical units.

use ndarray::{Array3, ArrayView3, Axis};

/// Squared distance from every voxel to the nearest `true` voxel of
/// `features`. With no features at all every entry is `f64::INFINITY`.
pub fn squared_edt(features: ArrayView3<'_, bool>, spacing: [f64; 3]) -> Array3<f64> {
    let mut dist = features.mapv(|f| if f { 0.0 } else { f64::INFINITY });

    let max_len = dist.shape().iter().copied().max().unwrap_or(0);
    let mut f = vec![0.0f64; max_len];
    let mut out = vec![0.0f64; max_len];
    let mut v = vec![0usize; max_len];
    let mut z = vec![0.0f64; max_len + 1];

    for axis in 0..3 {
        let step = spacing[axis];
        for mut lane in dist.lanes_mut(Axis(axis)) {
            let n = lane.len();
            for (dst, src) in f[..n].iter_mut().zip(lane.iter()) {
                *dst = *src;
            }
            edt_1d(&f[..n], step, &mut out[..n], &mut v, &mut z);
            for (dst, src) in lane.iter_mut().zip(out[..n].iter()) {
                *dst = *src;
            }
        }
    }
    dist
}

fn edt_1d(f: &[f64], step: f64, out: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    let mut k: usize = 0;
    let mut have_any = false;

    for q in 0..n {
        if !f[q].is_finite() {
            continue;
        }
        if !have_any {
            have_any = true;
            k = 0;
            v[0] = q;
            z[0] = f64::NEG_INFINITY;
            z[1] = f64::INFINITY;
            continue;
        }
        let xq = q as f64 * step;
        loop {
            let p = v[k];
            let xp = p as f64 * step;
            let s = ((f[q] + xq * xq) - (f[p] + xp * xp)) / (2.0 * (xq - xp));
            if s <= z[k] {
                if k == 0 {
                    v[0] = q;
                    z[0] = f64::NEG_INFINITY;
                    z[1] = f64::INFINITY;
                    break;
                }
                k -= 1;
                continue;
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
            break;
        }
    }

    if !have_any {
        for o in out.iter_mut() {
            *o = f64::INFINITY;
        }
        return;
    }

    k = 0;
    for (q, o) in out.iter_mut().enumerate() {
        let x = q as f64 * step;
        while z[k + 1] < x {
            k += 1;
        }
        let xp = v[k] as f64 * step;
        *o = (x - xp) * (x - xp) + f[v[k]];
    }
}
