//! Exact Euclidean distance transform (Felzenszwalb & Huttenlocher).
//!
//! Runs the 1D lower-envelope-of-parabolas transform along columns and then
//! rows. Per-axis spacing is honoured, so anisotropic grids measure true
//! world distance.

use crate::field::Field2D;

/// Distance from every cell to the nearest `true` cell, in world units.
///
/// Cells are `+inf` when the mask has no `true` cell at all.
pub fn distance_to_nearest(mask: &Field2D<bool>, spacing: (f64, f64)) -> Field2D<f64> {
    let (w, h) = mask.shape();
    let (dx, dy) = spacing;
    let mut squared: Vec<f64> = mask
        .iter()
        .map(|hit| if hit { 0.0 } else { f64::INFINITY })
        .collect();

    let mut line = Vec::with_capacity(w.max(h));
    let mut out = vec![0.0; w.max(h)];
    let mut hull = Vec::with_capacity(w.max(h));

    // Columns.
    for col in 0..w {
        line.clear();
        line.extend((0..h).map(|row| squared[row * w + col]));
        transform_line(&line, dy, &mut out[..h], &mut hull);
        for row in 0..h {
            squared[row * w + col] = out[row];
        }
    }

    // Rows.
    for row in 0..h {
        let start = row * w;
        line.clear();
        line.extend_from_slice(&squared[start..start + w]);
        transform_line(&line, dx, &mut out[..w], &mut hull);
        squared[start..start + w].copy_from_slice(&out[..w]);
    }

    let distances = squared.into_iter().map(f64::sqrt).collect();
    Field2D::from_vec(w, h, distances).unwrap_or_else(|_| Field2D::filled(w, h, f64::INFINITY))
}

/// `out[p] = min_q (spacing * (p - q))^2 + f[q]`.
fn transform_line(f: &[f64], spacing: f64, out: &mut [f64], hull: &mut Vec<(usize, f64)>) {
    hull.clear();
    for (q, &fq) in f.iter().enumerate() {
        if !fq.is_finite() {
            continue;
        }
        let pq = q as f64 * spacing;
        let mut start = f64::NEG_INFINITY;
        while let Some(&(r, z)) = hull.last() {
            let pr = r as f64 * spacing;
            let crossing = ((fq + pq * pq) - (f[r] + pr * pr)) / (2.0 * (pq - pr));
            if crossing <= z {
                hull.pop();
            } else {
                start = crossing;
                break;
            }
        }
        hull.push((q, start));
    }

    if hull.is_empty() {
        out.fill(f64::INFINITY);
        return;
    }

    let mut k = 0;
    for (p, slot) in out.iter_mut().enumerate() {
        let pp = p as f64 * spacing;
        while k + 1 < hull.len() && hull[k + 1].1 < pp {
            k += 1;
        }
        let r = hull[k].0;
        let d = pp - r as f64 * spacing;
        *slot = d * d + f[r];
    }
}
