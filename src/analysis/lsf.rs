//! Line spectral frequency conversion.
//!
//! LSFs are the on-circle roots of the symmetric/antisymmetric split of the
//! LPC polynomial. They are sorted, bounded in (0, pi) and interpolate
//! gracefully, which is what the vocal tract mapper and smoothing operate on.

use std::f64::consts::PI;

/// Grid points used when scanning for sign changes of the Chebyshev forms.
const ROOT_SEARCH_MIN_POINTS: usize = 4096;
/// Bisection refinement iterations per located sign change.
const BISECTION_STEPS: usize = 60;

/// Converts direct-form LPC coefficients to LSFs in radians, ascending.
///
/// Builds `P(z) = A(z) + z^-(p+1) A(z^-1)` and `Q(z) = A(z) - z^-(p+1) A(z^-1)`,
/// divides out their trivial roots, and finds the remaining roots on the
/// unit circle through the Chebyshev evaluation of the reduced palindromic
/// polynomials. The trivial roots depend on the order parity: even p puts
/// z = -1 in P and z = +1 in Q; odd p leaves P without one and puts both
/// z = +1 and z = -1 in Q.
pub fn lpc_to_lsf(lpc: &[f64]) -> Vec<f64> {
    let p = lpc.len();
    if p == 0 {
        return vec![];
    }

    let m = p + 1;
    let mut a = vec![0.0; m + 1];
    a[0] = 1.0;
    a[1..=p].copy_from_slice(lpc);

    let mut p_poly = vec![0.0; m + 1];
    let mut q_poly = vec![0.0; m + 1];
    for i in 0..=m {
        p_poly[i] = a[i] + a[m - i];
        q_poly[i] = a[i] - a[m - i];
    }

    let (p_reduced, q_reduced) = if p % 2 == 0 {
        (divide_out(&p_poly, 1.0), divide_out(&q_poly, -1.0))
    } else {
        (p_poly, divide_out(&divide_out(&q_poly, -1.0), 1.0))
    };

    let mut lsfs = Vec::with_capacity(p);
    scan_roots(&p_reduced, &mut lsfs);
    scan_roots(&q_reduced, &mut lsfs);
    lsfs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    lsfs.truncate(p);
    lsfs
}

/// Converts sorted LSFs (radians) back to direct-form LPC coefficients.
///
/// The roots of P and Q interlace starting with P, so even positions in the
/// ascending LSF vector rebuild P and odd positions rebuild Q. Multiplying
/// the trivial roots back in (per the parity rules of `lpc_to_lsf`) gives
/// `A(z) = (P(z) + Q(z)) / 2`.
pub fn lsf_to_lpc(lsf: &[f64]) -> Vec<f64> {
    let p = lsf.len();
    if p == 0 {
        return vec![];
    }

    let mut p_roots = Vec::with_capacity(p / 2 + 1);
    let mut q_roots = Vec::with_capacity(p / 2);
    for (i, &w) in lsf.iter().enumerate() {
        if i % 2 == 0 {
            p_roots.push(w);
        } else {
            q_roots.push(w);
        }
    }

    let (p_full, q_full) = if p % 2 == 0 {
        (
            convolve_linear(&poly_from_roots(&p_roots), 1.0),
            convolve_linear(&poly_from_roots(&q_roots), -1.0),
        )
    } else {
        (
            poly_from_roots(&p_roots),
            convolve_linear(&convolve_linear(&poly_from_roots(&q_roots), -1.0), 1.0),
        )
    };

    // Both sides have degree p + 1; the leading and trailing terms cancel.
    (0..p)
        .map(|i| 0.5 * (p_full[i + 1] + q_full[i + 1]))
        .collect()
}

/// Polynomial long division by `(1 + c z^-1)`.
fn divide_out(poly: &[f64], c: f64) -> Vec<f64> {
    let n = poly.len();
    if n < 2 {
        return poly.to_vec();
    }
    let mut r = vec![0.0; n - 1];
    r[0] = poly[0];
    for i in 1..n - 1 {
        r[i] = poly[i] - c * r[i - 1];
    }
    r
}

/// Evaluates a palindromic polynomial of even degree 2M on the unit circle:
/// `F(w) = c[M] + 2 * sum_{k<M} c[k] * cos((M-k) w)`.
fn chebyshev_eval(poly: &[f64], w: f64) -> f64 {
    let half = (poly.len() - 1) / 2;
    let mut val = poly[half];
    for k in 0..half {
        val += 2.0 * poly[k] * ((half - k) as f64 * w).cos();
    }
    val
}

/// Scans (0, pi) for sign changes and bisects each into a root.
fn scan_roots(poly: &[f64], out: &mut Vec<f64>) {
    let degree = poly.len().saturating_sub(1);
    let n_search = ROOT_SEARCH_MIN_POINTS.max(degree * 500);
    let dw = PI / n_search as f64;

    let mut prev = chebyshev_eval(poly, 1e-10);
    for i in 1..=n_search {
        let w = i as f64 * dw;
        let cur = chebyshev_eval(poly, w);
        if prev * cur < 0.0 {
            let root = bisect(poly, w - dw, w);
            if root > 1e-10 && root < PI - 1e-10 {
                out.push(root);
            }
        }
        prev = cur;
    }
}

fn bisect(poly: &[f64], mut lo: f64, mut hi: f64) -> f64 {
    let f_lo = chebyshev_eval(poly, lo);
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if f_lo * chebyshev_eval(poly, mid) <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Builds a monic polynomial from conjugate root pairs on the unit circle.
fn poly_from_roots(roots: &[f64]) -> Vec<f64> {
    let mut poly = vec![1.0];
    for &w in roots {
        let c = -2.0 * w.cos();
        let mut next = vec![0.0; poly.len() + 2];
        for (j, &pj) in poly.iter().enumerate() {
            next[j] += pj;
            next[j + 1] += c * pj;
            next[j + 2] += pj;
        }
        poly = next;
    }
    poly
}

/// Convolves a polynomial with `(1 + c z^-1)`.
fn convolve_linear(poly: &[f64], c: f64) -> Vec<f64> {
    let mut out = vec![0.0; poly.len() + 1];
    for (j, &v) in poly.iter().enumerate() {
        out[j] += v;
        out[j + 1] += c * v;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lpc;
    use std::f64::consts::PI;

    fn speech_like_frame() -> Vec<f64> {
        (0..320)
            .map(|i| {
                let t = i as f64 / 16000.0;
                (2.0 * PI * 700.0 * t).sin() + 0.6 * (2.0 * PI * 1220.0 * t).sin()
                    + 0.3 * (2.0 * PI * 2600.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn lsfs_are_sorted_and_bounded() {
        let frame = speech_like_frame();
        let model = lpc::analyze(&frame, 10);
        let lsfs = lpc_to_lsf(&model.coeffs);
        assert_eq!(lsfs.len(), model.coeffs.len());
        for pair in lsfs.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(lsfs[0] > 0.0);
        assert!(*lsfs.last().unwrap() < PI);
    }

    #[test]
    fn lpc_lsf_roundtrip() {
        let frame = speech_like_frame();
        let model = lpc::analyze(&frame, 10);
        let lsfs = lpc_to_lsf(&model.coeffs);
        let back = lsf_to_lpc(&lsfs);
        assert_eq!(back.len(), model.coeffs.len());
        for (a, b) in back.iter().zip(model.coeffs.iter()) {
            assert!((a - b).abs() < 1e-3, "roundtrip drift: {} vs {}", a, b);
        }
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(lpc_to_lsf(&[]).is_empty());
        assert!(lsf_to_lpc(&[]).is_empty());
    }

    fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; a.len() + b.len() - 1];
        for (i, &x) in a.iter().enumerate() {
            for (j, &y) in b.iter().enumerate() {
                out[i + j] += x * y;
            }
        }
        out
    }

    /// Cascades conjugate pole pairs `(r, theta)` and real poles into the
    /// direct-form coefficients of a stable A(z).
    fn cascade(pairs: &[(f64, f64)], reals: &[f64]) -> Vec<f64> {
        let mut a = vec![1.0];
        for &(r, theta) in pairs {
            a = convolve(&a, &[1.0, -2.0 * r * theta.cos(), r * r]);
        }
        for &r in reals {
            a = convolve(&a, &[1.0, -r]);
        }
        a[1..].to_vec()
    }

    #[test]
    fn third_order_roundtrip() {
        // One conjugate pair plus one real pole: [-1.472, 1.296, -0.405].
        let a = cascade(&[(0.9, 0.54f64.acos())], &[0.5]);
        let lsfs = lpc_to_lsf(&a);
        assert_eq!(lsfs.len(), 3);
        for pair in lsfs.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(lsfs[0] > 0.0 && *lsfs.last().unwrap() < PI);

        let back = lsf_to_lpc(&lsfs);
        for (x, y) in back.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-6, "roundtrip drift: {} vs {}", x, y);
        }
    }

    #[test]
    fn fifteenth_order_roundtrip() {
        let pairs = [
            (0.92, 0.3),
            (0.9, 0.7),
            (0.88, 1.1),
            (0.85, 1.5),
            (0.8, 1.9),
            (0.75, 2.3),
            (0.7, 2.7),
        ];
        let a = cascade(&pairs, &[0.4]);
        assert_eq!(a.len(), 15);

        let lsfs = lpc_to_lsf(&a);
        assert_eq!(lsfs.len(), 15);
        for pair in lsfs.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        let back = lsf_to_lpc(&lsfs);
        for (x, y) in back.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-6, "roundtrip drift: {} vs {}", x, y);
        }
    }

    #[test]
    fn second_order_known_case() {
        // A(z) with a conjugate pole pair inside the unit circle.
        let a = vec![-1.2, 0.72];
        let lsfs = lpc_to_lsf(&a);
        assert_eq!(lsfs.len(), 2);
        let back = lsf_to_lpc(&lsfs);
        for (x, y) in back.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
