// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use crate::geometry::plane::ProjectionPlane;
use crate::kernel::Sign;
use crate::numeric::CgarRational;

const EPSILON: f64 = f64::EPSILON * 0.5;
const CCW_ERRBOUND_A: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;
const O3D_ERRBOUND_A: f64 = (7.0 + 56.0 * EPSILON) * EPSILON;
// below this the static bounds no longer cover underflow
const MIN_PERMANENT: f64 = 1e-280;

/// Floating point orient2d on the projection of `a`, `b`, `c` onto `plane`.
/// `None` when the sign cannot be certified by the static error bound.
///
/// Positive when `a`, `b`, `c` turn counter-clockwise.
pub fn orient2d_f64(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], plane: ProjectionPlane) -> Option<Sign> {
    let (i, j) = plane.axes();
    let detleft = (a[i] - c[i]) * (b[j] - c[j]);
    let detright = (a[j] - c[j]) * (b[i] - c[i]);
    let det = detleft - detright;
    let detsum = detleft.abs() + detright.abs();

    if !det.is_finite() || !detsum.is_finite() {
        return None;
    }
    if detsum == 0.0 {
        // both products vanish exactly only when a difference is exactly zero
        return (detleft == 0.0 && detright == 0.0 && exact_zero_products_2d(a, b, c, i, j))
            .then_some(Sign::Zero);
    }
    if detsum < MIN_PERMANENT {
        return None;
    }

    let errbound = CCW_ERRBOUND_A * detsum;
    if det > errbound {
        Some(Sign::Positive)
    } else if -det > errbound {
        Some(Sign::Negative)
    } else {
        None
    }
}

// `detsum == 0` may come from underflowing products rather than true zeros.
fn exact_zero_products_2d(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], i: usize, j: usize) -> bool {
    let left = a[i] == c[i] || b[j] == c[j];
    let right = a[j] == c[j] || b[i] == c[i];
    left && right
}

/// Exact orient2d on the projection onto `plane`.
pub fn orient2d_exact(
    a: &[CgarRational; 3],
    b: &[CgarRational; 3],
    c: &[CgarRational; 3],
    plane: ProjectionPlane,
) -> Sign {
    let (i, j) = plane.axes();
    let left = &(&a[i] - &c[i]) * &(&b[j] - &c[j]);
    let right = &(&a[j] - &c[j]) * &(&b[i] - &c[i]);
    Sign::from_ordering(left.cmp(&right))
}

/// Floating point orient3d. Positive when `d` lies on the side of the plane
/// `abc` that `(b - a) x (c - a)` points to. `None` when not certified.
pub fn orient3d_f64(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], d: &[f64; 3]) -> Option<Sign> {
    let [adx, ady, adz] = [a[0] - d[0], a[1] - d[1], a[2] - d[2]];
    let [bdx, bdy, bdz] = [b[0] - d[0], b[1] - d[1], b[2] - d[2]];
    let [cdx, cdy, cdz] = [c[0] - d[0], c[1] - d[1], c[2] - d[2]];

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;

    // this determinant has the opposite sign of (b - a) x (c - a) . (d - a)
    let det = adz * (bdxcdy - cdxbdy) + bdz * (cdxady - adxcdy) + cdz * (adxbdy - bdxady);
    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * adz.abs()
        + (cdxady.abs() + adxcdy.abs()) * bdz.abs()
        + (adxbdy.abs() + bdxady.abs()) * cdz.abs();

    if !det.is_finite() || !permanent.is_finite() || permanent < MIN_PERMANENT {
        return None;
    }

    let errbound = O3D_ERRBOUND_A * permanent;
    if det > errbound {
        Some(Sign::Negative)
    } else if -det > errbound {
        Some(Sign::Positive)
    } else {
        None
    }
}

/// Exact `(b - a) x (c - a) . (d - a)` sign.
pub fn orient3d_exact(
    a: &[CgarRational; 3],
    b: &[CgarRational; 3],
    c: &[CgarRational; 3],
    d: &[CgarRational; 3],
) -> Sign {
    let ab = [&b[0] - &a[0], &b[1] - &a[1], &b[2] - &a[2]];
    let ac = [&c[0] - &a[0], &c[1] - &a[1], &c[2] - &a[2]];
    let ad = [&d[0] - &a[0], &d[1] - &a[1], &d[2] - &a[2]];

    let nx = &(&ab[1] * &ac[2]) - &(&ab[2] * &ac[1]);
    let ny = &(&ab[2] * &ac[0]) - &(&ab[0] * &ac[2]);
    let nz = &(&ab[0] * &ac[1]) - &(&ab[1] * &ac[0]);

    let vol = &(&(&nx * &ad[0]) + &(&ny * &ad[1])) + &(&nz * &ad[2]);
    vol.sign()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(p: [f64; 3]) -> [CgarRational; 3] {
        p.map(|c| CgarRational::from_f64(c).unwrap())
    }

    #[test]
    fn ccw_test() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        assert_eq!(orient2d_f64(&a, &b, &c, ProjectionPlane::Xy), Some(Sign::Positive));
        assert_eq!(orient2d_f64(&a, &c, &b, ProjectionPlane::Xy), Some(Sign::Negative));
        assert_eq!(
            orient2d_exact(&exact(a), &exact(b), &exact(c), ProjectionPlane::Xy),
            Sign::Positive
        );
    }

    #[test]
    fn projections_follow_dominant_normal() {
        // triangle in the plane x = 2 with normal +x
        let a = [2.0, 0.0, 0.0];
        let b = [2.0, 1.0, 0.0];
        let c = [2.0, 0.0, 1.0];
        assert_eq!(orient2d_f64(&a, &b, &c, ProjectionPlane::Yz), Some(Sign::Positive));
        assert_eq!(orient2d_f64(&a, &b, &c, ProjectionPlane::Xy), Some(Sign::Zero));
    }

    #[test]
    fn orientation_3d_signs() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        let above = [0.0, 0.0, 1.0];
        let below = [0.0, 0.0, -1.0];
        let on = [1.0, 1.0, 0.0];

        assert_eq!(orient3d_f64(&a, &b, &c, &above), Some(Sign::Positive));
        assert_eq!(orient3d_f64(&a, &b, &c, &below), Some(Sign::Negative));
        assert_eq!(orient3d_exact(&exact(a), &exact(b), &exact(c), &exact(above)), Sign::Positive);
        assert_eq!(orient3d_exact(&exact(a), &exact(b), &exact(c), &exact(on)), Sign::Zero);
    }

    #[test]
    fn near_degenerate_defers_to_exact() {
        // nearly collinear points the static filter cannot decide
        let a = [0.5, 0.5, 0.0];
        let b = [12.0, 12.0, 0.0];
        let c = [24.0, 24.0, 0.0];
        let d = [0.5 + f64::EPSILON, 0.5, 0.0];
        assert_eq!(orient2d_f64(&a, &b, &c, ProjectionPlane::Xy), None);
        assert_eq!(orient2d_exact(&exact(a), &exact(b), &exact(c), ProjectionPlane::Xy), Sign::Zero);
        assert_eq!(orient2d_exact(&exact(d), &exact(b), &exact(c), ProjectionPlane::Xy), Sign::Negative);
    }

    #[test]
    fn filter_agrees_with_exact_when_certified() {
        let pts = [
            [0.1, 0.2, 0.3],
            [1.7, -0.4, 2.2],
            [-3.0, 0.9, 0.05],
            [0.3, 0.3, -1.1],
            [2.5, 2.5, 2.5],
        ];
        for a in &pts {
            for b in &pts {
                for c in &pts {
                    for d in &pts {
                        if let Some(s) = orient3d_f64(a, b, c, d) {
                            assert_eq!(s, orient3d_exact(&exact(*a), &exact(*b), &exact(*c), &exact(*d)));
                        }
                    }
                }
            }
        }
    }
}
