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

use std::cmp::Ordering;

use crate::geometry::plane::ProjectionPlane;
use crate::geometry::point::GenericPoint;
use crate::kernel::Sign;
use crate::kernel::orientation::{orient2d_exact, orient2d_f64, orient3d_exact, orient3d_f64};

/// Where a point lies with respect to a closed segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentLocation {
    Outside,
    OnVertex(usize),
    Interior,
}

/// Where a point lies with respect to a closed triangle. Edge `k` joins
/// vertex `k` to vertex `k + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangleLocation {
    Outside,
    OnVertex(usize),
    OnEdge(usize),
    Interior,
}

impl TriangleLocation {
    pub fn is_inside(self) -> bool {
        self != TriangleLocation::Outside
    }
}

pub fn orient3d(a: &GenericPoint, b: &GenericPoint, c: &GenericPoint, d: &GenericPoint) -> Sign {
    if let (Some(a), Some(b), Some(c), Some(d)) =
        (a.as_explicit(), b.as_explicit(), c.as_explicit(), d.as_explicit())
    {
        if let Some(s) = orient3d_f64(&a.coords(), &b.coords(), &c.coords(), &d.coords()) {
            return s;
        }
    }
    orient3d_exact(a.exact().coords(), b.exact().coords(), c.exact().coords(), d.exact().coords())
}

pub fn orient2d(a: &GenericPoint, b: &GenericPoint, c: &GenericPoint, plane: ProjectionPlane) -> Sign {
    if let (Some(a), Some(b), Some(c)) = (a.as_explicit(), b.as_explicit(), c.as_explicit()) {
        if let Some(s) = orient2d_f64(&a.coords(), &b.coords(), &c.coords(), plane) {
            return s;
        }
    }
    orient2d_exact(a.exact().coords(), b.exact().coords(), c.exact().coords(), plane)
}

pub fn coplanar(a: &GenericPoint, b: &GenericPoint, c: &GenericPoint, d: &GenericPoint) -> bool {
    orient3d(a, b, c, d).is_zero()
}

/// Collinear in space: zero orientation on all three coordinate planes.
pub fn collinear(a: &GenericPoint, b: &GenericPoint, c: &GenericPoint) -> bool {
    ProjectionPlane::ALL
        .into_iter()
        .all(|p| orient2d(a, b, c, p).is_zero())
}

/// Exact lexicographic order (x, then y, then z).
pub fn lex_cmp(a: &GenericPoint, b: &GenericPoint) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_explicit(), b.as_explicit()) {
        let (a, b) = (a.coords(), b.coords());
        return cmp_f64(a[0], b[0])
            .then_with(|| cmp_f64(a[1], b[1]))
            .then_with(|| cmp_f64(a[2], b[2]));
    }
    a.exact().cmp(b.exact())
}

/// Exact lexicographic order of the projections onto `plane`.
pub fn lex_cmp_2d(a: &GenericPoint, b: &GenericPoint, plane: ProjectionPlane) -> Ordering {
    let (i, j) = plane.axes();
    if let (Some(a), Some(b)) = (a.as_explicit(), b.as_explicit()) {
        let (a, b) = (a.coords(), b.coords());
        return cmp_f64(a[i], b[i]).then_with(|| cmp_f64(a[j], b[j]));
    }
    let (a, b) = (a.exact().coords(), b.exact().coords());
    a[i].cmp(&b[i]).then_with(|| a[j].cmp(&b[j]))
}

pub fn same_point(a: &GenericPoint, b: &GenericPoint) -> bool {
    lex_cmp(a, b) == Ordering::Equal
}

// finite inputs only, so `-0.0 == 0.0`
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Location of `p` on the closed segment `ab`. All three points must lie on
/// a plane whose projection onto `plane` is one to one.
pub fn point_in_segment(
    p: &GenericPoint,
    a: &GenericPoint,
    b: &GenericPoint,
    plane: ProjectionPlane,
) -> SegmentLocation {
    if !orient2d(a, b, p, plane).is_zero() {
        return SegmentLocation::Outside;
    }
    let pa = lex_cmp_2d(p, a, plane);
    let pb = lex_cmp_2d(p, b, plane);
    match (pa, pb) {
        (Ordering::Equal, _) => SegmentLocation::OnVertex(0),
        (_, Ordering::Equal) => SegmentLocation::OnVertex(1),
        (Ordering::Greater, Ordering::Less) | (Ordering::Less, Ordering::Greater) => {
            SegmentLocation::Interior
        }
        _ => SegmentLocation::Outside,
    }
}

/// Location of `p` in the closed triangle `abc` on `plane`. Either vertex
/// order is accepted; a degenerate triangle contains nothing.
pub fn point_in_triangle(
    p: &GenericPoint,
    a: &GenericPoint,
    b: &GenericPoint,
    c: &GenericPoint,
    plane: ProjectionPlane,
) -> TriangleLocation {
    let orientation = orient2d(a, b, c, plane);
    if orientation.is_zero() {
        return TriangleLocation::Outside;
    }
    let mut s = [
        orient2d(a, b, p, plane),
        orient2d(b, c, p, plane),
        orient2d(c, a, p, plane),
    ];
    if orientation == Sign::Negative {
        s = s.map(Sign::reversed);
    }
    if s.contains(&Sign::Negative) {
        return TriangleLocation::Outside;
    }

    match (s[0].is_zero(), s[1].is_zero(), s[2].is_zero()) {
        (false, false, false) => TriangleLocation::Interior,
        (true, false, false) => TriangleLocation::OnEdge(0),
        (false, true, false) => TriangleLocation::OnEdge(1),
        (false, false, true) => TriangleLocation::OnEdge(2),
        (true, true, false) => TriangleLocation::OnVertex(1),
        (false, true, true) => TriangleLocation::OnVertex(2),
        (true, false, true) => TriangleLocation::OnVertex(0),
        (true, true, true) => TriangleLocation::Outside,
    }
}

/// Proper crossing: the open segments meet in exactly one point interior to
/// both.
pub fn segments_cross(
    a0: &GenericPoint,
    a1: &GenericPoint,
    b0: &GenericPoint,
    b1: &GenericPoint,
    plane: ProjectionPlane,
) -> bool {
    orient2d(a0, a1, b0, plane).strictly_opposite(orient2d(a0, a1, b1, plane))
        && orient2d(b0, b1, a0, plane).strictly_opposite(orient2d(b0, b1, a1, plane))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gp(x: f64, y: f64, z: f64) -> GenericPoint {
        GenericPoint::from_coords(x, y, z).unwrap()
    }

    const XY: ProjectionPlane = ProjectionPlane::Xy;

    #[test]
    fn triangle_locations() {
        let (a, b, c) = (gp(0.0, 0.0, 0.0), gp(4.0, 0.0, 0.0), gp(0.0, 4.0, 0.0));
        let loc = |x: f64, y: f64| point_in_triangle(&gp(x, y, 0.0), &a, &b, &c, XY);

        assert_eq!(loc(1.0, 1.0), TriangleLocation::Interior);
        assert_eq!(loc(2.0, 0.0), TriangleLocation::OnEdge(0));
        assert_eq!(loc(2.0, 2.0), TriangleLocation::OnEdge(1));
        assert_eq!(loc(0.0, 2.0), TriangleLocation::OnEdge(2));
        assert_eq!(loc(0.0, 0.0), TriangleLocation::OnVertex(0));
        assert_eq!(loc(4.0, 0.0), TriangleLocation::OnVertex(1));
        assert_eq!(loc(0.0, 4.0), TriangleLocation::OnVertex(2));
        assert_eq!(loc(3.0, 3.0), TriangleLocation::Outside);

        // clockwise input gives the same answers
        let cw = point_in_triangle(&gp(2.0, 0.0, 0.0), &a, &c, &b, XY);
        assert_eq!(cw, TriangleLocation::OnEdge(2));
    }

    #[test]
    fn segment_locations() {
        let (a, b) = (gp(0.0, 0.0, 0.0), gp(2.0, 2.0, 0.0));
        assert_eq!(point_in_segment(&gp(1.0, 1.0, 0.0), &a, &b, XY), SegmentLocation::Interior);
        assert_eq!(point_in_segment(&gp(2.0, 2.0, 0.0), &a, &b, XY), SegmentLocation::OnVertex(1));
        assert_eq!(point_in_segment(&gp(3.0, 3.0, 0.0), &a, &b, XY), SegmentLocation::Outside);
        assert_eq!(point_in_segment(&gp(1.0, 0.0, 0.0), &a, &b, XY), SegmentLocation::Outside);
    }

    #[test]
    fn crossing_is_proper_only() {
        let (a0, a1) = (gp(0.0, 0.0, 0.0), gp(2.0, 2.0, 0.0));
        assert!(segments_cross(&a0, &a1, &gp(0.0, 2.0, 0.0), &gp(2.0, 0.0, 0.0), XY));
        // touching at an endpoint is not a crossing
        assert!(!segments_cross(&a0, &a1, &gp(1.0, 1.0, 0.0), &gp(2.0, 0.0, 0.0), XY));
        // collinear overlap is not a crossing
        assert!(!segments_cross(&a0, &a1, &gp(1.0, 1.0, 0.0), &gp(3.0, 3.0, 0.0), XY));
    }

    #[test]
    fn lexicographic_order_mixes_explicit_and_implicit() {
        let e = |x, y, z| crate::geometry::point::ExplicitPoint::new(x, y, z).unwrap();
        let third = GenericPoint::lpi(
            e(0.0, 0.0, 0.0),
            e(1.0, 1.0, 1.0),
            e(1.0, 0.0, 0.0),
            e(0.0, 1.0, 0.0),
            e(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert_eq!(lex_cmp(&third, &gp(1.0 / 3.0, 0.0, 0.0)), Ordering::Greater);
        assert_eq!(lex_cmp(&gp(0.0, 1.0, 0.0), &gp(-0.0, 1.0, 0.0)), Ordering::Equal);
        assert!(collinear(&gp(0.0, 0.0, 0.0), &third, &gp(2.0, 2.0, 2.0)));
        assert!(!collinear(&gp(0.0, 0.0, 0.0), &third, &gp(2.0, 2.0, 1.0)));
    }
}
