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

use std::sync::Arc;

use log::warn;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::arrangement::case_table::{PlaneCase, classify_signs};
use crate::arrangement::ledger::IntersectionLedger;
use crate::geometry::{GenericPoint, ProjectionPlane};
use crate::kernel::{
    SegmentLocation, Sign, TriangleLocation, lex_cmp, orient2d, orient3d, point_in_segment,
    point_in_triangle, segments_cross,
};
use crate::mesh::TriangleSoup;

/// A soup triangle with its points and edges fetched once.
pub(crate) struct TriView {
    pub t: u32,
    pub v: [u32; 3],
    pub p: [Arc<GenericPoint>; 3],
    pub e: [u32; 3],
    pub plane: ProjectionPlane,
}

impl TriView {
    pub fn new(soup: &TriangleSoup, t: u32) -> Self {
        TriView {
            t,
            v: soup.tri(t),
            p: soup.tri_points(t),
            e: soup.tri_edges(t),
            plane: soup.tri_plane(t),
        }
    }

    fn edge_points(&self, i: usize) -> (&GenericPoint, &GenericPoint) {
        (&*self.p[i], &*self.p[(i + 1) % 3])
    }

    pub fn locate(&self, q: &GenericPoint) -> TriangleLocation {
        point_in_triangle(q, &self.p[0], &self.p[1], &self.p[2], self.plane)
    }
}

/// Intersection points found for one pair, without repetitions.
#[derive(Default)]
struct Found(SmallVec<[u32; 6]>);

impl Found {
    fn push(&mut self, v: u32) {
        if !self.0.contains(&v) {
            self.0.push(v);
        }
    }
}

/// Classifies every candidate pair, filling `ledger` and creating implicit
/// vertices and segment edges in `soup`.
pub fn classify_intersections(
    soup: &TriangleSoup,
    ledger: &IntersectionLedger,
    pairs: &[(u32, u32)],
    parallel: bool,
) {
    if parallel {
        pairs
            .par_iter()
            .for_each(|&(a, b)| check_triangle_pair(soup, ledger, a, b));
    } else {
        for &(a, b) in pairs {
            check_triangle_pair(soup, ledger, a, b);
        }
    }
}

/// Decides how triangles `ta` and `tb` meet and records what they share.
/// Disjoint pairs leave the soup and the ledger untouched.
pub fn check_triangle_pair(soup: &TriangleSoup, ledger: &IntersectionLedger, ta: u32, tb: u32) {
    if ta == tb {
        return;
    }
    let a = TriView::new(soup, ta);
    let b = TriView::new(soup, tb);

    let sb = b.p.each_ref().map(|q| orient3d(&a.p[0], &a.p[1], &a.p[2], q));
    let case_b = classify_signs(sb);
    match case_b {
        PlaneCase::AllCoplanar => return coplanar_pair(soup, ledger, &a, &b),
        PlaneCase::Separated => return,
        _ => {}
    }
    let sa = a.p.each_ref().map(|q| orient3d(&b.p[0], &b.p[1], &b.p[2], q));
    let case_a = classify_signs(sa);
    match case_a {
        PlaneCase::AllCoplanar => return coplanar_pair(soup, ledger, &a, &b),
        PlaneCase::Separated => return,
        _ => {}
    }

    let shared = a.v.iter().filter(|v| b.v.contains(v)).count();
    if shared >= 2 {
        // neighbours across an edge meet only along it
        return;
    }

    let mut found = Found::default();
    check_side(soup, ledger, &b, case_b, &a, &mut found);
    check_side(soup, ledger, &a, case_a, &b, &mut found);
    record(soup, ledger, &a, &b, found);
}

// features of `f` against the plane and interior of `tgt`
fn check_side(
    soup: &TriangleSoup,
    ledger: &IntersectionLedger,
    f: &TriView,
    case: PlaneCase,
    tgt: &TriView,
    found: &mut Found,
) {
    match case {
        PlaneCase::CoplanarEdge(i) => {
            let j = (i + 1) % 3;
            vertex_in_triangle(ledger, f.v[i], &f.p[i], tgt, found);
            vertex_in_triangle(ledger, f.v[j], &f.p[j], tgt, found);
            coplanar_edge_vs_triangle(soup, ledger, f, i, tgt, found);
        }
        PlaneCase::VertexTouch(k) => {
            vertex_in_triangle(ledger, f.v[k], &f.p[k], tgt, found);
        }
        PlaneCase::VertexAndCrossing(k) => {
            vertex_in_triangle(ledger, f.v[k], &f.p[k], tgt, found);
            edge_cross_triangle(soup, ledger, f, (k + 1) % 3, tgt, found);
        }
        PlaneCase::EdgesCross(k) => {
            edge_cross_triangle(soup, ledger, f, k, tgt, found);
            edge_cross_triangle(soup, ledger, f, (k + 2) % 3, tgt, found);
        }
        PlaneCase::AllCoplanar | PlaneCase::Separated => {}
    }
}

// `p` is known to lie on the plane of `tgt`
fn vertex_in_triangle(
    ledger: &IntersectionLedger,
    v: u32,
    p: &GenericPoint,
    tgt: &TriView,
    found: &mut Found,
) {
    if tgt.v.contains(&v) {
        found.push(v);
        return;
    }
    match tgt.locate(p) {
        TriangleLocation::Interior => {
            ledger.add_point_in_tri(tgt.t, v);
            found.push(v);
        }
        TriangleLocation::OnEdge(j) => {
            ledger.add_point_in_edge(tgt.e[j], v);
            found.push(v);
        }
        TriangleLocation::OnVertex(j) => {
            warn!("vertex {v} coincides with vertex {} of triangle {}", tgt.v[j], tgt.t);
            found.push(tgt.v[j]);
        }
        TriangleLocation::Outside => {}
    }
}

// edge `i` of `f` has its endpoints strictly on opposite sides of `tgt`'s plane
fn edge_cross_triangle(
    soup: &TriangleSoup,
    ledger: &IntersectionLedger,
    f: &TriView,
    i: usize,
    tgt: &TriView,
    found: &mut Found,
) {
    let (p, q) = f.edge_points(i);
    let s = [0, 1, 2].map(|j| orient3d(p, q, &tgt.p[j], &tgt.p[(j + 1) % 3]));
    if s.contains(&Sign::Positive) && s.contains(&Sign::Negative) {
        return;
    }
    match s.iter().filter(|x| x.is_zero()).count() {
        0 => {
            if let Some(x) = add_edge_cross_tri_inters(soup, f.e[i], tgt.t) {
                ledger.add_point_in_tri(tgt.t, x);
                ledger.add_point_in_edge(f.e[i], x);
                found.push(x);
            }
        }
        1 => {
            let j = s.iter().position(|x| x.is_zero()).unwrap_or(0);
            if let Some(x) = add_edge_cross_edge_inters(soup, f.e[i], tgt.e[j], tgt.t, false) {
                ledger.add_point_in_edge(tgt.e[j], x);
                ledger.add_point_in_edge(f.e[i], x);
                found.push(x);
            }
        }
        2 => {
            // through the vertex shared by the two zero edges
            let m = s.iter().position(|x| !x.is_zero()).unwrap_or(0);
            let w = tgt.v[(m + 2) % 3];
            ledger.add_point_in_edge(f.e[i], w);
            found.push(w);
        }
        _ => {}
    }
}

// edge `i` of `f` lies in the plane of `tgt`; its endpoints are handled by
// the caller
fn coplanar_edge_vs_triangle(
    soup: &TriangleSoup,
    ledger: &IntersectionLedger,
    f: &TriView,
    i: usize,
    tgt: &TriView,
    found: &mut Found,
) {
    let (p, q) = f.edge_points(i);
    let (vp, vq) = (f.v[i], f.v[(i + 1) % 3]);
    for j in 0..3 {
        if f.e[i] == tgt.e[j] {
            continue;
        }
        let (a, b) = tgt.edge_points(j);
        if segments_cross(p, q, a, b, tgt.plane) {
            if let Some(x) = add_edge_cross_edge_inters(soup, f.e[i], tgt.e[j], tgt.t, true) {
                ledger.add_point_in_edge(f.e[i], x);
                ledger.add_point_in_edge(tgt.e[j], x);
                found.push(x);
            }
        }
    }
    for j in 0..3 {
        let w = tgt.v[j];
        if w == vp || w == vq {
            continue;
        }
        if point_in_segment(&tgt.p[j], p, q, tgt.plane) == SegmentLocation::Interior {
            ledger.add_point_in_edge(f.e[i], w);
            found.push(w);
        }
    }
}

fn coplanar_pair(soup: &TriangleSoup, ledger: &IntersectionLedger, a: &TriView, b: &TriView) {
    let mut found = Found::default();
    for k in 0..3 {
        vertex_in_triangle(ledger, b.v[k], &b.p[k], a, &mut found);
        vertex_in_triangle(ledger, a.v[k], &a.p[k], b, &mut found);
    }
    for i in 0..3 {
        for j in 0..3 {
            if a.e[i] == b.e[j] {
                continue;
            }
            let (a0, a1) = a.edge_points(i);
            let (b0, b1) = b.edge_points(j);
            if !segments_cross(a0, a1, b0, b1, a.plane) {
                continue;
            }
            if let Some(x) = add_edge_cross_edge_inters(soup, a.e[i], b.e[j], b.t, true) {
                ledger.add_point_in_edge(a.e[i], x);
                ledger.add_point_in_edge(b.e[j], x);
                found.push(x);
            }
        }
    }

    if interiors_overlap(a, b) {
        ledger.add_coplanar(a.t, b.t);
        ledger.add_pair(a.t, b.t);
    } else if found.0.iter().any(|v| !(a.v.contains(v) && b.v.contains(v))) {
        ledger.add_pair(a.t, b.t);
    }
}

/// Exact separating axis test for two coplanar triangles: the interiors are
/// disjoint iff the line through some edge keeps the other triangle on its
/// closed outer side.
fn interiors_overlap(a: &TriView, b: &TriView) -> bool {
    !separated_by_edge(a, b) && !separated_by_edge(b, a)
}

fn separated_by_edge(a: &TriView, b: &TriView) -> bool {
    (0..3).any(|i| {
        let (p, q) = a.edge_points(i);
        let inner = orient2d(p, q, &a.p[(i + 2) % 3], a.plane);
        b.p.iter().all(|x| orient2d(p, q, x, a.plane) != inner)
    })
}

fn record(soup: &TriangleSoup, ledger: &IntersectionLedger, a: &TriView, b: &TriView, found: Found) {
    let mut pts = found.0;
    let shared_only = pts.iter().all(|v| a.v.contains(v) && b.v.contains(v));
    if pts.is_empty() || (shared_only && pts.len() < 2) {
        return;
    }
    ledger.add_pair(a.t, b.t);
    if pts.len() < 2 {
        return;
    }

    // collinear points: chain them in lexicographic order
    pts.sort_unstable();
    let mut points: Vec<(u32, Arc<GenericPoint>)> = pts.iter().map(|&v| (v, soup.vert(v))).collect();
    points.sort_by(|x, y| lex_cmp(&x.1, &y.1));
    for w in points.windows(2) {
        add_symbolic_segment(soup, ledger, a.t, w[0].0, w[1].0, b.t);
        add_symbolic_segment(soup, ledger, b.t, w[0].0, w[1].0, a.t);
    }
}

fn add_symbolic_segment(
    soup: &TriangleSoup,
    ledger: &IntersectionLedger,
    t: u32,
    v0: u32,
    v1: u32,
    support: u32,
) {
    if v0 == v1 {
        return;
    }
    let e = soup.add_edge(v0, v1);
    ledger.add_segment(t, v0, v1, e, support);
}

/// Vertex where edge `e` crosses the plane of triangle `t`.
pub fn add_edge_cross_tri_inters(soup: &TriangleSoup, e: u32, t: u32) -> Option<u32> {
    let [a, b] = soup.edge(e);
    let [r, s, u] = soup.tri(t);
    let point = GenericPoint::lpi(
        soup.explicit_vert(a),
        soup.explicit_vert(b),
        soup.explicit_vert(r),
        soup.explicit_vert(s),
        soup.explicit_vert(u),
    );
    match point {
        Some(p) => Some(soup.add_implicit_vertex(p)),
        None => {
            warn!("edge {e} is parallel to the plane of triangle {t}");
            None
        }
    }
}

/// Vertex where edge `e0` crosses edge `e1` of triangle `t1`. For coplanar
/// edges the second plane is the one through `e1` and the triangle's jolly
/// point; otherwise it is the plane of `t1`.
pub fn add_edge_cross_edge_inters(
    soup: &TriangleSoup,
    e0: u32,
    e1: u32,
    t1: u32,
    coplanar: bool,
) -> Option<u32> {
    let [a, b] = soup.edge(e0);
    let [r, s, u] = if coplanar {
        let [c, d] = soup.edge(e1);
        [c, d, soup.tri_jolly(t1)]
    } else {
        soup.tri(t1)
    };
    let point = GenericPoint::lpi(
        soup.explicit_vert(a),
        soup.explicit_vert(b),
        soup.explicit_vert(r),
        soup.explicit_vert(s),
        soup.explicit_vert(u),
    );
    match point {
        Some(p) => Some(soup.add_implicit_vertex(p)),
        None => {
            warn!("edges {e0} and {e1} do not meet in one point");
            None
        }
    }
}

/// Containment of `p` in soup triangle `t`. `p` must lie on its plane.
pub fn point_inside_triangle(soup: &TriangleSoup, p: &GenericPoint, t: u32, strict: bool) -> bool {
    let [a, b, c] = soup.tri_points(t);
    let loc = point_in_triangle(p, &a, &b, &c, soup.tri_plane(t));
    if strict {
        loc == TriangleLocation::Interior
    } else {
        loc.is_inside()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArrangementConfig;

    fn soup(coords: &[f64], tris: &[u32]) -> TriangleSoup {
        TriangleSoup::new(coords, tris, &[], &ArrangementConfig::default().with_parallel(false)).unwrap()
    }

    fn ledger(s: &TriangleSoup) -> IntersectionLedger {
        IntersectionLedger::new(s.num_tris(), s.num_orig_edges())
    }

    #[test]
    fn disjoint_pair_mutates_nothing() {
        let s = soup(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 5.0, 1.0, 6.0, 5.0, -1.0, 5.0, 6.0, 0.5],
            &[0, 1, 2, 3, 4, 5],
        );
        let l = ledger(&s);
        let (nv, ne) = (s.num_verts(), s.num_edges());
        check_triangle_pair(&s, &l, 0, 1);
        assert_eq!((s.num_verts(), s.num_edges()), (nv, ne));
        assert!(l.intersecting_pairs().is_empty());
        assert!(!l.tri_has_data(0) && !l.tri_has_data(1));
    }

    #[test]
    fn piercing_edge_makes_interior_point() {
        // a vertical triangle whose bottom edge pierces the horizontal one
        let s = soup(
            &[
                0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0, 0.0, //
                1.0, 1.0, -1.0, 1.0, 1.0, 3.0, 6.0, 1.0, 1.0,
            ],
            &[0, 1, 2, 3, 4, 5],
        );
        let l = ledger(&s);
        check_triangle_pair(&s, &l, 0, 1);

        assert_eq!(l.intersecting_pairs(), vec![(0, 1)]);
        let inner = l.tri_points(0);
        assert_eq!(inner.len(), 1);
        assert_eq!(s.vert(inner[0]).approx(), [1.0, 1.0, 0.0]);
        // the other end lies on the hypotenuse of triangle 0
        let hyp = s.tri_edge_id(0, 1);
        let on_edge = l.edge_points(hyp);
        assert_eq!(on_edge.len(), 1);
        assert_eq!(s.vert(on_edge[0]).approx(), [3.0, 1.0, 0.0]);
        assert_eq!(l.tri_segments(0).len(), 1);
        assert_eq!(l.tri_segments(1).len(), 1);
        assert_eq!(l.tri_segments(0)[0].support, 1);
        assert_eq!(s.num_verts(), s.num_orig_verts() + 4 + 2);
    }

    #[test]
    fn shared_vertex_alone_is_not_an_intersection() {
        let s = soup(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 1.0, -1.0, 0.0, 1.0],
            &[0, 1, 2, 0, 3, 4],
        );
        let l = ledger(&s);
        check_triangle_pair(&s, &l, 0, 1);
        assert!(l.intersecting_pairs().is_empty());
    }

    #[test]
    fn coplanar_overlap_is_recorded() {
        let s = soup(
            &[
                0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0, //
                1.0, -1.0, 0.0, 1.0, 1.5, 0.0, -1.0, 1.0, 0.0,
            ],
            &[0, 1, 2, 3, 4, 5],
        );
        let l = ledger(&s);
        check_triangle_pair(&s, &l, 0, 1);
        assert_eq!(l.coplanar_tris(0), vec![1]);
        assert_eq!(l.intersecting_pairs(), vec![(0, 1)]);
        // vertex (1, 1.5) of the second triangle is outside the first, but
        // the edges cross
        let crossings: usize = s.tri_edges(0).iter().map(|&e| l.edge_points(e).len()).sum();
        assert!(crossings >= 2);
    }

    #[test]
    fn coplanar_neighbours_do_not_overlap() {
        let s = soup(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2, 0, 2, 3],
        );
        let l = ledger(&s);
        check_triangle_pair(&s, &l, 0, 1);
        assert!(l.coplanar_tris(0).is_empty());
        assert!(l.intersecting_pairs().is_empty());
    }

    #[test]
    fn point_containment() {
        let s = soup(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0], &[0, 1, 2]);
        let on_edge = GenericPoint::from_coords(1.0, 0.0, 0.0).unwrap();
        assert!(point_inside_triangle(&s, &on_edge, 0, false));
        assert!(!point_inside_triangle(&s, &on_edge, 0, true));
    }
}
