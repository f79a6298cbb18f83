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

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, warn};

use crate::arrangement::ArrangedTriangle;
use crate::arrangement::ledger::IntersectionLedger;
use crate::arrangement::propagation::Cluster;
use crate::geometry::{Aabb, AabbTree, CanonicalEdge, ExplicitPoint, GenericPoint, ProjectionPlane};
use crate::kernel::{
    SegmentLocation, Sign, TriangleLocation, lex_cmp, lex_cmp_2d, orient2d, point_in_segment,
    point_in_triangle, segments_cross,
};
use crate::mesh::{CoplanarMesh, FlipOutcome, Label, LocationDag, TriangleSoup};

/// What a constraint piece lies on. Pieces of the same support are
/// collinear, so crossing points are always built from two different ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Support {
    /// The line through two explicit soup vertices (smaller id first).
    EdgeLine(u32, u32),
    /// The intersection of the cluster plane with this triangle's plane.
    Triangle(u32),
}

#[derive(Clone, Copy, Debug)]
struct Piece {
    v: [u32; 2],
    support: Support,
}

impl Piece {
    fn new(a: u32, b: u32, support: Support) -> Self {
        Piece {
            v: [a.min(b), a.max(b)],
            support,
        }
    }
}

/// Triangles and constrained edges produced for one cluster, in soup ids.
#[derive(Clone, Debug, Default)]
pub struct ClusterOutput {
    pub triangles: Vec<ArrangedTriangle>,
    pub constrained: Vec<[u32; 2]>,
}

// box of approximate projected coordinates, widened by the rounding error of
// the approximations
fn rough_box(points: &[[f64; 2]]) -> Aabb<f64, 2> {
    let b = Aabb::from_points(points);
    let mag = b
        .min()
        .iter()
        .chain(b.max().iter())
        .fold(0.0f64, |m, c| m.max(c.abs()));
    b.inflated(mag * f64::EPSILON * 4.0 + f64::MIN_POSITIVE)
}

struct ClusterBuilder<'a> {
    soup: &'a TriangleSoup,
    cluster: &'a Cluster,
    plane: ProjectionPlane,
    jolly: u32,
    points: BTreeMap<u32, Arc<GenericPoint>>,
    pieces: Vec<Piece>,
}

impl<'a> ClusterBuilder<'a> {
    fn new(soup: &'a TriangleSoup, ledger: &IntersectionLedger, cluster: &'a Cluster) -> Self {
        let reference = cluster.reference();
        let mut ids = BTreeSet::new();
        let mut pieces = Vec::new();
        for &t in &cluster.members {
            let v = soup.tri(t);
            ids.extend(v);
            ids.extend(ledger.tri_points(t));
            for (k, &e) in soup.tri_edges(t).iter().enumerate() {
                ids.extend(ledger.edge_points(e));
                let (a, b) = (v[k], v[(k + 1) % 3]);
                pieces.push(Piece::new(a, b, Support::EdgeLine(a.min(b), a.max(b))));
            }
            for s in ledger.tri_segments(t) {
                ids.extend(s.v);
                pieces.push(Piece::new(s.v[0], s.v[1], Support::Triangle(s.support)));
            }
        }
        let points = ids.into_iter().map(|v| (v, soup.vert(v))).collect();
        ClusterBuilder {
            soup,
            cluster,
            plane: soup.tri_plane(reference),
            jolly: soup.tri_jolly(reference),
            points,
            pieces,
        }
    }

    fn point(&self, v: u32) -> &GenericPoint {
        match self.points.get(&v) {
            Some(p) => &**p,
            None => panic!("vertex {v} is not part of cluster {}", self.cluster.reference()),
        }
    }

    fn projected(&self, v: u32) -> [f64; 2] {
        self.plane.project(self.point(v).approx())
    }

    fn piece_box(&self, v: [u32; 2]) -> Aabb<f64, 2> {
        rough_box(&[self.projected(v[0]), self.projected(v[1])])
    }

    /// Splits every piece at the `candidates` lying strictly inside it.
    /// Returns whether anything was split.
    fn split_pieces(&mut self, candidates: &[u32]) -> bool {
        let boxes: Vec<(u32, Aabb<f64, 2>)> = candidates
            .iter()
            .map(|&v| (v, rough_box(&[self.projected(v)])))
            .collect();
        let mut out = Vec::with_capacity(self.pieces.len());
        let mut changed = false;
        for piece in std::mem::take(&mut self.pieces) {
            let [a, b] = piece.v;
            let bx = self.piece_box(piece.v);
            let mut chain: Vec<u32> = boxes
                .iter()
                .filter(|(v, pb)| *v != a && *v != b && pb.intersects(&bx))
                .map(|(v, _)| *v)
                .filter(|&v| {
                    point_in_segment(self.point(v), self.point(a), self.point(b), self.plane)
                        == SegmentLocation::Interior
                })
                .collect();
            if chain.is_empty() {
                out.push(piece);
                continue;
            }
            changed = true;
            chain.push(a);
            chain.push(b);
            chain.sort_by(|x, y| lex_cmp_2d(self.point(*x), self.point(*y), self.plane));
            for w in chain.windows(2) {
                out.push(Piece::new(w[0], w[1], piece.support));
            }
        }
        self.pieces = out;
        self.dedup_pieces();
        changed
    }

    // one piece per vertex pair, smallest support first
    fn dedup_pieces(&mut self) {
        self.pieces.sort_unstable_by_key(|p| (p.v, p.support));
        self.pieces.dedup_by_key(|p| p.v);
    }

    /// Adds the crossing points of pieces until no two pieces cross.
    fn resolve_crossings(&mut self) {
        loop {
            let items: Vec<(Aabb<f64, 2>, usize)> = self
                .pieces
                .iter()
                .enumerate()
                .map(|(i, p)| (self.piece_box(p.v), i))
                .collect();
            let tree = AabbTree::build(items.clone());

            let mut found = Vec::new();
            for (i, j) in tree.overlapping_pairs(&items, false) {
                let (p, q) = (self.pieces[i], self.pieces[j]);
                if p.v.iter().any(|v| q.v.contains(v)) {
                    continue;
                }
                let crossing = segments_cross(
                    self.point(p.v[0]),
                    self.point(p.v[1]),
                    self.point(q.v[0]),
                    self.point(q.v[1]),
                    self.plane,
                );
                if crossing {
                    match self.crossing_point(p.support, q.support) {
                        Some(x) => found.push(x),
                        None => warn!(
                            "pieces {:?} and {:?} cross but their supports do not meet",
                            p.v, q.v
                        ),
                    }
                }
            }
            if found.is_empty() {
                return;
            }
            found.sort_unstable();
            found.dedup();
            let soup = self.soup;
            for &x in &found {
                self.points.entry(x).or_insert_with(|| soup.vert(x));
            }
            if !self.split_pieces(&found) {
                warn!(
                    "crossing points did not split any piece in cluster {}",
                    self.cluster.reference()
                );
                return;
            }
        }
    }

    fn crossing_point(&self, s: Support, r: Support) -> Option<u32> {
        let e = |v: u32| self.soup.explicit_vert(v);
        let plane_of = |t: u32| -> [ExplicitPoint; 3] { self.soup.tri(t).map(|v| e(v)) };
        let point = match (s, r) {
            (Support::EdgeLine(a, b), Support::EdgeLine(c, d)) => {
                GenericPoint::lpi(e(a), e(b), e(c), e(d), e(self.jolly))
            }
            (Support::EdgeLine(a, b), Support::Triangle(t))
            | (Support::Triangle(t), Support::EdgeLine(a, b)) => {
                let [p, q, u] = plane_of(t);
                GenericPoint::lpi(e(a), e(b), p, q, u)
            }
            (Support::Triangle(t1), Support::Triangle(t2)) => {
                GenericPoint::tpi([plane_of(self.cluster.reference()), plane_of(t1), plane_of(t2)])
            }
        }?;
        Some(self.soup.add_implicit_vertex(point))
    }

    /// Hull fan over every point, then the inner points one at a time.
    fn initial_mesh(&self) -> (CoplanarMesh, AHashMap<u32, u32>) {
        let mut order: Vec<u32> = self.points.keys().copied().collect();
        order.sort_by(|x, y| lex_cmp_2d(self.point(*x), self.point(*y), self.plane));
        let pts: Vec<Arc<GenericPoint>> = order.iter().map(|v| self.points[v].clone()).collect();

        let hull = convex_hull(&pts, self.plane);
        assert!(hull.len() >= 3, "cluster {} is degenerate", self.cluster.reference());
        let fan: Vec<[u32; 3]> = (1..hull.len() - 1)
            .map(|k| [hull[0], hull[k], hull[k + 1]])
            .collect();
        let mut on_hull = vec![false; pts.len()];
        for &h in &hull {
            on_hull[h as usize] = true;
        }

        let mut mesh = CoplanarMesh::from_triangles(pts, &order, &fan, self.plane, false);
        let mut dag = LocationDag::for_mesh(&mut mesh);
        let mut alias = AHashMap::new();
        for v in 0..order.len() as u32 {
            if on_hull[v as usize] {
                continue;
            }
            let p = mesh.vert(v).clone();
            match dag.locate(&mesh, &p) {
                Some((t, TriangleLocation::Interior)) => {
                    mesh.split_tri_tracked(t, v, &mut dag);
                }
                Some((t, TriangleLocation::OnEdge(k))) => {
                    let e = mesh.tri_edge_id(t, k);
                    mesh.split_edge_tracked(e, v, &mut dag);
                }
                Some((t, TriangleLocation::OnVertex(k))) => {
                    let w = mesh.tri_vert_id(t, k);
                    warn!("vertex {} coincides with vertex {}", order[v as usize], order[w as usize]);
                    alias.insert(order[v as usize], order[w as usize]);
                }
                Some((_, TriangleLocation::Outside)) | None => {
                    panic!("vertex {} lies outside the hull of its cluster", order[v as usize])
                }
            }
        }
        (mesh, alias)
    }

    fn build(mut self) -> ClusterOutput {
        let all: Vec<u32> = self.points.keys().copied().collect();
        self.split_pieces(&all);
        self.resolve_crossings();

        let (mut mesh, alias) = self.initial_mesh();
        let resolve = |v: u32| alias.get(&v).copied().unwrap_or(v);

        let mut constraints: Vec<[u32; 2]> = self
            .pieces
            .iter()
            .map(|p| p.v.map(resolve))
            .filter(|[a, b]| a != b)
            .map(|[a, b]| {
                if lex_cmp(self.point(a), self.point(b)).is_le() {
                    [a, b]
                } else {
                    [b, a]
                }
            })
            .collect();
        constraints.sort_by(|x, y| {
            lex_cmp(self.point(x[0]), self.point(y[0]))
                .then_with(|| lex_cmp(self.point(x[1]), self.point(y[1])))
        });
        constraints.dedup();
        for [a, b] in constraints {
            let (la, lb) = (local_id(&mesh, a), local_id(&mesh, b));
            insert_constraint(&mut mesh, la, lb);
        }

        let out = self.label(&mut mesh);
        debug!(
            "cluster {}: {} members, {} points, {} triangles",
            self.cluster.reference(),
            self.cluster.members.len(),
            self.points.len(),
            out.triangles.len()
        );
        out
    }

    fn label(&self, mesh: &mut CoplanarMesh) -> ClusterOutput {
        let members: Vec<(u32, [Arc<GenericPoint>; 3], Sign, Label)> = self
            .cluster
            .members
            .iter()
            .map(|&t| {
                let p = self.soup.tri_points(t);
                let s = orient2d(&p[0], &p[1], &p[2], self.plane);
                (t, p, s, self.soup.tri_label(t))
            })
            .collect();

        let mut out = ClusterOutput::default();
        let mut outside = Vec::new();
        let tris: Vec<u32> = mesh.tri_ids().collect();
        for t in tris {
            let v = mesh.tri(t);
            let mut pos: Option<(Label, u32)> = None;
            let mut neg: Option<(Label, u32)> = None;
            for (m, p, s, label) in &members {
                let covers = v.iter().all(|&x| {
                    point_in_triangle(mesh.vert(x), &p[0], &p[1], &p[2], self.plane).is_inside()
                });
                if !covers {
                    continue;
                }
                let group = if *s == Sign::Negative { &mut neg } else { &mut pos };
                *group = match *group {
                    Some((l, parent)) => Some((l | *label, parent.min(*m))),
                    None => Some((*label, *m)),
                };
            }
            if pos.is_none() && neg.is_none() {
                outside.push(t);
                continue;
            }
            let [a, b, c] = v.map(|x| soup_id(mesh, x));
            if let Some((label, parent)) = pos {
                out.triangles.push(ArrangedTriangle {
                    v: [a, b, c],
                    label,
                    parent,
                });
            }
            if let Some((label, parent)) = neg {
                out.triangles.push(ArrangedTriangle {
                    v: [a, c, b],
                    label,
                    parent,
                });
            }
        }
        mesh.remove_tris(&outside);

        for e in mesh.edge_ids() {
            if mesh.edge_is_constrained(e) {
                let [a, b] = mesh.edge(e).map(|x| soup_id(mesh, x));
                out.constrained.push([a.min(b), a.max(b)]);
            }
        }
        out.constrained.sort_unstable();
        out
    }
}

fn soup_id(mesh: &CoplanarMesh, v: u32) -> u32 {
    match mesh.vert_orig_id(v) {
        Some(s) => s,
        None => panic!("cluster vertex {v} has no soup id"),
    }
}

fn local_id(mesh: &CoplanarMesh, s: u32) -> u32 {
    match mesh.vert_new_id(s) {
        Some(v) => v,
        None => panic!("soup vertex {s} is not in the cluster mesh"),
    }
}

/// Strictly convex hull of points sorted by [`lex_cmp_2d`], counter-clockwise,
/// as indices into `pts`.
fn convex_hull(pts: &[Arc<GenericPoint>], plane: ProjectionPlane) -> Vec<u32> {
    let n = pts.len();
    let chain = |range: &mut dyn Iterator<Item = usize>| {
        let mut h: Vec<usize> = Vec::new();
        for i in range {
            while h.len() >= 2
                && orient2d(&pts[h[h.len() - 2]], &pts[h[h.len() - 1]], &pts[i], plane) != Sign::Positive
            {
                h.pop();
            }
            h.push(i);
        }
        h.pop();
        h
    };
    let mut hull = chain(&mut (0..n));
    hull.extend(chain(&mut (0..n).rev()));
    hull.into_iter().map(|i| i as u32).collect()
}

/// Makes `(a, b)` an edge of `mesh` by flipping the edges it crosses, then
/// marks it constrained. No vertex may lie strictly inside `(a, b)`.
pub(crate) fn insert_constraint(mesh: &mut CoplanarMesh, a: u32, b: u32) {
    if let Some(e) = mesh.edge_id(a, b) {
        mesh.set_edge_constrained(e, true);
        return;
    }
    let plane = mesh.plane();
    let (pa, pb) = (mesh.vert(a).clone(), mesh.vert(b).clone());
    let proj = |mesh: &CoplanarMesh, v: u32| plane.project(mesh.vert(v).approx());
    let bx = rough_box(&[proj(mesh, a), proj(mesh, b)]);
    let crosses = |mesh: &CoplanarMesh, u: u32, w: u32| {
        ![u, w].iter().any(|x| *x == a || *x == b)
            && rough_box(&[proj(mesh, u), proj(mesh, w)]).intersects(&bx)
            && segments_cross(&pa, &pb, mesh.vert(u), mesh.vert(w), plane)
    };

    let mut queue: VecDeque<CanonicalEdge> = mesh
        .edge_ids()
        .filter_map(|e| {
            let [u, w] = mesh.edge(e);
            crosses(mesh, u, w).then(|| CanonicalEdge::new(u, w))
        })
        .collect();
    let mut stalls = 0usize;
    while let Some(key) = queue.pop_front() {
        let [u, w] = key.verts();
        let Some(e) = mesh.edge_id(u, w) else {
            continue;
        };
        if !crosses(mesh, u, w) {
            continue;
        }
        match mesh.flip_edge(e) {
            FlipOutcome::Flipped(ne) => {
                stalls = 0;
                let [c, d] = mesh.edge(ne);
                if crosses(mesh, c, d) {
                    queue.push_back(CanonicalEdge::new(c, d));
                }
            }
            FlipOutcome::NotConvex => {
                queue.push_back(key);
                stalls += 1;
                assert!(
                    stalls <= queue.len(),
                    "no crossing edge of constraint ({a}, {b}) can be flipped"
                );
            }
            FlipOutcome::Constrained => panic!("constraint ({a}, {b}) crosses constrained edge ({u}, {w})"),
            FlipOutcome::Boundary => panic!("constraint ({a}, {b}) crosses boundary edge ({u}, {w})"),
        }
    }
    match mesh.edge_id(a, b) {
        Some(e) => mesh.set_edge_constrained(e, true),
        None => panic!("constraint ({a}, {b}) was not recovered"),
    }
}

/// Re-triangulates the members of `cluster` so that every intersection point
/// is a vertex and every intersection segment and member edge is a union of
/// constrained edges.
pub fn triangulate_cluster(
    soup: &TriangleSoup,
    ledger: &IntersectionLedger,
    cluster: &Cluster,
) -> ClusterOutput {
    ClusterBuilder::new(soup, ledger, cluster).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArrangementConfig;

    fn gp(x: f64, y: f64) -> Arc<GenericPoint> {
        Arc::new(GenericPoint::from_coords(x, y, 0.0).unwrap())
    }

    #[test]
    fn hull_skips_collinear_points() {
        let pts = [gp(0.0, 0.0), gp(0.0, 2.0), gp(1.0, 0.0), gp(1.0, 1.0), gp(2.0, 0.0)];
        let hull = convex_hull(&pts, ProjectionPlane::Xy);
        assert_eq!(hull, vec![0, 4, 1]);
    }

    #[test]
    fn constraint_is_recovered_by_flips() {
        // a square split along (1, 3); force the other diagonal
        let mut mesh = CoplanarMesh::from_triangles(
            vec![gp(0.0, 0.0), gp(1.0, 0.0), gp(1.0, 1.0), gp(0.0, 1.0)],
            &[0, 1, 2, 3],
            &[[0, 1, 3], [1, 2, 3]],
            ProjectionPlane::Xy,
            false,
        );
        insert_constraint(&mut mesh, 0, 2);
        let e = mesh.edge_id(0, 2).unwrap();
        assert!(mesh.edge_is_constrained(e));
        assert!(mesh.edge_id(1, 3).is_none());
        assert!(mesh.check_topology().is_ok());
    }

    #[test]
    fn piercing_triangles_share_a_constrained_segment() {
        let coords = [
            0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0, 0.0, //
            1.0, 1.0, -1.0, 1.0, 1.0, 3.0, 6.0, 1.0, 1.0,
        ];
        let cfg = ArrangementConfig::default().with_parallel(false);
        let soup = TriangleSoup::new(&coords, &[0, 1, 2, 3, 4, 5], &[], &cfg).unwrap();
        let ledger = IntersectionLedger::new(soup.num_tris(), soup.num_orig_edges());
        crate::arrangement::classify::check_triangle_pair(&soup, &ledger, 0, 1);

        let out = triangulate_cluster(&soup, &ledger, &Cluster { members: vec![0] });
        // (1,1,0) splits the triangle in three, (3,1,0) splits the
        // hypotenuse and with it one of those
        assert_eq!(out.triangles.len(), 4);
        assert!(out.triangles.iter().all(|t| t.parent == 0 && t.label == Label::bit(0)));

        let seg = ledger.tri_segments(0)[0].v;
        assert!(out.constrained.contains(&seg));
        // the three original edges survive as constrained chains: 3 + 1 split
        assert_eq!(out.constrained.len(), 5);
    }
}
