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

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use smallvec::{SmallVec, smallvec};

use crate::error::TopologyError;
use crate::geometry::{CanonicalEdge, GenericPoint, ProjectionPlane};
use crate::kernel::{
    SegmentLocation, Sign, TriangleLocation, orient2d, orient3d, point_in_segment,
    point_in_triangle,
};
use crate::mesh::info::VertInfo;
use crate::mesh::point_location::LocationDag;

/// Marks a triangle that has no node in a point-location structure.
pub const NO_NODE: u32 = u32::MAX;

#[derive(Clone, Debug)]
struct MeshVert {
    point: Arc<GenericPoint>,
    orig: Option<u32>,
    info: VertInfo,
}

#[derive(Clone, Copy, Debug)]
struct MeshEdge {
    v: [u32; 2],
    constrained: bool,
    visited: bool,
    removed: bool,
}

#[derive(Clone, Copy, Debug)]
struct MeshTri {
    v: [u32; 3],
    info: u32,
    node: u32,
    removed: bool,
}

/// Result of an edge flip request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    /// The edge was replaced by the returned one.
    Flipped(u32),
    Constrained,
    /// The two incident triangles do not form a strictly convex quad.
    NotConvex,
    /// Fewer than two incident triangles.
    Boundary,
}

/// Which triangles replaced a split one, and the location node it had.
#[derive(Clone, Debug)]
struct SplitRecord {
    node: u32,
    children: SmallVec<[u32; 3]>,
}

/// Indexed triangulation of one plane.
///
/// Triangles and edges live in dense slots; removal tombstones a slot and
/// pushes it on a free list, so ids of live entities never move. Vertices are
/// append-only. Every live triangle is stored positively oriented under
/// [`orient2d`] on the mesh plane.
///
/// The first triangle fixes the supporting plane: from then on every vertex,
/// earlier or later, must be coplanar with it under [`orient3d`].
#[derive(Clone, Debug)]
pub struct CoplanarMesh {
    plane: ProjectionPlane,
    reference: Option<[Arc<GenericPoint>; 3]>,
    verts: Vec<MeshVert>,
    edges: Vec<MeshEdge>,
    tris: Vec<MeshTri>,
    v2e: Vec<SmallVec<[u32; 8]>>,
    e2t: Vec<SmallVec<[u32; 2]>>,
    edge_map: AHashMap<CanonicalEdge, u32>,
    orig_to_local: AHashMap<u32, u32>,
    free_edges: Vec<u32>,
    free_tris: Vec<u32>,
    num_live_edges: usize,
    num_live_tris: usize,
}

impl CoplanarMesh {
    pub fn new(plane: ProjectionPlane) -> Self {
        CoplanarMesh {
            plane,
            reference: None,
            verts: Vec::new(),
            edges: Vec::new(),
            tris: Vec::new(),
            v2e: Vec::new(),
            e2t: Vec::new(),
            edge_map: AHashMap::new(),
            orig_to_local: AHashMap::new(),
            free_edges: Vec::new(),
            free_tris: Vec::new(),
            num_live_edges: 0,
            num_live_tris: 0,
        }
    }

    /// Mesh made of one triangle.
    pub fn from_triangle(points: [Arc<GenericPoint>; 3], orig_ids: [u32; 3], plane: ProjectionPlane) -> Self {
        let mut mesh = Self::new(plane);
        mesh.pre_allocate(3, 3, 1);
        let v = points
            .into_iter()
            .zip(orig_ids)
            .map(|(p, o)| mesh.add_vertex(p, Some(o)))
            .collect::<SmallVec<[u32; 3]>>();
        mesh.add_triangle(v[0], v[1], v[2]);
        mesh
    }

    /// Bulk construction. Edges are gathered, sorted and numbered the same
    /// way whether or not `parallel` is set.
    pub fn from_triangles(
        points: Vec<Arc<GenericPoint>>,
        orig_ids: &[u32],
        tris: &[[u32; 3]],
        plane: ProjectionPlane,
        parallel: bool,
    ) -> Self {
        assert_eq!(points.len(), orig_ids.len(), "one original id per point expected");
        let mut mesh = Self::new(plane);
        mesh.pre_allocate(points.len(), tris.len() * 3 / 2 + 3, tris.len());
        for (p, &o) in points.into_iter().zip(orig_ids) {
            mesh.add_vertex(p, Some(o));
        }
        for t in tris {
            for &v in t {
                mesh.check_vert(v);
            }
            assert!(
                t[0] != t[1] && t[1] != t[2] && t[2] != t[0],
                "triangle {t:?} repeats a vertex"
            );
        }

        let oriented: Vec<[u32; 3]> = if parallel {
            tris.par_iter().map(|t| mesh.oriented(*t)).collect()
        } else {
            tris.iter().map(|t| mesh.oriented(*t)).collect()
        };
        let mut keys: Vec<CanonicalEdge> = if parallel {
            oriented.par_iter().flat_map_iter(|t| tri_edge_keys(*t)).collect()
        } else {
            oriented.iter().flat_map(|t| tri_edge_keys(*t)).collect()
        };
        if parallel {
            keys.par_sort_unstable();
        } else {
            keys.sort_unstable();
        }
        keys.dedup();

        for key in keys {
            mesh.add_edge(key.a, key.b);
        }

        let mut seen = AHashSet::with_capacity(oriented.len());
        for v in oriented {
            let mut sorted = v;
            sorted.sort_unstable();
            assert!(seen.insert(sorted), "duplicate triangle {v:?}");
            mesh.push_triangle(v);
        }
        mesh
    }

    pub fn pre_allocate(&mut self, nv: usize, ne: usize, nt: usize) {
        self.verts.reserve(nv);
        self.v2e.reserve(nv);
        self.edges.reserve(ne);
        self.e2t.reserve(ne);
        self.edge_map.reserve(ne);
        self.tris.reserve(nt);
    }

    pub fn plane(&self) -> ProjectionPlane {
        self.plane
    }

    // ---------------------------------------------------------------- checks

    fn check_vert(&self, v: u32) -> usize {
        assert!(
            (v as usize) < self.verts.len(),
            "vertex {v} out of range ({} vertices)",
            self.verts.len()
        );
        v as usize
    }

    fn check_on_plane(&self, point: &GenericPoint) {
        if let Some([a, b, c]) = &self.reference {
            assert!(
                orient3d(a, b, c, point) == Sign::Zero,
                "vertex {:?} is not on the plane of the mesh",
                point.approx()
            );
        }
    }

    fn check_edge(&self, e: u32) -> usize {
        assert!(
            (e as usize) < self.edges.len() && !self.edges[e as usize].removed,
            "edge {e} is not live"
        );
        e as usize
    }

    fn check_tri(&self, t: u32) -> usize {
        assert!(
            (t as usize) < self.tris.len() && !self.tris[t as usize].removed,
            "triangle {t} is not live"
        );
        t as usize
    }

    // ------------------------------------------------------------- mutation

    /// Panics if the mesh already has a plane and `point` is not on it.
    pub fn add_vertex(&mut self, point: Arc<GenericPoint>, orig: Option<u32>) -> u32 {
        self.check_on_plane(&point);
        let v = self.verts.len() as u32;
        self.verts.push(MeshVert {
            point,
            orig,
            info: VertInfo::empty(),
        });
        self.v2e.push(SmallVec::new());
        if let Some(o) = orig {
            self.orig_to_local.insert(o, v);
        }
        v
    }

    fn oriented(&self, t: [u32; 3]) -> [u32; 3] {
        let [a, b, c] = t.map(|v| &self.verts[v as usize].point);
        match orient2d(a, b, c, self.plane) {
            Sign::Positive => t,
            Sign::Negative => [t[0], t[2], t[1]],
            Sign::Zero => panic!("triangle {t:?} is degenerate"),
        }
    }

    fn add_edge(&mut self, v0: u32, v1: u32) -> u32 {
        let key = CanonicalEdge::new(v0, v1);
        if let Some(&e) = self.edge_map.get(&key) {
            return e;
        }
        let record = MeshEdge {
            v: key.verts(),
            constrained: false,
            visited: false,
            removed: false,
        };
        let e = match self.free_edges.pop() {
            Some(e) => {
                self.edges[e as usize] = record;
                self.e2t[e as usize].clear();
                e
            }
            None => {
                self.edges.push(record);
                self.e2t.push(SmallVec::new());
                (self.edges.len() - 1) as u32
            }
        };
        self.v2e[key.a as usize].push(e);
        self.v2e[key.b as usize].push(e);
        self.edge_map.insert(key, e);
        self.num_live_edges += 1;
        e
    }

    fn remove_edge_record(&mut self, e: u32) {
        let [a, b] = self.edges[e as usize].v;
        self.edges[e as usize].removed = true;
        self.v2e[a as usize].retain(|x| *x != e);
        self.v2e[b as usize].retain(|x| *x != e);
        self.edge_map.remove(&CanonicalEdge::new(a, b));
        self.e2t[e as usize].clear();
        self.free_edges.push(e);
        self.num_live_edges -= 1;
    }

    /// Adds the triangle, flipping its vertex order if needed so that it is
    /// positively oriented. Panics on repeated or collinear vertices, on
    /// duplicates and when an edge would get a third triangle.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32) -> u32 {
        for v in [v0, v1, v2] {
            self.check_vert(v);
        }
        assert!(
            v0 != v1 && v1 != v2 && v2 != v0,
            "triangle ({v0}, {v1}, {v2}) repeats a vertex"
        );
        assert!(
            self.tri_id(v0, v1, v2).is_none(),
            "triangle ({v0}, {v1}, {v2}) already exists"
        );
        let v = self.oriented([v0, v1, v2]);
        for k in 0..3 {
            self.add_edge(v[k], v[(k + 1) % 3]);
        }
        self.push_triangle(v)
    }

    fn set_reference(&mut self, v: [u32; 3]) {
        self.reference = Some(v.map(|x| self.verts[x as usize].point.clone()));
        for vert in &self.verts {
            self.check_on_plane(&vert.point);
        }
    }

    // edges of `v` must exist
    fn push_triangle(&mut self, v: [u32; 3]) -> u32 {
        let edges = tri_edge_keys(v).map(|key| match self.edge_map.get(&key) {
            Some(&e) => e,
            None => panic!("edge ({}, {}) missing", key.a, key.b),
        });
        if self.reference.is_none() {
            self.set_reference(v);
        }
        for e in edges {
            assert!(
                self.e2t[e as usize].len() < 2,
                "edge {e} would get a third triangle"
            );
        }
        let record = MeshTri {
            v,
            info: 0,
            node: NO_NODE,
            removed: false,
        };
        let t = match self.free_tris.pop() {
            Some(t) => {
                self.tris[t as usize] = record;
                t
            }
            None => {
                self.tris.push(record);
                (self.tris.len() - 1) as u32
            }
        };
        for e in edges {
            self.e2t[e as usize].push(t);
        }
        self.num_live_tris += 1;
        t
    }

    /// Removes the triangle and every edge left without triangles.
    pub fn remove_tri(&mut self, t: u32) {
        let ti = self.check_tri(t);
        let v = self.tris[ti].v;
        self.tris[ti].removed = true;
        self.free_tris.push(t);
        self.num_live_tris -= 1;
        for key in tri_edge_keys(v) {
            let Some(&e) = self.edge_map.get(&key) else {
                panic!("triangle {t} lost edge ({}, {})", key.a, key.b);
            };
            self.e2t[e as usize].retain(|x| *x != t);
            if self.e2t[e as usize].is_empty() {
                self.remove_edge_record(e);
            }
        }
    }

    pub fn remove_tris(&mut self, tris: &[u32]) {
        let mut ids = tris.to_vec();
        ids.sort_unstable();
        ids.dedup();
        for t in ids {
            self.remove_tri(t);
        }
    }

    /// Removes the edge together with its incident triangles.
    pub fn remove_edge(&mut self, e: u32) {
        self.check_edge(e);
        let incident = self.e2t[e as usize].clone();
        self.remove_tris(&incident);
        if !self.edges[e as usize].removed {
            self.remove_edge_record(e);
        }
    }

    fn saved_constraints(&self, tris: &[u32]) -> SmallVec<[CanonicalEdge; 6]> {
        let mut out = SmallVec::new();
        for &t in tris {
            for key in tri_edge_keys(self.tris[t as usize].v) {
                if let Some(&e) = self.edge_map.get(&key) {
                    if self.edges[e as usize].constrained {
                        out.push(key);
                    }
                }
            }
        }
        out
    }

    fn restore_constraints(&mut self, saved: &[CanonicalEdge]) {
        for key in saved {
            if let Some(&e) = self.edge_map.get(key) {
                self.edges[e as usize].constrained = true;
            }
        }
    }

    fn split_edge_impl(&mut self, e: u32, v: u32) -> SmallVec<[SplitRecord; 2]> {
        let ei = self.check_edge(e);
        self.check_vert(v);
        let [a, b] = self.edges[ei].v;
        let loc = point_in_segment(self.vert(v), self.vert(a), self.vert(b), self.plane);
        assert!(
            loc == SegmentLocation::Interior,
            "vertex {v} is not inside edge {e} ({a}, {b}): {loc:?}"
        );
        let constrained = self.edges[ei].constrained;
        let incident = self.e2t[ei].clone();

        let plan: SmallVec<[(u32, u32, u32, u32); 2]> = incident
            .iter()
            .map(|&t| {
                let (x, y) = if self.tri_verts_are_ccw(t, a, b) { (a, b) } else { (b, a) };
                (x, y, self.tri_vert_opposite_to(t, a, b), self.tris[t as usize].node)
            })
            .collect();
        let saved = self.saved_constraints(&incident);
        for &t in &incident {
            self.remove_tri(t);
        }

        let mut records = SmallVec::new();
        for (x, y, c, node) in plan {
            let t0 = self.add_triangle(x, v, c);
            let t1 = self.add_triangle(v, y, c);
            records.push(SplitRecord {
                node,
                children: smallvec![t0, t1],
            });
        }
        self.restore_constraints(&saved);
        if constrained {
            for (p, q) in [(a, v), (v, b)] {
                if let Some(ne) = self.edge_id(p, q) {
                    self.edges[ne as usize].constrained = true;
                }
            }
        }
        records
    }

    /// Splits edge `e` at vertex `v`, which must lie strictly inside it.
    /// Each incident triangle is replaced by two; the halves inherit the
    /// constrained flag. Returns the new triangles.
    pub fn split_edge(&mut self, e: u32, v: u32) -> SmallVec<[u32; 4]> {
        self.split_edge_impl(e, v)
            .into_iter()
            .flat_map(|r| r.children)
            .collect()
    }

    /// [`CoplanarMesh::split_edge`] recording the new triangles in `dag`.
    pub fn split_edge_tracked(&mut self, e: u32, v: u32, dag: &mut LocationDag) -> SmallVec<[u32; 4]> {
        let records = self.split_edge_impl(e, v);
        self.record_split(&records, dag);
        records.into_iter().flat_map(|r| r.children).collect()
    }

    fn split_tri_impl(&mut self, t: u32, v: u32) -> SplitRecord {
        let ti = self.check_tri(t);
        self.check_vert(v);
        let [a, b, c] = self.tris[ti].v;
        let loc = point_in_triangle(self.vert(v), self.vert(a), self.vert(b), self.vert(c), self.plane);
        assert!(
            loc == TriangleLocation::Interior,
            "vertex {v} is not inside triangle {t}: {loc:?}"
        );
        let node = self.tris[ti].node;
        let saved = self.saved_constraints(&[t]);
        self.remove_tri(t);
        let children = smallvec![
            self.add_triangle(a, b, v),
            self.add_triangle(b, c, v),
            self.add_triangle(c, a, v),
        ];
        self.restore_constraints(&saved);
        SplitRecord { node, children }
    }

    /// Splits triangle `t` into three around `v`, which must lie strictly
    /// inside it.
    pub fn split_tri(&mut self, t: u32, v: u32) -> [u32; 3] {
        let r = self.split_tri_impl(t, v);
        [r.children[0], r.children[1], r.children[2]]
    }

    /// [`CoplanarMesh::split_tri`] recording the new triangles in `dag`.
    pub fn split_tri_tracked(&mut self, t: u32, v: u32, dag: &mut LocationDag) -> [u32; 3] {
        let r = self.split_tri_impl(t, v);
        self.record_split(std::slice::from_ref(&r), dag);
        [r.children[0], r.children[1], r.children[2]]
    }

    fn record_split(&mut self, records: &[SplitRecord], dag: &mut LocationDag) {
        for r in records {
            assert!(r.node != NO_NODE, "split triangle has no location node");
            for &c in &r.children {
                let node = dag.add_child(r.node, c, self.tris[c as usize].v);
                self.tris[c as usize].node = node;
            }
        }
    }

    /// Replaces edge `e` by the other diagonal of its two triangles.
    pub fn flip_edge(&mut self, e: u32) -> FlipOutcome {
        let ei = self.check_edge(e);
        if self.edges[ei].constrained {
            return FlipOutcome::Constrained;
        }
        if self.e2t[ei].len() != 2 {
            return FlipOutcome::Boundary;
        }
        let [a, b] = self.edges[ei].v;
        let (t0, t1) = (self.e2t[ei][0], self.e2t[ei][1]);
        let c = self.tri_vert_opposite_to(t0, a, b);
        let d = self.tri_vert_opposite_to(t1, a, b);

        let sa = orient2d(self.vert(c), self.vert(d), self.vert(a), self.plane);
        let sb = orient2d(self.vert(c), self.vert(d), self.vert(b), self.plane);
        if !sa.strictly_opposite(sb) {
            return FlipOutcome::NotConvex;
        }

        let saved = self.saved_constraints(&[t0, t1]);
        self.remove_tri(t0);
        self.remove_tri(t1);
        self.add_triangle(c, d, a);
        self.add_triangle(d, c, b);
        self.restore_constraints(&saved);
        match self.edge_id(c, d) {
            Some(ne) => FlipOutcome::Flipped(ne),
            None => panic!("flipped edge ({c}, {d}) missing"),
        }
    }

    /// Flips edge `off` of triangle `t`.
    pub fn flip_tri(&mut self, t: u32, off: usize) -> FlipOutcome {
        let e = self.tri_edge_id(t, off);
        self.flip_edge(e)
    }

    pub fn set_edge_constrained(&mut self, e: u32, constrained: bool) {
        let ei = self.check_edge(e);
        self.edges[ei].constrained = constrained;
    }

    pub fn edge_set_visited(&mut self, e: u32, visited: bool) {
        let ei = self.check_edge(e);
        self.edges[ei].visited = visited;
    }

    pub fn set_tri_info(&mut self, t: u32, info: u32) {
        let ti = self.check_tri(t);
        self.tris[ti].info = info;
    }

    pub fn reset_tris_info(&mut self) {
        for t in &mut self.tris {
            t.info = 0;
        }
    }

    pub fn set_tri_node(&mut self, t: u32, node: u32) {
        let ti = self.check_tri(t);
        self.tris[ti].node = node;
    }

    pub fn set_vert_info(&mut self, v: u32, info: VertInfo) {
        let vi = self.check_vert(v);
        self.verts[vi].info = info;
    }

    pub fn reset_verts_info(&mut self) {
        for v in &mut self.verts {
            v.info = VertInfo::empty();
        }
    }

    // -------------------------------------------------------------- queries

    pub fn num_verts(&self) -> usize {
        self.verts.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_live_edges
    }

    pub fn num_tris(&self) -> usize {
        self.num_live_tris
    }

    pub fn tri_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.tris
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.removed)
            .map(|(i, _)| i as u32)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.removed)
            .map(|(i, _)| i as u32)
    }

    pub fn vert(&self, v: u32) -> &Arc<GenericPoint> {
        &self.verts[self.check_vert(v)].point
    }

    pub fn vert_orig_id(&self, v: u32) -> Option<u32> {
        self.verts[self.check_vert(v)].orig
    }

    /// Local id of the vertex carrying original id `orig`.
    pub fn vert_new_id(&self, orig: u32) -> Option<u32> {
        self.orig_to_local.get(&orig).copied()
    }

    pub fn vert_info(&self, v: u32) -> VertInfo {
        self.verts[self.check_vert(v)].info
    }

    pub fn vert_valence(&self, v: u32) -> usize {
        self.v2e[self.check_vert(v)].len()
    }

    pub fn adj_v2e(&self, v: u32) -> &[u32] {
        &self.v2e[self.check_vert(v)]
    }

    pub fn adj_v2t(&self, v: u32) -> SmallVec<[u32; 8]> {
        let mut out: SmallVec<[u32; 8]> = SmallVec::new();
        for &e in self.adj_v2e(v) {
            for &t in &self.e2t[e as usize] {
                if !out.contains(&t) {
                    out.push(t);
                }
            }
        }
        out
    }

    pub fn edge(&self, e: u32) -> [u32; 2] {
        self.edges[self.check_edge(e)].v
    }

    pub fn edge_vert_id(&self, e: u32, off: usize) -> u32 {
        self.edge(e)[off]
    }

    pub fn edge_id(&self, v0: u32, v1: u32) -> Option<u32> {
        self.edge_map.get(&CanonicalEdge::new(v0, v1)).copied()
    }

    pub fn edge_is_constrained(&self, e: u32) -> bool {
        self.edges[self.check_edge(e)].constrained
    }

    pub fn edge_is_visited(&self, e: u32) -> bool {
        self.edges[self.check_edge(e)].visited
    }

    pub fn edge_is_removed(&self, e: u32) -> bool {
        self.edges.get(e as usize).is_none_or(|x| x.removed)
    }

    pub fn edge_opp_to_vert(&self, e: u32, v: u32) -> u32 {
        let [a, b] = self.edge(e);
        match CanonicalEdge::new(a, b).opposite(v) {
            Some(o) => o,
            None => panic!("vertex {v} is not on edge {e}"),
        }
    }

    pub fn edge_is_boundary(&self, e: u32) -> bool {
        self.e2t[self.check_edge(e)].len() == 1
    }

    pub fn edge_is_manifold(&self, e: u32) -> bool {
        self.e2t[self.check_edge(e)].len() <= 2
    }

    pub fn adj_e2t(&self, e: u32) -> &[u32] {
        &self.e2t[self.check_edge(e)]
    }

    pub fn tri(&self, t: u32) -> [u32; 3] {
        self.tris[self.check_tri(t)].v
    }

    pub fn tri_is_removed(&self, t: u32) -> bool {
        self.tris.get(t as usize).is_none_or(|x| x.removed)
    }

    pub fn tri_id(&self, v0: u32, v1: u32, v2: u32) -> Option<u32> {
        let e = self.edge_id(v0, v1)?;
        self.e2t[e as usize]
            .iter()
            .copied()
            .find(|&t| self.tris[t as usize].v.contains(&v2))
    }

    pub fn tri_vert_id(&self, t: u32, off: usize) -> u32 {
        self.tri(t)[off]
    }

    pub fn tri_vert(&self, t: u32, off: usize) -> &Arc<GenericPoint> {
        self.vert(self.tri_vert_id(t, off))
    }

    /// Edge `off` joins vertex `off` to vertex `off + 1`.
    pub fn tri_edge_id(&self, t: u32, off: usize) -> u32 {
        let v = self.tri(t);
        match self.edge_id(v[off], v[(off + 1) % 3]) {
            Some(e) => e,
            None => panic!("triangle {t} lost edge {off}"),
        }
    }

    pub fn adj_t2e(&self, t: u32) -> [u32; 3] {
        [0, 1, 2].map(|off| self.tri_edge_id(t, off))
    }

    pub fn adj_t2t(&self, t: u32) -> SmallVec<[u32; 3]> {
        self.adj_t2e(t)
            .into_iter()
            .filter_map(|e| self.tri_opp_to_edge(e, t))
            .collect()
    }

    /// The other triangle across edge `e`, if any.
    pub fn tri_opp_to_edge(&self, e: u32, t: u32) -> Option<u32> {
        self.adj_e2t(e).iter().copied().find(|&x| x != t)
    }

    pub fn tri_node(&self, t: u32) -> u32 {
        self.tris[self.check_tri(t)].node
    }

    pub fn tri_info(&self, t: u32) -> u32 {
        self.tris[self.check_tri(t)].info
    }

    pub fn tri_contains_vert(&self, t: u32, v: u32) -> bool {
        self.tri(t).contains(&v)
    }

    pub fn tri_vert_offset(&self, t: u32, v: u32) -> Option<usize> {
        self.tri(t).iter().position(|&x| x == v)
    }

    /// Vertex of `t` other than `v0` and `v1`.
    pub fn tri_vert_opposite_to(&self, t: u32, v0: u32, v1: u32) -> u32 {
        match self.tri(t).into_iter().find(|&x| x != v0 && x != v1) {
            Some(v) => v,
            None => panic!("triangle {t} has no vertex besides {v0} and {v1}"),
        }
    }

    /// `true` when `v1` follows `v0` in the vertex order of `t`.
    pub fn tri_verts_are_ccw(&self, t: u32, v0: u32, v1: u32) -> bool {
        let v = self.tri(t);
        match v.iter().position(|&x| x == v0) {
            Some(k) => v[(k + 1) % 3] == v1,
            None => panic!("vertex {v0} is not in triangle {t}"),
        }
    }

    pub fn tri_orientation(&self, t: u32) -> Sign {
        let [a, b, c] = self.tri(t);
        orient2d(self.vert(a), self.vert(b), self.vert(c), self.plane)
    }

    /// First live triangle whose closed region contains `p`.
    pub fn locate(&self, p: &GenericPoint) -> Option<(u32, TriangleLocation)> {
        self.tri_ids().find_map(|t| {
            let [a, b, c] = self.tri(t);
            let loc = point_in_triangle(p, self.vert(a), self.vert(b), self.vert(c), self.plane);
            loc.is_inside().then_some((t, loc))
        })
    }

    /// Verifies the adjacency invariants and returns the first violation.
    pub fn check_topology(&self) -> Result<(), TopologyError> {
        let mut seen: AHashMap<[u32; 3], u32> = AHashMap::new();
        for t in self.tri_ids() {
            let v = self.tris[t as usize].v;
            if v[0] == v[1] || v[1] == v[2] || v[2] == v[0] {
                return Err(TopologyError::RepeatedVertex { tri: t });
            }
            if self.tri_orientation(t) != Sign::Positive {
                return Err(TopologyError::BadOrientation { tri: t });
            }
            for key in tri_edge_keys(v) {
                let Some(&e) = self.edge_map.get(&key) else {
                    return Err(TopologyError::MissingEdge {
                        tri: t,
                        v0: key.a,
                        v1: key.b,
                    });
                };
                if self.edges[e as usize].removed || !self.e2t[e as usize].contains(&t) {
                    return Err(TopologyError::StaleAdjacency { what: "edge", id: e });
                }
            }
            let mut sorted = v;
            sorted.sort_unstable();
            if let Some(&other) = seen.get(&sorted) {
                return Err(TopologyError::DuplicateTriangle { a: other, b: t });
            }
            seen.insert(sorted, t);
        }

        for e in self.edge_ids() {
            let incident = &self.e2t[e as usize];
            if incident.is_empty() || incident.len() > 2 {
                return Err(TopologyError::EdgeValence {
                    edge: e,
                    count: incident.len(),
                });
            }
            let [a, b] = self.edges[e as usize].v;
            for &t in incident {
                let tri = &self.tris[t as usize];
                if tri.removed || !tri.v.contains(&a) || !tri.v.contains(&b) {
                    return Err(TopologyError::StaleAdjacency { what: "triangle", id: t });
                }
            }
            if !self.v2e[a as usize].contains(&e) || !self.v2e[b as usize].contains(&e) {
                return Err(TopologyError::StaleAdjacency { what: "edge", id: e });
            }
            if self.edge_map.get(&CanonicalEdge::new(a, b)) != Some(&e) {
                return Err(TopologyError::StaleAdjacency { what: "edge", id: e });
            }
        }

        for (v, edges) in self.v2e.iter().enumerate() {
            for &e in edges {
                let edge = &self.edges[e as usize];
                if edge.removed || !edge.v.contains(&(v as u32)) {
                    return Err(TopologyError::StaleAdjacency {
                        what: "vertex",
                        id: v as u32,
                    });
                }
            }
        }
        Ok(())
    }
}

fn tri_edge_keys(v: [u32; 3]) -> [CanonicalEdge; 3] {
    [
        CanonicalEdge::new(v[0], v[1]),
        CanonicalEdge::new(v[1], v[2]),
        CanonicalEdge::new(v[2], v[0]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gp(x: f64, y: f64) -> Arc<GenericPoint> {
        Arc::new(GenericPoint::from_coords(x, y, 0.0).unwrap())
    }

    fn square() -> CoplanarMesh {
        let pts = vec![gp(0.0, 0.0), gp(1.0, 0.0), gp(1.0, 1.0), gp(0.0, 1.0)];
        CoplanarMesh::from_triangles(pts, &[10, 11, 12, 13], &[[0, 1, 2], [0, 2, 3]], ProjectionPlane::Xy, false)
    }

    #[test]
    fn single_triangle_is_normalised() {
        let mesh = CoplanarMesh::from_triangle(
            [gp(0.0, 0.0), gp(0.0, 1.0), gp(1.0, 0.0)],
            [5, 6, 7],
            ProjectionPlane::Xy,
        );
        assert_eq!(mesh.num_tris(), 1);
        assert_eq!(mesh.num_edges(), 3);
        assert_eq!(mesh.tri_orientation(0), Sign::Positive);
        assert_eq!(mesh.vert_new_id(6), Some(1));
        assert_eq!(mesh.vert_orig_id(2), Some(7));
        assert!(mesh.check_topology().is_ok());
    }

    #[test]
    fn bulk_build_is_mode_independent() {
        let pts = || vec![gp(0.0, 0.0), gp(1.0, 0.0), gp(1.0, 1.0), gp(0.0, 1.0), gp(0.5, 2.0)];
        let tris = [[0, 1, 2], [0, 2, 3], [3, 2, 4]];
        let seq = CoplanarMesh::from_triangles(pts(), &[0, 1, 2, 3, 4], &tris, ProjectionPlane::Xy, false);
        let par = CoplanarMesh::from_triangles(pts(), &[0, 1, 2, 3, 4], &tris, ProjectionPlane::Xy, true);
        assert_eq!(seq.num_edges(), 7);
        for e in seq.edge_ids() {
            assert_eq!(seq.edge(e), par.edge(e));
            assert_eq!(seq.adj_e2t(e), par.adj_e2t(e));
        }
        assert!(par.check_topology().is_ok());
    }

    #[test]
    fn interior_edge_split_makes_four() {
        let mut mesh = square();
        let m = mesh.add_vertex(gp(0.5, 0.5), None);
        let diag = mesh.edge_id(0, 2).unwrap();
        mesh.set_edge_constrained(diag, true);

        let new_tris = mesh.split_edge(diag, m);
        assert_eq!(new_tris.len(), 4);
        assert_eq!(mesh.num_tris(), 4);
        assert_eq!(mesh.edge_id(0, 2), None);
        assert!(mesh.edge_is_constrained(mesh.edge_id(0, m).unwrap()));
        assert!(mesh.edge_is_constrained(mesh.edge_id(m, 2).unwrap()));
        assert!(!mesh.edge_is_constrained(mesh.edge_id(1, m).unwrap()));
        assert_eq!(mesh.vert_valence(m), 4);
        assert!(mesh.check_topology().is_ok());
    }

    #[test]
    fn boundary_edge_split_makes_two() {
        let mut mesh = square();
        let m = mesh.add_vertex(gp(0.5, 0.0), None);
        let e = mesh.edge_id(0, 1).unwrap();
        assert!(mesh.edge_is_boundary(e));
        mesh.split_edge(e, m);
        assert_eq!(mesh.num_tris(), 3);
        assert!(mesh.edge_is_boundary(mesh.edge_id(0, m).unwrap()));
        assert!(mesh.check_topology().is_ok());
    }

    #[test]
    #[should_panic(expected = "is not inside edge")]
    fn split_edge_rejects_off_edge_vertex() {
        let mut mesh = square();
        let m = mesh.add_vertex(gp(0.5, 0.4), None);
        let e = mesh.edge_id(0, 2).unwrap();
        mesh.split_edge(e, m);
    }

    #[test]
    fn split_tri_keeps_constraints() {
        let mut mesh = square();
        let e = mesh.edge_id(0, 1).unwrap();
        mesh.set_edge_constrained(e, true);
        let t = mesh.tri_id(0, 1, 2).unwrap();
        let m = mesh.add_vertex(gp(0.75, 0.25), None);
        let kids = mesh.split_tri(t, m);

        assert_eq!(mesh.num_tris(), 4);
        for k in kids {
            assert_eq!(mesh.tri_orientation(k), Sign::Positive);
        }
        assert!(mesh.edge_is_constrained(mesh.edge_id(0, 1).unwrap()));
        assert!(mesh.check_topology().is_ok());
    }

    #[test]
    fn flip_outcomes() {
        let mut mesh = square();
        let diag = mesh.edge_id(0, 2).unwrap();
        let FlipOutcome::Flipped(ne) = mesh.flip_edge(diag) else {
            panic!("convex quad must flip");
        };
        let mut verts = mesh.edge(ne);
        verts.sort();
        assert_eq!(verts, [1, 3]);
        assert!(mesh.check_topology().is_ok());

        assert_eq!(mesh.flip_edge(mesh.edge_id(0, 1).unwrap()), FlipOutcome::Boundary);
        mesh.set_edge_constrained(ne, true);
        assert_eq!(mesh.flip_edge(ne), FlipOutcome::Constrained);
    }

    #[test]
    fn flip_refuses_concave_quad() {
        // dart: vertex 3 pushed inside the hull of 0, 1, 2
        let pts = vec![gp(0.0, 0.0), gp(2.0, 0.0), gp(1.0, 2.0), gp(1.0, 0.5)];
        let mut mesh =
            CoplanarMesh::from_triangles(pts, &[0, 1, 2, 3], &[[0, 1, 3], [1, 2, 3]], ProjectionPlane::Xy, false);
        let e = mesh.edge_id(1, 3).unwrap();
        assert_eq!(mesh.flip_edge(e), FlipOutcome::NotConvex);
        assert_eq!(mesh.num_tris(), 2);
    }

    #[test]
    fn removal_reuses_slots() {
        let mut mesh = square();
        let t = mesh.tri_id(0, 2, 3).unwrap();
        mesh.remove_tri(t);
        assert_eq!(mesh.num_tris(), 1);
        assert_eq!(mesh.num_edges(), 3);
        assert!(mesh.tri_is_removed(t));
        assert!(mesh.edge_id(2, 3).is_none());
        assert!(mesh.edge_is_boundary(mesh.edge_id(0, 2).unwrap()));

        let again = mesh.add_triangle(0, 2, 3);
        assert_eq!(again, t);
        assert_eq!(mesh.num_edges(), 5);
        assert!(mesh.check_topology().is_ok());

        let diag = mesh.edge_id(0, 2).unwrap();
        mesh.remove_edge(diag);
        assert_eq!(mesh.num_tris(), 0);
        assert_eq!(mesh.num_edges(), 0);
    }

    #[test]
    fn adjacency_queries() {
        let mesh = square();
        let t = mesh.tri_id(0, 1, 2).unwrap();
        let other = mesh.tri_id(0, 2, 3).unwrap();
        assert_eq!(mesh.adj_t2t(t).as_slice(), &[other]);
        assert_eq!(mesh.adj_v2t(0).len(), 2);
        assert_eq!(mesh.tri_vert_opposite_to(t, 0, 2), 1);
        assert!(mesh.tri_verts_are_ccw(t, 0, 1));
        assert_eq!(mesh.locate(&gp(0.9, 0.1)), Some((t, TriangleLocation::Interior)));
        assert_eq!(mesh.locate(&gp(2.0, 2.0)), None);
        assert_eq!(mesh.edge_opp_to_vert(mesh.edge_id(0, 2).unwrap(), 2), 0);
    }

    #[test]
    #[should_panic(expected = "third triangle")]
    fn non_manifold_edge_is_rejected() {
        let mut mesh = square();
        let v = mesh.add_vertex(gp(2.0, 0.5), None);
        mesh.add_triangle(1, 2, v);
        let w = mesh.add_vertex(gp(0.6, 0.5), None);
        mesh.add_triangle(1, 2, w);
    }

    #[test]
    #[should_panic(expected = "not on the plane")]
    fn off_plane_vertex_is_rejected() {
        let mut mesh = square();
        let t = mesh.tri_id(0, 1, 2).unwrap();
        let m = mesh.add_vertex(Arc::new(GenericPoint::from_coords(0.75, 0.25, 7.0).unwrap()), None);
        mesh.split_tri(t, m);
    }

    #[test]
    #[should_panic(expected = "not on the plane")]
    fn first_triangle_checks_earlier_vertices() {
        let mut mesh = CoplanarMesh::new(ProjectionPlane::Xy);
        let a = mesh.add_vertex(gp(0.0, 0.0), None);
        let b = mesh.add_vertex(gp(1.0, 0.0), None);
        let c = mesh.add_vertex(gp(0.0, 1.0), None);
        mesh.add_vertex(Arc::new(GenericPoint::from_coords(0.2, 0.2, -1.0).unwrap()), None);
        mesh.add_triangle(a, b, c);
    }

    #[test]
    fn tilted_plane_accepts_its_own_points() {
        let p = |x: f64, y: f64| Arc::new(GenericPoint::from_coords(x, y, x + y).unwrap());
        let mut mesh = CoplanarMesh::from_triangle([p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0)], [0, 1, 2], ProjectionPlane::Xy);
        let m = mesh.add_vertex(p(1.0, 1.0), None);
        mesh.split_tri(0, m);
        assert_eq!(mesh.num_tris(), 3);
        assert!(mesh.check_topology().is_ok());
    }

    #[test]
    #[should_panic(expected = "is degenerate")]
    fn collinear_triangle_is_rejected() {
        let mut mesh = square();
        let a = mesh.add_vertex(gp(4.0, 0.0), None);
        let b = mesh.add_vertex(gp(10.0, 0.0), None);
        let c = mesh.add_vertex(gp(20.0, 0.0), None);
        mesh.add_triangle(a, b, c);
    }

    #[test]
    #[should_panic(expected = "is degenerate")]
    fn bulk_build_rejects_collinear_triangle() {
        let pts = vec![gp(0.0, 0.0), gp(1.0, 0.0), gp(2.0, 0.0), gp(0.0, 1.0)];
        CoplanarMesh::from_triangles(pts, &[0, 1, 2, 3], &[[0, 1, 3], [0, 1, 2]], ProjectionPlane::Xy, false);
    }
}
