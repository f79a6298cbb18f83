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

use std::sync::Mutex;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::geometry::CanonicalEdge;
use crate::mesh::sharded_map::lock;

/// Intersection segment recorded inside one triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntersectionSegment {
    /// Endpoints, smaller id first.
    pub v: [u32; 2],
    /// Soup edge created for the segment.
    pub edge: u32,
    /// Triangle whose plane also contains the segment.
    pub support: u32,
}

#[derive(Debug, Default)]
struct TriInters {
    points: SmallVec<[u32; 4]>,
    segments: AHashMap<CanonicalEdge, (u32, u32)>,
    coplanar: SmallVec<[u32; 2]>,
}

/// Intersection data shared by all classifier workers. Every triangle and
/// every original edge has its own lock.
#[derive(Debug)]
pub struct IntersectionLedger {
    tris: Vec<Mutex<TriInters>>,
    edge_points: Vec<Mutex<SmallVec<[u32; 2]>>>,
    pairs: Mutex<Vec<(u32, u32)>>,
}

impl IntersectionLedger {
    pub fn new(num_tris: usize, num_edges: usize) -> Self {
        IntersectionLedger {
            tris: (0..num_tris).map(|_| Mutex::default()).collect(),
            edge_points: (0..num_edges).map(|_| Mutex::default()).collect(),
            pairs: Mutex::default(),
        }
    }

    fn tri(&self, t: u32) -> &Mutex<TriInters> {
        match self.tris.get(t as usize) {
            Some(m) => m,
            None => panic!("triangle {t} out of range ({} triangles)", self.tris.len()),
        }
    }

    fn edge(&self, e: u32) -> &Mutex<SmallVec<[u32; 2]>> {
        match self.edge_points.get(e as usize) {
            Some(m) => m,
            None => panic!("edge {e} is not an original edge ({} edges)", self.edge_points.len()),
        }
    }

    pub fn num_tris(&self) -> usize {
        self.tris.len()
    }

    /// Records `v` inside triangle `t`; `false` when already known.
    pub fn add_point_in_tri(&self, t: u32, v: u32) -> bool {
        let mut data = lock(self.tri(t));
        if data.points.contains(&v) {
            return false;
        }
        data.points.push(v);
        true
    }

    /// Records `v` inside original edge `e`; `false` when already known.
    pub fn add_point_in_edge(&self, e: u32, v: u32) -> bool {
        let mut points = lock(self.edge(e));
        if points.contains(&v) {
            return false;
        }
        points.push(v);
        true
    }

    /// Records segment `(v0, v1)` in triangle `t`. When several triangles
    /// report the same segment the smallest support id is kept.
    pub fn add_segment(&self, t: u32, v0: u32, v1: u32, edge: u32, support: u32) {
        let key = CanonicalEdge::new(v0, v1);
        let mut data = lock(self.tri(t));
        data.segments
            .entry(key)
            .and_modify(|(e, s)| {
                if support < *s {
                    *e = edge;
                    *s = support;
                }
            })
            .or_insert((edge, support));
    }

    /// Marks `a` and `b` as coplanar triangles with overlapping interiors.
    pub fn add_coplanar(&self, a: u32, b: u32) {
        for (x, y) in [(a, b), (b, a)] {
            let mut data = lock(self.tri(x));
            if !data.coplanar.contains(&y) {
                data.coplanar.push(y);
            }
        }
    }

    pub fn add_pair(&self, a: u32, b: u32) {
        lock(&self.pairs).push((a.min(b), a.max(b)));
    }

    pub fn tri_points(&self, t: u32) -> Vec<u32> {
        let mut out = lock(self.tri(t)).points.to_vec();
        out.sort_unstable();
        out
    }

    pub fn tri_segments(&self, t: u32) -> Vec<IntersectionSegment> {
        let mut out: Vec<IntersectionSegment> = lock(self.tri(t))
            .segments
            .iter()
            .map(|(k, &(edge, support))| IntersectionSegment {
                v: k.verts(),
                edge,
                support,
            })
            .collect();
        out.sort_unstable();
        out
    }

    pub fn coplanar_tris(&self, t: u32) -> Vec<u32> {
        let mut out = lock(self.tri(t)).coplanar.to_vec();
        out.sort_unstable();
        out
    }

    pub fn edge_points(&self, e: u32) -> Vec<u32> {
        let mut out = lock(self.edge(e)).to_vec();
        out.sort_unstable();
        out
    }

    /// Points, segments or coplanar partners recorded for `t` itself.
    pub fn tri_has_data(&self, t: u32) -> bool {
        let data = lock(self.tri(t));
        !data.points.is_empty() || !data.segments.is_empty() || !data.coplanar.is_empty()
    }

    pub fn edge_has_points(&self, e: u32) -> bool {
        !lock(self.edge(e)).is_empty()
    }

    /// Intersecting pairs, sorted and unique.
    pub fn intersecting_pairs(&self) -> Vec<(u32, u32)> {
        let mut out = lock(&self.pairs).clone();
        out.sort_unstable();
        out.dedup();
        out
    }
}
