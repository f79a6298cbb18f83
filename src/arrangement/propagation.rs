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

use ahash::AHashSet;
use rayon::prelude::*;

use crate::arrangement::classify::TriView;
use crate::arrangement::ledger::IntersectionLedger;
use crate::kernel::TriangleLocation;
use crate::mesh::TriangleSoup;

/// Triangles re-triangulated together: one triangle with intersections, or
/// a group of coplanar triangles whose interiors overlap (transitively).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    /// Sorted soup triangle ids.
    pub members: Vec<u32>,
}

impl Cluster {
    /// Smallest member; its plane and jolly point stand for the cluster.
    pub fn reference(&self) -> u32 {
        self.members[0]
    }

    pub fn is_coplanar_group(&self) -> bool {
        self.members.len() > 1
    }
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let up = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = up;
            x = up;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // smaller id becomes the root
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi as usize] = lo;
        }
    }
}

/// Groups the triangles that need re-triangulation into clusters and shares
/// the points of each coplanar group among its members.
pub fn propagate_coplanar_intersections(soup: &TriangleSoup, ledger: &IntersectionLedger, parallel: bool) -> Vec<Cluster> {
    let n = soup.num_tris();
    let mut uf = UnionFind::new(n);
    for t in 0..n as u32 {
        for o in ledger.coplanar_tris(t) {
            uf.union(t, o);
        }
    }
    let mut groups: Vec<Vec<u32>> = vec![Vec::new(); n];
    for t in 0..n as u32 {
        if !ledger.coplanar_tris(t).is_empty() {
            let r = uf.find(t);
            groups[r as usize].push(t);
        }
    }
    let groups: Vec<Cluster> = groups
        .into_iter()
        .filter(|g| g.len() > 1)
        .map(|members| Cluster { members })
        .collect();

    if parallel {
        groups.par_iter().for_each(|c| share_points(soup, ledger, c));
    } else {
        groups.iter().for_each(|c| share_points(soup, ledger, c));
    }

    let grouped: AHashSet<u32> = groups.iter().flat_map(|c| c.members.iter().copied()).collect();
    let mut clusters = groups;
    for t in 0..n as u32 {
        if grouped.contains(&t) {
            continue;
        }
        let touched = ledger.tri_has_data(t) || soup.tri_edges(t).iter().any(|&e| ledger.edge_has_points(e));
        if touched {
            clusters.push(Cluster { members: vec![t] });
        }
    }
    clusters.sort_unstable_by_key(Cluster::reference);
    clusters
}

/// Pushes every point known to one member into the other members that
/// contain it, until nothing changes.
fn share_points(soup: &TriangleSoup, ledger: &IntersectionLedger, cluster: &Cluster) {
    let views: Vec<TriView> = cluster.members.iter().map(|&t| TriView::new(soup, t)).collect();
    loop {
        let mut points: Vec<u32> = Vec::new();
        for t in &views {
            points.extend(ledger.tri_points(t.t));
            for &e in &t.e {
                points.extend(ledger.edge_points(e));
            }
            for s in ledger.tri_segments(t.t) {
                points.extend(s.v);
            }
        }
        points.sort_unstable();
        points.dedup();

        let mut changed = false;
        for &v in &points {
            let p = soup.vert(v);
            for t in &views {
                if t.v.contains(&v) {
                    continue;
                }
                changed |= match t.locate(&p) {
                    TriangleLocation::Interior => ledger.add_point_in_tri(t.t, v),
                    TriangleLocation::OnEdge(j) => ledger.add_point_in_edge(t.e[j], v),
                    TriangleLocation::OnVertex(_) | TriangleLocation::Outside => false,
                };
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::classify::classify_intersections;
    use crate::config::ArrangementConfig;

    #[test]
    fn union_find_roots_at_smallest() {
        let mut uf = UnionFind::new(6);
        uf.union(4, 2);
        uf.union(5, 4);
        uf.union(1, 3);
        assert_eq!(uf.find(5), 2);
        assert_eq!(uf.find(3), 1);
        assert_eq!(uf.find(0), 0);
    }

    #[test]
    fn coplanar_points_are_shared() {
        // 0 overlaps 1 and 1 overlaps 2; the pair (0, 2) is never classified
        let coords = [
            0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0, //
            1.0, -1.0, 0.0, 5.0, -1.0, 0.0, 1.0, 3.0, 0.0, //
            0.5, -0.5, 0.0, 3.0, -0.5, 0.0, 0.5, 2.0, 0.0, //
            10.0, 10.0, 0.0, 11.0, 10.0, 0.0, 10.0, 11.0, 0.0,
        ];
        let tris: Vec<u32> = (0..12).collect();
        let cfg = ArrangementConfig::default().with_parallel(false);
        let soup = TriangleSoup::new(&coords, &tris, &[], &cfg).unwrap();
        let ledger = IntersectionLedger::new(soup.num_tris(), soup.num_orig_edges());
        classify_intersections(&soup, &ledger, &[(0, 1), (1, 2)], false);

        let clusters = propagate_coplanar_intersections(&soup, &ledger, false);
        assert_eq!(clusters, vec![Cluster { members: vec![0, 1, 2] }]);
        assert!(clusters[0].is_coplanar_group());

        // the crossing of triangle 0's bottom edge with triangle 1's left
        // edge is found by the pair (0, 1) and lies inside triangle 2
        let coords = soup.approx_coords();
        let v = (0..soup.num_verts() as u32)
            .find(|&v| coords[v as usize] == [1.0, 0.0, 0.0])
            .unwrap();
        assert!(ledger.tri_points(2).contains(&v));
    }
}
