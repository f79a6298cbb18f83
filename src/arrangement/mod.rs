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

//! The arrangement pipeline: soup → candidate pairs → classification →
//! coplanar propagation → per-cluster re-triangulation.

pub mod candidates;
pub mod case_table;
pub mod classify;
pub mod ledger;
pub mod propagation;
pub mod triangulation;

use ahash::AHashSet;
use log::{debug, info};
use rayon::prelude::*;

use crate::config::ArrangementConfig;
use crate::error::ArrangementError;
use crate::geometry::CanonicalEdge;
use crate::mesh::{Label, TriangleSoup};
use crate::mesh::soup::NUM_JOLLY;

pub use candidates::candidate_pairs;
pub use classify::{
    add_edge_cross_edge_inters, add_edge_cross_tri_inters, check_triangle_pair,
    classify_intersections, point_inside_triangle,
};
pub use ledger::{IntersectionLedger, IntersectionSegment};
pub use propagation::{Cluster, propagate_coplanar_intersections};
pub use triangulation::{ClusterOutput, triangulate_cluster};

/// One output triangle, in soup vertex ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrangedTriangle {
    pub v: [u32; 3],
    /// Union of the labels of the input triangles covering it.
    pub label: Label,
    /// Soup triangle it was cut from (the smallest one when several
    /// coplanar triangles cover it).
    pub parent: u32,
}

/// Result of [`arrange`]: the soup with every implicit vertex it gained,
/// the intersection ledger and the output triangulation.
pub struct Arrangement {
    soup: TriangleSoup,
    ledger: IntersectionLedger,
    clusters: Vec<Cluster>,
    triangles: Vec<ArrangedTriangle>,
    constrained_edges: Vec<[u32; 2]>,
    constrained_set: AHashSet<CanonicalEdge>,
}

impl Arrangement {
    pub fn soup(&self) -> &TriangleSoup {
        &self.soup
    }

    pub fn ledger(&self) -> &IntersectionLedger {
        &self.ledger
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn triangles(&self) -> &[ArrangedTriangle] {
        &self.triangles
    }

    /// Edges lying on an input triangle boundary or on an intersection
    /// segment, smaller vertex first, sorted.
    pub fn constrained_edges(&self) -> &[[u32; 2]] {
        &self.constrained_edges
    }

    pub fn edge_is_constrained(&self, v0: u32, v1: u32) -> bool {
        self.constrained_set.contains(&CanonicalEdge::new(v0, v1))
    }

    /// Pairs of soup triangles that intersect, sorted.
    pub fn intersecting_pairs(&self) -> Vec<(u32, u32)> {
        self.ledger.intersecting_pairs()
    }

    /// Approximate coordinates of every soup vertex, jolly points included.
    pub fn vertices(&self) -> Vec<[f64; 3]> {
        self.soup.approx_coords()
    }

    /// Implicit vertices created by intersections.
    pub fn num_new_verts(&self) -> usize {
        self.soup.num_verts() - self.soup.num_orig_verts() - NUM_JOLLY
    }

    pub fn tri_coords(&self, i: usize) -> [[f64; 3]; 3] {
        self.triangles[i].v.map(|v| self.soup.vert(v).approx())
    }
}

/// Arranges the soup given as flat coordinate and index buffers. `labels`
/// is empty or holds one label per input triangle.
pub fn arrange(
    coords: &[f64],
    tris: &[u32],
    labels: &[Label],
    config: &ArrangementConfig,
) -> Result<Arrangement, ArrangementError> {
    let soup = TriangleSoup::new(coords, tris, labels, config)?;
    let pairs = candidate_pairs(&soup, config.parallel);
    info!("{} candidate pairs", pairs.len());
    Ok(run(soup, &pairs, config))
}

/// [`arrange`] with caller-supplied candidate pairs, given as input
/// triangle indices. Pairs involving dropped triangles are ignored.
pub fn arrange_with_pairs(
    coords: &[f64],
    tris: &[u32],
    labels: &[Label],
    pairs: &[(u32, u32)],
    config: &ArrangementConfig,
) -> Result<Arrangement, ArrangementError> {
    let soup = TriangleSoup::new(coords, tris, labels, config)?;
    let n = soup.num_input_tris();
    let mut mapped = Vec::with_capacity(pairs.len());
    for &(a, b) in pairs {
        if a as usize >= n || b as usize >= n {
            return Err(ArrangementError::CandidateOutOfRange { pair: (a, b) });
        }
        if let (Some(x), Some(y)) = (soup.input_tri(a), soup.input_tri(b)) {
            if x != y {
                mapped.push((x.min(y), x.max(y)));
            }
        }
    }
    mapped.sort_unstable();
    mapped.dedup();
    Ok(run(soup, &mapped, config))
}

fn run(soup: TriangleSoup, pairs: &[(u32, u32)], config: &ArrangementConfig) -> Arrangement {
    let ledger = IntersectionLedger::new(soup.num_tris(), soup.num_orig_edges());
    classify_intersections(&soup, &ledger, pairs, config.parallel);
    info!(
        "{} intersecting pairs, {} new vertices",
        ledger.intersecting_pairs().len(),
        soup.num_verts() - soup.num_orig_verts() - NUM_JOLLY
    );

    let clusters = propagate_coplanar_intersections(&soup, &ledger, config.parallel);
    debug!("{} clusters to re-triangulate", clusters.len());

    let outputs: Vec<ClusterOutput> = if config.parallel {
        clusters
            .par_iter()
            .map(|c| triangulate_cluster(&soup, &ledger, c))
            .collect()
    } else {
        clusters
            .iter()
            .map(|c| triangulate_cluster(&soup, &ledger, c))
            .collect()
    };

    let mut owner = vec![None; soup.num_tris()];
    for (i, c) in clusters.iter().enumerate() {
        for &t in &c.members {
            owner[t as usize] = Some(i);
        }
    }

    let mut triangles = Vec::with_capacity(soup.num_tris());
    let mut constrained = Vec::new();
    for t in 0..soup.num_tris() as u32 {
        match owner[t as usize] {
            Some(i) if clusters[i].reference() == t => {
                triangles.extend_from_slice(&outputs[i].triangles);
                constrained.extend_from_slice(&outputs[i].constrained);
            }
            Some(_) => {}
            None => {
                let v = soup.tri(t);
                triangles.push(ArrangedTriangle {
                    v,
                    label: soup.tri_label(t),
                    parent: t,
                });
                for k in 0..3 {
                    let (a, b) = (v[k], v[(k + 1) % 3]);
                    constrained.push([a.min(b), a.max(b)]);
                }
            }
        }
    }
    constrained.sort_unstable();
    constrained.dedup();
    let constrained_set = constrained.iter().map(|[a, b]| CanonicalEdge::new(*a, *b)).collect();

    info!(
        "arrangement: {} triangles, {} vertices, {} constrained edges",
        triangles.len(),
        soup.num_verts(),
        constrained.len()
    );
    Arrangement {
        soup,
        ledger,
        clusters,
        triangles,
        constrained_edges: constrained,
        constrained_set,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> ArrangementConfig {
        ArrangementConfig::default().with_parallel(false)
    }

    #[test]
    fn untouched_soup_passes_through() {
        let coords = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            5.0, 5.0, 5.0, 6.0, 5.0, 5.0, 5.0, 6.0, 5.0,
        ];
        let arr = arrange(&coords, &[0, 1, 2, 3, 4, 5], &[], &seq()).unwrap();
        assert_eq!(arr.triangles().len(), 2);
        assert!(arr.clusters().is_empty());
        assert_eq!(arr.num_new_verts(), 0);
        assert_eq!(arr.constrained_edges().len(), 6);
        assert!(arr.edge_is_constrained(1, 0));
        assert_eq!(arr.tri_coords(1)[0], [5.0, 5.0, 5.0]);
    }

    #[test]
    fn bad_candidates_are_rejected() {
        let coords = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let err = arrange_with_pairs(&coords, &[0, 1, 2], &[], &[(0, 3)], &seq()).err();
        assert_eq!(err, Some(ArrangementError::CandidateOutOfRange { pair: (0, 3) }));
    }

    #[test]
    fn self_and_dropped_pairs_are_ignored() {
        let coords = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0];
        // triangle 1 is collinear and dropped
        let arr = arrange_with_pairs(&coords, &[0, 1, 2, 0, 1, 3], &[], &[(0, 0), (0, 1)], &seq()).unwrap();
        assert_eq!(arr.triangles().len(), 1);
        assert!(arr.intersecting_pairs().is_empty());
    }
}
