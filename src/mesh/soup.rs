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

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use log::{debug, warn};
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::config::ArrangementConfig;
use crate::error::ArrangementError;
use crate::geometry::{
    CanonicalEdge, ExactKey, ExplicitPoint, GenericPoint, PointArena, PointId, ProjectionPlane,
};
use crate::kernel::coplanar;
use crate::mesh::info::{Label, VertInfo};
use crate::mesh::sharded_map::{ShardedMap, get_mut, read_lock, write_lock};

pub const NUM_JOLLY: usize = 4;

// vertices of a regular tetrahedron centred at the origin
const JOLLY_DIRECTIONS: [[f64; 3]; NUM_JOLLY] = [
    [1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

#[derive(Clone, Debug)]
struct SoupVertex {
    point: Arc<GenericPoint>,
    handle: PointId,
    info: VertInfo,
    orig_ids: SmallVec<[u32; 1]>,
}

/// Global index of the input soup: deduplicated vertices, triangles, edges
/// and the implicit vertices discovered while classifying intersections.
///
/// Vertex ids are laid out as `[original | jolly | implicit]`. Construction
/// and [`TriangleSoup::add_vertex`] need exclusive access; the implicit
/// vertex and edge get-or-insert operations are safe to call from many
/// threads.
pub struct TriangleSoup {
    arena: PointArena,
    vertices: RwLock<Vec<SoupVertex>>,
    num_orig_verts: u32,
    jolly: Option<[u32; NUM_JOLLY]>,
    orig_to_soup: Vec<u32>,
    by_handle: AHashMap<PointId, u32>,
    by_coords: AHashMap<[u64; 3], u32>,
    implicit: ShardedMap<ExactKey, u32>,

    edges: RwLock<Vec<CanonicalEdge>>,
    edge_map: ShardedMap<CanonicalEdge, u32>,
    num_orig_edges: u32,

    tris: Vec<[u32; 3]>,
    tri_edges: Vec<[u32; 3]>,
    tri_labels: Vec<Label>,
    tri_planes: Vec<ProjectionPlane>,
    tri_jolly: Vec<u32>,
    tri_input_ids: Vec<u32>,
    input_to_tri: Vec<Option<u32>>,
}

fn coord_key(p: [f64; 3]) -> [u64; 3] {
    // -0.0 and 0.0 are the same location
    p.map(|c| if c == 0.0 { 0 } else { c.to_bits() })
}

fn canonical_rotation(t: [u32; 3]) -> [u32; 3] {
    let k = (0..3).min_by_key(|&i| t[i]).unwrap_or(0);
    [t[k], t[(k + 1) % 3], t[(k + 2) % 3]]
}

impl TriangleSoup {
    /// Builds the soup from flat buffers: `coords` holds xyz triples and
    /// `tris` vertex index triples. `labels` is either empty (every triangle
    /// gets label bit 0) or has one entry per input triangle.
    pub fn new(
        coords: &[f64],
        tris: &[u32],
        labels: &[Label],
        config: &ArrangementConfig,
    ) -> Result<Self, ArrangementError> {
        config.validate()?;
        if coords.len() % 3 != 0 {
            return Err(ArrangementError::CoordsNotTriples { len: coords.len() });
        }
        if tris.len() % 3 != 0 {
            return Err(ArrangementError::TrisNotTriples { len: tris.len() });
        }
        let num_in_verts = coords.len() / 3;
        let num_in_tris = tris.len() / 3;
        if !labels.is_empty() && labels.len() != num_in_tris {
            return Err(ArrangementError::LabelCountMismatch {
                labels: labels.len(),
                triangles: num_in_tris,
            });
        }

        let mut soup = TriangleSoup {
            arena: PointArena::with_capacity(num_in_verts + NUM_JOLLY),
            vertices: RwLock::new(Vec::with_capacity(num_in_verts + NUM_JOLLY)),
            num_orig_verts: 0,
            jolly: None,
            orig_to_soup: Vec::with_capacity(num_in_verts),
            by_handle: AHashMap::with_capacity(num_in_verts),
            by_coords: AHashMap::with_capacity(num_in_verts),
            implicit: ShardedMap::for_current_pool(),
            edges: RwLock::new(Vec::with_capacity(num_in_tris * 3 / 2)),
            edge_map: ShardedMap::for_current_pool(),
            num_orig_edges: 0,
            tris: Vec::with_capacity(num_in_tris),
            tri_edges: Vec::with_capacity(num_in_tris),
            tri_labels: Vec::with_capacity(num_in_tris),
            tri_planes: Vec::with_capacity(num_in_tris),
            tri_jolly: Vec::with_capacity(num_in_tris),
            tri_input_ids: Vec::with_capacity(num_in_tris),
            input_to_tri: vec![None; num_in_tris],
        };

        for (i, c) in coords.chunks_exact(3).enumerate() {
            let p = ExplicitPoint::new(c[0], c[1], c[2])
                .ok_or(ArrangementError::NonFiniteCoordinate { vertex: i })?;
            let key = coord_key(p.coords());
            let handle = match soup.by_coords.get(&key) {
                Some(&v) => soup.vertex(v).handle,
                None => soup.arena.push(GenericPoint::explicit(p)),
            };
            let v = soup.add_vertex(handle, Some(i as u32));
            soup.by_coords.insert(key, v);
            soup.orig_to_soup.push(v);
        }
        soup.num_orig_verts = soup.num_verts() as u32;

        let max_coord = coords.iter().fold(0.0f64, |m, c| m.max(c.abs()));
        soup.append_jolly_points(config.jolly_scale * (max_coord + 1.0))
            .map_err(|_| ArrangementError::CoordinateTooLarge { max_coord })?;

        soup.add_input_triangles(tris, labels, config)?;
        Ok(soup)
    }

    fn add_input_triangles(
        &mut self,
        tris: &[u32],
        labels: &[Label],
        config: &ArrangementConfig,
    ) -> Result<(), ArrangementError> {
        let num_in_verts = self.orig_to_soup.len();
        let mut mapped = Vec::with_capacity(tris.len() / 3);
        for (t, idx) in tris.chunks_exact(3).enumerate() {
            let mut v = [0u32; 3];
            for k in 0..3 {
                let Some(&s) = self.orig_to_soup.get(idx[k] as usize) else {
                    return Err(ArrangementError::VertexIndexOutOfRange {
                        triangle: t,
                        index: idx[k],
                        num_verts: num_in_verts,
                    });
                };
                v[k] = s;
            }
            mapped.push(v);
        }

        let plane_of = |v: &[u32; 3]| -> Option<ProjectionPlane> {
            if v[0] == v[1] || v[1] == v[2] || v[2] == v[0] {
                return None;
            }
            let [a, b, c] = self.tri_points_of(*v);
            ProjectionPlane::for_triangle(&a, &b, &c)
        };
        let planes: Vec<Option<ProjectionPlane>> = if config.parallel {
            mapped.par_iter().map(plane_of).collect()
        } else {
            mapped.iter().map(plane_of).collect()
        };

        let mut seen: AHashMap<[u32; 3], u32> = AHashMap::with_capacity(mapped.len());
        let (mut degenerate, mut duplicate) = (0usize, 0usize);
        for (t_in, (v, plane)) in mapped.into_iter().zip(planes).enumerate() {
            let label = labels.get(t_in).copied().unwrap_or(Label::bit(0));
            let Some(plane) = plane else {
                degenerate += 1;
                continue;
            };
            let key = canonical_rotation(v);
            if config.merge_duplicate_triangles {
                if let Some(&existing) = seen.get(&key) {
                    self.tri_labels[existing as usize] |= label;
                    self.input_to_tri[t_in] = Some(existing);
                    duplicate += 1;
                    continue;
                }
            }
            let t = self.tris.len() as u32;
            seen.entry(key).or_insert(t);
            self.tris.push(v);
            self.tri_labels.push(label);
            self.tri_planes.push(plane);
            self.tri_input_ids.push(t_in as u32);
            self.input_to_tri[t_in] = Some(t);
        }
        if degenerate > 0 {
            warn!("dropped {degenerate} degenerate input triangles");
        }
        if duplicate > 0 {
            debug!("merged {duplicate} duplicate input triangles");
        }

        for t in 0..self.tris.len() {
            let [a, b, c] = self.tris[t];
            let e = [self.add_edge(a, b), self.add_edge(b, c), self.add_edge(c, a)];
            self.tri_edges.push(e);
        }
        self.num_orig_edges = self.num_edges() as u32;

        let jolly_of = |v: &[u32; 3]| -> u32 {
            let [a, b, c] = self.tri_points_of(*v);
            self.no_coplanar_jolly(&a, &b, &c)
        };
        self.tri_jolly = if config.parallel {
            self.tris.par_iter().map(jolly_of).collect()
        } else {
            self.tris.iter().map(jolly_of).collect()
        };

        debug!(
            "soup: {} vertices, {} triangles, {} edges",
            self.num_orig_verts,
            self.tris.len(),
            self.num_orig_edges
        );
        Ok(())
    }

    /// Registers the point behind `handle` as a soup vertex. A handle that is
    /// already registered returns its vertex; `orig_id` is then appended to
    /// the vertices it stands for.
    pub fn add_vertex(&mut self, handle: PointId, orig_id: Option<u32>) -> u32 {
        let vertices = get_mut(&mut self.vertices);
        let v = match self.by_handle.get(&handle) {
            Some(&v) => v,
            None => {
                let point = self.arena.get(handle);
                vertices.push(SoupVertex {
                    point,
                    handle,
                    info: VertInfo::empty(),
                    orig_ids: SmallVec::new(),
                });
                let v = (vertices.len() - 1) as u32;
                self.by_handle.insert(handle, v);
                v
            }
        };
        if let Some(orig) = orig_id {
            let vert = &mut vertices[v as usize];
            vert.orig_ids.push(orig);
            vert.info.insert(VertInfo::ORIGINAL);
        }
        v
    }

    /// Get-or-insert of an implicit point by exact location. Concurrent
    /// callers racing on one location all receive the same id; the losers'
    /// points are dropped. A location already held by an explicit vertex
    /// resolves to that vertex.
    pub fn add_implicit_vertex(&self, p: GenericPoint) -> u32 {
        let key = p.exact().clone();
        if let Some(c) = key.to_f64_exact() {
            if let Some(&v) = self.by_coords.get(&coord_key(c)) {
                return v;
            }
        }
        self.implicit
            .get_or_insert_with(key, || {
                let handle = self.arena.push(p);
                let point = self.arena.get(handle);
                let mut vertices = write_lock(&self.vertices);
                vertices.push(SoupVertex {
                    point,
                    handle,
                    info: VertInfo::NEW,
                    orig_ids: SmallVec::new(),
                });
                (vertices.len() - 1) as u32
            })
            .0
    }

    /// Get-or-insert of the undirected edge `(v0, v1)`.
    pub fn add_edge(&self, v0: u32, v1: u32) -> u32 {
        assert!(v0 != v1, "edge ({v0}, {v1}) is degenerate");
        let key = CanonicalEdge::new(v0, v1);
        self.edge_map
            .get_or_insert_with(key, || {
                let mut edges = write_lock(&self.edges);
                edges.push(key);
                (edges.len() - 1) as u32
            })
            .0
    }

    // fails, touching nothing, when `multiplier` is not finite
    fn append_jolly_points(&mut self, multiplier: f64) -> Result<(), f64> {
        if self.jolly.is_some() {
            return Ok(());
        }
        if !multiplier.is_finite() {
            return Err(multiplier);
        }
        let mut ids = [0u32; NUM_JOLLY];
        for (k, dir) in JOLLY_DIRECTIONS.iter().enumerate() {
            let c = dir.map(|d| d * multiplier);
            let point = GenericPoint::from_coords(c[0], c[1], c[2]).ok_or(multiplier)?;
            let handle = self.arena.push(point);
            let v = self.add_vertex(handle, None);
            get_mut(&mut self.vertices)[v as usize].info.insert(VertInfo::JOLLY);
            self.by_coords.insert(coord_key(c), v);
            ids[k] = v;
        }
        self.jolly = Some(ids);
        Ok(())
    }

    /// First jolly point not coplanar with `a`, `b`, `c`.
    pub fn no_coplanar_jolly(&self, a: &GenericPoint, b: &GenericPoint, c: &GenericPoint) -> u32 {
        let ids = self.jolly_ids();
        for v in ids {
            if !coplanar(a, b, c, &self.vert(v)) {
                return v;
            }
        }
        // four affinely independent points cannot share one plane
        panic!("every jolly point is coplanar with the query triangle");
    }

    fn jolly_ids(&self) -> [u32; NUM_JOLLY] {
        match self.jolly {
            Some(ids) => ids,
            None => panic!("jolly points have not been appended"),
        }
    }

    fn vertex(&self, v: u32) -> SoupVertex {
        let vertices = read_lock(&self.vertices);
        match vertices.get(v as usize) {
            Some(vert) => vert.clone(),
            None => panic!("vertex {v} out of range ({} vertices)", vertices.len()),
        }
    }

    fn check_tri(&self, t: u32) -> usize {
        assert!(
            (t as usize) < self.tris.len(),
            "triangle {t} out of range ({} triangles)",
            self.tris.len()
        );
        t as usize
    }

    fn tri_points_of(&self, v: [u32; 3]) -> [Arc<GenericPoint>; 3] {
        let vertices = read_lock(&self.vertices);
        v.map(|i| match vertices.get(i as usize) {
            Some(vert) => vert.point.clone(),
            None => panic!("vertex {i} out of range ({} vertices)", vertices.len()),
        })
    }

    pub fn arena(&self) -> &PointArena {
        &self.arena
    }

    pub fn num_verts(&self) -> usize {
        read_lock(&self.vertices).len()
    }

    /// Number of soup vertices standing for input vertices.
    pub fn num_orig_verts(&self) -> usize {
        self.num_orig_verts as usize
    }

    pub fn num_tris(&self) -> usize {
        self.tris.len()
    }

    pub fn num_edges(&self) -> usize {
        read_lock(&self.edges).len()
    }

    /// Edges created from triangle boundaries; intersection segments are
    /// numbered after them.
    pub fn num_orig_edges(&self) -> usize {
        self.num_orig_edges as usize
    }

    pub fn vert(&self, v: u32) -> Arc<GenericPoint> {
        self.vertex(v).point
    }

    /// Explicit coordinates of `v`; panics on implicit vertices.
    pub fn explicit_vert(&self, v: u32) -> ExplicitPoint {
        match self.vert(v).as_explicit() {
            Some(p) => *p,
            None => panic!("vertex {v} is implicit"),
        }
    }

    pub fn vert_point_id(&self, v: u32) -> PointId {
        self.vertex(v).handle
    }

    pub fn vert_info(&self, v: u32) -> VertInfo {
        self.vertex(v).info
    }

    /// Input vertex ids merged into `v` (empty for jolly and implicit ones).
    pub fn vert_orig_ids(&self, v: u32) -> SmallVec<[u32; 1]> {
        self.vertex(v).orig_ids
    }

    /// Soup vertex standing for input vertex `orig`.
    pub fn orig_vert_id(&self, orig: u32) -> u32 {
        match self.orig_to_soup.get(orig as usize) {
            Some(&v) => v,
            None => panic!("input vertex {orig} out of range ({} vertices)", self.orig_to_soup.len()),
        }
    }

    /// Approximate coordinates of every vertex.
    pub fn approx_coords(&self) -> Vec<[f64; 3]> {
        read_lock(&self.vertices).iter().map(|v| v.point.approx()).collect()
    }

    pub fn tri(&self, t: u32) -> [u32; 3] {
        self.tris[self.check_tri(t)]
    }

    pub fn tri_vert_id(&self, t: u32, off: usize) -> u32 {
        self.tri(t)[off]
    }

    pub fn tri_vert(&self, t: u32, off: usize) -> Arc<GenericPoint> {
        self.vert(self.tri_vert_id(t, off))
    }

    pub fn tri_points(&self, t: u32) -> [Arc<GenericPoint>; 3] {
        self.tri_points_of(self.tri(t))
    }

    /// Edge `off` joins vertex `off` to vertex `off + 1`.
    pub fn tri_edge_id(&self, t: u32, off: usize) -> u32 {
        self.tri_edges[self.check_tri(t)][off]
    }

    pub fn tri_edges(&self, t: u32) -> [u32; 3] {
        self.tri_edges[self.check_tri(t)]
    }

    pub fn tri_plane(&self, t: u32) -> ProjectionPlane {
        self.tri_planes[self.check_tri(t)]
    }

    pub fn tri_label(&self, t: u32) -> Label {
        self.tri_labels[self.check_tri(t)]
    }

    /// Memoised jolly vertex not coplanar with triangle `t`.
    pub fn tri_jolly(&self, t: u32) -> u32 {
        self.tri_jolly[self.check_tri(t)]
    }

    pub fn tri_contains_vert(&self, t: u32, v: u32) -> bool {
        self.tri(t).contains(&v)
    }

    pub fn tri_contains_edge(&self, t: u32, e: u32) -> bool {
        self.tri_edges(t).contains(&e)
    }

    /// Edge of `t` that does not touch its vertex `v`.
    pub fn edge_opposite_to_vert(&self, t: u32, v: u32) -> u32 {
        let tri = self.tri(t);
        match tri.iter().position(|&x| x == v) {
            Some(k) => self.tri_edge_id(t, (k + 1) % 3),
            None => panic!("vertex {v} is not in triangle {t}"),
        }
    }

    /// First input triangle folded into soup triangle `t`.
    pub fn tri_input_id(&self, t: u32) -> u32 {
        self.tri_input_ids[self.check_tri(t)]
    }

    /// Soup triangle for input triangle `t_in`; `None` when it was dropped as
    /// degenerate.
    pub fn input_tri(&self, t_in: u32) -> Option<u32> {
        self.input_to_tri.get(t_in as usize).copied().flatten()
    }

    pub fn num_input_tris(&self) -> usize {
        self.input_to_tri.len()
    }

    pub fn edge(&self, e: u32) -> [u32; 2] {
        let edges = read_lock(&self.edges);
        match edges.get(e as usize) {
            Some(edge) => edge.verts(),
            None => panic!("edge {e} out of range ({} edges)", edges.len()),
        }
    }

    pub fn edge_id(&self, v0: u32, v1: u32) -> Option<u32> {
        self.edge_map.get(&CanonicalEdge::new(v0, v1))
    }

    /// Vertex id of jolly point `k` (0..4).
    pub fn jolly_point(&self, k: usize) -> u32 {
        self.jolly_ids()[k]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Sign, orient3d};

    fn unit_tri() -> (Vec<f64>, Vec<u32>) {
        (
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn merges_coincident_vertices() {
        let coords = vec![
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            -0.0, 0.0, 0.0, // same as vertex 0
            1.0, 0.0, 0.0, // same as vertex 1
            1.0, 1.0, 0.0,
        ];
        let tris = vec![0, 1, 2, 3, 5, 4];
        let soup = TriangleSoup::new(&coords, &tris, &[], &ArrangementConfig::default()).unwrap();

        assert_eq!(soup.num_orig_verts(), 4);
        assert_eq!(soup.orig_vert_id(3), soup.orig_vert_id(0));
        assert_eq!(soup.vert_orig_ids(soup.orig_vert_id(0)).as_slice(), &[0, 3]);
        assert_eq!(soup.num_tris(), 2);
        // the shared edge (0, 1) exists once
        assert_eq!(soup.num_edges(), 5);
        assert!(soup.vert_info(0).contains(VertInfo::ORIGINAL));
    }

    #[test]
    fn drops_degenerate_and_merges_duplicates() {
        let coords = vec![
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            2.0, 0.0, 0.0,
        ];
        // collinear, repeated vertex, duplicate with another label
        let tris = vec![0, 1, 3, 0, 0, 2, 0, 1, 2, 1, 2, 0];
        let labels = [Label::bit(0), Label::bit(0), Label::bit(1), Label::bit(2)];
        let soup = TriangleSoup::new(&coords, &tris, &labels, &ArrangementConfig::default()).unwrap();

        assert_eq!(soup.num_tris(), 1);
        assert_eq!(soup.tri_label(0), Label::bit(1) | Label::bit(2));
        assert_eq!(soup.input_tri(0), None);
        assert_eq!(soup.input_tri(3), Some(0));
        assert_eq!(soup.tri_input_id(0), 2);
    }

    #[test]
    fn opposite_orientation_is_not_a_duplicate() {
        let coords = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let tris = vec![0, 1, 2, 0, 2, 1];
        let soup = TriangleSoup::new(&coords, &tris, &[], &ArrangementConfig::default()).unwrap();
        assert_eq!(soup.num_tris(), 2);
        assert_eq!(soup.num_edges(), 3);
    }

    #[test]
    fn rejects_unusable_jolly_scale() {
        let (coords, tris) = unit_tri();
        for scale in [0.5, -4.0, f64::NAN, f64::INFINITY] {
            let cfg = ArrangementConfig::default().with_jolly_scale(scale);
            let err = TriangleSoup::new(&coords, &tris, &[], &cfg).err();
            assert!(matches!(err, Some(ArrangementError::InvalidJollyScale { .. })), "{scale}");
        }
        let cfg = ArrangementConfig::default().with_jolly_scale(1.0);
        assert!(TriangleSoup::new(&coords, &tris, &[], &cfg).is_ok());
    }

    #[test]
    fn huge_coordinates_leave_no_room_for_jolly_points() {
        let coords = [0.0, 0.0, 0.0, 1e308, 0.0, 0.0, 0.0, 1e308, 0.0];
        let err = TriangleSoup::new(&coords, &[0, 1, 2], &[], &ArrangementConfig::default()).err();
        assert_eq!(err, Some(ArrangementError::CoordinateTooLarge { max_coord: 1e308 }));

        // still representable once scaled
        let coords = [0.0, 0.0, 0.0, 1e300, 0.0, 0.0, 0.0, 1e300, 0.0];
        let soup = TriangleSoup::new(&coords, &[0, 1, 2], &[], &ArrangementConfig::default()).unwrap();
        assert_eq!(soup.num_tris(), 1);
        assert!(soup.approx_coords().iter().flatten().all(|c| c.is_finite()));
    }

    #[test]
    fn rejects_bad_input() {
        let cfg = ArrangementConfig::default();
        let err = TriangleSoup::new(&[0.0, 1.0], &[], &[], &cfg).err();
        assert_eq!(err, Some(ArrangementError::CoordsNotTriples { len: 2 }));

        let (mut coords, tris) = unit_tri();
        coords[4] = f64::NAN;
        let err = TriangleSoup::new(&coords, &tris, &[], &cfg).err();
        assert_eq!(err, Some(ArrangementError::NonFiniteCoordinate { vertex: 1 }));

        let (coords, _) = unit_tri();
        let err = TriangleSoup::new(&coords, &[0, 1, 7], &[], &cfg).err();
        assert_eq!(
            err,
            Some(ArrangementError::VertexIndexOutOfRange {
                triangle: 0,
                index: 7,
                num_verts: 3
            })
        );

        let err = TriangleSoup::new(&coords, &[0, 1, 2], &[Label(1), Label(1)], &cfg).err();
        assert_eq!(
            err,
            Some(ArrangementError::LabelCountMismatch {
                labels: 2,
                triangles: 1
            })
        );
    }

    #[test]
    fn jolly_points_escape_every_plane() {
        let (coords, tris) = unit_tri();
        let soup = TriangleSoup::new(&coords, &tris, &[], &ArrangementConfig::default()).unwrap();

        for k in 0..NUM_JOLLY {
            let j = soup.jolly_point(k);
            assert!(soup.vert_info(j).contains(VertInfo::JOLLY));
            assert!(soup.vert_orig_ids(j).is_empty());
        }
        let [a, b, c] = soup.tri_points(0);
        let j = soup.vert(soup.tri_jolly(0));
        let s = orient3d(&a, &b, &c, &j);
        assert_ne!(s, Sign::Zero);
        assert_eq!(orient3d(&b, &a, &c, &j), s.reversed());
    }

    #[test]
    fn implicit_vertices_are_deduplicated_concurrently() {
        let (coords, tris) = unit_tri();
        let soup = TriangleSoup::new(&coords, &tris, &[], &ArrangementConfig::default()).unwrap();
        let before = soup.num_verts();
        let e = |x, y, z| ExplicitPoint::new(x, y, z).unwrap();
        let make = || {
            GenericPoint::lpi(
                e(0.0, 0.0, 0.0),
                e(1.0, 1.0, 1.0),
                e(1.0, 0.0, 0.0),
                e(0.0, 1.0, 0.0),
                e(0.0, 0.0, 1.0),
            )
            .unwrap()
        };

        let ids: Vec<u32> = (0..64).into_par_iter().map(|_| soup.add_implicit_vertex(make())).collect();
        assert!(ids.iter().all(|&v| v == ids[0]));
        assert_eq!(soup.num_verts(), before + 1);
        assert!(soup.vert_info(ids[0]).contains(VertInfo::NEW));

        // an implicit point on an input vertex resolves to that vertex
        let on_vertex = GenericPoint::lpi(
            e(1.0, 0.0, -1.0),
            e(1.0, 0.0, 1.0),
            e(0.0, 0.0, 0.0),
            e(1.0, 0.0, 0.0),
            e(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_eq!(soup.add_implicit_vertex(on_vertex), soup.orig_vert_id(1));
    }

    #[test]
    fn edges_are_get_or_insert() {
        let (coords, tris) = unit_tri();
        let soup = TriangleSoup::new(&coords, &tris, &[], &ArrangementConfig::default()).unwrap();
        assert_eq!(soup.num_orig_edges(), 3);
        assert_eq!(soup.add_edge(1, 0), soup.tri_edge_id(0, 0));
        let e = soup.add_edge(0, soup.jolly_point(0));
        assert_eq!(e, 3);
        assert_eq!(soup.edge_id(soup.jolly_point(0), 0), Some(3));
        assert_eq!(soup.edge_opposite_to_vert(0, 0), soup.tri_edge_id(0, 1));
    }
}
