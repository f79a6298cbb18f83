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

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tri_arrangement::geometry::{GenericPoint, ProjectionPlane};
use tri_arrangement::kernel::Sign;
use tri_arrangement::{CoplanarMesh, FlipOutcome};

fn gp(x: f64, y: f64) -> Arc<GenericPoint> {
    Arc::new(GenericPoint::from_coords(x, y, 0.0).unwrap())
}

// n x n grid of unit squares, each cut along its main diagonal
fn grid(n: u32) -> CoplanarMesh {
    let mut points = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            points.push(gp(i as f64, j as f64));
        }
    }
    let id = |i: u32, j: u32| j * (n + 1) + i;
    let mut tris = Vec::new();
    for j in 0..n {
        for i in 0..n {
            tris.push([id(i, j), id(i + 1, j), id(i + 1, j + 1)]);
            tris.push([id(i, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    let orig: Vec<u32> = (0..points.len() as u32).collect();
    CoplanarMesh::from_triangles(points, &orig, &tris, ProjectionPlane::Xy, false)
}

fn area(mesh: &CoplanarMesh) -> f64 {
    mesh.tri_ids()
        .map(|t| {
            let [a, b, c] = mesh.tri(t).map(|v| mesh.vert(v).approx());
            ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])) / 2.0
        })
        .sum()
}

#[test]
fn test_bulk_construction_matches_sequential() {
    let seq = grid(3);
    let mut points = Vec::new();
    for j in 0..=3 {
        for i in 0..=3 {
            points.push(gp(i as f64, j as f64));
        }
    }
    let orig: Vec<u32> = (0..16).collect();
    let tris: Vec<[u32; 3]> = seq.tri_ids().map(|t| seq.tri(t)).collect();
    let par = CoplanarMesh::from_triangles(points, &orig, &tris, ProjectionPlane::Xy, true);

    assert_eq!(par.num_edges(), seq.num_edges());
    for e in seq.edge_ids() {
        assert_eq!(par.edge(e), seq.edge(e));
    }
    assert_eq!(seq.num_tris(), 18);
    assert_eq!(seq.num_edges(), 33);
    assert!(seq.check_topology().is_ok());
}

#[test]
fn test_random_flips_keep_topology_and_constraints() {
    let mut mesh = grid(4);
    let total = area(&mesh);
    let num_tris = mesh.num_tris();

    // constrain the bottom row diagonals and the left border
    let mut constrained = Vec::new();
    for i in 0..4u32 {
        let e = mesh.edge_id(i, 5 + 1 + i).unwrap();
        mesh.set_edge_constrained(e, true);
        constrained.push([i, 6 + i]);
    }
    let e = mesh.edge_id(0, 5).unwrap();
    mesh.set_edge_constrained(e, true);
    constrained.push([0, 5]);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let (mut flipped, mut refused) = (0, 0);
    for _ in 0..500 {
        let ids: Vec<u32> = mesh.edge_ids().collect();
        let e = ids[rng.random_range(0..ids.len())];
        let was_constrained = mesh.edge_is_constrained(e);
        match mesh.flip_edge(e) {
            FlipOutcome::Flipped(ne) => {
                assert!(!was_constrained);
                assert!(!mesh.edge_is_constrained(ne));
                flipped += 1;
            }
            FlipOutcome::Constrained => {
                assert!(was_constrained);
                refused += 1;
            }
            FlipOutcome::NotConvex | FlipOutcome::Boundary => {}
        }
        assert!(mesh.check_topology().is_ok());
        assert_eq!(mesh.num_tris(), num_tris);
        assert!(mesh.tri_ids().all(|t| mesh.tri_orientation(t) == Sign::Positive));
        assert!((area(&mesh) - total).abs() < 1e-9);
        for [a, b] in &constrained {
            let e = mesh.edge_id(*a, *b).expect("constrained edge vanished");
            assert!(mesh.edge_is_constrained(e));
        }
    }
    assert!(flipped > 0);
    assert!(refused > 0);
}

#[test]
fn test_splits_conserve_area() {
    let mut mesh = grid(2);
    let total = area(&mesh);

    // interior diagonal of the lower-left square, constrained
    let e = mesh.edge_id(0, 4).unwrap();
    mesh.set_edge_constrained(e, true);
    let m = mesh.add_vertex(gp(0.5, 0.5), None);
    let new = mesh.split_edge(e, m);
    assert_eq!(new.len(), 4);
    assert_eq!(mesh.num_tris(), 10);
    assert!(mesh.edge_is_constrained(mesh.edge_id(0, m).unwrap()));
    assert!(mesh.edge_is_constrained(mesh.edge_id(m, 4).unwrap()));
    assert!(!mesh.edge_is_constrained(mesh.edge_id(1, m).unwrap()));
    assert!((area(&mesh) - total).abs() < 1e-12);

    // boundary edge: one incident triangle
    let b = mesh.edge_id(1, 2).unwrap();
    assert!(mesh.edge_is_boundary(b));
    let w = mesh.add_vertex(gp(1.5, 0.0), None);
    assert_eq!(mesh.split_edge(b, w).len(), 2);
    assert_eq!(mesh.vert_valence(w), 3);

    let t = mesh.locate(&gp(1.6, 1.7)).unwrap().0;
    let c = mesh.add_vertex(gp(1.6, 1.7), None);
    mesh.split_tri(t, c);
    assert_eq!(mesh.num_tris(), 13);
    assert!((area(&mesh) - total).abs() < 1e-12);
    assert!(mesh.check_topology().is_ok());
}

#[test]
fn test_removed_slots_are_reused() {
    let mut mesh = grid(1);
    let t = mesh.tri_id(0, 1, 3).unwrap();
    mesh.remove_tri(t);
    assert!(mesh.tri_is_removed(t));
    assert_eq!(mesh.num_tris(), 1);
    // the diagonal survives on the other triangle, the two outer edges go
    assert_eq!(mesh.num_edges(), 3);

    let again = mesh.add_triangle(0, 3, 1);
    assert_eq!(again, t);
    assert_eq!(mesh.tri_orientation(again), Sign::Positive);
    assert!(mesh.check_topology().is_ok());
}

#[test]
#[should_panic(expected = "not on the plane")]
fn test_split_rejects_vertex_above_the_plane() {
    let mut mesh = grid(1);
    let t = mesh.tri_id(0, 1, 3).unwrap();
    let lifted = mesh.add_vertex(Arc::new(GenericPoint::from_coords(0.7, 0.2, 7.0).unwrap()), None);
    mesh.split_tri(t, lifted);
}

#[test]
#[should_panic(expected = "is degenerate")]
fn test_collinear_triangle_is_refused() {
    let mut mesh = grid(1);
    let a = mesh.add_vertex(gp(4.0, 0.0), None);
    let b = mesh.add_vertex(gp(10.0, 0.0), None);
    mesh.add_triangle(1, a, b);
}
