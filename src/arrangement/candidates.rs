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

use rayon::prelude::*;

use crate::geometry::{Aabb, AabbTree};
use crate::mesh::TriangleSoup;

/// Pairs of soup triangles whose bounding boxes overlap, `(lo, hi)` and
/// sorted. Touching boxes count as overlapping.
pub fn candidate_pairs(soup: &TriangleSoup, parallel: bool) -> Vec<(u32, u32)> {
    let tri_box = |t: u32| -> (Aabb<f64, 3>, u32) {
        let pts = soup.tri_points(t).map(|p| p.approx());
        (Aabb::from_points(&pts), t)
    };
    let n = soup.num_tris() as u32;
    let items: Vec<(Aabb<f64, 3>, u32)> = if parallel {
        (0..n).into_par_iter().map(tri_box).collect()
    } else {
        (0..n).map(tri_box).collect()
    };
    let tree = AabbTree::build(items.clone());
    tree.overlapping_pairs(&items, parallel)
}
