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

use num_traits::Float;
use rayon::prelude::*;

use crate::geometry::aabb::Aabb;

/// A static AABB-tree over `(aabb, data)` items.
#[derive(Debug)]
pub enum AabbTree<T: Float, const N: usize, D> {
    Empty,
    Leaf {
        aabb: Aabb<T, N>,
        data: D,
    },
    Node {
        aabb: Aabb<T, N>,
        left: Box<AabbTree<T, N, D>>,
        right: Box<AabbTree<T, N, D>>,
        size: usize,
    },
}

impl<T: Float, const N: usize, D: Copy> AabbTree<T, N, D> {
    /// Build the tree via recursive median split along the longest axis of
    /// the item centers.
    pub fn build(items: Vec<(Aabb<T, N>, D)>) -> Self {
        if items.is_empty() {
            return AabbTree::Empty;
        }
        Self::build_binary_tree(items)
    }

    fn build_binary_tree(mut items: Vec<(Aabb<T, N>, D)>) -> Self {
        if items.len() == 1 {
            let (aabb, data) = items[0];
            return AabbTree::Leaf { aabb, data };
        }

        let centers = items
            .iter()
            .map(|(b, _)| std::array::from_fn::<T, N, _>(|i| b.center(i)))
            .collect::<Vec<_>>();
        let axis = Aabb::from_points(&centers).longest_axis();

        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |(a, _), (b, _)| {
            a.center(axis)
                .partial_cmp(&b.center(axis))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let right_items = items.split_off(mid);

        let left = Box::new(Self::build_binary_tree(items));
        let right = Box::new(Self::build_binary_tree(right_items));

        AabbTree::Node {
            aabb: left.aabb_unchecked().union(right.aabb_unchecked()),
            size: left.size() + right.size(),
            left,
            right,
        }
    }

    // children of a node are never empty
    fn aabb_unchecked(&self) -> &Aabb<T, N> {
        match self {
            AabbTree::Leaf { aabb, .. } | AabbTree::Node { aabb, .. } => aabb,
            AabbTree::Empty => unreachable!("empty subtree below a node"),
        }
    }

    pub fn aabb(&self) -> Option<&Aabb<T, N>> {
        match self {
            AabbTree::Empty => None,
            AabbTree::Leaf { aabb, .. } | AabbTree::Node { aabb, .. } => Some(aabb),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            AabbTree::Empty => 0,
            AabbTree::Leaf { .. } => 1,
            AabbTree::Node { size, .. } => *size,
        }
    }

    /// Collect all data whose AABB intersects `query`.
    pub fn query(&self, query: &Aabb<T, N>, out: &mut Vec<D>) {
        match self {
            AabbTree::Empty => {}
            AabbTree::Leaf { aabb, data } => {
                if aabb.intersects(query) {
                    out.push(*data);
                }
            }
            AabbTree::Node {
                aabb, left, right, ..
            } => {
                if aabb.intersects(query) {
                    left.query(query, out);
                    right.query(query, out);
                }
            }
        }
    }
}

impl<T, const N: usize, D> AabbTree<T, N, D>
where
    T: Float + Send + Sync,
    D: Copy + Ord + Send + Sync,
{
    /// Self-join: every unordered pair of distinct items whose boxes overlap,
    /// reported once as `(lo, hi)` and sorted.
    pub fn overlapping_pairs(&self, items: &[(Aabb<T, N>, D)], parallel: bool) -> Vec<(D, D)> {
        let per_item = |(aabb, data): &(Aabb<T, N>, D)| {
            let mut hits = Vec::new();
            self.query(aabb, &mut hits);
            hits.into_iter()
                .filter(|other| *other > *data)
                .map(|other| (*data, other))
                .collect::<Vec<_>>()
        };

        let mut pairs: Vec<(D, D)> = if parallel {
            items.par_iter().flat_map_iter(per_item).collect()
        } else {
            items.iter().flat_map(per_item).collect()
        };
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f64) -> Aabb<f64, 3> {
        Aabb::new([x, 0.0, 0.0], [x + 1.0, 1.0, 1.0])
    }

    #[test]
    fn query_finds_touching_boxes() {
        let items: Vec<_> = (0..8u32).map(|i| (unit_box(i as f64 * 2.0), i)).collect();
        let tree = AabbTree::build(items);
        assert_eq!(tree.size(), 8);

        let mut out = Vec::new();
        tree.query(&Aabb::new([3.0, 0.5, 0.5], [4.0, 0.6, 0.6]), &mut out);
        out.sort();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn self_join_matches_brute_force() {
        let items: Vec<_> = (0..40u32)
            .map(|i| {
                let x = (i as f64 * 0.37).sin() * 5.0;
                let y = (i as f64 * 0.91).cos() * 5.0;
                (Aabb::new([x, y, 0.0], [x + 1.3, y + 0.7, 1.0]), i)
            })
            .collect();
        let tree = AabbTree::build(items.clone());

        let mut expected = Vec::new();
        for (a, i) in &items {
            for (b, j) in &items {
                if i < j && a.intersects(b) {
                    expected.push((*i, *j));
                }
            }
        }
        assert_eq!(tree.overlapping_pairs(&items, false), expected);
        assert_eq!(tree.overlapping_pairs(&items, true), expected);
    }

    #[test]
    fn empty_tree() {
        let tree: AabbTree<f64, 3, u32> = AabbTree::build(Vec::new());
        let mut out = Vec::new();
        tree.query(&unit_box(0.0), &mut out);
        assert!(out.is_empty());
        assert!(tree.aabb().is_none());
    }
}
