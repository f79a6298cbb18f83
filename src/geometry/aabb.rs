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

/// An axis-aligned bounding box in N dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb<T: Float, const N: usize> {
    pub min: [T; N],
    pub max: [T; N],
}

impl<T: Float, const N: usize> Aabb<T, N> {
    pub fn new(min: [T; N], max: [T; N]) -> Self {
        Aabb { min, max }
    }

    /// Access the minimum corner.
    pub fn min(&self) -> &[T; N] {
        &self.min
    }

    /// Access the maximum corner.
    pub fn max(&self) -> &[T; N] {
        &self.max
    }

    /// Build the smallest AABB containing all `points`.
    pub fn from_points(points: &[[T; N]]) -> Self {
        let mut min = [T::infinity(); N];
        let mut max = [T::neg_infinity(); N];
        for p in points {
            for i in 0..N {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Aabb { min, max }
    }

    pub fn union(&self, other: &Aabb<T, N>) -> Aabb<T, N> {
        let min = std::array::from_fn(|i| self.min[i].min(other.min[i]));
        let max = std::array::from_fn(|i| self.max[i].max(other.max[i]));
        Aabb { min, max }
    }

    /// Does this AABB intersect `other`? Boxes are closed, so touching counts.
    pub fn intersects(&self, other: &Aabb<T, N>) -> bool {
        (0..N).all(|i| self.max[i] >= other.min[i] && other.max[i] >= self.min[i])
    }

    /// Widen every side by `margin`.
    pub fn inflated(&self, margin: T) -> Aabb<T, N> {
        Aabb {
            min: self.min.map(|v| v - margin),
            max: self.max.map(|v| v + margin),
        }
    }

    /// Center coordinate along axis `i`.
    pub fn center(&self, i: usize) -> T {
        (self.min[i] + self.max[i]) / (T::one() + T::one())
    }

    /// Length along axis `i`.
    fn extent(&self, i: usize) -> T {
        (self.max[i] - self.min[i]).abs()
    }

    /// Return the axis index with largest extent.
    pub fn longest_axis(&self) -> usize {
        let mut best_i = 0usize;
        let mut best = self.extent(0);
        for i in 1..N {
            let e = self.extent(i);
            if e > best {
                best_i = i;
                best = e;
            }
        }
        best_i
    }
}
