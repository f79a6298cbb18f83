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

/// Undirected edge key: the two vertex ids with the smaller one first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalEdge {
    pub a: u32,
    pub b: u32,
}

impl CanonicalEdge {
    pub fn new(v0: u32, v1: u32) -> Self {
        if v0 < v1 {
            Self { a: v0, b: v1 }
        } else {
            Self { a: v1, b: v0 }
        }
    }

    pub fn verts(&self) -> [u32; 2] {
        [self.a, self.b]
    }

    pub fn contains(&self, v: u32) -> bool {
        self.a == v || self.b == v
    }

    /// The other endpoint; `None` if `v` is not on the edge.
    pub fn opposite(&self, v: u32) -> Option<u32> {
        if v == self.a {
            Some(self.b)
        } else if v == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_independent() {
        assert_eq!(CanonicalEdge::new(5, 2), CanonicalEdge::new(2, 5));
        assert_eq!(CanonicalEdge::new(5, 2).verts(), [2, 5]);
        assert_eq!(CanonicalEdge::new(5, 2).opposite(2), Some(5));
        assert_eq!(CanonicalEdge::new(5, 2).opposite(3), None);
    }
}
