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

use crate::geometry::point::GenericPoint;
use crate::kernel::{Sign, predicates::orient2d};

/// Coordinate plane a planar primitive is projected on: the one orthogonal to
/// the dominant axis of its normal. Projection keeps the cyclic axis order,
/// so a triangle whose normal points along `+axis` projects counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectionPlane {
    Yz,
    Zx,
    Xy,
}

impl ProjectionPlane {
    pub const ALL: [ProjectionPlane; 3] = [ProjectionPlane::Yz, ProjectionPlane::Zx, ProjectionPlane::Xy];

    /// Coordinates kept by the projection, in order.
    pub fn axes(self) -> (usize, usize) {
        match self {
            ProjectionPlane::Yz => (1, 2),
            ProjectionPlane::Zx => (2, 0),
            ProjectionPlane::Xy => (0, 1),
        }
    }

    pub fn dropped_axis(self) -> usize {
        match self {
            ProjectionPlane::Yz => 0,
            ProjectionPlane::Zx => 1,
            ProjectionPlane::Xy => 2,
        }
    }

    pub fn from_dropped_axis(axis: usize) -> Self {
        match axis {
            0 => ProjectionPlane::Yz,
            1 => ProjectionPlane::Zx,
            2 => ProjectionPlane::Xy,
            _ => panic!("axis {axis} out of range"),
        }
    }

    /// Plane orthogonal to the largest component of an approximate normal.
    pub fn from_normal(n: [f64; 3]) -> Self {
        let abs = n.map(f64::abs);
        let mut axis = 2;
        if abs[0] > abs[1] && abs[0] > abs[2] {
            axis = 0;
        } else if abs[1] > abs[2] {
            axis = 1;
        }
        Self::from_dropped_axis(axis)
    }

    /// Projection plane for the triangle `abc`, `None` when the triangle is
    /// degenerate. The approximate normal suggests a plane; the choice is kept
    /// only if the exact projected orientation is non-zero.
    pub fn for_triangle(a: &GenericPoint, b: &GenericPoint, c: &GenericPoint) -> Option<Self> {
        let suggested = Self::from_normal(approx_normal(a.approx(), b.approx(), c.approx()));
        if orient2d(a, b, c, suggested) != Sign::Zero {
            return Some(suggested);
        }
        Self::ALL
            .into_iter()
            .filter(|p| *p != suggested)
            .find(|p| orient2d(a, b, c, *p) != Sign::Zero)
    }

    pub fn project(self, p: [f64; 3]) -> [f64; 2] {
        let (i, j) = self.axes();
        [p[i], p[j]]
    }
}

pub fn approx_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}
