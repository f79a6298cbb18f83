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

use once_cell::sync::OnceCell;

use crate::numeric::CgarRational;

type Vec3 = [CgarRational; 3];

/// A point given by three finite double-precision coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplicitPoint([f64; 3]);

impl ExplicitPoint {
    /// `None` unless all coordinates are finite.
    pub fn new(x: f64, y: f64, z: f64) -> Option<Self> {
        if x.is_finite() && y.is_finite() && z.is_finite() {
            Some(ExplicitPoint([x, y, z]))
        } else {
            None
        }
    }

    pub fn coords(&self) -> [f64; 3] {
        self.0
    }

    pub fn exact(&self) -> ExactKey {
        // finite by construction, the conversion cannot fail
        ExactKey(self.0.map(|c| CgarRational::from_f64(c).unwrap_or_default()))
    }
}

/// Exact coordinates of a point. Two generic points denote the same location
/// iff their keys are equal; the derived order is the lexicographic one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExactKey(pub [CgarRational; 3]);

impl ExactKey {
    pub fn coords(&self) -> &[CgarRational; 3] {
        &self.0
    }

    pub fn approx(&self) -> [f64; 3] {
        [self.0[0].to_f64(), self.0[1].to_f64(), self.0[2].to_f64()]
    }

    /// The coordinates as doubles when all three are exactly representable.
    pub fn to_f64_exact(&self) -> Option<[f64; 3]> {
        Some([
            self.0[0].to_f64_exact()?,
            self.0[1].to_f64_exact()?,
            self.0[2].to_f64_exact()?,
        ])
    }
}

/// Points defined as intersections of explicit primitives.
#[derive(Clone, Debug)]
pub enum ImplicitPoint {
    /// Line through `line[0]`, `line[1]` meeting the plane through `plane`.
    Lpi {
        line: [ExplicitPoint; 2],
        plane: [ExplicitPoint; 3],
    },
    /// Common point of three planes, each through three points.
    Tpi { planes: [[ExplicitPoint; 3]; 3] },
}

#[derive(Clone, Debug)]
pub enum PointRepr {
    Explicit(ExplicitPoint),
    Implicit(ImplicitPoint),
}

/// Explicit or implicit point with a cached approximation and lazily
/// memoised exact coordinates.
#[derive(Clone, Debug)]
pub struct GenericPoint {
    repr: PointRepr,
    approx: [f64; 3],
    exact: OnceCell<ExactKey>,
}

impl GenericPoint {
    pub fn explicit(p: ExplicitPoint) -> Self {
        GenericPoint {
            repr: PointRepr::Explicit(p),
            approx: p.coords(),
            exact: OnceCell::new(),
        }
    }

    pub fn from_coords(x: f64, y: f64, z: f64) -> Option<Self> {
        ExplicitPoint::new(x, y, z).map(GenericPoint::explicit)
    }

    /// Intersection of line `pq` with plane `rst`. `None` when the line is
    /// parallel to the plane or the plane is degenerate.
    pub fn lpi(
        p: ExplicitPoint,
        q: ExplicitPoint,
        r: ExplicitPoint,
        s: ExplicitPoint,
        t: ExplicitPoint,
    ) -> Option<Self> {
        let (pe, qe) = (p.exact(), q.exact());
        let (re, se, te) = (r.exact(), s.exact(), t.exact());

        let n = cross(&sub(&se.0, &re.0), &sub(&te.0, &re.0));
        let dir = sub(&qe.0, &pe.0);
        let den = dot(&n, &dir);
        if den.is_zero() {
            return None;
        }
        let num = dot(&n, &sub(&re.0, &pe.0));
        let param = &num / &den;
        let x = add(&pe.0, &scale(&dir, &param));

        Some(Self::implicit(
            ImplicitPoint::Lpi {
                line: [p, q],
                plane: [r, s, t],
            },
            ExactKey(x),
        ))
    }

    /// Intersection of three planes. `None` unless they meet in one point.
    pub fn tpi(planes: [[ExplicitPoint; 3]; 3]) -> Option<Self> {
        let mut normals: [Vec3; 3] = Default::default();
        let mut offsets: [CgarRational; 3] = Default::default();
        for (i, plane) in planes.iter().enumerate() {
            let [a, b, c] = plane.map(|p| p.exact());
            normals[i] = cross(&sub(&b.0, &a.0), &sub(&c.0, &a.0));
            offsets[i] = dot(&normals[i], &a.0);
        }

        let n12 = cross(&normals[1], &normals[2]);
        let det = dot(&normals[0], &n12);
        if det.is_zero() {
            return None;
        }
        let n20 = cross(&normals[2], &normals[0]);
        let n01 = cross(&normals[0], &normals[1]);

        let sum = add(
            &add(&scale(&n12, &offsets[0]), &scale(&n20, &offsets[1])),
            &scale(&n01, &offsets[2]),
        );
        let x = sum.map(|c| &c / &det);

        Some(Self::implicit(ImplicitPoint::Tpi { planes }, ExactKey(x)))
    }

    fn implicit(repr: ImplicitPoint, exact: ExactKey) -> Self {
        let approx = exact.approx();
        GenericPoint {
            repr: PointRepr::Implicit(repr),
            approx,
            exact: OnceCell::with_value(exact),
        }
    }

    pub fn repr(&self) -> &PointRepr {
        &self.repr
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self.repr, PointRepr::Explicit(_))
    }

    pub fn as_explicit(&self) -> Option<&ExplicitPoint> {
        match &self.repr {
            PointRepr::Explicit(p) => Some(p),
            PointRepr::Implicit(_) => None,
        }
    }

    /// Nearest double coordinates (exact for explicit points).
    pub fn approx(&self) -> [f64; 3] {
        self.approx
    }

    pub fn exact(&self) -> &ExactKey {
        self.exact.get_or_init(|| match &self.repr {
            PointRepr::Explicit(p) => p.exact(),
            // implicit points are born with their exact value
            PointRepr::Implicit(_) => unreachable!("implicit point without exact coordinates"),
        })
    }
}

fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [&a[0] - &b[0], &a[1] - &b[1], &a[2] - &b[2]]
}

fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    [&a[0] + &b[0], &a[1] + &b[1], &a[2] + &b[2]]
}

fn scale(a: &Vec3, s: &CgarRational) -> Vec3 {
    [&a[0] * s, &a[1] * s, &a[2] * s]
}

fn dot(a: &Vec3, b: &Vec3) -> CgarRational {
    &(&(&a[0] * &b[0]) + &(&a[1] * &b[1])) + &(&a[2] * &b[2])
}

fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        &(&a[1] * &b[2]) - &(&a[2] * &b[1]),
        &(&a[2] * &b[0]) - &(&a[0] * &b[2]),
        &(&a[0] * &b[1]) - &(&a[1] * &b[0]),
    ]
}
