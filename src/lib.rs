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

//! Exact arrangement of triangle soups.
//!
//! Input triangles may cross, touch or overlap. [`arrange`] finds every
//! pairwise intersection with exact predicates, carries coplanar
//! intersections across overlapping triangles, and re-triangulates each
//! affected triangle so that no two output triangles cross improperly.

pub mod arrangement;
pub mod config;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod mesh;
pub mod numeric;

pub use arrangement::{Arrangement, ArrangedTriangle, arrange, arrange_with_pairs};
pub use config::ArrangementConfig;
pub use error::{ArrangementError, TopologyError};
pub use mesh::{CoplanarMesh, FlipOutcome, Label, TriangleSoup, VertInfo};
