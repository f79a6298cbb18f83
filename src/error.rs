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

use thiserror::Error;

/// Rejected input. Everything past input validation either succeeds or
/// panics on a broken internal invariant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArrangementError {
    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFiniteCoordinate { vertex: usize },
    #[error("coordinate buffer length {len} is not a multiple of 3")]
    CoordsNotTriples { len: usize },
    #[error("triangle buffer length {len} is not a multiple of 3")]
    TrisNotTriples { len: usize },
    #[error("triangle {triangle} references vertex {index}, but there are only {num_verts} vertices")]
    VertexIndexOutOfRange {
        triangle: usize,
        index: u32,
        num_verts: usize,
    },
    #[error("{labels} labels given for {triangles} triangles")]
    LabelCountMismatch { labels: usize, triangles: usize },
    #[error("candidate pair {pair:?} references a triangle that does not exist")]
    CandidateOutOfRange { pair: (u32, u32) },
    #[error("jolly scale {scale} must be finite and at least 1")]
    InvalidJollyScale { scale: f64 },
    #[error("coordinate magnitude {max_coord} leaves no finite room for the jolly points")]
    CoordinateTooLarge { max_coord: f64 },
}

/// First broken invariant reported by `CoplanarMesh::check_topology`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("edge {edge} has {count} incident triangles")]
    EdgeValence { edge: u32, count: usize },
    #[error("triangle {tri} is missing its edge ({v0}, {v1})")]
    MissingEdge { tri: u32, v0: u32, v1: u32 },
    #[error("triangle {tri} repeats a vertex")]
    RepeatedVertex { tri: u32 },
    #[error("triangle {tri} is not positively oriented")]
    BadOrientation { tri: u32 },
    #[error("triangles {a} and {b} share all three vertices")]
    DuplicateTriangle { a: u32, b: u32 },
    #[error("adjacency of {what} {id} is out of sync")]
    StaleAdjacency { what: &'static str, id: u32 },
}
