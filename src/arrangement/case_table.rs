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

use crate::kernel::Sign;

/// Position of a triangle's vertices against another triangle's plane,
/// decided from the three orientation signs alone. Vertex and edge indices
/// refer to the triangle whose signs were classified; edge `k` joins vertex
/// `k` to vertex `k + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneCase {
    /// All three vertices on the plane.
    AllCoplanar,
    /// All three strictly on one side.
    Separated,
    /// Edge `k` lies on the plane, the third vertex does not.
    CoplanarEdge(usize),
    /// Vertex `k` on the plane, the other two strictly on one side.
    VertexTouch(usize),
    /// Vertex `k` on the plane, the opposite edge crosses it.
    VertexAndCrossing(usize),
    /// Vertex `k` alone on its side; edges `k` and `k + 2` cross the plane.
    EdgesCross(usize),
}

pub fn classify_signs(s: [Sign; 3]) -> PlaneCase {
    let zeros = s.iter().filter(|x| x.is_zero()).count();
    match zeros {
        3 => PlaneCase::AllCoplanar,
        2 => {
            let m = s.iter().position(|x| !x.is_zero()).unwrap_or(0);
            PlaneCase::CoplanarEdge((m + 1) % 3)
        }
        1 => {
            let k = s.iter().position(|x| x.is_zero()).unwrap_or(0);
            if s[(k + 1) % 3] == s[(k + 2) % 3] {
                PlaneCase::VertexTouch(k)
            } else {
                PlaneCase::VertexAndCrossing(k)
            }
        }
        _ => {
            if s[0] == s[1] && s[1] == s[2] {
                PlaneCase::Separated
            } else {
                // exactly one vertex disagrees with the other two
                let k = (0..3)
                    .find(|&k| s[(k + 1) % 3] == s[(k + 2) % 3])
                    .unwrap_or(0);
                PlaneCase::EdgesCross(k)
            }
        }
    }
}
