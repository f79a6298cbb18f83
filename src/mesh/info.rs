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

use std::ops::{BitOr, BitOrAssign};

/// Per-vertex flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertInfo(u8);

impl VertInfo {
    pub const VISITED: VertInfo = VertInfo(1);
    /// Vertex of the input soup.
    pub const ORIGINAL: VertInfo = VertInfo(1 << 1);
    /// Intersection point created while classifying.
    pub const NEW: VertInfo = VertInfo(1 << 2);
    pub const JOLLY: VertInfo = VertInfo(1 << 3);

    pub const fn empty() -> Self {
        VertInfo(0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: VertInfo) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: VertInfo) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: VertInfo) {
        self.0 &= !other.0;
    }
}

impl BitOr for VertInfo {
    type Output = VertInfo;

    fn bitor(self, rhs: VertInfo) -> VertInfo {
        VertInfo(self.0 | rhs.0)
    }
}

/// Membership bitset: bit `i` set means "belongs to input mesh `i`".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl Label {
    pub const MAX_BITS: u32 = 32;

    pub fn bit(i: u32) -> Self {
        assert!(i < Self::MAX_BITS, "label bit {i} out of range");
        Label(1 << i)
    }

    pub fn contains(self, i: u32) -> bool {
        i < Self::MAX_BITS && self.0 & (1 << i) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Label {
    type Output = Label;

    fn bitor(self, rhs: Label) -> Label {
        Label(self.0 | rhs.0)
    }
}

impl BitOrAssign for Label {
    fn bitor_assign(&mut self, rhs: Label) {
        self.0 |= rhs.0;
    }
}
