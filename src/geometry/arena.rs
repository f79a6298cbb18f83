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

use std::sync::{Arc, RwLock};

use crate::geometry::point::GenericPoint;
use crate::mesh::sharded_map::{read_lock, write_lock};

/// Stable handle into a [`PointArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub u32);

/// Append-only store of points shared by the soup and every local mesh.
#[derive(Debug, Default)]
pub struct PointArena {
    points: RwLock<Vec<Arc<GenericPoint>>>,
}

impl PointArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        PointArena {
            points: RwLock::new(Vec::with_capacity(n)),
        }
    }

    pub fn push(&self, p: GenericPoint) -> PointId {
        let mut points = write_lock(&self.points);
        points.push(Arc::new(p));
        PointId((points.len() - 1) as u32)
    }

    pub fn get(&self, id: PointId) -> Arc<GenericPoint> {
        let points = read_lock(&self.points);
        match points.get(id.0 as usize) {
            Some(p) => p.clone(),
            None => panic!("point id {} out of range ({} points)", id.0, points.len()),
        }
    }

    pub fn len(&self) -> usize {
        read_lock(&self.points).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
