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

use crate::error::ArrangementError;

/// Knobs of the arrangement pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrangementConfig {
    /// Run the candidate sweep, bulk mesh builds and cluster triangulation on
    /// the rayon pool.
    pub parallel: bool,
    /// Distance of the jolly points from the origin, in units of
    /// `max |coordinate| + 1`.
    pub jolly_scale: f64,
    /// Merge triangles with the same vertices and orientation, OR-ing labels.
    pub merge_duplicate_triangles: bool,
}

impl Default for ArrangementConfig {
    fn default() -> Self {
        ArrangementConfig {
            parallel: true,
            jolly_scale: 4.0,
            merge_duplicate_triangles: true,
        }
    }
}

impl ArrangementConfig {
    pub fn validate(&self) -> Result<(), ArrangementError> {
        if !self.jolly_scale.is_finite() || self.jolly_scale < 1.0 {
            return Err(ArrangementError::InvalidJollyScale {
                scale: self.jolly_scale,
            });
        }
        Ok(())
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_jolly_scale(mut self, scale: f64) -> Self {
        self.jolly_scale = scale;
        self
    }

    pub fn with_merge_duplicate_triangles(mut self, merge: bool) -> Self {
        self.merge_duplicate_triangles = merge;
        self
    }
}
