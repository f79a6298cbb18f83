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

use smallvec::SmallVec;

use crate::geometry::GenericPoint;
use crate::kernel::{TriangleLocation, point_in_triangle};
use crate::mesh::coplanar_mesh::CoplanarMesh;

#[derive(Clone, Debug)]
struct DagNode {
    tri: u32,
    verts: [u32; 3],
    children: SmallVec<[u32; 3]>,
}

/// History of triangle splits in a [`CoplanarMesh`]. Leaves are the live
/// triangles; an inner node is a triangle that was split, with the triangles
/// that replaced it as children. Node ids are what `tri_node` stores.
#[derive(Clone, Debug, Default)]
pub struct LocationDag {
    nodes: Vec<DagNode>,
    roots: Vec<u32>,
}

impl LocationDag {
    pub fn new() -> Self {
        Self::default()
    }

    /// One root per live triangle of `mesh`, registered as the triangle's node.
    pub fn for_mesh(mesh: &mut CoplanarMesh) -> Self {
        let mut dag = Self::new();
        let tris: Vec<u32> = mesh.tri_ids().collect();
        for t in tris {
            let node = dag.add_root(t, mesh.tri(t));
            mesh.set_tri_node(t, node);
        }
        dag
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_root(&mut self, tri: u32, verts: [u32; 3]) -> u32 {
        let node = self.push(tri, verts);
        self.roots.push(node);
        node
    }

    pub fn add_child(&mut self, parent: u32, tri: u32, verts: [u32; 3]) -> u32 {
        assert!((parent as usize) < self.nodes.len(), "history node {parent} out of range");
        let node = self.push(tri, verts);
        self.nodes[parent as usize].children.push(node);
        node
    }

    fn push(&mut self, tri: u32, verts: [u32; 3]) -> u32 {
        self.nodes.push(DagNode {
            tri,
            verts,
            children: SmallVec::new(),
        });
        (self.nodes.len() - 1) as u32
    }

    fn test(&self, mesh: &CoplanarMesh, node: u32, p: &GenericPoint) -> TriangleLocation {
        let [a, b, c] = self.nodes[node as usize].verts;
        point_in_triangle(p, mesh.vert(a), mesh.vert(b), mesh.vert(c), mesh.plane())
    }

    /// Live triangle containing `p` and the location of `p` inside it;
    /// `None` when `p` is outside every root.
    pub fn locate(&self, mesh: &CoplanarMesh, p: &GenericPoint) -> Option<(u32, TriangleLocation)> {
        let (mut node, mut loc) = self.roots.iter().find_map(|&r| {
            let loc = self.test(mesh, r, p);
            loc.is_inside().then_some((r, loc))
        })?;

        loop {
            let n = &self.nodes[node as usize];
            if n.children.is_empty() {
                debug_assert!(!mesh.tri_is_removed(n.tri), "history leaf {node} is stale");
                return Some((n.tri, loc));
            }
            let next = n.children.iter().find_map(|&c| {
                let l = self.test(mesh, c, p);
                l.is_inside().then_some((c, l))
            });
            match next {
                Some((c, l)) => {
                    node = c;
                    loc = l;
                }
                None => panic!("point escaped the children of history node {node}"),
            }
        }
    }
}
