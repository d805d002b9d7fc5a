/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use tracing::*;

use crate::{
    costmap::{INSCRIBED, NO_INFORMATION, OCCUPIED},
    errors::*,
};

/// Position of a node on the grid, in cells
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub x: f32,
    pub y: f32,
}

impl Coordinates {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Search state of one cell of a 2D grid
///
/// The identity of a node is its flat (row-major) index. Two nodes compare
/// equal when their indices are equal.
#[derive(Debug, Clone)]
pub struct Node2D {
    /// Index of the node this one was reached from, used to reconstruct the path
    pub parent: Option<usize>,
    cell_cost: f32,
    accumulated_cost: f32,
    index: usize,
    was_visited: bool,
    is_queued: bool,
}

impl PartialEq for Node2D {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Node2D {
    /// Create a node with the costmap cost of its cell
    pub fn new(cell_cost: u8, index: usize) -> Self {
        Self {
            parent: None,
            cell_cost: f32::from(cell_cost),
            accumulated_cost: f32::INFINITY,
            index,
            was_visited: false,
            is_queued: false,
        }
    }

    /// Reinitialize in place for a new search
    pub fn reset(&mut self, cell_cost: u8, index: usize) {
        self.parent = None;
        self.cell_cost = f32::from(cell_cost);
        self.accumulated_cost = f32::INFINITY;
        self.index = index;
        self.was_visited = false;
        self.is_queued = false;
    }

    pub fn accumulated_cost(&self) -> f32 {
        self.accumulated_cost
    }

    pub fn set_accumulated_cost(&mut self, cost: f32) {
        self.accumulated_cost = cost;
    }

    /// Costmap cost of the cell
    pub fn cost(&self) -> f32 {
        self.cell_cost
    }

    pub fn was_visited(&self) -> bool {
        self.was_visited
    }

    /// Mark as visited (closed). A visited node is no longer queued.
    pub fn visited(&mut self) {
        self.was_visited = true;
        self.is_queued = false;
    }

    pub fn is_queued(&self) -> bool {
        self.is_queued
    }

    /// Mark as queued (open)
    pub fn queued(&mut self) {
        self.is_queued = true;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if this node can be expanded
    ///
    /// Occupied and inscribed cells are never valid. Unknown cells are valid only
    /// when `traverse_unknown` is true.
    pub fn is_node_valid(&self, traverse_unknown: bool) -> bool {
        let cost = self.cell_cost;
        if cost == f32::from(OCCUPIED) || cost == f32::from(INSCRIBED) {
            return false;
        }
        if cost == f32::from(NO_INFORMATION) && !traverse_unknown {
            return false;
        }
        true
    }

    /// Flat index of the cell `(x, y)` on a grid of `width` columns
    pub fn index_from_coordinates(x: usize, y: usize, width: usize) -> usize {
        x + y * width
    }

    /// Cell coordinates of a flat index
    ///
    /// `Node2D` carries no orientation, so `angle_quantization` must be 1.
    ///
    /// ```
    /// use openrr_grid_planner::Node2D;
    ///
    /// let coords = Node2D::coordinates_from_index(23, 10, 1).unwrap();
    /// assert_eq!(coords.x, 3.0);
    /// assert_eq!(coords.y, 2.0);
    /// assert!(Node2D::coordinates_from_index(23, 10, 72).is_err());
    /// ```
    pub fn coordinates_from_index(
        index: usize,
        width: usize,
        angle_quantization: usize,
    ) -> Result<Coordinates> {
        if angle_quantization != 1 {
            return Err(Error::InvalidArgument(format!(
                "Node2D does not have a valid angle quantization: {angle_quantization}"
            )));
        }
        if width == 0 {
            return Err(Error::InvalidArgument("grid width must be positive".to_owned()));
        }
        Ok(Coordinates::new((index % width) as f32, (index / width) as f32))
    }

    /// Euclidean distance to the goal scaled by the cost of one neutral step
    pub fn heuristic_cost(node: &Coordinates, goal: &Coordinates, neutral_cost: f32) -> f32 {
        (goal.x - node.x).hypot(goal.y - node.y) * neutral_cost
    }
}

/// Arena owning one node per grid cell
///
/// The arena is sized once per grid and reused across searches with [`NodeGraph::reset`].
#[derive(Debug, Clone)]
pub struct NodeGraph {
    nodes: Vec<Node2D>,
    width: usize,
}

impl NodeGraph {
    /// Create the nodes of a row-major grid of `width` columns
    pub fn new(costs: &[u8], width: usize) -> Result<Self> {
        check_grid_shape(costs.len(), width)?;
        let nodes = costs
            .iter()
            .enumerate()
            .map(|(index, &cost)| Node2D::new(cost, index))
            .collect();
        Ok(Self { nodes, width })
    }

    /// Prepare the arena for a new search
    ///
    /// Nodes are reinitialized in place when the grid size is unchanged.
    pub fn reset(&mut self, costs: &[u8], width: usize) -> Result<()> {
        check_grid_shape(costs.len(), width)?;
        if costs.len() == self.nodes.len() {
            for (index, (node, &cost)) in self.nodes.iter_mut().zip(costs).enumerate() {
                node.reset(cost, index);
            }
        } else {
            debug!(
                "grid size changed {} -> {}, reallocating nodes",
                self.nodes.len(),
                costs.len()
            );
            self.nodes = costs
                .iter()
                .enumerate()
                .map(|(index, &cost)| Node2D::new(cost, index))
                .collect();
        }
        self.width = width;
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.nodes.len() / self.width
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&Node2D> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node2D> {
        self.nodes.get_mut(index)
    }

    /// Validity predicate for neighbor expansion
    ///
    /// Returns the index back if the node exists and can be traversed.
    pub fn valid_node(&self, index: usize, traverse_unknown: bool) -> Option<usize> {
        self.nodes
            .get(index)
            .filter(|node| node.is_node_valid(traverse_unknown))
            .map(Node2D::index)
    }

    /// Follow parent links from `goal` and return the indices from start to goal
    ///
    /// The walk stops after visiting as many nodes as the arena holds, so a
    /// malformed parent cycle cannot loop forever.
    pub fn backtrace(&self, goal: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(goal).map(|_| goal);
        while let Some(index) = current {
            if path.len() >= self.nodes.len() {
                warn!("parent links of node {goal} form a cycle");
                break;
            }
            path.push(index);
            current = self.nodes.get(index).and_then(|node| node.parent);
        }
        path.reverse();
        path
    }
}

fn check_grid_shape(len: usize, width: usize) -> Result<()> {
    if width == 0 {
        return Err(Error::InvalidArgument("grid width must be positive".to_owned()));
    }
    if len % width != 0 {
        return Err(Error::InvalidArgument(format!(
            "{len} cells cannot form rows of width {width}"
        )));
    }
    Ok(())
}
