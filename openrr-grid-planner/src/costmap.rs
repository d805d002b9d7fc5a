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
//! Costmap interface consumed by the smoother, and a finite-difference
//! estimate of the local cost gradient.

use nalgebra as na;

use crate::{errors::*, EPSILON};

/// Cell with no obstacle cost
pub const FREE_SPACE: u8 = 0;
/// Highest cost a traversable cell can have
pub const MAX_NON_OBSTACLE: u8 = 252;
/// Cell within the inscribed radius of an obstacle
pub const INSCRIBED: u8 = 253;
/// Lethal obstacle
pub const OCCUPIED: u8 = 254;
/// Cell with no information
pub const NO_INFORMATION: u8 = 255;

/// 2D costmap lookups needed by planning
pub trait Costmap {
    /// Convert world coordinates to map cell coordinates
    ///
    /// Returns `None` if the point is outside of the map.
    fn world_to_map(&self, wx: f64, wy: f64) -> Option<(u32, u32)>;
    /// Cost of the cell `(mx, my)`
    fn cost(&self, mx: u32, my: u32) -> u8;
    fn size_x(&self) -> u32;
    fn size_y(&self) -> u32;
}

impl<C> Costmap for &C
where
    C: Costmap + ?Sized,
{
    fn world_to_map(&self, wx: f64, wy: f64) -> Option<(u32, u32)> {
        (**self).world_to_map(wx, wy)
    }

    fn cost(&self, mx: u32, my: u32) -> u8 {
        (**self).cost(mx, my)
    }

    fn size_x(&self) -> u32 {
        (**self).size_x()
    }

    fn size_y(&self) -> u32 {
        (**self).size_y()
    }
}

/// Plain row-major costmap with an origin and a resolution
///
/// Map indices grow along the world x and y axes.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalCostmap {
    size_x: u32,
    size_y: u32,
    resolution: f64,
    origin: na::Vector2<f64>,
    costs: Vec<u8>,
}

impl MinimalCostmap {
    /// Create a costmap filled with [`FREE_SPACE`]
    pub fn new(size_x: u32, size_y: u32, resolution: f64, origin: na::Vector2<f64>) -> Result<Self> {
        let len = size_x as usize * size_y as usize;
        Self::from_costs(vec![FREE_SPACE; len], size_x, size_y, resolution, origin)
    }

    /// Create a costmap from row-major cell costs
    pub fn from_costs(
        costs: Vec<u8>,
        size_x: u32,
        size_y: u32,
        resolution: f64,
        origin: na::Vector2<f64>,
    ) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "costmap resolution must be positive but {resolution}"
            )));
        }
        if !(origin.x.is_finite() && origin.y.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "costmap origin must be finite but {origin:?}"
            )));
        }
        if costs.len() != size_x as usize * size_y as usize {
            return Err(Error::InvalidArgument(format!(
                "{} costs for a {size_x}x{size_y} costmap",
                costs.len()
            )));
        }
        Ok(Self {
            size_x,
            size_y,
            resolution,
            origin,
            costs,
        })
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn origin(&self) -> &na::Vector2<f64> {
        &self.origin
    }

    /// Row-major cell costs
    pub fn costs(&self) -> &[u8] {
        &self.costs
    }

    /// Set the cost of a cell, returns false if the cell is outside of the map
    pub fn set_cost(&mut self, mx: u32, my: u32, cost: u8) -> bool {
        match self.cell_index(mx, my) {
            Some(index) => {
                self.costs[index] = cost;
                true
            }
            None => false,
        }
    }

    /// World coordinates of the center of a cell
    pub fn map_to_world(&self, mx: u32, my: u32) -> na::Vector2<f64> {
        self.origin
            + na::Vector2::new(f64::from(mx) + 0.5, f64::from(my) + 0.5) * self.resolution
    }

    fn cell_index(&self, mx: u32, my: u32) -> Option<usize> {
        (mx < self.size_x && my < self.size_y)
            .then(|| my as usize * self.size_x as usize + mx as usize)
    }
}

impl Costmap for MinimalCostmap {
    fn world_to_map(&self, wx: f64, wy: f64) -> Option<(u32, u32)> {
        let mx = ((wx - self.origin.x) / self.resolution).floor();
        let my = ((wy - self.origin.y) / self.resolution).floor();
        // NaN fails both comparisons
        if mx >= 0.0 && my >= 0.0 && mx < f64::from(self.size_x) && my < f64::from(self.size_y) {
            Some((mx as u32, my as u32))
        } else {
            None
        }
    }

    /// Cells outside of the map have [`NO_INFORMATION`]
    fn cost(&self, mx: u32, my: u32) -> u8 {
        self.cell_index(mx, my)
            .map_or(NO_INFORMATION, |index| self.costs[index])
    }

    fn size_x(&self) -> u32 {
        self.size_x
    }

    fn size_y(&self) -> u32 {
        self.size_y
    }
}

/// Unit direction of increasing cost at the cell `(mx, my)`
///
/// Each axis is differentiated with the 7 point central stencil
/// `(45 (f1 - f-1) - 9 (f2 - f-2) + (f3 - f-3)) / 60`. The x component is taken
/// along map x and the y component along map y, so for a costmap whose indices
/// grow with the world axes the result is a world frame direction. Samples
/// outside of the map count as zero. A flat neighborhood (including a single
/// isolated cell) yields the zero vector.
///
/// ```
/// use nalgebra as na;
/// use openrr_grid_planner::{costmap_gradient, MinimalCostmap};
///
/// let mut costmap = MinimalCostmap::new(10, 10, 0.1, na::Vector2::zeros()).unwrap();
/// for mx in 0..10 {
///     for my in 0..10 {
///         costmap.set_cost(mx, my, (mx * 20) as u8);
///     }
/// }
/// let gradient = costmap_gradient(&costmap, 5, 5);
/// assert_eq!(gradient, na::Vector2::new(1.0, 0.0));
/// ```
pub fn costmap_gradient<C>(costmap: &C, mx: u32, my: u32) -> na::Vector2<f64>
where
    C: Costmap + ?Sized,
{
    let sample = |dx: i32, dy: i32| -> f64 {
        match (mx.checked_add_signed(dx), my.checked_add_signed(dy)) {
            (Some(x), Some(y)) if x < costmap.size_x() && y < costmap.size_y() => {
                f64::from(costmap.cost(x, y))
            }
            _ => 0.0,
        }
    };
    let derivative = |dx: i32, dy: i32| -> f64 {
        (45.0 * (sample(dx, dy) - sample(-dx, -dy))
            - 9.0 * (sample(2 * dx, 2 * dy) - sample(-2 * dx, -2 * dy))
            + (sample(3 * dx, 3 * dy) - sample(-3 * dx, -3 * dy)))
            / 60.0
    };

    let gradient = na::Vector2::new(derivative(1, 0), derivative(0, 1));
    let norm = gradient.norm();
    if norm.is_finite() && norm > EPSILON {
        gradient / norm
    } else {
        na::Vector2::zeros()
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn costmap_from_fn(size: u32, f: impl Fn(u32, u32) -> u8) -> MinimalCostmap {
        let mut costmap = MinimalCostmap::new(size, size, 0.5, na::Vector2::new(-1.0, -2.0)).unwrap();
        for mx in 0..size {
            for my in 0..size {
                assert!(costmap.set_cost(mx, my, f(mx, my)));
            }
        }
        costmap
    }

    #[test]
    fn world_map_conversion() {
        let costmap = MinimalCostmap::new(10, 8, 0.5, na::Vector2::new(-1.0, -2.0)).unwrap();
        assert_eq!(costmap.world_to_map(-1.0, -2.0), Some((0, 0)));
        assert_eq!(costmap.world_to_map(0.0, 0.0), Some((2, 4)));
        assert_eq!(costmap.world_to_map(3.99, 1.99), Some((9, 7)));
        assert_eq!(costmap.world_to_map(4.0, 0.0), None);
        assert_eq!(costmap.world_to_map(0.0, 2.0), None);
        assert_eq!(costmap.world_to_map(-1.01, 0.0), None);
        assert_eq!(costmap.world_to_map(f64::NAN, 0.0), None);
        let center = costmap.map_to_world(2, 4);
        assert_approx_eq!(center.x, 0.25);
        assert_approx_eq!(center.y, 0.25);
        assert_eq!(costmap.world_to_map(center.x, center.y), Some((2, 4)));
    }

    #[test]
    fn cost_access() {
        let mut costmap = MinimalCostmap::new(4, 3, 1.0, na::Vector2::zeros()).unwrap();
        assert!(costmap.set_cost(3, 2, OCCUPIED));
        assert!(!costmap.set_cost(4, 2, OCCUPIED));
        assert_eq!(costmap.cost(3, 2), OCCUPIED);
        assert_eq!(costmap.cost(0, 0), FREE_SPACE);
        assert_eq!(costmap.cost(0, 3), NO_INFORMATION);
        assert_eq!(costmap.costs()[11], OCCUPIED);
    }

    #[test]
    fn invalid_costmaps() {
        assert!(MinimalCostmap::new(4, 4, 0.0, na::Vector2::zeros()).is_err());
        assert!(MinimalCostmap::new(4, 4, f64::NAN, na::Vector2::zeros()).is_err());
        assert!(MinimalCostmap::new(4, 4, 1.0, na::Vector2::new(f64::INFINITY, 0.0)).is_err());
        assert!(MinimalCostmap::from_costs(vec![0; 15], 4, 4, 1.0, na::Vector2::zeros()).is_err());
    }

    #[test]
    fn gradient_follows_x_ramp() {
        let costmap = costmap_from_fn(10, |mx, _| (mx * 10) as u8);
        let gradient = costmap_gradient(&costmap, 5, 5);
        assert_approx_eq!(gradient.x, 1.0);
        assert_approx_eq!(gradient.y, 0.0);
    }

    #[test]
    fn gradient_follows_y_ramp() {
        let costmap = costmap_from_fn(10, |_, my| (200 - my * 10) as u8);
        let gradient = costmap_gradient(&costmap, 4, 4);
        assert_approx_eq!(gradient.x, 0.0);
        assert_approx_eq!(gradient.y, -1.0);
    }

    #[test]
    fn gradient_diagonal() {
        let costmap = costmap_from_fn(12, |mx, my| ((mx + my) * 5) as u8);
        let gradient = costmap_gradient(&costmap, 6, 6);
        assert_approx_eq!(gradient.x, std::f64::consts::FRAC_1_SQRT_2);
        assert_approx_eq!(gradient.y, std::f64::consts::FRAC_1_SQRT_2);
        assert_approx_eq!(gradient.norm(), 1.0);
    }

    #[test]
    fn gradient_of_flat_or_isolated_cell_is_zero() {
        let flat = costmap_from_fn(10, |_, _| 100);
        assert_eq!(costmap_gradient(&flat, 5, 5), na::Vector2::zeros());

        let peak = costmap_from_fn(10, |mx, my| if (mx, my) == (5, 5) { 200 } else { 0 });
        assert_eq!(costmap_gradient(&peak, 5, 5), na::Vector2::zeros());
    }

    #[test]
    fn gradient_at_edges_treats_outside_as_zero() {
        let flat = costmap_from_fn(10, |_, _| 100);
        // the right neighbors are outside of the map
        let gradient = costmap_gradient(&flat, 9, 5);
        assert_approx_eq!(gradient.x, -1.0);
        assert_approx_eq!(gradient.y, 0.0);
        let corner = costmap_gradient(&flat, 0, 0);
        assert!(corner.x > 0.0 && corner.y > 0.0);
    }

    #[test]
    fn gradient_points_toward_higher_cost_in_world_frame() {
        // cost grows toward the world point (2.5, 1.5)
        let costmap = costmap_from_fn(16, |mx, my| {
            let dx = mx as f64 - 7.0;
            let dy = my as f64 - 7.0;
            (250.0 - 20.0 * (dx * dx + dy * dy).sqrt()).max(0.0) as u8
        });
        let peak = costmap.map_to_world(7, 7);
        for (mx, my) in [(4, 7), (10, 7), (7, 3), (7, 11), (5, 5), (9, 10)] {
            let gradient = costmap_gradient(&costmap, mx, my);
            let position = costmap.map_to_world(mx, my);
            let toward_peak = (peak - position).normalize();
            assert!(gradient.dot(&toward_peak) > 0.9, "{mx} {my} {gradient:?}");

            // a step against the gradient reaches a cheaper cell
            let stepped = position - gradient * costmap.resolution();
            let (sx, sy) = costmap.world_to_map(stepped.x, stepped.y).unwrap();
            assert!(costmap.cost(sx, sy) < costmap.cost(mx, my));
        }
    }
}
