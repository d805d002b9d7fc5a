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
use nalgebra as na;
use tracing::*;

use super::{terms::*, FirstOrderFunction, SmootherParams};
use crate::{
    costmap::{costmap_gradient, Costmap},
    errors::*,
};

/// Value of each term of the smoothing objective
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostTerms {
    pub smoothness: f64,
    pub curvature: f64,
    pub distance: f64,
    pub costmap: f64,
}

impl CostTerms {
    pub fn total(&self) -> f64 {
        self.smoothness + self.curvature + self.distance + self.costmap
    }
}

/// Objective for smoothing a path found by the grid search
///
/// The decision variables are the flattened `(x, y)` pairs of every point of the
/// path (see [`flatten_path`](super::flatten_path)). Each interior point adds
/// four terms, computed from the point and its two neighbors:
///
/// - smoothness: squared second difference of the path
/// - curvature: squared excess of the curvature over `max_curvature`
/// - distance: squared displacement from the original path
/// - costmap: obstacle avoidance from the cost of the cell under the point
///
/// The first and the last point never add cost and their gradient is always
/// zero, so a solver keeps them fixed. The gradient at an interior point is the
/// derivative of that point's terms with respect to the point.
///
/// Degenerate geometry (coincident points) or a point outside of the costmap
/// only drops the affected term for that point; the evaluation still succeeds.
#[derive(Debug)]
pub struct SmootherCostFunction<'a, C> {
    original_path: &'a [na::Vector2<f64>],
    costmap: &'a C,
    params: SmootherParams,
}

impl<'a, C> SmootherCostFunction<'a, C>
where
    C: Costmap,
{
    /// Create the objective for `original_path`
    ///
    /// `original_path` anchors the distance term and fixes the number of points.
    pub fn new(
        original_path: &'a [na::Vector2<f64>],
        costmap: &'a C,
        params: SmootherParams,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            original_path,
            costmap,
            params,
        })
    }

    pub fn params(&self) -> &SmootherParams {
        &self.params
    }

    pub fn original_path(&self) -> &[na::Vector2<f64>] {
        self.original_path
    }

    /// Evaluate each term separately
    pub fn cost_terms(&self, parameters: &[f64]) -> Result<CostTerms> {
        self.accumulate(parameters, None)
    }

    fn accumulate(
        &self,
        parameters: &[f64],
        mut gradient: Option<&mut [f64]>,
    ) -> Result<CostTerms> {
        let num_parameters = self.num_parameters();
        if parameters.len() != num_parameters {
            warn!(
                "parameters length {} does not match {num_parameters}",
                parameters.len()
            );
            return Err(Error::ParameterSizeMismatch(parameters.len(), num_parameters));
        }
        if let Some(gradient) = gradient.as_deref_mut() {
            if gradient.len() != num_parameters {
                warn!(
                    "gradient length {} does not match {num_parameters}",
                    gradient.len()
                );
                return Err(Error::ParameterSizeMismatch(gradient.len(), num_parameters));
            }
            gradient.fill(0.0);
        }

        let params = &self.params;
        let point = |i: usize| na::Vector2::new(parameters[2 * i], parameters[2 * i + 1]);
        let mut terms = CostTerms::default();
        let num_points = self.original_path.len();

        for i in 1..num_points.saturating_sub(1) {
            let pt = point(i);
            let pt_p = point(i + 1);
            let pt_m = point(i - 1);
            let pt_original = &self.original_path[i];

            let curvature = CurvatureScratch::new(&pt, &pt_p, &pt_m, params.max_curvature);
            if curvature.is_degenerate() {
                trace!("point {i}: degenerate edges, curvature term skipped");
            }
            terms.smoothness += smoothing_residual(params.smooth_weight, &pt, &pt_p, &pt_m);
            terms.curvature += curvature.residual(params.curvature_weight);
            terms.distance += distance_residual(params.distance_weight, &pt, pt_original);

            let cell = self.costmap.world_to_map(pt.x, pt.y);
            let cell_cost = match cell {
                Some((mx, my)) => {
                    let value = f64::from(self.costmap.cost(mx, my));
                    terms.costmap += costmap_residual(params.costmap_weight, value);
                    Some(value)
                }
                None => {
                    trace!("point {i} ({}, {}) is off the costmap", pt.x, pt.y);
                    None
                }
            };

            if let Some(gradient) = gradient.as_deref_mut() {
                let mut g = smoothing_gradient(params.smooth_weight, &pt, &pt_p, &pt_m)
                    + curvature.gradient(params.curvature_weight)
                    + distance_gradient(params.distance_weight, &pt, pt_original);
                if let (Some((mx, my)), Some(value)) = (cell, cell_cost) {
                    if !is_costless(value) {
                        let direction = costmap_gradient(self.costmap, mx, my);
                        g += costmap_gradient_term(params.costmap_weight, value, &direction);
                    }
                }
                gradient[2 * i] = g.x;
                gradient[2 * i + 1] = g.y;
            }
        }
        Ok(terms)
    }
}

impl<C> FirstOrderFunction for SmootherCostFunction<'_, C>
where
    C: Costmap,
{
    fn num_parameters(&self) -> usize {
        2 * self.original_path.len()
    }

    fn evaluate(&self, parameters: &[f64], gradient: Option<&mut [f64]>) -> Result<f64> {
        self.accumulate(parameters, gradient).map(|terms| terms.total())
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::{
        costmap::{MinimalCostmap, NO_INFORMATION},
        smoother::flatten_path,
    };

    fn line(num_points: usize) -> Vec<na::Vector2<f64>> {
        (0..num_points)
            .map(|i| na::Vector2::new(0.5 + i as f64, 2.5))
            .collect()
    }

    fn params() -> SmootherParams {
        SmootherParams {
            smooth_weight: 1.0,
            costmap_weight: 0.01,
            curvature_weight: 2.0,
            distance_weight: 0.5,
            max_curvature: 0.5,
        }
    }

    fn free_costmap() -> MinimalCostmap {
        MinimalCostmap::new(8, 6, 1.0, na::Vector2::zeros()).unwrap()
    }

    #[test]
    fn num_parameters() {
        let path = line(5);
        let costmap = free_costmap();
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        assert_eq!(function.num_parameters(), 10);
        assert_eq!(function.original_path().len(), 5);
        assert_eq!(function.params(), &params());
    }

    #[test]
    fn rejects_invalid_params() {
        let path = line(5);
        let costmap = free_costmap();
        let invalid = SmootherParams {
            max_curvature: f64::NAN,
            ..params()
        };
        assert!(SmootherCostFunction::new(&path, &costmap, invalid).is_err());
    }

    #[test]
    fn size_mismatch() {
        let path = line(5);
        let costmap = free_costmap();
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        assert!(matches!(
            function.evaluate(&[0.0; 8], None),
            Err(Error::ParameterSizeMismatch(8, 10))
        ));
        let mut gradient = vec![0.0; 4];
        assert!(matches!(
            function.evaluate(&flatten_path(&path), Some(&mut gradient)),
            Err(Error::ParameterSizeMismatch(4, 10))
        ));
    }

    #[test]
    fn straight_line_is_optimal() {
        let path = line(5);
        let costmap = free_costmap();
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        let mut gradient = vec![1.0; 10];
        let cost = function
            .evaluate(&flatten_path(&path), Some(&mut gradient))
            .unwrap();
        assert_eq!(cost, 0.0);
        assert!(gradient.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn endpoints_are_fixed() {
        let path = line(4);
        let costmap = free_costmap();
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        let mut parameters = flatten_path(&path);
        // move the endpoints far away from the original
        parameters[0] = -3.0;
        parameters[7] = 5.0;
        let mut gradient = vec![1.0; 8];
        let terms = function.accumulate(&parameters, Some(&mut gradient)).unwrap();
        assert_eq!(gradient[0], 0.0);
        assert_eq!(gradient[1], 0.0);
        assert_eq!(gradient[6], 0.0);
        assert_eq!(gradient[7], 0.0);
        // only the interior points feel the moved endpoints through smoothing
        assert_eq!(terms.distance, 0.0);
        assert!(terms.smoothness > 0.0);
    }

    #[test]
    fn two_points_have_no_cost() {
        let path = line(2);
        let costmap = free_costmap();
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        let mut gradient = vec![1.0; 4];
        assert_eq!(
            function
                .evaluate(&flatten_path(&path), Some(&mut gradient))
                .unwrap(),
            0.0
        );
        assert_eq!(gradient, vec![0.0; 4]);
        let empty: Vec<na::Vector2<f64>> = vec![];
        let function = SmootherCostFunction::new(&empty, &costmap, params()).unwrap();
        assert_eq!(function.evaluate(&[], None).unwrap(), 0.0);
    }

    #[test]
    fn duplicate_points_do_not_fail() {
        let path = vec![
            na::Vector2::new(0.5, 0.5),
            na::Vector2::new(1.5, 0.5),
            na::Vector2::new(1.5, 0.5),
            na::Vector2::new(2.5, 1.5),
        ];
        let costmap = free_costmap();
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        let mut gradient = vec![0.0; 8];
        let cost = function
            .evaluate(&flatten_path(&path), Some(&mut gradient))
            .unwrap();
        assert!(cost.is_finite());
        assert!(gradient.iter().all(|g| g.is_finite()));
        let terms = function.cost_terms(&flatten_path(&path)).unwrap();
        assert_eq!(terms.curvature, 0.0);
    }

    #[test]
    fn off_map_points_skip_costmap_term() {
        let path = vec![
            na::Vector2::new(-5.5, -5.5),
            na::Vector2::new(-4.5, -5.5),
            na::Vector2::new(-3.5, -5.5),
        ];
        let mut costmap = free_costmap();
        for mx in 0..8 {
            for my in 0..6 {
                costmap.set_cost(mx, my, 100);
            }
        }
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        let terms = function.cost_terms(&flatten_path(&path)).unwrap();
        assert_eq!(terms.costmap, 0.0);
    }

    #[test]
    fn cost_terms_sum_to_evaluate() {
        let path = vec![
            na::Vector2::new(0.5, 0.5),
            na::Vector2::new(1.5, 1.2),
            na::Vector2::new(2.2, 2.8),
            na::Vector2::new(4.5, 3.5),
        ];
        let mut costmap = free_costmap();
        for mx in 0..8 {
            costmap.set_cost(mx, 1, 120);
            costmap.set_cost(mx, 2, 90);
        }
        let params = SmootherParams {
            max_curvature: 0.1,
            ..params()
        };
        let original = line(4);
        let function = SmootherCostFunction::new(&original, &costmap, params).unwrap();
        let parameters = flatten_path(&path);
        let terms = function.cost_terms(&parameters).unwrap();
        assert!(terms.smoothness > 0.0);
        assert!(terms.curvature > 0.0);
        assert!(terms.distance > 0.0);
        assert!(terms.costmap < 0.0);
        assert_approx_eq!(function.evaluate(&parameters, None).unwrap(), terms.total());
    }

    #[test]
    fn unknown_cells_add_nothing() {
        let path = line(3);
        let mut costmap = free_costmap();
        costmap.set_cost(1, 2, NO_INFORMATION);
        let function = SmootherCostFunction::new(&path, &costmap, params()).unwrap();
        let mut gradient = vec![0.0; 6];
        let cost = function
            .evaluate(&flatten_path(&path), Some(&mut gradient))
            .unwrap();
        assert_eq!(cost, 0.0);
        assert_eq!(gradient, vec![0.0; 6]);
    }
}
