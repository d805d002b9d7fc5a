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
//! Path smoothing objective for a gradient based solver.

mod cost_function;
mod params;
mod terms;

use nalgebra as na;

pub use self::{cost_function::*, params::*, terms::CurvatureScratch};
use crate::errors::*;

/// Objective with an analytic gradient, evaluated repeatedly by a solver
pub trait FirstOrderFunction {
    /// Number of decision variables
    fn num_parameters(&self) -> usize;

    /// Return the cost at `parameters` and, if requested, write the gradient
    ///
    /// Fails only if a buffer does not have [`num_parameters`](Self::num_parameters) elements.
    fn evaluate(&self, parameters: &[f64], gradient: Option<&mut [f64]>) -> Result<f64>;
}

/// Flatten path points into `[x0, y0, x1, y1, ...]`
pub fn flatten_path(path: &[na::Vector2<f64>]) -> Vec<f64> {
    path.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Inverse of [`flatten_path`]
///
/// ```
/// use nalgebra as na;
/// use openrr_grid_planner::{flatten_path, unflatten_path};
///
/// let path = vec![na::Vector2::new(0.0, 1.0), na::Vector2::new(2.0, 3.0)];
/// let parameters = flatten_path(&path);
/// assert_eq!(parameters, vec![0.0, 1.0, 2.0, 3.0]);
/// assert_eq!(unflatten_path(&parameters).unwrap(), path);
/// assert!(unflatten_path(&[0.0, 1.0, 2.0]).is_err());
/// ```
pub fn unflatten_path(parameters: &[f64]) -> Result<Vec<na::Vector2<f64>>> {
    if parameters.len() % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "odd number of path parameters: {}",
            parameters.len()
        )));
    }
    Ok(parameters
        .chunks_exact(2)
        .map(|xy| na::Vector2::new(xy[0], xy[1]))
        .collect())
}
