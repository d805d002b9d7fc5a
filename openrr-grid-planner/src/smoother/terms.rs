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
//! Per point terms of the smoothing objective.
//!
//! Every term of point `i` depends on `pt` (point `i`), `pt_p` (point `i + 1`)
//! and `pt_m` (point `i - 1`). Gradients are the partial derivatives of the
//! term with respect to `pt`.

use nalgebra as na;

use crate::{
    costmap::{FREE_SPACE, MAX_NON_OBSTACLE, NO_INFORMATION},
    EPSILON,
};

/// Squared second difference of the path
pub(crate) fn smoothing_residual(
    weight: f64,
    pt: &na::Vector2<f64>,
    pt_p: &na::Vector2<f64>,
    pt_m: &na::Vector2<f64>,
) -> f64 {
    weight * (pt_p - pt * 2.0 + pt_m).norm_squared()
}

pub(crate) fn smoothing_gradient(
    weight: f64,
    pt: &na::Vector2<f64>,
    pt_p: &na::Vector2<f64>,
    pt_m: &na::Vector2<f64>,
) -> na::Vector2<f64> {
    (pt_m * -4.0 + pt * 8.0 - pt_p * 4.0) * weight
}

/// Squared displacement from the original path
pub(crate) fn distance_residual(
    weight: f64,
    pt: &na::Vector2<f64>,
    pt_original: &na::Vector2<f64>,
) -> f64 {
    weight * (pt - pt_original).norm_squared()
}

pub(crate) fn distance_gradient(
    weight: f64,
    pt: &na::Vector2<f64>,
    pt_original: &na::Vector2<f64>,
) -> na::Vector2<f64> {
    (pt - pt_original) * (2.0 * weight)
}

/// Free and unknown cells carry no obstacle cost
pub(crate) fn is_costless(value: f64) -> bool {
    value == f64::from(FREE_SPACE) || value == f64::from(NO_INFORMATION)
}

/// Obstacle avoidance: a downward parabola around [`MAX_NON_OBSTACLE`]
///
/// Free and unknown cells cost nothing.
pub(crate) fn costmap_residual(weight: f64, value: f64) -> f64 {
    if is_costless(value) {
        return 0.0;
    }
    let offset = value - f64::from(MAX_NON_OBSTACLE);
    -weight * offset * offset
}

/// `direction` is the unit direction of increasing cost at the cell of the point.
pub(crate) fn costmap_gradient_term(
    weight: f64,
    value: f64,
    direction: &na::Vector2<f64>,
) -> na::Vector2<f64> {
    if is_costless(value) {
        return na::Vector2::zeros();
    }
    direction * (-2.0 * weight * (value - f64::from(MAX_NON_OBSTACLE)))
}

/// Intermediate values of the curvature term of one point
///
/// Computed once per point and shared by the cost and the gradient. A scratch
/// is invalid, and then contributes neither cost nor gradient, when an edge is
/// shorter than [`EPSILON`], a value is not finite, or the curvature does not
/// exceed the limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvatureScratch {
    valid: bool,
    degenerate: bool,
    /// `pt - pt_m`
    delta_xi: na::Vector2<f64>,
    /// `pt_p - pt`
    delta_xi_p: na::Vector2<f64>,
    delta_xi_norm: f64,
    delta_xi_p_norm: f64,
    projection: f64,
    delta_phi: f64,
    curvature: f64,
    excess: f64,
}

impl CurvatureScratch {
    pub fn new(
        pt: &na::Vector2<f64>,
        pt_p: &na::Vector2<f64>,
        pt_m: &na::Vector2<f64>,
        max_curvature: f64,
    ) -> Self {
        let delta_xi = pt - pt_m;
        let delta_xi_p = pt_p - pt;
        let delta_xi_norm = delta_xi.norm();
        let delta_xi_p_norm = delta_xi_p.norm();
        let mut scratch = Self {
            valid: false,
            degenerate: true,
            delta_xi,
            delta_xi_p,
            delta_xi_norm,
            delta_xi_p_norm,
            projection: 1.0,
            delta_phi: 0.0,
            curvature: 0.0,
            excess: 0.0,
        };
        if !(delta_xi_norm.is_finite() && delta_xi_p_norm.is_finite())
            || delta_xi_norm < EPSILON
            || delta_xi_p_norm < EPSILON
        {
            return scratch;
        }

        let mut projection = delta_xi.dot(&delta_xi_p) / (delta_xi_norm * delta_xi_p_norm);
        if (1.0 - projection).abs() < EPSILON || (projection + 1.0).abs() < EPSILON {
            projection = 1.0;
        }
        let projection = projection.clamp(-1.0, 1.0);
        if !projection.is_finite() {
            return scratch;
        }
        scratch.degenerate = false;
        scratch.projection = projection;
        scratch.delta_phi = projection.acos();
        scratch.curvature = scratch.delta_phi / delta_xi_norm;
        scratch.excess = scratch.curvature - max_curvature;
        scratch.valid = scratch.excess.is_finite() && scratch.excess > 0.0;
        scratch
    }

    /// True if the curvature exceeds the limit and the geometry is well defined
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True if an edge is too short or not finite to define a turning angle
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Turning angle between the incoming and the outgoing edge [rad]
    pub fn turning_angle(&self) -> f64 {
        self.delta_phi
    }

    /// Turning angle over the length of the incoming edge
    pub fn curvature(&self) -> f64 {
        self.curvature
    }

    /// Curvature minus the limit
    pub fn excess(&self) -> f64 {
        self.excess
    }

    /// `weight * excess^2` when valid, otherwise zero
    pub fn residual(&self, weight: f64) -> f64 {
        if !self.valid {
            return 0.0;
        }
        weight * self.excess * self.excess
    }

    /// Partial derivative of [`CurvatureScratch::residual`] with respect to the point
    pub fn gradient(&self, weight: f64) -> na::Vector2<f64> {
        if !self.valid {
            return na::Vector2::zeros();
        }
        let unit_xi = self.delta_xi / self.delta_xi_norm;
        let unit_xi_p = self.delta_xi_p / self.delta_xi_p_norm;
        let cos_phi = self.projection;

        // d(cos phi)/d(pt): pt moves the end of delta_xi and the start of delta_xi_p
        let d_cos = (unit_xi_p - unit_xi * cos_phi) / self.delta_xi_norm
            - (unit_xi - unit_xi_p * cos_phi) / self.delta_xi_p_norm;
        // d(acos(c))/dc = -1 / sin(phi)
        let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
        let d_phi = if sin_phi > EPSILON {
            d_cos * (-1.0 / sin_phi)
        } else {
            na::Vector2::zeros()
        };
        let d_curvature = d_phi / self.delta_xi_norm
            - unit_xi * (self.delta_phi / (self.delta_xi_norm * self.delta_xi_norm));

        let gradient = d_curvature * (2.0 * weight * self.excess);
        if gradient.iter().all(|v| v.is_finite()) {
            gradient
        } else {
            na::Vector2::zeros()
        }
    }
}
