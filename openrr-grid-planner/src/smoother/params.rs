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
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// Weights of the smoothing objective and the curvature limit
#[derive(Clone, Serialize, Deserialize, Debug, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SmootherParams {
    /// Weight of the second difference of the path
    #[serde(default = "default_smooth_weight")]
    pub smooth_weight: f64,
    /// Weight of the obstacle cost avoidance
    #[serde(default = "default_costmap_weight")]
    pub costmap_weight: f64,
    /// Weight of the curvature exceeding `max_curvature`
    #[serde(default = "default_curvature_weight")]
    pub curvature_weight: f64,
    /// Weight binding the path to the original one
    #[serde(default = "default_distance_weight")]
    pub distance_weight: f64,
    /// Maximum curvature (inverse of the minimum turning radius) [1/m]
    #[serde(default = "default_max_curvature")]
    pub max_curvature: f64,
}

fn default_smooth_weight() -> f64 {
    15000.0
}

fn default_costmap_weight() -> f64 {
    0.015
}

fn default_curvature_weight() -> f64 {
    30.0
}

fn default_distance_weight() -> f64 {
    0.0
}

fn default_max_curvature() -> f64 {
    // minimum turning radius 0.4m
    2.5
}

impl Default for SmootherParams {
    fn default() -> Self {
        Self {
            smooth_weight: default_smooth_weight(),
            costmap_weight: default_costmap_weight(),
            curvature_weight: default_curvature_weight(),
            distance_weight: default_distance_weight(),
            max_curvature: default_max_curvature(),
        }
    }
}

impl SmootherParams {
    /// Check that every value is finite and `max_curvature` is not negative
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("smooth_weight", self.smooth_weight),
            ("costmap_weight", self.costmap_weight),
            ("curvature_weight", self.curvature_weight),
            ("distance_weight", self.distance_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return Err(Error::InvalidArgument(format!(
                    "{name} must be finite but {value}"
                )));
            }
        }
        if !(self.max_curvature.is_finite() && self.max_curvature >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "max_curvature must be finite and non-negative but {}",
                self.max_curvature
            )));
        }
        Ok(())
    }
}
