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
//! # Grid Path Planning Library for Mobile Robots
//!
//! Building blocks of a 2D costmap planner: the per cell search state used by a
//! best first search ([`Node2D`], [`NodeGraph`], [`Neighborhood`]) and the cost
//! function that smooths the resulting path with a gradient based solver
//! ([`SmootherCostFunction`]).
//!
//! The search loop, the costmap itself and the solver are provided by the caller.
//!

#![warn(rust_2018_idioms)]

mod config;

pub mod costmap;

mod errors;

mod graph;

pub mod smoother;

pub use crate::{
    config::*,
    costmap::{costmap_gradient, Costmap, MinimalCostmap},
    errors::{Error, Result},
    graph::*,
    smoother::{
        flatten_path, unflatten_path, CostTerms, CurvatureScratch, FirstOrderFunction,
        SmootherCostFunction, SmootherParams,
    },
};

/// Length and value threshold below which geometry is treated as degenerate
pub(crate) const EPSILON: f64 = 0.0001;
